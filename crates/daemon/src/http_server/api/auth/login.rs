use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::account::AccountError;

use super::Credentials;
use crate::http_server::api::client::{endpoint, ApiRequest};
use crate::http_server::api::error::{json_body, ApiError};
use crate::http_server::api::session::SESSION_COOKIE;
use crate::ServiceState;

/// Exchange credentials for a session token.
#[derive(Debug, Clone)]
pub struct LoginRequest(pub Credentials);

#[derive(Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("LoginResponse { token: <redacted> }")
    }
}

/// Verifies the credentials, then hands the token back both in the body
/// and as an `HttpOnly` cookie.
///
/// Unknown users and wrong passwords produce the same `403`; the cause is
/// only visible in debug logs.
#[tracing::instrument(skip_all)]
pub async fn handler(
    State(state): State<ServiceState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let credentials: Credentials = json_body(body)?;

    let username = match state
        .credentials()
        .verify(&credentials.username, &credentials.password)
        .await
    {
        Ok(username) => username,
        Err(e @ (AccountError::NotFound(_) | AccountError::Unauthorized(_))) => {
            tracing::debug!(reason = %e, "login rejected");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    let token = state.sessions().issue(&username).map_err(ApiError::internal)?;
    let max_age = time::Duration::seconds(state.sessions().ttl().num_seconds());

    let cookie = Cookie::build((SESSION_COOKIE, token.as_str().to_string()))
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(max_age);

    tracing::info!(username = %username, "logged in");
    Ok((
        CookieJar::new().add(cookie),
        Json(LoginResponse {
            token: token.into_inner(),
        }),
    ))
}

// Client implementation - builds request for this operation
impl ApiRequest for LoginRequest {
    type Response = LoginResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.post(endpoint(base_url, "/login")).json(&self.0)
    }
}
