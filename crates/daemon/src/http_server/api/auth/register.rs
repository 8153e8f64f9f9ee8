use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Url};

use super::Credentials;
use crate::http_server::api::client::{endpoint, ApiRequest};
use crate::http_server::api::error::{json_body, ApiError};
use crate::ServiceState;

/// Create an account.
#[derive(Debug, Clone)]
pub struct RegisterRequest(pub Credentials);

#[tracing::instrument(skip_all)]
pub async fn handler(
    State(state): State<ServiceState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let credentials: Credentials = json_body(body)?;

    let username = state
        .credentials()
        .register(&credentials.username, &credentials.password)
        .await?;

    tracing::info!(username = %username, "registered");
    Ok(StatusCode::NO_CONTENT)
}

// Client implementation - builds request for this operation
impl ApiRequest for RegisterRequest {
    type Response = ();

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.post(endpoint(base_url, "/register")).json(&self.0)
    }
}
