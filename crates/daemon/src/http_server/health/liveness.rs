use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::http_server::api::client::{endpoint, ApiRequest};

/// `GET /_status/livez`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivezRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivezResponse {
    pub status: String,
}

impl ApiRequest for LivezRequest {
    type Response = LivezResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.get(endpoint(base_url, "/_status/livez"))
    }
}

/// Answers `ok` as long as the stash process is serving HTTP. Touches
/// neither the account database nor the blob store, so a slow disk never
/// makes the daemon look dead. `stash health` and the readiness route
/// cover the database.
#[tracing::instrument]
pub async fn handler() -> Response {
    let body = LivezResponse {
        status: "ok".to_string(),
    };
    (StatusCode::OK, Json(body)).into_response()
}
