use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::http_server::api::client::{endpoint, ApiRequest};
use crate::http_server::api::error::ApiError;
use crate::http_server::api::session::Session;
use crate::ServiceState;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListFilesRequest {}

/// The caller's filenames in upload order.
#[tracing::instrument(skip_all)]
pub async fn handler(
    State(state): State<ServiceState>,
    Session(owner): Session,
) -> Result<impl IntoResponse, ApiError> {
    let names = state.files().list(&owner).await?;
    Ok(Json(names))
}

// Client implementation - builds request for this operation
impl ApiRequest for ListFilesRequest {
    type Response = Vec<String>;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.get(endpoint(base_url, "/files"))
    }
}
