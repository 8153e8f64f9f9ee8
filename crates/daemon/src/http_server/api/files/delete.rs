use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};

use crate::http_server::api::client::{file_endpoint, ApiRequest};
use crate::http_server::api::error::ApiError;
use crate::http_server::api::session::Session;
use crate::ServiceState;

#[derive(Debug, Clone)]
pub struct DeleteFileRequest {
    pub filename: String,
}

#[tracing::instrument(skip_all)]
pub async fn handler(
    State(state): State<ServiceState>,
    Session(owner): Session,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.files().delete(&owner, &filename).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Client implementation - builds request for this operation
impl ApiRequest for DeleteFileRequest {
    type Response = ();

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.delete(file_endpoint(base_url, &self.filename))
    }
}
