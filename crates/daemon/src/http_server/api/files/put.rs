use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::http_server::api::client::{file_endpoint, ApiRequest};
use crate::http_server::api::error::ApiError;
use crate::http_server::api::session::Session;
use crate::ServiceState;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Upload a new file.
#[derive(Debug, Clone)]
pub struct PutFileRequest {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutFileResponse {
    pub filename: String,
    pub content_type: String,
    pub content_length: u64,
}

/// Streams the request body into the blob store.
///
/// `Content-Length` is required: it becomes the descriptor's declared size
/// and is checked against the upload limit before anything is stored.
#[tracing::instrument(skip_all)]
pub async fn handler(
    State(state): State<ServiceState>,
    Session(owner): Session,
    Path(filename): Path<String>,
    headers: HeaderMap,
    body: Body,
) -> Result<impl IntoResponse, ApiError> {
    let content_length = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .ok_or_else(|| ApiError::Validation("a valid Content-Length header is required".into()))?;

    if content_length > state.max_upload_size() {
        return Err(ApiError::PayloadTooLarge);
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string();

    let descriptor = state
        .files()
        .put(
            &owner,
            &filename,
            &content_type,
            content_length,
            body.into_data_stream(),
        )
        .await?;

    let location = HeaderValue::from_str(descriptor.filename.as_str()).map_err(ApiError::internal)?;

    Ok((
        StatusCode::CREATED,
        [(LOCATION, location)],
        Json(PutFileResponse {
            filename: descriptor.filename.to_string(),
            content_type: descriptor.content_type,
            content_length: descriptor.content_length,
        }),
    ))
}

// Client implementation - builds request for this operation
impl ApiRequest for PutFileRequest {
    type Response = PutFileResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let content_type = self
            .content_type
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        client
            .put(file_endpoint(base_url, &self.filename))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(self.data)
    }
}
