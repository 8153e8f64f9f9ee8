use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use crate::http_server::api::error::ApiError;
use crate::http_server::api::session::Session;
use crate::ServiceState;

/// A downloaded file, as returned by
/// [`ApiClient::download`](crate::http_server::api::client::ApiClient::download).
#[derive(Debug, Clone)]
pub struct Download {
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Streams the blob back with the descriptor's content type and length.
#[tracing::instrument(skip_all)]
pub async fn handler(
    State(state): State<ServiceState>,
    Session(owner): Session,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let file = state.files().get(&owner, &filename).await?;

    let content_type = HeaderValue::from_str(&file.descriptor.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(super::put::DEFAULT_CONTENT_TYPE));

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, content_type),
            (CONTENT_LENGTH, HeaderValue::from(file.descriptor.content_length)),
        ],
        Body::from_stream(file.reader.into_stream()),
    )
        .into_response())
}
