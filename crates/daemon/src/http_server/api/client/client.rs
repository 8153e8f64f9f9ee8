use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use url::Url;

use super::error::ClientError;
use super::{file_endpoint, ApiRequest};
use crate::http_server::api::error::ErrorBody;
use crate::http_server::api::files::Download;

#[derive(Debug, Clone)]
pub struct ApiClient {
    pub remote: Url,
    client: Client,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(remote: &Url) -> Result<Self, ClientError> {
        let client = Client::builder().build()?;

        Ok(Self {
            remote: remote.clone(),
            client,
            token: None,
        })
    }

    /// Attach a session token, sent as `Authorization: Bearer`.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub async fn call<T: ApiRequest>(&self, request: T) -> Result<T::Response, ClientError> {
        let mut request_builder = request.build_request(&self.remote, &self.client);
        if let Some(token) = &self.token {
            request_builder = request_builder.bearer_auth(token);
        }
        let response = check_status(request_builder.send().await?).await?;

        let body = response.bytes().await?;
        let body: &[u8] = if body.is_empty() { b"null" } else { &body };
        Ok(serde_json::from_slice(body)?)
    }

    /// Fetch a file's bytes.
    pub async fn download(&self, filename: &str) -> Result<Download, ClientError> {
        let mut request_builder = self.client.get(file_endpoint(&self.remote, filename));
        if let Some(token) = &self.token {
            request_builder = request_builder.bearer_auth(token);
        }
        let response = check_status(request_builder.send().await?).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let data = response.bytes().await?;

        Ok(Download { content_type, data })
    }

    /// Get the base URL for API requests
    pub fn base_url(&self) -> &Url {
        &self.remote
    }
}

/// Turn a non-success response into [`ClientError::HttpStatus`], preferring
/// the server's `{"error": ...}` message over the raw body.
async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await?;
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);
    Err(ClientError::HttpStatus(status, message))
}
