//! Typed HTTP client for the stash API.
//!
//! Each endpoint module defines its request type and implements
//! [`ApiRequest`] for it next to the handler, so client and server agree on
//! paths and payloads.

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

#[allow(clippy::module_inception)]
mod client;
mod error;

pub use client::ApiClient;
pub use error::ClientError;

pub trait ApiRequest {
    /// Decoded from the JSON body; an empty body decodes as `null`.
    type Response: DeserializeOwned;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder;
}

/// `base_url` with its path replaced by `path`.
pub fn endpoint(base_url: &Url, path: &str) -> Url {
    let mut url = base_url.clone();
    url.set_path(path);
    url
}

/// URL of a single file, with the name percent-encoded as one segment.
pub fn file_endpoint(base_url: &Url, filename: &str) -> Url {
    let mut url = endpoint(base_url, "/files/");
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(filename);
    }
    url
}
