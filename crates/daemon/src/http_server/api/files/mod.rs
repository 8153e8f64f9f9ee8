//! File endpoints. Every route requires a session; the owner is always the
//! session's user.

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;

use crate::ServiceState;

pub mod delete;
pub mod get;
pub mod list;
pub mod put;

pub use delete::DeleteFileRequest;
pub use get::Download;
pub use list::ListFilesRequest;
pub use put::{PutFileRequest, PutFileResponse};

/// Uploads are streamed and bounded by the declared `Content-Length`, so the
/// default body limit does not apply here.
pub fn router() -> Router<ServiceState> {
    Router::new()
        .route("/files", get(list::handler))
        .route(
            "/files/:filename",
            get(get::handler).put(put::handler).delete(delete::handler),
        )
        .layer(DefaultBodyLimit::disable())
}
