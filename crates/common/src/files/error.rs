use blobs_store::BlobStoreError;

use crate::catalog::CatalogError;
use crate::validation::{Filename, Username, ValidationError};

/// Errors from the file service.
///
/// `E` is the catalog provider's own error type.
#[derive(thiserror::Error, Debug)]
pub enum FileError<E> {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("file already exists: {1}")]
    Conflict(Username, Filename),
    #[error("file not found: {1}")]
    NotFound(Username, Filename),
    /// The catalog has a row but the blob is missing or the wrong size
    #[error("file {key} is corrupt: {reason}")]
    Corrupt { key: String, reason: String },
    /// The upload body did not match its declared length
    #[error("declared content length {declared} but received {received} bytes")]
    LengthMismatch { declared: u64, received: u64 },
    #[error("catalog error: {0}")]
    Catalog(E),
    #[error("blob store error: {0}")]
    Blob(#[from] BlobStoreError),
}

impl<E> From<CatalogError<E>> for FileError<E> {
    fn from(err: CatalogError<E>) -> Self {
        match err {
            CatalogError::Provider(e) => FileError::Catalog(e),
            CatalogError::Conflict(owner, filename) => FileError::Conflict(owner, filename),
            CatalogError::NotFound(owner, filename) => FileError::NotFound(owner, filename),
        }
    }
}
