//! The file service: uploads, downloads, deletes and listings that keep
//! the metadata catalog and the blob store consistent.

mod error;
mod reconcile;
mod service;

pub use error::FileError;
pub use reconcile::{Anomaly, ReconcileOptions, ReconcileReport};
pub use service::{FileService, StoredFile};
