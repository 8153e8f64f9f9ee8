//! Per-owner blob storage
//!
//! This crate stores raw file bytes for stash on a pluggable object storage
//! backend (local filesystem or memory). Blobs are keyed by
//! `(owner, filename)` and laid out hierarchically as `<owner>/<filename>`.
//!
//! The store knows nothing about file metadata. Which blobs *should* exist
//! is decided by the metadata catalog; [`BlobStore::list_all`] and
//! [`BlobStore::size`] exist so a reconciliation pass can compare the two.
//!
//! # Example
//!
//! ```rust,no_run
//! use stash_blobs_store::BlobStore;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), stash_blobs_store::BlobStoreError> {
//! let store = BlobStore::new_local(Path::new("/tmp/stash/blobs")).await?;
//!
//! let body = futures::stream::iter(vec![Ok::<_, std::io::Error>(bytes::Bytes::from("hello"))]);
//! let size = store.write("alice", "hello.txt", body).await?;
//! assert_eq!(size, 5);
//!
//! let data = store.read("alice", "hello.txt").await?.bytes().await?;
//! println!("Retrieved: {:?}", data);
//! # Ok(())
//! # }
//! ```

mod error;
mod storage;
mod store;

pub use error::{BlobStoreError, Result};
pub use storage::{BlobStoreConfig, Storage};
pub use store::{BlobEntry, BlobKey, BlobReader, BlobStore};
