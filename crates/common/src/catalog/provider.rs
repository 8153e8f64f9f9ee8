use std::fmt::{Debug, Display};

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::validation::{Filename, Username};

/// Metadata for one stored file, keyed by `(owner, filename)`.
///
/// Descriptors are created when an upload is registered and removed on
/// delete. They are never updated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub owner: Username,
    pub filename: Filename,
    pub content_type: String,
    /// Declared size in bytes
    pub content_length: u64,
    pub created_at: OffsetDateTime,
}

impl FileDescriptor {
    pub fn new(
        owner: Username,
        filename: Filename,
        content_type: impl Into<String>,
        content_length: u64,
    ) -> Self {
        Self {
            owner,
            filename,
            content_type: content_type.into(),
            content_length,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CatalogError<T> {
    #[error("unhandled catalog provider error: {0}")]
    Provider(#[from] T),
    /// A descriptor with the same key is already registered
    #[error("file already exists: {0}/{1}")]
    Conflict(Username, Filename),
    #[error("file not found: {0}/{1}")]
    NotFound(Username, Filename),
}

/// Persistence for file descriptors.
///
/// The `(owner, filename)` key is unique and the provider is the arbiter of
/// that uniqueness: two concurrent inserts of the same key must resolve to
/// exactly one success and one [`CatalogError::Conflict`].
#[async_trait]
pub trait CatalogProvider: Send + Sync + Debug + Clone + 'static {
    type Error: Display + Debug + Send;

    async fn exists(
        &self,
        owner: &Username,
        filename: &Filename,
    ) -> Result<bool, CatalogError<Self::Error>>;

    /// Register a descriptor
    ///
    /// Should fail with the following errors to be considered
    ///  correct:
    /// * `Err(CatalogError::Conflict)` - The key is already registered
    async fn insert(&self, descriptor: &FileDescriptor) -> Result<(), CatalogError<Self::Error>>;

    /// Remove a descriptor
    ///
    /// Should fail with the following errors to be considered
    ///  correct:
    /// * `Err(CatalogError::NotFound)` - No descriptor with this key
    async fn delete(
        &self,
        owner: &Username,
        filename: &Filename,
    ) -> Result<(), CatalogError<Self::Error>>;

    async fn get(
        &self,
        owner: &Username,
        filename: &Filename,
    ) -> Result<Option<FileDescriptor>, CatalogError<Self::Error>>;

    /// Filenames registered to `owner`, in insertion order
    async fn list_by_owner(&self, owner: &Username)
        -> Result<Vec<String>, CatalogError<Self::Error>>;

    /// Every descriptor across all owners
    async fn list_all(&self) -> Result<Vec<FileDescriptor>, CatalogError<Self::Error>>;
}
