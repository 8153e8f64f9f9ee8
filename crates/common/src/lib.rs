//! Core of the stash file service.
//!
//! - [`account`]: registration and password verification over a pluggable
//!   [`account::AccountProvider`]
//! - [`session`]: stateless signed session tokens
//! - [`catalog`]: file descriptors and the [`catalog::CatalogProvider`] trait
//! - [`files`]: the file service that keeps catalog and blob store in step
//!
//! Persistent providers live in the daemon crate; the in-memory ones here
//! back the tests.

pub mod account;
pub mod catalog;
pub mod files;
pub mod session;
pub mod validation;

pub use blobs_store;

pub mod prelude {
    pub use crate::account::{AccountError, AccountProvider, CredentialStore, PasswordHasher};
    pub use crate::catalog::{CatalogError, CatalogProvider, FileDescriptor};
    pub use crate::files::{FileError, FileService, StoredFile};
    pub use crate::session::{SessionManager, SessionToken};
    pub use crate::validation::{Filename, Password, Username, ValidationError};
}
