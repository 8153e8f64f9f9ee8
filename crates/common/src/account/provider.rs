use std::fmt::{Debug, Display};

use async_trait::async_trait;

use crate::validation::{Username, ValidationError};

#[derive(thiserror::Error, Debug)]
pub enum AccountError<T> {
    /// The backing store failed
    #[error("unhandled account provider error: {0}")]
    Provider(#[from] T),
    /// The username or password did not pass validation
    #[error("{0}")]
    Validation(ValidationError),
    /// An account with this username already exists
    #[error("username already exists: {0}")]
    Conflict(Username),
    /// No account with this username
    #[error("account not found: {0}")]
    NotFound(String),
    /// The account exists but the password does not match
    #[error("incorrect password for {0}")]
    Unauthorized(Username),
    /// The password hasher failed
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Persistence for `username -> password hash`.
///
/// Implementations must treat the username as a unique key: inserting an
/// existing username has to fail with [`AccountError::Conflict`] even when
/// a concurrent caller slipped past the [`AccountProvider::account_exists`]
/// pre-check.
#[async_trait]
pub trait AccountProvider: Send + Sync + Debug + Clone + 'static {
    type Error: Display + Debug + Send;

    async fn account_exists(&self, username: &Username)
        -> Result<bool, AccountError<Self::Error>>;

    /// Persist a new account
    ///
    /// # Arguments
    /// * `username` - The validated account name
    /// * `password_hash` - PHC formatted hash; never the raw password
    ///
    /// Should fail with the following errors to be considered
    ///  correct:
    /// * `Err(AccountError::Conflict)` - The username is taken
    async fn insert_account(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<(), AccountError<Self::Error>>;

    /// Look up the stored hash, `None` when there is no such account
    async fn password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<String>, AccountError<Self::Error>>;
}
