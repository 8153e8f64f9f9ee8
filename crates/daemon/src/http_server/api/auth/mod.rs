//! Account endpoints: `/register` and `/login`.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod login;
pub mod register;

pub use login::{LoginRequest, LoginResponse};
pub use register::RegisterRequest;

/// `{username, password}` body shared by both endpoints.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
