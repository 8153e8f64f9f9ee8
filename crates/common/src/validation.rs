//! Input validation for the values that cross the trust boundary.
//!
//! Everything here is checked before any store is touched.

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 20;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const FILENAME_MAX_LEN: usize = 255;

/// Characters a filename may not contain. Object storage would escape these,
/// and `/` and `\` would escape the owner's namespace.
const FILENAME_FORBIDDEN: &[char] = &[
    '/', '\\', '{', '}', '^', '%', '`', '[', ']', '"', '<', '>', '~', '#', '|', '*', '?',
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Usernames must be at least 3 characters and no more than 20")]
    UsernameLength,
    #[error("Usernames may only contain alphanumeric characters")]
    UsernameCharset,
    #[error("Password must be at least 8 characters")]
    PasswordTooShort,
    #[error("Filename must not be empty")]
    FilenameEmpty,
    #[error("Filename must be at most 255 bytes")]
    FilenameTooLong,
    #[error("Filename must not be '.' or '..'")]
    FilenameReserved,
    #[error("Filename contains a forbidden character: {0:?}")]
    FilenameCharset(char),
}

/// An account name: 3 to 20 ASCII alphanumeric characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&raw.len()) {
            return Err(ValidationError::UsernameLength);
        }
        if !raw.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValidationError::UsernameCharset);
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for Username {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Username::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl Deref for Username {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A plaintext password on its way to the hasher. `Debug` never prints it.
#[derive(Clone)]
pub struct Password(String);

impl Password {
    /// Accept a password for registration, enforcing the minimum length in
    /// characters. Eight characters are never fewer than eight bytes.
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        if raw.chars().count() < PASSWORD_MIN_LEN {
            return Err(ValidationError::PasswordTooShort);
        }
        Ok(Self(raw))
    }

    /// Wrap a candidate password for verification. No policy is applied:
    /// a login attempt with a short password simply fails to verify.
    pub fn candidate(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// A file name inside an owner's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Filename(String);

impl Filename {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if raw.is_empty() {
            return Err(ValidationError::FilenameEmpty);
        }
        if raw.len() > FILENAME_MAX_LEN {
            return Err(ValidationError::FilenameTooLong);
        }
        if raw == "." || raw == ".." {
            return Err(ValidationError::FilenameReserved);
        }
        if let Some(c) = raw
            .chars()
            .find(|c| c.is_control() || FILENAME_FORBIDDEN.contains(c))
        {
            return Err(ValidationError::FilenameCharset(c));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Filename {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for Filename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_bounds() {
        assert_eq!(Username::parse("ab"), Err(ValidationError::UsernameLength));
        assert_eq!(
            Username::parse(&"a".repeat(21)),
            Err(ValidationError::UsernameLength)
        );
        assert!(Username::parse("abc").is_ok());
        assert!(Username::parse(&"a".repeat(20)).is_ok());
    }

    #[test]
    fn test_username_charset() {
        for bad in ["al ice", "alice!", "ali_ce", "bøb", "../x"] {
            assert!(Username::parse(bad).is_err(), "{bad} should be rejected");
        }
        assert_eq!(Username::parse("Alice42").unwrap().as_str(), "Alice42");
    }

    #[test]
    fn test_username_deserialize_validates() {
        let ok: Username = serde_json::from_str("\"alice\"").unwrap();
        assert_eq!(ok.as_str(), "alice");
        assert!(serde_json::from_str::<Username>("\"a!\"").is_err());
    }

    #[test]
    fn test_password_min_length() {
        assert_eq!(
            Password::new("short").unwrap_err(),
            ValidationError::PasswordTooShort
        );
        assert!(Password::new("12345678").is_ok());

        // Four characters in eight bytes is still too short.
        assert_eq!(
            Password::new("éééé").unwrap_err(),
            ValidationError::PasswordTooShort
        );
        assert!(Password::new("éééééééé").is_ok());
    }

    #[test]
    fn test_password_debug_is_redacted() {
        let password = Password::new("correctpw1").unwrap();
        assert!(!format!("{password:?}").contains("correctpw1"));
    }

    #[test]
    fn test_filename_rules() {
        assert_eq!(Filename::parse(""), Err(ValidationError::FilenameEmpty));
        assert_eq!(Filename::parse(".."), Err(ValidationError::FilenameReserved));
        assert_eq!(
            Filename::parse("../secret"),
            Err(ValidationError::FilenameCharset('/'))
        );
        assert_eq!(
            Filename::parse("a\nb"),
            Err(ValidationError::FilenameCharset('\n'))
        );
        assert_eq!(
            Filename::parse(&"x".repeat(256)),
            Err(ValidationError::FilenameTooLong)
        );
        assert!(Filename::parse("report 2024.final.pdf").is_ok());
        assert!(Filename::parse(".hidden").is_ok());
    }
}
