//! Credential store: registration and password verification.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};

use super::provider::{AccountError, AccountProvider};
use crate::validation::{Password, Username};

/// Returned when Argon2 rejects a [`HashParams`] combination.
pub type HashParamsError = argon2::Error;

/// Verified in place of a real hash when the account does not exist, so an
/// unknown username costs as much as a wrong password.
const DUMMY_PASSWORD: &str = "stash-dummy-password";

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashParams {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Password hasher using Argon2id.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher").finish_non_exhaustive()
    }
}

impl PasswordHasher {
    pub fn new(params: HashParams) -> Result<Self, HashParamsError> {
        let params = Params::new(
            params.memory_kib,
            params.iterations,
            params.parallelism,
            None,
        )?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a password into a salted PHC string.
    pub fn hash_password(&self, password: &Password) -> Result<String, String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.expose().as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| e.to_string())
    }

    /// Check a password against a PHC string. A malformed hash never
    /// verifies.
    pub fn verify_password(&self, password: &Password, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        self.argon2
            .verify_password(password.expose().as_bytes(), &parsed)
            .is_ok()
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}

/// Registers accounts and verifies passwords on top of an
/// [`AccountProvider`].
///
/// Hashing is CPU bound, so it runs on the blocking thread pool.
#[derive(Debug, Clone)]
pub struct CredentialStore<A: AccountProvider> {
    provider: A,
    hasher: PasswordHasher,
    dummy_hash: Option<String>,
}

impl<A: AccountProvider> CredentialStore<A> {
    pub fn new(provider: A, hasher: PasswordHasher) -> Self {
        let dummy_hash = hasher
            .hash_password(&Password::candidate(DUMMY_PASSWORD))
            .ok();
        Self {
            provider,
            hasher,
            dummy_hash,
        }
    }

    pub fn provider(&self) -> &A {
        &self.provider
    }

    /// Create an account.
    ///
    /// Input is validated before the provider is consulted. The existence
    /// check is only a fast path; a concurrent registration of the same name
    /// is rejected by the provider's uniqueness guarantee.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Username, AccountError<A::Error>> {
        let username = Username::parse(username).map_err(AccountError::Validation)?;
        let password = Password::new(password).map_err(AccountError::Validation)?;

        if self.provider.account_exists(&username).await? {
            return Err(AccountError::Conflict(username));
        }

        let hasher = self.hasher.clone();
        let hash = tokio::task::spawn_blocking(move || hasher.hash_password(&password))
            .await
            .map_err(|e| AccountError::Hashing(e.to_string()))?
            .map_err(AccountError::Hashing)?;

        self.provider.insert_account(&username, &hash).await?;

        tracing::info!(username = %username, "account registered");
        Ok(username)
    }

    /// Check a username/password pair.
    ///
    /// Returns [`AccountError::NotFound`] for an unknown (or syntactically
    /// impossible) username and [`AccountError::Unauthorized`] for a wrong
    /// password. Callers facing untrusted clients should collapse the two.
    pub async fn verify(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Username, AccountError<A::Error>> {
        let password = Password::candidate(password);

        let Ok(username) = Username::parse(username) else {
            self.burn(password).await;
            return Err(AccountError::NotFound(username.to_string()));
        };

        let Some(hash) = self.provider.password_hash(&username).await? else {
            self.burn(password).await;
            return Err(AccountError::NotFound(username.into_inner()));
        };

        let hasher = self.hasher.clone();
        let verified =
            tokio::task::spawn_blocking(move || hasher.verify_password(&password, &hash))
                .await
                .map_err(|e| AccountError::Hashing(e.to_string()))?;

        if verified {
            Ok(username)
        } else {
            Err(AccountError::Unauthorized(username))
        }
    }

    /// Spend one verification's worth of work against the dummy hash.
    async fn burn(&self, password: Password) {
        let Some(dummy) = self.dummy_hash.clone() else {
            return;
        };
        let hasher = self.hasher.clone();
        let _ = tokio::task::spawn_blocking(move || hasher.verify_password(&password, &dummy)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::MemoryAccountProvider;
    use crate::validation::ValidationError;

    /// Cheap parameters so tests don't spend seconds per hash.
    fn test_hasher() -> PasswordHasher {
        PasswordHasher::new(HashParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    fn store() -> CredentialStore<MemoryAccountProvider> {
        CredentialStore::new(MemoryAccountProvider::new(), test_hasher())
    }

    #[test]
    fn test_password_hash_and_verify() {
        let hasher = test_hasher();
        let password = Password::new("test_password_123").unwrap();

        let hash = hasher.hash_password(&password).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify_password(&password, &hash));
        assert!(!hasher.verify_password(&Password::candidate("wrong_password"), &hash));
    }

    #[test]
    fn test_same_password_different_salts() {
        let hasher = test_hasher();
        let password = Password::new("password1").unwrap();

        let hash1 = hasher.hash_password(&password).unwrap();
        let hash2 = hasher.hash_password(&password).unwrap();
        assert_ne!(hash1, hash2);
        assert!(hasher.verify_password(&password, &hash1));
        assert!(hasher.verify_password(&password, &hash2));
    }

    #[test]
    fn test_rejected_params_are_a_std_error() {
        let err = PasswordHasher::new(HashParams {
            memory_kib: 1,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap_err();
        let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(err);
        assert!(!boxed.to_string().is_empty());
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        let hasher = test_hasher();
        assert!(!hasher.verify_password(&Password::candidate("password"), "invalid_hash"));
    }

    #[tokio::test]
    async fn test_register_distinct_users() {
        let store = store();
        store.register("alice", "correctpw1").await.unwrap();
        store.register("bob", "correctpw2").await.unwrap();

        assert!(store
            .provider()
            .account_exists(&Username::parse("alice").unwrap())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_register_twice_conflicts() {
        let store = store();
        store.register("alice", "correctpw1").await.unwrap();

        let err = store.register("alice", "otherpass1").await.unwrap_err();
        assert!(matches!(err, AccountError::Conflict(u) if u.as_str() == "alice"));
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_input_before_store() {
        let store = store();

        let cases = [
            ("ab", "longenough", ValidationError::UsernameLength),
            ("averyveryverylongname1", "longenough", ValidationError::UsernameLength),
            ("bad-name", "longenough", ValidationError::UsernameCharset),
            ("alice", "short", ValidationError::PasswordTooShort),
        ];
        for (username, password, expected) in cases {
            let err = store.register(username, password).await.unwrap_err();
            assert!(
                matches!(&err, AccountError::Validation(v) if *v == expected),
                "{username}: {err}"
            );
        }

        // nothing reached the provider
        assert!(!store
            .provider()
            .account_exists(&Username::parse("alice").unwrap())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_password() {
        let store = store();
        store.register("alice", "correctpw1").await.unwrap();

        let hash = store
            .provider()
            .password_hash(&Username::parse("alice").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(!hash.contains("correctpw1"));
    }

    #[tokio::test]
    async fn test_verify() {
        let store = store();
        store.register("alice", "correctpw1").await.unwrap();

        let user = store.verify("alice", "correctpw1").await.unwrap();
        assert_eq!(user.as_str(), "alice");

        let err = store.verify("alice", "wrong").await.unwrap_err();
        assert!(matches!(err, AccountError::Unauthorized(_)));

        let err = store.verify("mallory", "correctpw1").await.unwrap_err();
        assert!(matches!(err, AccountError::NotFound(_)));

        let err = store.verify("not a user", "correctpw1").await.unwrap_err();
        assert!(matches!(err, AccountError::NotFound(_)));
    }
}
