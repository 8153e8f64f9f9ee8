//! In-memory account provider, for tests and ephemeral setups.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::provider::{AccountError, AccountProvider};
use crate::validation::Username;

#[derive(Debug, thiserror::Error)]
pub enum MemoryAccountProviderError {
    #[error("account table lock poisoned")]
    Poisoned,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryAccountProvider {
    accounts: Arc<Mutex<HashMap<Username, String>>>,
}

impl MemoryAccountProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<
        std::sync::MutexGuard<'_, HashMap<Username, String>>,
        AccountError<MemoryAccountProviderError>,
    > {
        self.accounts
            .lock()
            .map_err(|_| AccountError::Provider(MemoryAccountProviderError::Poisoned))
    }
}

#[async_trait]
impl AccountProvider for MemoryAccountProvider {
    type Error = MemoryAccountProviderError;

    async fn account_exists(&self, username: &Username) -> Result<bool, AccountError<Self::Error>> {
        Ok(self.lock()?.contains_key(username))
    }

    async fn insert_account(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<(), AccountError<Self::Error>> {
        let mut accounts = self.lock()?;
        if accounts.contains_key(username) {
            return Err(AccountError::Conflict(username.clone()));
        }
        accounts.insert(username.clone(), password_hash.to_string());
        Ok(())
    }

    async fn password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<String>, AccountError<Self::Error>> {
        Ok(self.lock()?.get(username).cloned())
    }
}
