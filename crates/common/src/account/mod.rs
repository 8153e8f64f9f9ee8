mod credentials;
pub mod memory;
mod provider;

pub use credentials::{CredentialStore, HashParams, HashParamsError, PasswordHasher};
pub use memory::{MemoryAccountProvider, MemoryAccountProviderError};
pub use provider::{AccountError, AccountProvider};
