use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use common::account::HashParams;
use common::blobs_store::BlobStoreConfig;

/// Default cap on `/register` and `/login` bodies: 1 MiB.
pub const DEFAULT_MAX_CREDENTIAL_BODY: usize = 1024 * 1024;
/// Default cap on uploads: 64 MiB.
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 64 * 1024 * 1024;

/// HMAC key used to sign session tokens.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionSecret(Vec<u8>);

impl SessionSecret {
    pub const LEN: usize = 32;

    /// Fresh random secret.
    pub fn generate() -> Self {
        Self(rand::random::<[u8; Self::LEN]>().to_vec())
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn from_hex(encoded: &str) -> Result<Self, hex::FromHexError> {
        Ok(Self(hex::decode(encoded.trim())?))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionSecret(<redacted>)")
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to
    pub listen_addr: SocketAddr,
    /// SQLite file; `None` runs against an in-memory database
    pub sqlite_path: Option<PathBuf>,
    pub blob_store: BlobStoreConfig,
    pub session_secret: SessionSecret,
    pub session_ttl: chrono::Duration,
    pub hash_params: HashParams,
    pub max_upload_size: u64,
    pub max_credential_body: usize,
    pub log_level: tracing::Level,
}

impl Config {
    /// Everything in memory, for tests and throwaway servers.
    pub fn ephemeral() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            sqlite_path: None,
            blob_store: BlobStoreConfig::Memory,
            session_secret: SessionSecret::generate(),
            session_ttl: chrono::Duration::seconds(common::session::DEFAULT_SESSION_TTL_SECS),
            hash_params: HashParams::default(),
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            max_credential_body: DEFAULT_MAX_CREDENTIAL_BODY,
            log_level: tracing::Level::INFO,
        }
    }
}
