//! On-disk application state: the stash directory and its config.
//!
//! Layout of the stash directory (default `~/.stash`):
//!
//! ```text
//! config.toml   AppConfig
//! db.sqlite     accounts + file catalog
//! session.key   hex encoded session signing secret
//! blobs/        file contents, one subdirectory per owner
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use common::account::HashParams;
pub use common::blobs_store::BlobStoreConfig;

use crate::service_config::{
    Config as ServiceConfig, SessionSecret, DEFAULT_MAX_CREDENTIAL_BODY, DEFAULT_MAX_UPLOAD_SIZE,
};

pub const APP_NAME: &str = "stash";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DB_FILE_NAME: &str = "db.sqlite";
pub const KEY_FILE_NAME: &str = "session.key";
pub const BLOBS_DIR_NAME: &str = "blobs";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address the daemon listens on
    pub listen_addr: String,
    /// Default log level when `RUST_LOG` is not set
    pub log_level: String,
    pub session_ttl_secs: i64,
    pub max_upload_size: u64,
    pub max_credential_body: usize,
    /// Where blobs live; defaults to `<stash dir>/blobs`
    pub blob_store: Option<BlobStoreConfig>,
    pub password_hash: HashParams,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:5080".to_string(),
            log_level: "info".to_string(),
            session_ttl_secs: common::session::DEFAULT_SESSION_TTL_SECS,
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            max_credential_body: DEFAULT_MAX_CREDENTIAL_BODY,
            blob_store: None,
            password_hash: HashParams::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub stash_dir: PathBuf,
    pub config_path: PathBuf,
    pub db_path: PathBuf,
    pub key_path: PathBuf,
    pub blobs_path: PathBuf,
    pub config: AppConfig,
}

impl AppState {
    /// Resolve the stash directory: an explicit path, or `~/.stash`.
    pub fn stash_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        match custom_path {
            Some(path) => Ok(path),
            None => dirs::home_dir()
                .map(|home| home.join(format!(".{APP_NAME}")))
                .ok_or(StateError::NoHomeDirectory),
        }
    }

    fn at(stash_dir: PathBuf, config: AppConfig) -> Self {
        Self {
            config_path: stash_dir.join(CONFIG_FILE_NAME),
            db_path: stash_dir.join(DB_FILE_NAME),
            key_path: stash_dir.join(KEY_FILE_NAME),
            blobs_path: stash_dir.join(BLOBS_DIR_NAME),
            stash_dir,
            config,
        }
    }

    /// Create a fresh stash directory with config, empty database, blobs
    /// directory and a newly generated session secret.
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let stash_dir = Self::stash_dir(custom_path)?;
        let state = Self::at(stash_dir, config.unwrap_or_default());

        if state.config_path.exists() {
            return Err(StateError::AlreadyInitialized(state.stash_dir));
        }

        std::fs::create_dir_all(&state.stash_dir)?;
        std::fs::create_dir_all(&state.blobs_path)?;

        let config_toml = toml::to_string_pretty(&state.config)?;
        std::fs::write(&state.config_path, config_toml)?;

        if !state.db_path.exists() {
            std::fs::File::create(&state.db_path)?;
        }

        std::fs::write(&state.key_path, SessionSecret::generate().to_hex())?;
        restrict_permissions(&state.key_path)?;

        tracing::info!(dir = %state.stash_dir.display(), "initialized stash directory");
        Ok(state)
    }

    /// Load an existing stash directory.
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let stash_dir = Self::stash_dir(custom_path)?;
        let config_path = stash_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Err(StateError::NotInitialized(stash_dir));
        }

        let raw = std::fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&raw)?;

        Ok(Self::at(stash_dir, config))
    }

    /// Read the session secret from `session.key`.
    pub fn load_session_secret(&self) -> Result<SessionSecret, StateError> {
        let raw = std::fs::read_to_string(&self.key_path)?;
        let secret = SessionSecret::from_hex(&raw)?;
        if secret.as_bytes().is_empty() {
            return Err(StateError::EmptySessionSecret);
        }
        Ok(secret)
    }

    pub fn blob_store_config(&self) -> BlobStoreConfig {
        self.config
            .blob_store
            .clone()
            .unwrap_or_else(|| BlobStoreConfig::Local {
                path: self.blobs_path.clone(),
            })
    }

    /// Build the service configuration for this stash directory.
    pub fn service_config(&self, session_secret: SessionSecret) -> Result<ServiceConfig, StateError> {
        let listen_addr: SocketAddr = self
            .config
            .listen_addr
            .parse()
            .map_err(|_| StateError::InvalidConfig(format!(
                "listen_addr is not a socket address: {}",
                self.config.listen_addr
            )))?;
        let log_level = self.config.log_level.parse().map_err(|_| {
            StateError::InvalidConfig(format!("unknown log level: {}", self.config.log_level))
        })?;
        if self.config.session_ttl_secs <= 0 {
            return Err(StateError::InvalidConfig(
                "session_ttl_secs must be positive".to_string(),
            ));
        }

        Ok(ServiceConfig {
            listen_addr,
            sqlite_path: Some(self.db_path.clone()),
            blob_store: self.blob_store_config(),
            session_secret,
            session_ttl: chrono::Duration::seconds(self.config.session_ttl_secs),
            hash_params: self.config.password_hash,
            max_upload_size: self.config.max_upload_size,
            max_credential_body: self.config.max_credential_body,
            log_level,
        })
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &std::path::Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &std::path::Path) -> std::io::Result<()> {
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("could not determine home directory")]
    NoHomeDirectory,
    #[error("stash is already initialized at {0}")]
    AlreadyInitialized(PathBuf),
    #[error("stash is not initialized at {0}; run `stash init` first")]
    NotInitialized(PathBuf),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("session secret is empty")]
    EmptySessionSecret,
    #[error("session secret is not valid hex: {0}")]
    InvalidSessionSecret(#[from] hex::FromHexError),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to write config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_then_load() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let dir = temp_dir.path().join("stash");

        let created = AppState::init(Some(dir.clone()), None).unwrap();
        assert!(created.config_path.exists());
        assert!(created.db_path.exists());
        assert!(created.blobs_path.is_dir());

        let loaded = AppState::load(Some(dir.clone())).unwrap();
        assert_eq!(loaded.config, AppConfig::default());

        let secret = loaded.load_session_secret().unwrap();
        assert_eq!(secret.as_bytes().len(), SessionSecret::LEN);

        assert!(matches!(
            AppState::init(Some(dir), None),
            Err(StateError::AlreadyInitialized(_))
        ));
    }

    #[test]
    fn test_load_uninitialized() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            AppState::load(Some(temp_dir.path().join("missing"))),
            Err(StateError::NotInitialized(_))
        ));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = toml::from_str("listen_addr = \"0.0.0.0:9000\"\n").unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.max_upload_size, DEFAULT_MAX_UPLOAD_SIZE);
        assert!(config.blob_store.is_none());
    }

    #[test]
    fn test_service_config_defaults_to_local_blobs() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let state = AppState::init(Some(temp_dir.path().to_path_buf()), None).unwrap();

        let config = state.service_config(SessionSecret::generate()).unwrap();
        assert_eq!(
            config.blob_store,
            BlobStoreConfig::Local {
                path: state.blobs_path.clone()
            }
        );
        assert_eq!(config.sqlite_path.as_deref(), Some(state.db_path.as_path()));
    }
}
