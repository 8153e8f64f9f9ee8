use std::fmt;
use std::path::PathBuf;

use clap::Args;
use owo_colors::OwoColorize;

use stash_daemon::state::{AppConfig, AppState, BlobStoreConfig};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Address the daemon listens on
    #[arg(long, default_value = "127.0.0.1:5080")]
    pub listen_addr: String,

    /// Store blobs outside the stash directory
    /// Must be an absolute path
    #[arg(long)]
    pub blobs_path: Option<PathBuf>,

    /// Largest accepted upload in bytes
    #[arg(long)]
    pub max_upload_size: Option<u64>,
}

#[derive(Debug)]
pub struct InitOutput {
    pub stash_dir: PathBuf,
    pub db_path: PathBuf,
    pub key_path: PathBuf,
    pub config_path: PathBuf,
    pub listen_addr: String,
    pub blob_store: String,
}

impl fmt::Display for InitOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} stash at {}",
            "Initialized".green().bold(),
            self.stash_dir.display().to_string().bold()
        )?;
        writeln!(f, "  {} {}", "Database:".dimmed(), self.db_path.display())?;
        writeln!(f, "  {} {}", "Key:".dimmed(), self.key_path.display())?;
        writeln!(f, "  {} {}", "Config:".dimmed(), self.config_path.display())?;
        writeln!(f, "  {} {}", "Listen:".dimmed(), self.listen_addr)?;
        write!(f, "  {} {}", "Blob store:".dimmed(), self.blob_store)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] stash_daemon::state::StateError),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("invalid listen address: {0}")]
    InvalidListenAddr(String),
}

impl Init {
    fn build_config(&self) -> Result<AppConfig, InitError> {
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(InitError::InvalidListenAddr(self.listen_addr.clone()));
        }

        let blob_store = match &self.blobs_path {
            Some(path) if !path.is_absolute() => {
                return Err(InitError::InvalidPath(
                    "--blobs-path must be an absolute path".to_string(),
                ));
            }
            Some(path) => Some(BlobStoreConfig::Local { path: path.clone() }),
            None => None,
        };

        let defaults = AppConfig::default();
        Ok(AppConfig {
            listen_addr: self.listen_addr.clone(),
            max_upload_size: self.max_upload_size.unwrap_or(defaults.max_upload_size),
            blob_store,
            ..defaults
        })
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = InitOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = self.build_config()?;
        let state = AppState::init(ctx.config_path.clone(), Some(config))?;

        let blob_store = match state.blob_store_config() {
            BlobStoreConfig::Local { path } => format!("local ({})", path.display()),
            BlobStoreConfig::Memory => "memory (not persisted)".to_string(),
        };

        Ok(InitOutput {
            stash_dir: state.stash_dir,
            db_path: state.db_path,
            key_path: state.key_path,
            config_path: state.config_path,
            listen_addr: state.config.listen_addr,
            blob_store,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() -> Init {
        Init {
            listen_addr: "127.0.0.1:5080".to_string(),
            blobs_path: None,
            max_upload_size: None,
        }
    }

    #[test]
    fn test_relative_blobs_path_rejected() {
        let op = Init {
            blobs_path: Some(PathBuf::from("relative/blobs")),
            ..init()
        };
        assert!(matches!(op.build_config(), Err(InitError::InvalidPath(_))));
    }

    #[test]
    fn test_bad_listen_addr_rejected() {
        let op = Init {
            listen_addr: "not-an-address".to_string(),
            ..init()
        };
        assert!(matches!(
            op.build_config(),
            Err(InitError::InvalidListenAddr(_))
        ));
    }

    #[test]
    fn test_overrides_apply() {
        let op = Init {
            blobs_path: Some(PathBuf::from("/srv/stash/blobs")),
            max_upload_size: Some(1024),
            ..init()
        };
        let config = op.build_config().unwrap();
        assert_eq!(config.max_upload_size, 1024);
        assert_eq!(
            config.blob_store,
            Some(BlobStoreConfig::Local {
                path: PathBuf::from("/srv/stash/blobs")
            })
        );
    }
}
