use std::fmt;

use clap::Args;

use stash_daemon::{AppState, ProcessError, SessionSecret, StateError};

/// Run the stash server in the foreground until ctrl-c.
#[derive(Args, Debug, Clone)]
pub struct Daemon {
    /// Override the configured listen address
    #[arg(long)]
    pub listen_addr: Option<String>,

    /// Hex encoded session secret; overrides the key file
    #[arg(long, env = "STASH_SESSION_SECRET", hide_env_values = true)]
    pub session_secret: Option<String>,
}

#[derive(Debug)]
pub struct DaemonOutput;

impl fmt::Display for DaemonOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "daemon stopped")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("STASH_SESSION_SECRET is not valid hex: {0}")]
    InvalidSecret(#[from] hex::FromHexError),
    #[error("session secret must not be empty")]
    EmptySecret,
    #[error(transparent)]
    Process(#[from] ProcessError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Daemon {
    type Error = DaemonError;
    type Output = DaemonOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut state = AppState::load(ctx.config_path.clone())?;
        if let Some(addr) = &self.listen_addr {
            state.config.listen_addr = addr.clone();
        }

        let secret = match &self.session_secret {
            Some(hex) => SessionSecret::from_hex(hex)?,
            None => state.load_session_secret()?,
        };
        if secret.as_bytes().is_empty() {
            return Err(DaemonError::EmptySecret);
        }

        let config = state.service_config(secret)?;
        let _guard = stash_daemon::init_tracing(config.log_level);
        tracing::info!(dir = %state.stash_dir.display(), "starting stash daemon");

        stash_daemon::spawn_service(&config).await?;
        Ok(DaemonOutput)
    }
}
