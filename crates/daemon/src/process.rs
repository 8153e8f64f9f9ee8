use std::future::Future;

use tokio::net::TcpListener;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::http_server;
use crate::service_config::Config;
use crate::service_state::{State, StateSetupError};

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("service setup failed: {0}")]
    Setup(#[from] StateSetupError),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `default_level`. The returned guard flushes the
/// non-blocking writer on drop and must be held for the life of the process.
pub fn init_tracing(default_level: tracing::Level) -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

    // a second install (tests, embedded use) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .try_init();

    guard
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn start_service<F>(
    config: &Config,
    listener: TcpListener,
    shutdown: F,
) -> Result<(), ProcessError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = State::from_config(config).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "stash listening");

    http_server::run(listener, state, shutdown).await?;

    tracing::info!("stash stopped");
    Ok(())
}

/// Bind the configured address and serve until ctrl-c.
pub async fn spawn_service(config: &Config) -> Result<(), ProcessError> {
    let listener = TcpListener::bind(config.listen_addr).await?;
    start_service(config, listener, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        // without a signal handler, run until killed
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
