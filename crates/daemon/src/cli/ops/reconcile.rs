use std::fmt;
use std::time::Duration;

use clap::Args;
use owo_colors::OwoColorize;

use common::files::{FileError, ReconcileOptions, ReconcileReport};
use stash_daemon::{AppState, ServiceState, SessionSecret, StateError, StateSetupError};

/// Check the catalog against the blob store, optionally repairing.
///
/// Opens the stash directory directly rather than going through the daemon.
#[derive(Args, Debug, Clone)]
pub struct Reconcile {
    /// Delete broken descriptors and orphan blobs
    #[arg(long)]
    pub repair: bool,

    /// Leave files registered within this many seconds alone
    #[arg(long, default_value_t = 900)]
    pub grace_secs: u64,
}

#[derive(Debug)]
pub struct ReconcileOutput {
    pub report: ReconcileReport,
    pub repair: bool,
}

impl fmt::Display for ReconcileOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = &self.report;
        writeln!(
            f,
            "{} {} files ({} in flight skipped)",
            "Checked".bold(),
            report.checked,
            report.skipped_in_flight
        )?;

        if report.is_clean() {
            return write!(f, "{}", "No anomalies found".green());
        }

        for anomaly in &report.anomalies {
            writeln!(f, "  {} {}", "-".yellow(), anomaly)?;
        }
        for error in &report.errors {
            writeln!(f, "  {} {}", "repair failed:".red(), error)?;
        }

        if self.repair {
            write!(
                f,
                "{} {} of {} anomalies",
                "Repaired".green().bold(),
                report.repaired,
                report.anomalies.len()
            )
        } else {
            write!(
                f,
                "{} anomalies found; rerun with --repair to fix",
                report.anomalies.len().to_string().yellow()
            )
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Setup(#[from] StateSetupError),
    #[error("reconciliation failed: {0}")]
    Failed(#[from] FileError<sqlx::Error>),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Reconcile {
    type Error = ReconcileError;
    type Output = ReconcileOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let app_state = AppState::load(ctx.config_path.clone())?;
        // no tokens are issued here, any secret will do
        let config = app_state.service_config(SessionSecret::generate())?;
        let state = ServiceState::from_config(&config).await?;

        let report = state
            .files()
            .reconcile(ReconcileOptions {
                repair: self.repair,
                grace: Duration::from_secs(self.grace_secs),
            })
            .await?;

        Ok(ReconcileOutput {
            report,
            repair: self.repair,
        })
    }
}
