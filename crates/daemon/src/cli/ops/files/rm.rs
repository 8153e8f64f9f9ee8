use std::fmt;

use clap::Args;
use owo_colors::OwoColorize;

use stash_daemon::http_server::api::client::ClientError;
use stash_daemon::http_server::api::files::DeleteFileRequest;

#[derive(Args, Debug, Clone)]
pub struct Rm {
    pub filename: String,
}

#[derive(Debug)]
pub struct RmOutput {
    pub filename: String,
}

impl fmt::Display for RmOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", "Deleted".green().bold(), self.filename.bold())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RmError {
    #[error("API error: {0}")]
    Api(#[from] ClientError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Rm {
    type Error = RmError;
    type Output = RmOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        ctx.client
            .call(DeleteFileRequest {
                filename: self.filename.clone(),
            })
            .await?;
        Ok(RmOutput {
            filename: self.filename.clone(),
        })
    }
}
