use std::fmt;
use std::path::PathBuf;

use clap::Args;
use owo_colors::OwoColorize;

use stash_daemon::http_server::api::client::ClientError;

#[derive(Args, Debug, Clone)]
pub struct Get {
    /// Name of the stored file
    pub filename: String,

    /// Where to write it (defaults to the file name in the current directory)
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Debug)]
pub struct GetOutput {
    pub path: PathBuf,
    pub content_type: Option<String>,
    pub size: usize,
}

impl fmt::Display for GetOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({} bytes",
            "Saved".green().bold(),
            self.path.display().to_string().bold(),
            self.size
        )?;
        if let Some(content_type) = &self.content_type {
            write!(f, ", {content_type}")?;
        }
        write!(f, ")")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GetError {
    #[error("API error: {0}")]
    Api(#[from] ClientError),
    #[error("failed to write {0}: {1}")]
    Write(PathBuf, std::io::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Get {
    type Error = GetError;
    type Output = GetOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let download = ctx.client.download(&self.filename).await?;

        let path = self
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.filename));
        tokio::fs::write(&path, &download.data)
            .await
            .map_err(|e| GetError::Write(path.clone(), e))?;

        Ok(GetOutput {
            path,
            content_type: download.content_type,
            size: download.data.len(),
        })
    }
}
