use std::fmt;
use std::path::PathBuf;

use bytes::Bytes;
use clap::Args;
use owo_colors::OwoColorize;

use stash_daemon::http_server::api::client::ClientError;
use stash_daemon::http_server::api::files::{PutFileRequest, PutFileResponse};

#[derive(Args, Debug, Clone)]
pub struct Put {
    /// Local file to upload
    pub path: PathBuf,

    /// Name to store it under (defaults to the local file name)
    #[arg(long)]
    pub name: Option<String>,

    /// Content type (guessed from the extension when omitted)
    #[arg(long)]
    pub content_type: Option<String>,
}

#[derive(Debug)]
pub struct PutOutput {
    pub file: PutFileResponse,
}

impl fmt::Display for PutOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}, {} bytes)",
            "Uploaded".green().bold(),
            self.file.filename.bold(),
            self.file.content_type,
            self.file.content_length
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PutError {
    #[error("API error: {0}")]
    Api(#[from] ClientError),
    #[error("failed to read {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("cannot derive a file name from {0}; pass --name")]
    NoName(PathBuf),
}

impl Put {
    fn filename(&self) -> Result<String, PutError> {
        if let Some(name) = &self.name {
            return Ok(name.clone());
        }
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(|| PutError::NoName(self.path.clone()))
    }

    fn content_type(&self, filename: &str) -> String {
        self.content_type.clone().unwrap_or_else(|| {
            mime_guess::from_path(filename)
                .first_or_octet_stream()
                .to_string()
        })
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Put {
    type Error = PutError;
    type Output = PutOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let filename = self.filename()?;
        let content_type = self.content_type(&filename);
        let data = tokio::fs::read(&self.path)
            .await
            .map_err(|e| PutError::Read(self.path.clone(), e))?;

        let file = ctx
            .client
            .call(PutFileRequest {
                filename,
                content_type: Some(content_type),
                data: Bytes::from(data),
            })
            .await?;

        Ok(PutOutput { file })
    }
}
