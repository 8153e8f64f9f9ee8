use std::fmt;

use clap::Args;
use comfy_table::Table;

use stash_daemon::http_server::api::client::ClientError;
use stash_daemon::http_server::api::files::ListFilesRequest;

#[derive(Args, Debug, Clone)]
pub struct Ls;

#[derive(Debug)]
pub struct LsOutput {
    pub filenames: Vec<String>,
}

impl fmt::Display for LsOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.filenames.is_empty() {
            return write!(f, "No files found");
        }

        let mut table = Table::new();
        table.set_header(vec!["#", "NAME"]);
        for (i, name) in self.filenames.iter().enumerate() {
            table.add_row(vec![(i + 1).to_string(), name.clone()]);
        }
        write!(f, "{table}")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LsError {
    #[error("API error: {0}")]
    Api(#[from] ClientError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Ls {
    type Error = LsError;
    type Output = LsOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let filenames = ctx.client.call(ListFilesRequest {}).await?;
        Ok(LsOutput { filenames })
    }
}
