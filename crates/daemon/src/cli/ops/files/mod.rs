use clap::Args;

pub mod get;
pub mod ls;
pub mod put;
pub mod rm;

use crate::cli::op::Op;

crate::command_enum! {
    (Put, put::Put),
    (Get, get::Get),
    (Ls, ls::Ls),
    (Rm, rm::Rm),
}

pub type FilesCommand = Command;

/// Upload, download, list and delete your files
#[derive(Args, Debug, Clone)]
pub struct Files {
    #[command(subcommand)]
    pub command: FilesCommand,
}

#[async_trait::async_trait]
impl Op for Files {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}
