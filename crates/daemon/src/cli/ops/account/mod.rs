use std::io::{BufRead, Write};

use clap::Args;

pub mod login;
pub mod register;

use crate::cli::op::Op;

crate::command_enum! {
    (Register, register::Register),
    (Login, login::Login),
}

pub type AccountCommand = Command;

/// Manage accounts on the daemon
#[derive(Args, Debug, Clone)]
pub struct Account {
    #[command(subcommand)]
    pub command: AccountCommand,
}

#[async_trait::async_trait]
impl Op for Account {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}

/// Use the password given on the command line, or read one line from stdin.
pub(crate) async fn password_or_prompt(password: Option<&str>) -> std::io::Result<String> {
    if let Some(password) = password {
        return Ok(password.to_string());
    }

    tokio::task::spawn_blocking(|| -> std::io::Result<String> {
        eprint!("Password: ");
        std::io::stderr().flush()?;
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    })
    .await
    .map_err(std::io::Error::other)?
}
