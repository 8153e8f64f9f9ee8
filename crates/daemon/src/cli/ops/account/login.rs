use std::fmt;

use clap::Args;
use owo_colors::OwoColorize;

use stash_daemon::http_server::api::auth::{Credentials, LoginRequest};
use stash_daemon::http_server::api::client::ClientError;

use super::password_or_prompt;

/// Log in and print a session token
#[derive(Args, Debug, Clone)]
pub struct Login {
    pub username: String,

    /// Prompted for on stdin when omitted
    #[arg(long, env = "STASH_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Print only the token, for `export STASH_TOKEN=$(...)`
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Debug)]
pub struct LoginOutput {
    pub username: String,
    pub token: String,
    pub quiet: bool,
}

impl fmt::Display for LoginOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quiet {
            return write!(f, "{}", self.token);
        }
        writeln!(
            f,
            "{} as {}",
            "Logged in".green().bold(),
            self.username.bold()
        )?;
        writeln!(f, "  {} {}", "Token:".dimmed(), self.token)?;
        write!(
            f,
            "  {} export STASH_TOKEN=<token>",
            "Use with:".dimmed()
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("API error: {0}")]
    Api(#[from] ClientError),
    #[error("failed to read password: {0}")]
    Prompt(#[from] std::io::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Login {
    type Error = LoginError;
    type Output = LoginOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let password = password_or_prompt(self.password.as_deref()).await?;

        let response = ctx
            .client
            .call(LoginRequest(Credentials {
                username: self.username.clone(),
                password,
            }))
            .await?;

        Ok(LoginOutput {
            username: self.username.clone(),
            token: response.token,
            quiet: self.quiet,
        })
    }
}
