use std::fmt;

use clap::Args;
use owo_colors::OwoColorize;

use stash_daemon::http_server::api::auth::{Credentials, RegisterRequest};
use stash_daemon::http_server::api::client::ClientError;

use super::password_or_prompt;

#[derive(Args, Debug, Clone)]
pub struct Register {
    /// 3-20 ASCII letters or digits
    pub username: String,

    /// Prompted for on stdin when omitted
    #[arg(long, env = "STASH_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Debug)]
pub struct RegisterOutput {
    pub username: String,
}

impl fmt::Display for RegisterOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} account {}",
            "Registered".green().bold(),
            self.username.bold()
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("API error: {0}")]
    Api(#[from] ClientError),
    #[error("failed to read password: {0}")]
    Prompt(#[from] std::io::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Register {
    type Error = RegisterError;
    type Output = RegisterOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let password = password_or_prompt(self.password.as_deref()).await?;

        ctx.client
            .call(RegisterRequest(Credentials {
                username: self.username.clone(),
                password,
            }))
            .await?;

        Ok(RegisterOutput {
            username: self.username.clone(),
        })
    }
}
