use std::path::PathBuf;

use clap::Parser;
use url::Url;

use super::ops::Command;

#[derive(Parser, Debug)]
#[command(name = "stash", version, about = "Authenticated per-user file storage")]
pub struct Args {
    /// Stash directory holding config, database and blobs (default: ~/.stash)
    #[arg(long, global = true, env = "STASH_DIR")]
    pub config_path: Option<PathBuf>,

    /// Daemon API URL
    #[arg(
        long,
        global = true,
        env = "STASH_REMOTE",
        default_value = "http://localhost:5080"
    )]
    pub remote: Url,

    /// Session token for file commands (see `stash account login`)
    #[arg(long, global = true, env = "STASH_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}
