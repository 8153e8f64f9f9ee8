use clap::Parser;

mod cli;

use cli::op::{Op, OpContext};
use cli::Args;
use stash_daemon::http_server::api::client::ApiClient;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let client = match ApiClient::new(&args.remote) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: failed to build API client: {e}");
            std::process::exit(1);
        }
    };
    let client = match args.token.clone() {
        Some(token) => client.with_token(token),
        None => client,
    };

    let ctx = OpContext {
        client,
        config_path: args.config_path.clone(),
    };

    match args.command.execute(&ctx).await {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
