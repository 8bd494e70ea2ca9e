use clap::Parser;
use oauth_client_cache::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Keys(args) => cli::keys::run(args).await,
        Command::Find(args) => cli::find::run(args).await,
        Command::Flush => cli::flush::run().await,
    }
}
