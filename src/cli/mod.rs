pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "vote-api")]
#[command(about = "Vote API - records ballots and notifies webhooks")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server")]
    Serve(commands::serve::ServeArgs),

    #[command(about = "Create the votes table if it does not exist")]
    Migrate,

    #[command(about = "Print a signed session token")]
    Token(commands::token::TokenArgs),
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = crate::config::config().clone();

    match cli.command {
        Commands::Serve(args) => commands::serve::handle(args, config).await,
        Commands::Migrate => commands::migrate::handle(config).await,
        Commands::Token(args) => commands::token::handle(args, config),
    }
}
