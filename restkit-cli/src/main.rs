//! restkit CLI - REST API server with a pooled PostgreSQL access layer
//!
//! Subcommands:
//! - `serve`: run the HTTP API until Ctrl+C/SIGTERM
//! - `call`: invoke one stored function and print its rows
//!
//! Database settings come from flags or DB_* variables, optionally loaded
//! from a `.env` file in the working directory.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "restkit",
    author,
    version,
    about = "REST API server backed by PostgreSQL stored functions"
)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Call a stored database function once and print the result as JSON
    Call(commands::call::CallArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before parsing, so DB_* values from .env reach clap's env fallbacks
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug })?;

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await?,
        Commands::Call(args) => commands::run_call(args).await?,
    }
    Ok(())
}
