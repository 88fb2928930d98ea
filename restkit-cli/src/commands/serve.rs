//! HTTP server command
//!
//! Runs the restkit API server until Ctrl+C or SIGTERM, then closes the pool.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use restkit_server::{run_server, AppState, Database, ServerConfig};

use crate::config::DatabaseArgs;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Interface to listen on
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, short = 'p', env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    #[command(flatten)]
    pub db: DatabaseArgs,
}

impl ServeArgs {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind_addr: SocketAddr::new(self.host, self.port),
            cors_permissive: self.cors_permissive,
        }
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = args.server_config();
    tracing::info!("Starting restkit server on {}", config.bind_addr);

    // Never fails: an unreachable database is logged and boot continues
    let db = Database::initialize(&args.db.to_config()).await;
    let state = AppState::new(Arc::new(db.clone()));

    // Run server (blocks until shutdown)
    let served = run_server(state, config).await.context("Server error");

    db.shutdown().await;
    served
}
