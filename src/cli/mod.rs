use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::application::LedgerService;
use crate::config::ServerConfig;

const DEFAULT_LOG_FILTER: &str = "paybook=info,tower_http=info";

/// Paybook - entry-based account ledger
#[derive(Parser, Debug)]
#[command(name = "paybook")]
#[command(about = "An account ledger that settles debits by consuming entries oldest first")]
#[command(version)]
pub struct Cli {
    /// Log filter, overrides RUST_LOG (e.g. "paybook=debug")
    #[arg(long, global = true)]
    pub log: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the ledger over HTTP with in-memory storage
    Serve(ServerConfig),
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        init_tracing(self.log.as_deref());

        match self.command {
            Commands::Serve(config) => serve(config).await,
        }
    }
}

fn init_tracing(filter: Option<&str>) {
    let filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
    };

    // A second init (e.g. in tests) is not an error worth surfacing.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

async fn serve(config: ServerConfig) -> Result<()> {
    let addr = config.socket_addr()?;
    let service = LedgerService::in_memory().with_retry_policy(config.retry_policy());
    let app = api::router(Arc::new(service));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until the process is killed.
        std::future::pending::<()>().await;
    }
}
