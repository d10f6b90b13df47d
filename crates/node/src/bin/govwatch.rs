// Path: crates/node/src/bin/govwatch.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

use anyhow::{Context, Result};
use clap::Parser;
use govwatch_node::{build_engine, run};
use govwatch_telemetry::init::{init_tracing, LogFormat};
use govwatch_types::config::WatchConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::sync::watch;

/// Alerts when monitored validators have not voted on governance proposals
/// that are about to close.
#[derive(Parser, Debug)]
#[clap(name = "govwatch", version)]
struct WatchOpts {
    #[clap(long, default_value = "govwatch.toml")]
    config: PathBuf,
    /// Run a single poll cycle and exit.
    #[clap(long)]
    once: bool,
    /// Log alerts instead of delivering them.
    #[clap(long)]
    dry_run: bool,
    #[clap(
        long,
        env = "GOVWATCH_TELEMETRY_ADDR",
        help = "Serve /metrics, /healthz and /readyz on this address"
    )]
    telemetry_addr: Option<SocketAddr>,
    #[clap(long, default_value = "json", help = "json | plain")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let opts = WatchOpts::parse();
    init_tracing(opts.log_format)?;

    let config = WatchConfig::load(&opts.config)
        .with_context(|| format!("failed to load config from {}", opts.config.display()))?;
    tracing::info!(
        target: "node",
        event = "startup",
        config = %opts.config.display(),
        poll_interval_secs = config.poll_interval_secs,
        chains = config.chains.len(),
        dry_run = opts.dry_run,
        "Starting governance vote watcher"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    if let Some(addr) = opts.telemetry_addr {
        govwatch_telemetry::prometheus::install()?;
        tokio::spawn(govwatch_telemetry::http::run_server(
            addr,
            shutdown_rx.clone(),
        ));
    }

    let engine = build_engine(&config, opts.dry_run)?;

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(target: "node", error = %e, "Failed to listen for CTRL-C");
            std::future::pending::<()>().await;
        }
        tracing::info!(target: "node", "Shutdown requested");
        let _ = shutdown_tx.send(true);
    });

    run(engine, config.poll_interval(), opts.once, shutdown_rx).await;
    Ok(())
}
