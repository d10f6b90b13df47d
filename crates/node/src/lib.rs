// Path: crates/node/src/lib.rs
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

//! Wiring for the `govwatch` daemon: builds the alert engine from a
//! `WatchConfig` and drives it on a fixed poll interval.

use anyhow::Result;
use govwatch_alerting::{
    provider_from_config, AlertEngine, AlertSink, AlertStore, EngineDependencies, LogSink,
    SlackSink, StoreError, SystemClock,
};
use govwatch_lcd::LcdClient;
use govwatch_telemetry::http::mark_ready;
use govwatch_types::config::WatchConfig;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// Opens the dedup store. A corrupt state file is logged and replaced on the
/// next persist; an unreadable one is an error.
pub fn open_store(path: Option<&Path>) -> Result<AlertStore, StoreError> {
    let Some(path) = path else {
        return Ok(AlertStore::in_memory());
    };
    match AlertStore::open(path) {
        Ok(store) => {
            tracing::info!(target: "node", path = %path.display(), entries = store.len(), "Loaded alert state");
            Ok(store)
        }
        Err(e @ StoreError::Corrupt { .. }) => {
            tracing::warn!(target: "node", error = %e, "Discarding corrupt alert state");
            Ok(AlertStore::fresh(path))
        }
        Err(e) => Err(e),
    }
}

/// Picks the delivery sink: Slack when configured, the log otherwise.
pub fn build_sink(config: &WatchConfig, dry_run: bool) -> Result<Arc<dyn AlertSink>> {
    if dry_run {
        tracing::info!(target: "node", "Dry run: alerts will be logged, not delivered");
        return Ok(Arc::new(LogSink));
    }
    match &config.slack {
        Some(slack) => Ok(Arc::new(SlackSink::new(slack, config.request_timeout())?)),
        None => {
            tracing::warn!(target: "node", "No [slack] section configured; alerts will only be logged");
            Ok(Arc::new(LogSink))
        }
    }
}

pub fn build_engine(config: &WatchConfig, dry_run: bool) -> Result<AlertEngine> {
    let deps = EngineDependencies {
        provider: provider_from_config(config),
        lcd: Arc::new(LcdClient::from_config(config)?),
        sink: build_sink(config, dry_run)?,
        store: open_store(config.state_path.as_deref())?,
        clock: Arc::new(SystemClock),
    };
    Ok(AlertEngine::new(deps, config))
}

/// Runs poll cycles every `poll_interval` until shutdown is requested, or
/// once when `once` is set. Returns the number of cycles executed.
pub async fn run(
    engine: AlertEngine,
    poll_interval: Duration,
    once: bool,
    mut shutdown: watch::Receiver<bool>,
) -> u64 {
    let mut interval = tokio::time::interval(poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut cycles = 0u64;

    loop {
        tokio::select! {
            biased;
            _ = shutdown_requested(&mut shutdown) => break,
            _ = interval.tick() => {}
        }
        engine.run_cycle(shutdown.clone()).await;
        cycles += 1;
        if cycles == 1 {
            mark_ready();
        }
        if once || *shutdown.borrow() {
            break;
        }
    }

    if let Err(e) = engine.persist().await {
        tracing::error!(target: "node", error = %e, "Failed to persist alert state on exit");
    }
    tracing::info!(target: "node", event = "shutdown", cycles, "Poll loop stopped");
    cycles
}

/// Resolves once shutdown is requested or the sender is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
