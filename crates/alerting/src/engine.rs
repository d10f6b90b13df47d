// Path: crates/alerting/src/engine.rs
use crate::clock::Clock;
use crate::message::format_alert;
use crate::policy::{AlertPolicy, Decision};
use crate::provider::ValidatorProvider;
use crate::sink::AlertSink;
use crate::store::{AlertStore, StoreError};
use govwatch_lcd::{operator_to_account, LcdClient};
use govwatch_telemetry::{alert_metrics, cycle_metrics, error_metrics, time::Timer};
use govwatch_types::{
    config::WatchConfig, error::WatchError, AlertKey, ErrorCode, Proposal, Validator, VoteRecord,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tokio::time::Instant;

/// Everything the engine reads from or writes to.
pub struct EngineDependencies {
    pub provider: Arc<dyn ValidatorProvider>,
    pub lcd: Arc<LcdClient>,
    pub sink: Arc<dyn AlertSink>,
    pub store: AlertStore,
    pub clock: Arc<dyn Clock>,
}

/// The outcome of one chain's share of a cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainReport {
    pub chain: String,
    /// No healthy endpoint or no endpoint could list proposals.
    pub skipped: bool,
    /// Shutdown was requested before the chain finished.
    pub cancelled: bool,
    /// Proposals in their voting period.
    pub proposals: usize,
    pub alerts_sent: usize,
    pub alert_failures: usize,
    /// (validator, proposal) pairs that could not be evaluated.
    pub pair_errors: usize,
}

impl ChainReport {
    fn new(chain: &str) -> Self {
        Self {
            chain: chain.to_string(),
            ..Self::default()
        }
    }

    fn cancelled(chain: &str) -> Self {
        Self {
            cancelled: true,
            ..Self::new(chain)
        }
    }
}

/// The outcome of one poll cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub validators: usize,
    /// Per-chain reports, ordered by chain name.
    pub chains: Vec<ChainReport>,
    /// Dedup entries dropped because their voting period ended.
    pub evicted: usize,
    /// The cycle hit its deadline and unfinished chains were aborted.
    pub timed_out: bool,
    /// The validator store could not be read. Nothing else was attempted.
    pub provider_failed: bool,
}

impl CycleReport {
    pub fn alerts_sent(&self) -> usize {
        self.chains.iter().map(|c| c.alerts_sent).sum()
    }

    pub fn alert_failures(&self) -> usize {
        self.chains.iter().map(|c| c.alert_failures).sum()
    }

    pub fn pair_errors(&self) -> usize {
        self.chains.iter().map(|c| c.pair_errors).sum()
    }

    pub fn chains_skipped(&self) -> usize {
        self.chains.iter().filter(|c| c.skipped).count()
    }

    pub fn chains_cancelled(&self) -> usize {
        self.chains.iter().filter(|c| c.cancelled).count()
    }

    /// Label for the `govwatch_cycles_total` counter.
    pub fn outcome(&self) -> &'static str {
        if self.provider_failed {
            "provider_failed"
        } else if self.timed_out {
            "timed_out"
        } else if self.chains_cancelled() > 0 {
            "aborted"
        } else {
            "completed"
        }
    }
}

/// Runs poll cycles: one task per chain, bounded by a semaphore, each walking
/// every (validator, active proposal) pair of its chain.
///
/// A dedup key always contains its chain, and each chain is handled by exactly
/// one task per cycle, so two tasks never race on the same key.
#[derive(Clone)]
pub struct AlertEngine {
    provider: Arc<dyn ValidatorProvider>,
    lcd: Arc<LcdClient>,
    sink: Arc<dyn AlertSink>,
    store: Arc<Mutex<AlertStore>>,
    clock: Arc<dyn Clock>,
    policy: AlertPolicy,
    max_concurrent_chains: usize,
    cycle_timeout: Duration,
}

impl AlertEngine {
    pub fn new(deps: EngineDependencies, config: &WatchConfig) -> Self {
        Self {
            provider: deps.provider,
            lcd: deps.lcd,
            sink: deps.sink,
            store: Arc::new(Mutex::new(deps.store)),
            clock: deps.clock,
            policy: AlertPolicy::new(config.alert_window()),
            max_concurrent_chains: config.max_concurrent_chains.max(1),
            cycle_timeout: config.cycle_timeout(),
        }
    }

    /// Shared handle to the dedup store.
    pub fn store(&self) -> Arc<Mutex<AlertStore>> {
        self.store.clone()
    }

    /// Flushes the dedup store to disk if it is file-backed and has changed.
    /// The snapshot is taken under the lock and written on the blocking pool.
    pub async fn persist(&self) -> Result<(), StoreError> {
        let Some(pending) = self.store.lock().snapshot()? else {
            return Ok(());
        };
        let generation = pending.generation();
        let path = pending.path().to_path_buf();
        tokio::task::spawn_blocking(move || pending.write())
            .await
            .map_err(|e| StoreError::Io {
                path,
                source: std::io::Error::other(e),
            })??;
        self.store.lock().mark_persisted(generation);
        Ok(())
    }

    /// Executes one full poll cycle.
    ///
    /// Chains still running when `shutdown` flips to `true` are cancelled.
    /// Chains still running when the cycle timeout elapses are aborted.
    pub async fn run_cycle(&self, shutdown: watch::Receiver<bool>) -> CycleReport {
        let _timer = Timer::new(cycle_metrics());
        // An unrepresentable deadline means the cycle is unbounded.
        let deadline = Instant::now().checked_add(self.cycle_timeout);
        let mut report = CycleReport::default();

        let validators = match self.provider.get_monitored_validators().await {
            Ok(validators) => validators,
            Err(e) => {
                let err = WatchError::from(e);
                tracing::error!(target: "engine", error = %err, code = err.code(), "Failed to load monitored validators");
                record_error(&err);
                report.provider_failed = true;
                cycle_metrics().inc_cycles_total(report.outcome());
                return report;
            }
        };
        report.validators = validators.len();
        let by_chain = group_by_chain(validators);
        tracing::debug!(
            target: "engine",
            validators = report.validators,
            chains = by_chain.len(),
            "Starting poll cycle"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_chains));
        let mut tasks = JoinSet::new();
        for (chain, validators) in by_chain {
            let engine = self.clone();
            let semaphore = semaphore.clone();
            let mut shutdown = shutdown.clone();
            tasks.spawn(async move {
                tokio::select! {
                    biased;
                    _ = wait_for_shutdown(&mut shutdown) => ChainReport::cancelled(&chain),
                    report = async {
                        // The semaphore is never closed.
                        let _permit = semaphore.acquire().await.ok();
                        engine.process_chain(&chain, &validators).await
                    } => report,
                }
            });
        }

        loop {
            let next = match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, tasks.join_next()).await,
                None => Ok(tasks.join_next().await),
            };
            match next {
                Ok(Some(Ok(chain_report))) => report.chains.push(chain_report),
                Ok(Some(Err(e))) => {
                    tracing::error!(target: "engine", error = %e, "Chain task failed");
                }
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        target: "engine",
                        timeout_secs = self.cycle_timeout.as_secs(),
                        unfinished = tasks.len(),
                        "Poll cycle timed out; aborting unfinished chains"
                    );
                    tasks.abort_all();
                    report.timed_out = true;
                    break;
                }
            }
        }
        report.chains.sort_by(|a, b| a.chain.cmp(&b.chain));

        report.evicted = self.housekeep().await;
        cycle_metrics().inc_cycles_total(report.outcome());
        tracing::info!(
            target: "engine",
            outcome = report.outcome(),
            chains = report.chains.len(),
            skipped = report.chains_skipped(),
            alerts_sent = report.alerts_sent(),
            alert_failures = report.alert_failures(),
            pair_errors = report.pair_errors(),
            evicted = report.evicted,
            "Poll cycle finished"
        );
        report
    }

    /// Evicts dedup entries whose voting period has ended and flushes the store.
    async fn housekeep(&self) -> usize {
        let now = self.clock.now();
        let evicted = {
            let mut store = self.store.lock();
            let evicted = store.evict_expired(now);
            alert_metrics().set_tracked_alert_keys(store.len());
            evicted
        };
        if evicted > 0 {
            alert_metrics().inc_alert_keys_evicted(evicted as u64);
        }
        if let Err(e) = self.persist().await {
            tracing::error!(target: "engine", error = %e, code = e.code(), "Failed to persist alert store");
            error_metrics().inc_error("store", e.code());
        }
        evicted
    }

    async fn process_chain(&self, chain: &str, validators: &[Validator]) -> ChainReport {
        let mut report = ChainReport::new(chain);

        let endpoints = self.lcd.healthy_endpoints(chain).await;
        if endpoints.is_empty() {
            let err = WatchError::EndpointUnavailable {
                chain: chain.to_string(),
            };
            tracing::warn!(target: "engine", chain, error = %err, "Skipping chain");
            record_error(&err);
            report.skipped = true;
            return report;
        }

        let Some((serving, proposals)) = self.fetch_proposals(chain, &endpoints).await else {
            report.skipped = true;
            return report;
        };
        let active: Vec<&Proposal> = proposals.iter().filter(|p| p.is_voting()).collect();
        report.proposals = active.len();
        if active.is_empty() {
            tracing::debug!(target: "engine", chain, "No proposals in voting period");
            return report;
        }

        for validator in validators {
            let account = match operator_to_account(&validator.address) {
                Ok(account) => account,
                Err(e) => {
                    let err = WatchError::from(e);
                    tracing::warn!(
                        target: "engine",
                        chain,
                        validator = %validator.address,
                        error = %err,
                        "Skipping validator with unusable address"
                    );
                    record_error(&err);
                    report.pair_errors += active.len();
                    continue;
                }
            };
            for proposal in &active {
                self.evaluate(&endpoints, serving, validator, &account, proposal, &mut report)
                    .await;
            }
        }
        report
    }

    /// Lists proposals from the first endpoint that answers. Returns the index
    /// of that endpoint together with the proposals.
    async fn fetch_proposals(
        &self,
        chain: &str,
        endpoints: &[String],
    ) -> Option<(usize, Vec<Proposal>)> {
        for (index, base) in endpoints.iter().enumerate() {
            match self.lcd.active_proposals(base).await {
                Ok(proposals) => return Some((index, proposals)),
                Err(e) => {
                    tracing::warn!(
                        target: "engine",
                        chain,
                        endpoint = %base,
                        error = %e,
                        code = e.code(),
                        "Failed to list proposals"
                    );
                    record_error(&e);
                }
            }
        }
        tracing::warn!(target: "engine", chain, "No endpoint could list proposals; skipping chain");
        None
    }

    /// Looks up a vote starting at the endpoint that served the proposal list,
    /// then the remaining healthy endpoints in order.
    async fn fetch_vote(
        &self,
        chain: &str,
        endpoints: &[String],
        serving: usize,
        proposal_id: &str,
        account: &str,
    ) -> Result<VoteRecord, WatchError> {
        let mut last_err = None;
        for base in endpoints.iter().cycle().skip(serving).take(endpoints.len()) {
            match self.lcd.vote(base, proposal_id, account).await {
                Ok(vote) => return Ok(vote),
                Err(e) => {
                    tracing::debug!(target: "engine", endpoint = %base, error = %e, "Vote lookup failed");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| WatchError::EndpointUnavailable {
            chain: chain.to_string(),
        }))
    }

    async fn evaluate(
        &self,
        endpoints: &[String],
        serving: usize,
        validator: &Validator,
        account: &str,
        proposal: &Proposal,
        report: &mut ChainReport,
    ) {
        let chain = validator.chain_name.as_str();
        let key = AlertKey::new(validator, &proposal.id);

        let vote = match self.fetch_vote(chain, endpoints, serving, &proposal.id, account).await {
            Ok(vote) => vote,
            Err(e) => {
                // Unknown vote state: no alert, and the key stays unmarked.
                tracing::warn!(
                    target: "engine",
                    chain,
                    proposal = %proposal.id,
                    validator = %validator.address,
                    error = %e,
                    code = e.code(),
                    "Failed to fetch vote"
                );
                record_error(&e);
                report.pair_errors += 1;
                return;
            }
        };

        let now = self.clock.now();
        let already_alerted = self.store.lock().is_alerted(&key, proposal.voting_end_time);
        let decision = self.policy.decide(proposal, &vote, already_alerted, now);
        match decision {
            Decision::Voted => {
                if self.store.lock().clear(&key) {
                    tracing::debug!(target: "engine", key = %key, "Validator voted; cleared alert entry");
                }
            }
            Decision::Alert { remaining } => {
                let message = format_alert(validator, account, proposal, remaining);
                match self.sink.send(&message).await {
                    Ok(()) => {
                        self.store
                            .lock()
                            .mark_alerted(key.clone(), proposal.voting_end_time, now);
                        alert_metrics().inc_alerts_sent(chain);
                        report.alerts_sent += 1;
                        tracing::info!(
                            target: "engine",
                            key = %key,
                            sink = self.sink.name(),
                            remaining_mins = remaining.whole_minutes(),
                            "Alert sent"
                        );
                    }
                    Err(e) => {
                        let e = WatchError::from(e);
                        alert_metrics().inc_alert_failures(chain);
                        record_error(&e);
                        report.alert_failures += 1;
                        tracing::warn!(
                            target: "engine",
                            key = %key,
                            sink = self.sink.name(),
                            error = %e,
                            "Alert delivery failed; will retry next cycle"
                        );
                    }
                }
            }
            other => {
                tracing::trace!(target: "engine", key = %key, decision = ?other, "No alert");
            }
        }
    }
}

fn record_error(err: &WatchError) {
    error_metrics().inc_error(err.kind(), err.code());
}

/// Groups validators by chain, dropping duplicate entries.
fn group_by_chain(validators: Vec<Validator>) -> BTreeMap<String, Vec<Validator>> {
    let mut seen = BTreeSet::new();
    let mut by_chain: BTreeMap<String, Vec<Validator>> = BTreeMap::new();
    for validator in validators {
        if seen.insert(validator.clone()) {
            by_chain
                .entry(validator.chain_name.clone())
                .or_default()
                .push(validator);
        }
    }
    by_chain
}

/// Resolves once shutdown is requested. Never resolves if the sender is gone.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
