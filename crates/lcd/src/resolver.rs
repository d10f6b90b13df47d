// Path: crates/lcd/src/resolver.rs
use crate::fetcher::HttpFetcher;
use govwatch_telemetry::lcd_metrics;
use govwatch_types::{config::WatchConfig, CandidateEndpoint};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

/// Lightweight resource used as the reachability probe.
pub const PROBE_PATH: &str = "/cosmos/base/tendermint/v1beta1/node_info";

#[derive(Deserialize)]
struct ChainRecord {
    #[serde(default)]
    apis: Option<ChainApis>,
}

#[derive(Deserialize)]
struct ChainApis {
    #[serde(default)]
    rest: Vec<RestApi>,
}

#[derive(Deserialize)]
struct RestApi {
    address: String,
}

/// Produces and health-checks candidate LCD base URLs for a chain.
pub struct EndpointResolver {
    fetcher: Arc<dyn HttpFetcher>,
    configured: BTreeMap<String, Vec<String>>,
    registry_url: Option<String>,
}

impl EndpointResolver {
    pub fn new(
        fetcher: Arc<dyn HttpFetcher>,
        configured: BTreeMap<String, Vec<String>>,
        registry_url: Option<String>,
    ) -> Self {
        Self {
            fetcher,
            configured,
            registry_url,
        }
    }

    pub fn from_config(fetcher: Arc<dyn HttpFetcher>, config: &WatchConfig) -> Self {
        let configured = config
            .chains
            .iter()
            .map(|(name, c)| (name.clone(), c.rest.clone()))
            .collect();
        let registry_url = config
            .use_chain_registry
            .then(|| config.chain_registry_url.clone());
        Self::new(fetcher, configured, registry_url)
    }

    /// Candidate base URLs in preference order: configured endpoints first,
    /// then those listed in the chain registry. Duplicates are dropped.
    pub async fn candidates(&self, chain: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let configured = self.configured.get(chain).cloned().unwrap_or_default();
        let discovered = self.registry_endpoints(chain).await;
        for raw in configured.into_iter().chain(discovered) {
            let url = raw.trim().trim_end_matches('/').to_string();
            if url.is_empty() {
                continue;
            }
            if seen.insert(url.clone()) {
                out.push(url);
            }
        }
        out
    }

    async fn registry_endpoints(&self, chain: &str) -> Vec<String> {
        let Some(registry) = self.registry_url.as_deref() else {
            return Vec::new();
        };
        let path = format!("/{chain}/chain.json");
        let resp = match self.fetcher.fetch(registry, &path, &[]).await {
            Ok(r) if r.is_success() => r,
            Ok(r) => {
                tracing::warn!(target: "lcd", chain, status = r.status, "chain registry lookup failed");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(target: "lcd", chain, error = %e, "chain registry unreachable");
                return Vec::new();
            }
        };
        match serde_json::from_slice::<ChainRecord>(&resp.body) {
            Ok(record) => record
                .apis
                .map(|a| a.rest.into_iter().map(|r| r.address).collect())
                .unwrap_or_default(),
            Err(e) => {
                tracing::warn!(target: "lcd", chain, error = %e, "chain registry record is malformed");
                Vec::new()
            }
        }
    }

    /// Probes every candidate concurrently. The result keeps candidate order.
    pub async fn resolve(&self, chain: &str) -> Vec<CandidateEndpoint> {
        let candidates = self.candidates(chain).await;
        let probes = candidates.into_iter().map(|base_url| async move {
            let started = Instant::now();
            let healthy = match self.fetcher.probe(&base_url, PROBE_PATH).await {
                Ok(resp) => {
                    lcd_metrics().inc_requests_total("probe", resp.status);
                    resp.is_success()
                }
                Err(e) => {
                    tracing::debug!(target: "lcd", chain, endpoint = %base_url, error = %e, "probe failed");
                    false
                }
            };
            lcd_metrics().observe_request_duration("probe", started.elapsed().as_secs_f64());
            CandidateEndpoint { base_url, healthy }
        });
        futures::future::join_all(probes).await
    }

    /// The healthy subset of `resolve`, most preferred first. Empty means the
    /// chain has no reachable endpoint this cycle.
    pub async fn healthy_endpoints(&self, chain: &str) -> Vec<String> {
        let healthy: Vec<String> = self
            .resolve(chain)
            .await
            .into_iter()
            .filter(|c| c.healthy)
            .map(|c| c.base_url)
            .collect();
        lcd_metrics().set_healthy_endpoints(chain, healthy.len());
        healthy
    }
}
