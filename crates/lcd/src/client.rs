// Path: crates/lcd/src/client.rs
use crate::fetcher::{HttpFetcher, ReqwestFetcher};
use crate::proposals::fetch_active_proposals;
use crate::resolver::EndpointResolver;
use crate::votes::fetch_vote;
use govwatch_telemetry::lcd_metrics;
use govwatch_types::{
    config::WatchConfig,
    error::{FetchError, WatchError},
    Proposal, VoteRecord,
};
use std::sync::Arc;
use std::time::Instant;

/// Read access to the governance module of every monitored chain.
pub struct LcdClient {
    fetcher: Arc<dyn HttpFetcher>,
    resolver: EndpointResolver,
}

impl LcdClient {
    pub fn new(fetcher: Arc<dyn HttpFetcher>, resolver: EndpointResolver) -> Self {
        Self { fetcher, resolver }
    }

    /// Builds a client over a shared `reqwest` fetcher using the configured
    /// timeouts and endpoint sources.
    pub fn from_config(config: &WatchConfig) -> Result<Self, FetchError> {
        let fetcher: Arc<dyn HttpFetcher> = Arc::new(ReqwestFetcher::new(
            config.request_timeout(),
            config.probe_timeout(),
        )?);
        let resolver = EndpointResolver::from_config(fetcher.clone(), config);
        Ok(Self::new(fetcher, resolver))
    }

    /// Builds a client from any fetcher, resolving endpoints from `config`.
    pub fn with_fetcher(fetcher: Arc<dyn HttpFetcher>, config: &WatchConfig) -> Self {
        let resolver = EndpointResolver::from_config(fetcher.clone(), config);
        Self::new(fetcher, resolver)
    }

    /// Healthy endpoints for `chain`, most preferred first.
    pub async fn healthy_endpoints(&self, chain: &str) -> Vec<String> {
        self.resolver.healthy_endpoints(chain).await
    }

    /// Proposals in their voting period on the chain served by `base_url`.
    pub async fn active_proposals(&self, base_url: &str) -> Result<Vec<Proposal>, WatchError> {
        let started = Instant::now();
        let result = fetch_active_proposals(self.fetcher.as_ref(), base_url).await;
        lcd_metrics().observe_request_duration("proposals", started.elapsed().as_secs_f64());
        result
    }

    /// The vote of `account_address` on `proposal_id`.
    pub async fn vote(
        &self,
        base_url: &str,
        proposal_id: &str,
        account_address: &str,
    ) -> Result<VoteRecord, WatchError> {
        let started = Instant::now();
        let result = fetch_vote(self.fetcher.as_ref(), base_url, proposal_id, account_address).await;
        lcd_metrics().observe_request_duration("vote", started.elapsed().as_secs_f64());
        result
    }
}
