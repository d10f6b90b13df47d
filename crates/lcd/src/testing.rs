// Path: crates/lcd/src/testing.rs
//! An in-memory `HttpFetcher` that serves canned responses keyed by URL.

use crate::fetcher::{display_url, join_url, FetchResponse, HttpFetcher};
use crate::resolver::PROBE_PATH;
use async_trait::async_trait;
use govwatch_types::error::FetchError;
use parking_lot::Mutex;
use std::collections::HashMap;

/// A canned outcome for one URL.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Answer with this status and body.
    Response(FetchResponse),
    /// Fail as if the request timed out.
    Timeout,
    /// Fail with a transport error.
    Transport(String),
}

/// Serves replies by URL. A route registered with its query string wins over
/// one registered for the bare `{base}{path}`. Unrouted URLs fail with a
/// transport error, like an unreachable host.
#[derive(Debug, Default)]
pub struct MockFetcher {
    routes: Mutex<HashMap<String, MockReply>>,
    calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes `url` to a response with the given status and body.
    pub fn respond(&self, url: &str, status: u16, body: impl Into<String>) {
        let body: String = body.into();
        self.routes.lock().insert(
            url.to_string(),
            MockReply::Response(FetchResponse::new(status, body.into_bytes())),
        );
    }

    /// Routes `url` to an arbitrary reply.
    pub fn reply(&self, url: &str, reply: MockReply) {
        self.routes.lock().insert(url.to_string(), reply);
    }

    /// Makes `base_url` pass its health probe.
    pub fn healthy(&self, base_url: &str) {
        self.respond(&join_url(base_url, PROBE_PATH), 200, "{}");
    }

    /// Every URL requested so far, in order, including any query string.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// How many times `url` was requested.
    pub fn call_count(&self, url: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.as_str() == url).count()
    }

    fn serve(&self, bare: String, url: String) -> Result<FetchResponse, FetchError> {
        self.calls.lock().push(url.clone());
        let reply = {
            let routes = self.routes.lock();
            routes.get(&url).or_else(|| routes.get(&bare)).cloned()
        };
        match reply {
            Some(MockReply::Response(resp)) => Ok(resp),
            Some(MockReply::Timeout) => Err(FetchError::Timeout {
                url,
                timeout_ms: 1,
            }),
            Some(MockReply::Transport(reason)) => Err(FetchError::Transport { url, reason }),
            None => Err(FetchError::Transport {
                url,
                reason: "connection refused".into(),
            }),
        }
    }
}

#[async_trait]
impl HttpFetcher for MockFetcher {
    async fn fetch(
        &self,
        base_url: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<FetchResponse, FetchError> {
        self.serve(join_url(base_url, path), display_url(base_url, path, query))
    }

    async fn probe(&self, base_url: &str, path: &str) -> Result<FetchResponse, FetchError> {
        let url = join_url(base_url, path);
        self.serve(url.clone(), url)
    }
}
