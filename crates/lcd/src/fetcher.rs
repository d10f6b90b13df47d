// Path: crates/lcd/src/fetcher.rs
use async_trait::async_trait;
use govwatch_types::error::FetchError;
use reqwest::Client;
use std::time::Duration;

/// A raw HTTP response. Non-2xx statuses are carried here rather than turned
/// into errors so callers can decide what a 404 means for their resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// A short, printable rendering of the body for logs and errors.
    pub fn snippet(&self) -> String {
        ascii_snippet(&self.body)
    }

    /// Converts a non-2xx response into a `FetchError::Status`.
    pub fn into_status_error(self, url: String) -> FetchError {
        FetchError::Status {
            url,
            status: self.status,
            body: self.snippet(),
        }
    }
}

pub(crate) fn ascii_snippet(bytes: &[u8]) -> String {
    let s = String::from_utf8_lossy(bytes);
    let s: String = s.trim().chars().take(160).collect();
    s.replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Joins a base URL and a path, tolerating a trailing slash on the base.
pub fn join_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Renders the full request URL including the query, for diagnostics.
pub fn display_url(base_url: &str, path: &str, query: &[(&str, &str)]) -> String {
    let url = join_url(base_url, path);
    if query.is_empty() {
        return url;
    }
    let q: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{}?{}", url, q.join("&"))
}

/// Issues GET requests against LCD endpoints.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// Fetches `{base_url}{path}?{query}` under the regular request timeout.
    async fn fetch(
        &self,
        base_url: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<FetchResponse, FetchError>;

    /// Fetches `{base_url}{path}` under the shorter health-probe timeout.
    async fn probe(&self, base_url: &str, path: &str) -> Result<FetchResponse, FetchError>;
}

/// The production fetcher backed by a shared `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
    request_timeout: Duration,
    probe_timeout: Duration,
}

impl ReqwestFetcher {
    pub fn new(request_timeout: Duration, probe_timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(probe_timeout.min(request_timeout))
            .user_agent(concat!("govwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport {
                url: String::new(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            request_timeout,
            probe_timeout,
        })
    }

    async fn get(
        &self,
        base_url: &str,
        path: &str,
        query: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<FetchResponse, FetchError> {
        let url = join_url(base_url, path);
        let shown = display_url(base_url, path, query);
        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: shown.clone(),
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                }
            } else {
                FetchError::Transport {
                    url: shown.clone(),
                    reason: e.to_string(),
                }
            }
        };

        let resp = self
            .client
            .get(&url)
            .query(query)
            .timeout(timeout)
            .send()
            .await
            .map_err(map_err)?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(map_err)?;
        tracing::trace!(target: "lcd", url = %shown, status, bytes = body.len(), "fetched");
        Ok(FetchResponse::new(status, body.to_vec()))
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn fetch(
        &self,
        base_url: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<FetchResponse, FetchError> {
        self.get(base_url, path, query, self.request_timeout).await
    }

    async fn probe(&self, base_url: &str, path: &str) -> Result<FetchResponse, FetchError> {
        self.get(base_url, path, &[], self.probe_timeout).await
    }
}
