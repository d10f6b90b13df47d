// Path: crates/types/src/config/mod.rs

//! Runtime configuration for the watcher (`govwatch.toml`).

use crate::app::Validator;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `slack.bot_token`.
pub const SLACK_TOKEN_ENV: &str = "GOVWATCH_SLACK_BOT_TOKEN";

/// Top-level watcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Seconds between the start of two poll cycles.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Upper bound on the wall-clock duration of a single cycle.
    #[serde(default = "default_cycle_timeout_secs")]
    pub cycle_timeout_secs: u64,
    /// Trailing span before the voting deadline in which an unvoted proposal
    /// becomes alert-worthy. The boundary is inclusive.
    #[serde(default = "default_alert_window_secs")]
    pub alert_window_secs: u64,
    /// Timeout applied to every LCD request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Timeout applied to endpoint health probes.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    /// Maximum number of chains processed concurrently within a cycle.
    #[serde(default = "default_max_concurrent_chains")]
    pub max_concurrent_chains: usize,
    /// Base URL of the chain registry used for endpoint discovery.
    #[serde(default = "default_chain_registry_url")]
    pub chain_registry_url: String,
    /// Whether to discover endpoints from the chain registry at all.
    #[serde(default = "default_true")]
    pub use_chain_registry: bool,
    /// Where the alert dedup store is persisted. In-memory only when unset.
    #[serde(default)]
    pub state_path: Option<PathBuf>,
    /// Explicit per-chain endpoint lists, tried before discovered ones.
    #[serde(default)]
    pub chains: BTreeMap<String, ChainEndpoints>,
    /// Slack delivery settings. Alerts are only logged when absent.
    #[serde(default)]
    pub slack: Option<SlackConfig>,
    /// A TOML file with `[[validators]]` entries, re-read every cycle.
    #[serde(default)]
    pub validators_file: Option<PathBuf>,
    /// Validators listed inline in the config file.
    #[serde(default)]
    pub validators: Vec<Validator>,
}

/// Explicit endpoints for one chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainEndpoints {
    /// REST (LCD) base URLs, most preferred first.
    #[serde(default)]
    pub rest: Vec<String>,
}

/// Slack bot credentials and target channel.
#[derive(Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    /// Bot OAuth token (`xoxb-...`). May be overridden via the environment.
    #[serde(default)]
    pub bot_token: String,
    /// The channel alerts are posted to.
    pub channel_id: String,
    /// Web API base URL.
    #[serde(default = "default_slack_api_url")]
    pub api_url: String,
}

impl fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.bot_token.is_empty() {
            "<unset>"
        } else {
            "<redacted>"
        };
        f.debug_struct("SlackConfig")
            .field("bot_token", &token)
            .field("channel_id", &self.channel_id)
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// The on-disk shape of `validators_file`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidatorsFile {
    /// Monitored validators.
    #[serde(default)]
    pub validators: Vec<Validator>,
}

fn default_poll_interval_secs() -> u64 {
    300
}
fn default_cycle_timeout_secs() -> u64 {
    240
}
fn default_alert_window_secs() -> u64 {
    24 * 60 * 60
}
fn default_request_timeout_secs() -> u64 {
    8
}
fn default_probe_timeout_secs() -> u64 {
    3
}
fn default_max_concurrent_chains() -> usize {
    4
}
fn default_chain_registry_url() -> String {
    "https://raw.githubusercontent.com/cosmos/chain-registry/master".to_string()
}
fn default_slack_api_url() -> String {
    "https://slack.com/api".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            cycle_timeout_secs: default_cycle_timeout_secs(),
            alert_window_secs: default_alert_window_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
            max_concurrent_chains: default_max_concurrent_chains(),
            chain_registry_url: default_chain_registry_url(),
            use_chain_registry: true,
            state_path: None,
            chains: BTreeMap::new(),
            slack: None,
            validators_file: None,
            validators: Vec::new(),
        }
    }
}

impl WatchConfig {
    /// Reads, parses and validates a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Parses and validates a config document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let mut config: WatchConfig = toml::from_str(raw)?;
        if let Some(slack) = config.slack.as_mut() {
            if let Ok(token) = std::env::var(SLACK_TOKEN_ENV) {
                slack.bot_token = token;
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would stall or disable the watcher.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_zero = [
            ("poll_interval_secs", self.poll_interval_secs),
            ("cycle_timeout_secs", self.cycle_timeout_secs),
            ("alert_window_secs", self.alert_window_secs),
            ("request_timeout_secs", self.request_timeout_secs),
            ("probe_timeout_secs", self.probe_timeout_secs),
        ];
        for (name, value) in non_zero {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be greater than 0")));
            }
        }
        if self.max_concurrent_chains == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent_chains must be greater than 0".into(),
            ));
        }
        if let Some(slack) = &self.slack {
            if slack.channel_id.trim().is_empty() {
                return Err(ConfigError::Invalid("slack.channel_id is empty".into()));
            }
            if slack.bot_token.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "slack.bot_token is empty (set it in the file or via {SLACK_TOKEN_ENV})"
                )));
            }
        }
        Ok(())
    }

    /// The poll interval as a `Duration`.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// The cycle timeout as a `Duration`.
    pub fn cycle_timeout(&self) -> Duration {
        Duration::from_secs(self.cycle_timeout_secs)
    }

    /// The alert window as a `time::Duration` for deadline arithmetic.
    pub fn alert_window(&self) -> time::Duration {
        time::Duration::seconds(i64::try_from(self.alert_window_secs).unwrap_or(i64::MAX))
    }

    /// The LCD request timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The health probe timeout as a `Duration`.
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}
