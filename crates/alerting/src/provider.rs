// Path: crates/alerting/src/provider.rs
use async_trait::async_trait;
use govwatch_types::{
    config::{ValidatorsFile, WatchConfig},
    error::ProviderError,
    Validator,
};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Supplies the (chain, validator-operator address) pairs to monitor.
///
/// The records are owned by the registration layer. The engine only reads them
/// once at the start of every cycle.
#[async_trait]
pub trait ValidatorProvider: Send + Sync {
    async fn get_monitored_validators(&self) -> Result<Vec<Validator>, ProviderError>;
}

/// A fixed list, e.g. the inline `[[validators]]` of the config file.
#[derive(Debug, Clone, Default)]
pub struct StaticValidatorProvider {
    validators: Vec<Validator>,
}

impl StaticValidatorProvider {
    pub fn new(validators: Vec<Validator>) -> Self {
        Self { validators }
    }
}

#[async_trait]
impl ValidatorProvider for StaticValidatorProvider {
    async fn get_monitored_validators(&self) -> Result<Vec<Validator>, ProviderError> {
        Ok(self.validators.clone())
    }
}

/// Re-reads a TOML file of `[[validators]]` on every call, so records added
/// by the registration layer are picked up on the next cycle.
#[derive(Debug, Clone)]
pub struct FileValidatorProvider {
    path: PathBuf,
    inline: Vec<Validator>,
}

impl FileValidatorProvider {
    pub fn new(path: PathBuf, inline: Vec<Validator>) -> Self {
        Self { path, inline }
    }
}

#[async_trait]
impl ValidatorProvider for FileValidatorProvider {
    async fn get_monitored_validators(&self) -> Result<Vec<Validator>, ProviderError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ProviderError::Unavailable(format!("{}: {}", self.path.display(), e))
        })?;
        let file: ValidatorsFile = toml::from_str(&raw)
            .map_err(|e| ProviderError::Malformed(format!("{}: {}", self.path.display(), e)))?;

        // Keep first-seen order while dropping duplicates.
        let mut seen = BTreeSet::new();
        Ok(self
            .inline
            .iter()
            .cloned()
            .chain(file.validators)
            .filter(|v| seen.insert(v.clone()))
            .collect())
    }
}

/// Picks the provider described by the config.
pub fn provider_from_config(config: &WatchConfig) -> Arc<dyn ValidatorProvider> {
    match &config.validators_file {
        Some(path) => Arc::new(FileValidatorProvider::new(
            path.clone(),
            config.validators.clone(),
        )),
        None => Arc::new(StaticValidatorProvider::new(config.validators.clone())),
    }
}
