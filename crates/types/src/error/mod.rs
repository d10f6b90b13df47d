// Path: crates/types/src/error/mod.rs
//! Error types for the governance vote watcher.
//!
//! None of these errors is fatal to the process. They exist so that a failed
//! fetch can never be mistaken for "no vote" or "no active proposals".

use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Errors raised while issuing an HTTP request against an LCD endpoint.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request did not complete within the configured timeout.
    #[error("Request to {url} timed out after {timeout_ms}ms")]
    Timeout {
        /// The full request URL.
        url: String,
        /// The timeout that elapsed.
        timeout_ms: u64,
    },
    /// The connection failed or the response body could not be read.
    #[error("Transport error for {url}: {reason}")]
    Transport {
        /// The full request URL.
        url: String,
        /// The underlying client error.
        reason: String,
    },
    /// The endpoint answered with a status the caller treats as a failure.
    #[error("HTTP {status} from {url}: {body}")]
    Status {
        /// The full request URL.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// A short printable snippet of the response body.
        body: String,
    },
}

impl ErrorCode for FetchError {
    fn code(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "LCD_FETCH_TIMEOUT",
            Self::Transport { .. } => "LCD_FETCH_TRANSPORT",
            Self::Status { .. } => "LCD_FETCH_STATUS",
        }
    }
}

/// Errors raised while decoding a response body into typed records.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The body was not valid JSON for the expected shape.
    #[error("Malformed JSON from {url}: {reason}")]
    Json {
        /// The endpoint that produced the body.
        url: String,
        /// The parser error.
        reason: String,
    },
    /// A field was present but its value could not be interpreted.
    #[error("Invalid field '{field}' from {url}: {reason}")]
    Field {
        /// The endpoint that produced the body.
        url: String,
        /// The offending field name.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ErrorCode for DecodeError {
    fn code(&self) -> &'static str {
        match self {
            Self::Json { .. } => "LCD_DECODE_JSON",
            Self::Field { .. } => "LCD_DECODE_FIELD",
        }
    }
}

/// Errors raised while re-encoding a validator-operator address.
#[derive(Debug, Error)]
pub enum AddressError {
    /// The string is not valid bech32.
    #[error("Invalid bech32 address '{address}': {reason}")]
    Bech32 {
        /// The address as provided.
        address: String,
        /// The decoder error.
        reason: String,
    },
    /// The human-readable part does not carry the operator suffix.
    #[error("Address '{address}' is not a validator-operator address (prefix '{hrp}')")]
    NotOperatorAddress {
        /// The address as provided.
        address: String,
        /// The decoded human-readable part.
        hrp: String,
    },
    /// The decoded payload is neither 20 nor 32 bytes.
    #[error("Address '{address}' has an unexpected payload length of {len} bytes")]
    InvalidLength {
        /// The address as provided.
        address: String,
        /// The decoded payload length.
        len: usize,
    },
}

impl ErrorCode for AddressError {
    fn code(&self) -> &'static str {
        match self {
            Self::Bech32 { .. } => "ADDRESS_BECH32_INVALID",
            Self::NotOperatorAddress { .. } => "ADDRESS_NOT_OPERATOR",
            Self::InvalidLength { .. } => "ADDRESS_INVALID_LENGTH",
        }
    }
}

/// Errors raised by an alert sink when a notification could not be delivered.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The notification service could not be reached.
    #[error("Alert delivery failed: {0}")]
    Transport(String),
    /// The notification service refused the message.
    #[error("Alert rejected by channel: {0}")]
    Rejected(String),
}

impl ErrorCode for SinkError {
    fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "SINK_DELIVERY_FAILED",
            Self::Rejected(_) => "SINK_REJECTED",
        }
    }
}

/// Errors raised by the monitored-validator provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The backing store could not be read.
    #[error("Validator store unavailable: {0}")]
    Unavailable(String),
    /// The backing store was read but its contents are invalid.
    #[error("Validator store is malformed: {0}")]
    Malformed(String),
}

impl ErrorCode for ProviderError {
    fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "PROVIDER_UNAVAILABLE",
            Self::Malformed(_) => "PROVIDER_MALFORMED",
        }
    }
}

/// Errors raised while loading or validating the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid TOML for the expected shape.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value is out of its permitted range.
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

impl ErrorCode for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "CONFIG_IO",
            Self::Parse(_) => "CONFIG_PARSE",
            Self::Invalid(_) => "CONFIG_INVALID",
        }
    }
}

/// The umbrella error for a single step of a poll cycle.
#[derive(Debug, Error)]
pub enum WatchError {
    /// Every candidate endpoint for the chain failed its health probe.
    #[error("No reachable LCD endpoint for chain '{chain}'")]
    EndpointUnavailable {
        /// The chain that was skipped.
        chain: String,
    },
    /// An HTTP request failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// A response body could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// A validator address could not be converted.
    #[error(transparent)]
    Address(#[from] AddressError),
    /// An alert could not be delivered.
    #[error(transparent)]
    Sink(#[from] SinkError),
    /// The monitored validator set could not be loaded.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl WatchError {
    /// A coarse category label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EndpointUnavailable { .. } => "endpoint",
            Self::Fetch(_) => "fetch",
            Self::Decode(_) => "decode",
            Self::Address(_) => "address",
            Self::Sink(_) => "sink",
            Self::Provider(_) => "provider",
        }
    }
}

impl ErrorCode for WatchError {
    fn code(&self) -> &'static str {
        match self {
            Self::EndpointUnavailable { .. } => "ENDPOINT_UNAVAILABLE",
            Self::Fetch(e) => e.code(),
            Self::Decode(e) => e.code(),
            Self::Address(e) => e.code(),
            Self::Sink(e) => e.code(),
            Self::Provider(e) => e.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_error_codes_delegate() {
        let err: WatchError = FetchError::Status {
            url: "http://lcd/x".into(),
            status: 500,
            body: "boom".into(),
        }
        .into();
        assert_eq!(err.code(), "LCD_FETCH_STATUS");
        assert_eq!(err.kind(), "fetch");
        assert_eq!(err.to_string(), "HTTP 500 from http://lcd/x: boom");

        let err = WatchError::EndpointUnavailable {
            chain: "osmosis".into(),
        };
        assert_eq!(err.code(), "ENDPOINT_UNAVAILABLE");
    }
}
