// Path: crates/alerting/src/lib.rs
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

//! # Governance Watch Alerting
//!
//! The voting-deadline alert engine. One poll cycle loads the monitored
//! validators, fans out one task per chain, cross-references each validator's
//! vote against every proposal in its voting period and raises at most one
//! alert per (chain, validator, proposal) and voting period.

/// Time sources for deadline arithmetic.
pub mod clock;
/// The poll-cycle orchestrator.
pub mod engine;
/// Alert text rendering.
pub mod message;
/// The alert timing policy.
pub mod policy;
/// The monitored-validator read contract and its implementations.
pub mod provider;
/// Alert delivery sinks.
pub mod sink;
/// The alert deduplication store.
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{AlertEngine, ChainReport, CycleReport, EngineDependencies};
pub use policy::{AlertPolicy, Decision};
pub use provider::{
    provider_from_config, FileValidatorProvider, StaticValidatorProvider, ValidatorProvider,
};
pub use sink::{AlertSink, LogSink, SlackSink};
pub use store::{AlertRecord, AlertStore, StoreError};
