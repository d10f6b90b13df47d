// Path: crates/types/src/lib.rs
#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! # Governance Watch Types
//!
//! The shared data model of the governance vote watcher: monitored validators,
//! proposals and votes as decoded from a chain's LCD, the deduplication key for
//! alerts, runtime configuration and the error taxonomy.
//!
//! ## Architectural Role
//!
//! Every other crate in the workspace depends on `govwatch-types`, so it keeps
//! its own dependencies to serialization and error derivation only.

/// A crate-wide `Result` alias defaulting to the poll-cycle error.
pub type Result<T, E = crate::error::WatchError> = std::result::Result<T, E>;

/// Domain records exchanged between the LCD client and the alert engine.
pub mod app;
/// Runtime configuration loaded from `govwatch.toml`.
pub mod config;
/// Error types and their stable machine-readable codes.
pub mod error;

pub use app::*;
pub use error::ErrorCode;
