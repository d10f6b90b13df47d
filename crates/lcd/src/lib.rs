// Path: crates/lcd/src/lib.rs
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

//! # Governance Watch LCD Client
//!
//! Read-only access to the governance module of Cosmos SDK chains over their
//! REST (LCD) interface. Every lookup returns an explicit three-way outcome:
//! a positive result, an explicit absence (no active proposals, no vote), or a
//! typed error. Errors are never folded into absence.

/// Bech32 re-encoding between validator-operator and account addresses.
pub mod address;
/// The facade used by the alert engine.
pub mod client;
/// The HTTP transport abstraction and its `reqwest` implementation.
pub mod fetcher;
/// Decoding of the active-proposals resource.
pub mod proposals;
/// Discovery and health probing of candidate endpoints.
pub mod resolver;
/// An in-memory fetcher for tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
/// Decoding of the per-account vote resource.
pub mod votes;

pub use address::operator_to_account;
pub use client::LcdClient;
pub use fetcher::{FetchResponse, HttpFetcher, ReqwestFetcher};
pub use resolver::EndpointResolver;
