//! # Rescue Effects - Layer 3: Effect Handlers
//!
//! Stateless and snapshot-backed implementations of the effect traits
//! defined in `rescue-core`.
//!
//! ## What Belongs Here
//!
//! - [`ChainSnapshot`]: an in-memory image of the storage items, constants and
//!   block height the recovery engines read
//! - [`InMemoryChainHandler`]: a `ChainQueryEffects` handler over a snapshot,
//!   used by the CLI to inspect exported chain state
//!
//! ## What Does NOT Belong Here
//!
//! - Live RPC transports (supplied by the embedding application)
//! - Failure injection or gated responses (belong in rescue-testkit)

#![forbid(unsafe_code)]

pub mod chain;

pub use chain::{ChainSnapshot, InMemoryChainHandler, StorageEntry};
