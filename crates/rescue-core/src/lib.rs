//! # Rescue Core - Layer 1: Foundation
//!
//! Foundation types for the Rescue social recovery client.
//!
//! ## Purpose
//!
//! Layer 1 crate providing the vocabulary shared by every other crate:
//! - Account identifiers and the (lost, rescuer) pair that scopes a rescue
//! - On-chain record shapes of the recovery, balances and staking pallets
//! - The unified [`RescueError`] type
//! - The [`ChainQueryEffects`] trait, the only seam to the chain client
//! - Engine configuration
//!
//! ## What Belongs Here
//!
//! - Plain data types and their invariants (e.g. sorted, unique friend sets)
//! - Effect trait definitions (no implementations)
//! - Storage and constant descriptors understood by chain handlers
//!
//! ## What Does NOT Belong Here
//!
//! - Effect handler implementations (belong in rescue-effects)
//! - Probe bookkeeping or phase derivation (belong in rescue-recovery)
//! - Test doubles (belong in rescue-testkit)

#![forbid(unsafe_code)]

/// Engine configuration loaded from TOML and the environment
pub mod config;

/// Effect traits implemented by chain handlers
pub mod effects;

/// Unified error type
pub mod errors;

/// Account identifiers
pub mod identifiers;

/// On-chain record types
pub mod types;

pub use config::EngineConfig;
pub use effects::chain::{
    read_constant_decoded, read_decoded, ChainConstant, ChainError, ChainQueryEffects,
    StorageKey, StoragePrefix,
};
pub use errors::{RescueError, Result};
pub use identifiers::{AccountId, RecoveryPair};
pub use types::{
    ActiveRecoveryAttempt, Balance, BalanceSnapshot, BlockNumber, EraIndex, FriendSet,
    RecoveryConfig, SlashingSpans, StakingLedger, UnlockChunk,
};
