//! Effect traits.
//!
//! # Effect Classification
//!
//! - **Category**: Infrastructure Effect
//! - **Implementation**: `rescue-effects` (Layer 3), `rescue-testkit` (Layer 8)
//! - **Usage**: every probe in `rescue-recovery`

pub mod chain;

pub use chain::{ChainConstant, ChainError, ChainQueryEffects, StorageKey, StoragePrefix};
