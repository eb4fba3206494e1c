//! # Rescue Recovery - Layer 5: Recovery State Engines
//!
//! Client-side state derivation for the social recovery pallet.
//!
//! ## Purpose
//!
//! Layer 5 crate mirroring an on-chain, multi-party recovery protocol from
//! polled reads alone:
//! - Tri-state probes over optional on-chain records
//! - The rescuer step engine (initiate, wait, withdraw) with a live countdown
//! - The friend vouch decision
//! - Owner setup validation and deposit calculation
//! - The withdrawal calculator and the call batches handed to the wallet
//!
//! ## Architecture Constraints
//!
//! This crate depends on:
//! - **Layer 1** (rescue-core): identifiers, record types, errors, the chain
//!   query effect trait and configuration
//!
//! Chain access only happens through [`rescue_core::ChainQueryEffects`];
//! handlers live in rescue-effects and test doubles in rescue-testkit.
//!
//! ## Design Principles
//!
//! - Engines are synchronous reducers. They never await; every mutation
//!   returns the [`ProbeRequest`]s it implies.
//! - Every query is tagged with the key and generation it was issued for, and
//!   answers for a superseded selection are discarded on arrival.
//! - "Not known yet" is never conflated with "does not exist". A failed read
//!   is its own state and freezes the rescuer phase.
//! - The rescuer phase is one pure derivation over the latest probe results,
//!   held monotone for a (lost, rescuer) session.
//! - Triggers validate locally and return a [`RecoveryCall`]; signing and
//!   submission belong to the caller.

#![forbid(unsafe_code)]

/// Extrinsic descriptors returned by triggers
pub mod calls;

/// Protocol constants and the per-connection reader
pub mod constants;

/// Friend vouch decision and engine
pub mod friend;

/// Owner setup validation and engine
pub mod owner;

/// Tri-state probes
pub mod probes;

/// Probe requests and their tagged answers
pub mod requests;

/// Rescuer phase derivation, countdown and step engine
pub mod rescuer;

/// Enumeration of other rescuers
pub mod rescuers;

/// Async sessions driving an engine against a chain
pub mod session;

/// Read-only snapshots for presentation
pub mod view;

/// Withdrawal amount calculation
pub mod withdrawal;

pub use calls::RecoveryCall;
pub use constants::{RecoveryConfigReader, RecoveryConstants};
pub use friend::{decide_vouch, FriendVouchEngine, VouchOutcome, VouchStatus};
pub use owner::{OwnerEngine, OwnerSetup, ValidatedSetup};
pub use probes::active_recovery::{active_recovery_probe, query_active_recovery};
pub use probes::proxy::{is_proxy_of, proxy_probe, query_proxy};
pub use probes::recoverability::{query_recovery_config, recoverability_probe};
pub use probes::{
    ActiveRecoveryProbe, Probe, ProbeFailure, ProbeResponse, ProbeState, ProbeTicket, ProxyProbe,
    RecoverabilityProbe,
};
pub use requests::{ProbeEvent, ProbeRequest};
pub use rescuer::{derive_phase, remaining_blocks, PhaseInputs, RescuerPhase, RescuerStepEngine};
pub use rescuers::{query_other_rescuers, total_deposits, RescuerRecord};
pub use session::{
    FriendSession, OwnerSession, ProbeReducer, RecoverySession, RescuerSession,
};
pub use view::{FriendView, OwnerView, RescuerView};
pub use withdrawal::{compute as compute_withdrawal, WithdrawAmounts, WithdrawalInputs};
