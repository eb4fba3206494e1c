//! Whether a friend may vouch, as a pure function of probe results.

use crate::probes::{ProbeFailure, ProbeState};
use rescue_core::{AccountId, ActiveRecoveryAttempt, RecoveryConfig};
use serde::{Deserialize, Serialize};

/// Outcome of the vouch decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VouchStatus {
    /// An input is still being read
    Checking,
    /// An input could not be read
    Failed {
        /// Failure of the probe that blocked the decision
        failure: ProbeFailure,
    },
    /// The lost account has no recovery config
    NotRecoverable,
    /// The caller is not in the config's friend set
    NotAFriend,
    /// The caller is a friend but no rescuer is selected
    AwaitingRescuer,
    /// The selected rescuer has no attempt on the lost account
    NotInitiated,
    /// The caller already vouched for this attempt
    AlreadyVouched,
    /// The caller may vouch
    Ready,
}

impl VouchStatus {
    /// Whether the vouch action is enabled.
    pub fn can_vouch(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Whether the caller's vouch is already recorded.
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::AlreadyVouched)
    }

    /// Message for the presentation layer.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Checking => "checking...",
            Self::Failed { .. } => "could not read recovery state, refresh to retry",
            Self::NotRecoverable => "this account is not recoverable",
            Self::NotAFriend => "you are not registered as a friend of this account",
            Self::AwaitingRescuer => "select the rescuer to vouch for",
            Self::NotInitiated => "recovery was not initiated by this rescuer",
            Self::AlreadyVouched => "you have already vouched for this rescuer",
            Self::Ready => "you can vouch for this rescuer",
        }
    }
}

/// Decide whether `caller` may vouch.
///
/// `attempt` is only consulted once a rescuer is selected; pass the probe
/// state for the selected pair.
pub fn decide_vouch(
    recoverability: &ProbeState<RecoveryConfig>,
    attempt: &ProbeState<ActiveRecoveryAttempt>,
    caller: &AccountId,
    rescuer: Option<&AccountId>,
) -> VouchStatus {
    let config = match recoverability {
        ProbeState::Unknown => return VouchStatus::Checking,
        ProbeState::Failed(failure) => {
            return VouchStatus::Failed {
                failure: failure.clone(),
            }
        }
        ProbeState::Absent => return VouchStatus::NotRecoverable,
        ProbeState::Present(config) => config,
    };
    if !config.is_friend(caller) {
        return VouchStatus::NotAFriend;
    }
    if rescuer.is_none() {
        return VouchStatus::AwaitingRescuer;
    }
    match attempt {
        ProbeState::Unknown => VouchStatus::Checking,
        ProbeState::Failed(failure) => VouchStatus::Failed {
            failure: failure.clone(),
        },
        ProbeState::Absent => VouchStatus::NotInitiated,
        ProbeState::Present(attempt) if attempt.has_vouched(caller) => VouchStatus::AlreadyVouched,
        ProbeState::Present(_) => VouchStatus::Ready,
    }
}
