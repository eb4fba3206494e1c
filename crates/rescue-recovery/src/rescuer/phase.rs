//! Rescuer phase derivation.
//!
//! [`derive_phase`] is a pure function of the latest probe results. The
//! engine combines it with the phase it already holds: the result only ever
//! moves forward within a session, and a failed input freezes it.

use crate::probes::ProbeState;
use rescue_core::{ActiveRecoveryAttempt, BlockNumber, RecoveryConfig};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Step of a rescue, strictly ordered.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RescuerPhase {
    /// No attempt exists yet
    #[default]
    Initiate,
    /// Attempt exists; collecting vouches and waiting out the delay
    Wait,
    /// Recovery can be claimed, or already has been
    Withdraw,
}

impl fmt::Display for RescuerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initiate => "initiate",
            Self::Wait => "wait",
            Self::Withdraw => "withdraw",
        };
        f.write_str(name)
    }
}

/// Probe results the phase depends on.
#[derive(Debug, Clone, Copy)]
pub struct PhaseInputs<'a> {
    /// Recovery config of the lost account
    pub config: &'a ProbeState<RecoveryConfig>,
    /// Attempt of the (lost, rescuer) pair
    pub attempt: &'a ProbeState<ActiveRecoveryAttempt>,
    /// Whether the rescuer already proxies the lost account
    pub is_proxy: Option<bool>,
    /// Latest known block height
    pub block_height: Option<BlockNumber>,
}

/// Blocks left before the attempt's delay has elapsed.
///
/// Negative once the delay is over.
pub fn remaining_blocks(created: BlockNumber, delay: BlockNumber, height: BlockNumber) -> i64 {
    i64::from(created) + i64::from(delay) - i64::from(height)
}

/// Remaining blocks for the current inputs, once attempt, config and block
/// height are all known.
pub fn remaining_for(inputs: &PhaseInputs<'_>) -> Option<i64> {
    let attempt = inputs.attempt.present()?;
    let config = inputs.config.present()?;
    let height = inputs.block_height?;
    Some(remaining_blocks(attempt.created, config.delay_period, height))
}

/// Phase implied by the inputs alone.
pub fn derive_phase(inputs: &PhaseInputs<'_>) -> RescuerPhase {
    if inputs.is_proxy == Some(true) {
        return RescuerPhase::Withdraw;
    }

    let Some(attempt) = inputs.attempt.present() else {
        return RescuerPhase::Initiate;
    };

    let threshold_met = inputs
        .config
        .present()
        .is_some_and(|config| attempt.voucher_count() >= usize::from(config.threshold));
    let delay_elapsed = remaining_for(inputs).is_some_and(|remaining| remaining <= 0);

    if threshold_met && delay_elapsed {
        RescuerPhase::Withdraw
    } else {
        RescuerPhase::Wait
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rescue_core::{AccountId, FriendSet};

    fn friend(seed: u8) -> AccountId {
        AccountId::new([seed; 32])
    }

    fn config(threshold: u16, delay: BlockNumber) -> ProbeState<RecoveryConfig> {
        ProbeState::Present(RecoveryConfig {
            delay_period: delay,
            deposit: 10,
            friends: FriendSet::new(vec![friend(1), friend(2), friend(3)]),
            threshold,
        })
    }

    fn attempt(created: BlockNumber, vouchers: &[u8]) -> ProbeState<ActiveRecoveryAttempt> {
        ProbeState::Present(ActiveRecoveryAttempt {
            created,
            deposit: 5,
            friends: vouchers.iter().map(|seed| friend(*seed)).collect(),
        })
    }

    #[test]
    fn test_phase_order() {
        assert!(RescuerPhase::Initiate < RescuerPhase::Wait);
        assert!(RescuerPhase::Wait < RescuerPhase::Withdraw);
    }

    #[test]
    fn test_no_attempt_is_initiate() {
        let config = config(2, 10);
        let inputs = PhaseInputs {
            config: &config,
            attempt: &ProbeState::Absent,
            is_proxy: Some(false),
            block_height: Some(100),
        };
        assert_eq!(derive_phase(&inputs), RescuerPhase::Initiate);
    }

    #[test]
    fn test_expired_timer_below_threshold_waits() {
        let config = config(2, 10);
        let attempt = attempt(90, &[1]);
        let inputs = PhaseInputs {
            config: &config,
            attempt: &attempt,
            is_proxy: Some(false),
            block_height: Some(100),
        };
        assert_eq!(remaining_for(&inputs), Some(0));
        assert_eq!(derive_phase(&inputs), RescuerPhase::Wait);
    }

    #[test]
    fn test_threshold_met_timer_running_waits() {
        let config = config(2, 110);
        let attempt = attempt(90, &[1, 2]);
        let inputs = PhaseInputs {
            config: &config,
            attempt: &attempt,
            is_proxy: Some(false),
            block_height: Some(100),
        };
        assert_eq!(remaining_for(&inputs), Some(100));
        assert_eq!(derive_phase(&inputs), RescuerPhase::Wait);
    }

    #[test]
    fn test_threshold_and_timer_withdraw() {
        let config = config(2, 10);
        let attempt = attempt(90, &[1, 2]);
        let inputs = PhaseInputs {
            config: &config,
            attempt: &attempt,
            is_proxy: Some(false),
            block_height: Some(120),
        };
        assert_eq!(derive_phase(&inputs), RescuerPhase::Withdraw);
    }

    #[test]
    fn test_unknown_height_never_withdraws_by_timer() {
        let config = config(1, 0);
        let attempt = attempt(0, &[1]);
        let inputs = PhaseInputs {
            config: &config,
            attempt: &attempt,
            is_proxy: None,
            block_height: None,
        };
        assert_eq!(derive_phase(&inputs), RescuerPhase::Wait);
    }

    #[test]
    fn test_proxy_short_circuits_everything() {
        let inputs = PhaseInputs {
            config: &ProbeState::Unknown,
            attempt: &ProbeState::Absent,
            is_proxy: Some(true),
            block_height: None,
        };
        assert_eq!(derive_phase(&inputs), RescuerPhase::Withdraw);
    }

    proptest! {
        #[test]
        fn prop_remaining_strictly_decreases(
            created in 0u32..1_000_000,
            delay in 0u32..1_000_000,
            height in 0u32..1_000_000,
            step in 1u32..1_000,
        ) {
            prop_assert!(
                remaining_blocks(created, delay, height + step)
                    < remaining_blocks(created, delay, height)
            );
        }
    }
}
