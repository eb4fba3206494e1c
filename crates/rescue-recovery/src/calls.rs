//! Extrinsic descriptors produced by the trigger callbacks.
//!
//! The engines never sign or submit. Each trigger validates locally and
//! returns a [`RecoveryCall`] for the presentation layer to hand to the
//! wallet.

use rescue_core::{AccountId, BlockNumber};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A recovery-related call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum RecoveryCall {
    /// `recovery.create_recovery(friends, threshold, delay_period)`
    CreateRecovery {
        /// Sorted, unique friends
        friends: Vec<AccountId>,
        /// Vouches required
        threshold: u16,
        /// Delay in blocks
        delay_period: BlockNumber,
    },
    /// `recovery.remove_recovery()`
    RemoveRecovery,
    /// `recovery.initiate_recovery(account)`
    InitiateRecovery {
        /// Lost account
        account: AccountId,
    },
    /// `recovery.vouch_recovery(lost, rescuer)`
    VouchRecovery {
        /// Lost account
        lost: AccountId,
        /// Rescuer being vouched for
        rescuer: AccountId,
    },
    /// `recovery.claim_recovery(account)`
    ClaimRecovery {
        /// Lost account
        account: AccountId,
    },
    /// `recovery.close_recovery(rescuer)`, dispatched as the lost account
    CloseRecovery {
        /// Rescuer whose attempt is closed
        rescuer: AccountId,
    },
    /// `recovery.as_recovered(account, call)`
    AsRecovered {
        /// Account to act as
        account: AccountId,
        /// Inner call
        inner: Box<RecoveryCall>,
    },
    /// `staking.withdraw_unbonded(num_slashing_spans)`
    WithdrawUnbonded {
        /// Slashing span count
        num_slashing_spans: u32,
    },
    /// `balances.transfer_all(dest, keep_alive)`
    TransferAll {
        /// Recipient
        dest: AccountId,
        /// Keep the sender above the existential deposit
        keep_alive: bool,
    },
    /// `utility.batch_all(calls)`
    BatchAll {
        /// Calls dispatched atomically in order
        calls: Vec<RecoveryCall>,
    },
}

impl RecoveryCall {
    /// `pallet.call` name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateRecovery { .. } => "recovery.create_recovery",
            Self::RemoveRecovery => "recovery.remove_recovery",
            Self::InitiateRecovery { .. } => "recovery.initiate_recovery",
            Self::VouchRecovery { .. } => "recovery.vouch_recovery",
            Self::ClaimRecovery { .. } => "recovery.claim_recovery",
            Self::CloseRecovery { .. } => "recovery.close_recovery",
            Self::AsRecovered { .. } => "recovery.as_recovered",
            Self::WithdrawUnbonded { .. } => "staking.withdraw_unbonded",
            Self::TransferAll { .. } => "balances.transfer_all",
            Self::BatchAll { .. } => "utility.batch_all",
        }
    }

    /// Depth-first list of every call name, outermost first.
    pub fn flatten_names(&self) -> Vec<&'static str> {
        let mut names = vec![self.name()];
        match self {
            Self::AsRecovered { inner, .. } => names.extend(inner.flatten_names()),
            Self::BatchAll { calls } => {
                for call in calls {
                    names.extend(call.flatten_names());
                }
            }
            _ => {}
        }
        names
    }
}

impl fmt::Display for RecoveryCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AsRecovered { account, inner } => {
                write!(f, "{}({}, {})", self.name(), account.short(), inner)
            }
            Self::BatchAll { calls } => {
                write!(f, "{}[", self.name())?;
                for (index, call) in calls.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{call}")?;
                }
                write!(f, "]")
            }
            _ => write!(f, "{}", self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(seed: u8) -> AccountId {
        AccountId::new([seed; 32])
    }

    #[test]
    fn test_nested_as_recovered_serde_roundtrip() {
        let call = RecoveryCall::AsRecovered {
            account: account(1),
            inner: Box::new(RecoveryCall::BatchAll {
                calls: vec![
                    RecoveryCall::CloseRecovery {
                        rescuer: account(2),
                    },
                    RecoveryCall::RemoveRecovery,
                ],
            }),
        };

        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json["call"], "as_recovered");
        assert_eq!(json["inner"]["call"], "batch_all");
        assert_eq!(json["inner"]["calls"][1], serde_json::json!({"call": "remove_recovery"}));

        let back: RecoveryCall = serde_json::from_value(json).unwrap();
        assert_eq!(back, call);
    }

    #[test]
    fn test_display_names_nested_calls() {
        let call = RecoveryCall::AsRecovered {
            account: account(1),
            inner: Box::new(RecoveryCall::RemoveRecovery),
        };
        assert_eq!(
            call.to_string(),
            format!("recovery.as_recovered({}, recovery.remove_recovery)", account(1).short())
        );
    }
}
