//! Read-only snapshots handed to the presentation layer.
//!
//! Views are plain data: they serialize, they compare, and nothing in them
//! changes engine state.

use crate::friend::VouchStatus;
use crate::probes::{ProbeFailure, ProbeState};
use crate::rescuer::RescuerPhase;
use crate::rescuers::RescuerRecord;
use crate::withdrawal::WithdrawAmounts;
use rescue_core::{AccountId, ActiveRecoveryAttempt, Balance, BlockNumber, RecoveryConfig};
use serde::{Deserialize, Serialize};

/// State of a rescue as seen by the rescuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescuerView {
    /// Account being recovered
    pub lost: Option<AccountId>,
    /// Account recovering it
    pub rescuer: Option<AccountId>,
    /// Current step
    pub phase: RescuerPhase,
    /// Recovery config of the lost account
    pub recoverability: ProbeState<RecoveryConfig>,
    /// Attempt of the pair
    pub attempt: ProbeState<ActiveRecoveryAttempt>,
    /// Whether the rescuer already proxies the lost account
    pub is_proxy: Option<bool>,
    /// Latest block height
    pub block_height: Option<BlockNumber>,
    /// Blocks left on the delay
    pub remaining_blocks: Option<i64>,
    /// Seconds left on the local countdown
    pub countdown_secs: Option<u64>,
    /// Vouches collected
    pub vouchers: Option<usize>,
    /// Vouches required
    pub threshold: Option<u16>,
    /// Deposit reserved when initiating
    pub initiate_deposit: Option<Balance>,
    /// Whether the step's action is enabled
    pub can_proceed: bool,
    /// Whether an answer is still pending
    pub checking: bool,
    /// First probe failure, offered with a refresh
    pub error: Option<ProbeFailure>,
    /// Withdraw amounts, in the withdraw phase only
    pub amounts: Option<WithdrawAmounts>,
    /// Other rescuers of the lost account
    pub other_rescuers: Vec<RescuerRecord>,
}

/// State of a vouch as seen by a friend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendView {
    /// Friend using the engine
    pub caller: AccountId,
    /// Account being recovered
    pub lost: Option<AccountId>,
    /// Rescuer to vouch for
    pub rescuer: Option<AccountId>,
    /// Decision
    pub status: VouchStatus,
    /// Message for the decision
    pub message: String,
    /// Whether the vouch action is enabled
    pub can_vouch: bool,
    /// Whether an answer is still pending
    pub checking: bool,
    /// Vouches collected
    pub vouchers: Option<usize>,
    /// Vouches required
    pub threshold: Option<u16>,
}

/// Recovery setup as seen by the account owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerView {
    /// Owner account
    pub account: Option<AccountId>,
    /// Current recovery config
    pub recoverability: ProbeState<RecoveryConfig>,
    /// Reservation a new config with the proposed friends needs
    pub proposed_deposit: Option<Balance>,
    /// Whether a config can be created
    pub can_create: bool,
    /// Whether the config can be removed
    pub can_remove: bool,
    /// Whether an answer is still pending
    pub checking: bool,
    /// Probe failure, offered with a refresh
    pub error: Option<ProbeFailure>,
}
