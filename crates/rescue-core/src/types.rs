//! On-chain record types read by the recovery engines.
//!
//! Field names follow the JSON shape the chain client hands back
//! (camelCase), so records decode straight from storage values.

use crate::identifiers::AccountId;
use serde::{Deserialize, Serialize};

/// Token amount in the chain's smallest unit.
pub type Balance = u128;

/// Block height.
pub type BlockNumber = u32;

/// Staking era index.
pub type EraIndex = u32;

/// Ordered, duplicate-free set of friend accounts.
///
/// The recovery pallet keeps friends sorted so membership checks are binary
/// searches. Construction and deserialization both normalize, so a
/// `FriendSet` is always sorted and unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<AccountId>", into = "Vec<AccountId>")]
pub struct FriendSet {
    friends: Vec<AccountId>,
}

impl FriendSet {
    /// Create from any list of accounts, sorting and dropping duplicates.
    pub fn new(mut friends: Vec<AccountId>) -> Self {
        friends.sort_unstable();
        friends.dedup();
        Self { friends }
    }

    /// Number of friends.
    pub fn len(&self) -> usize {
        self.friends.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.friends.is_empty()
    }

    /// Membership check.
    pub fn contains(&self, account: &AccountId) -> bool {
        self.friends.binary_search(account).is_ok()
    }

    /// Insert an account. Returns `false` if it was already present.
    pub fn insert(&mut self, account: AccountId) -> bool {
        match self.friends.binary_search(&account) {
            Ok(_) => false,
            Err(pos) => {
                self.friends.insert(pos, account);
                true
            }
        }
    }

    /// Iterate in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &AccountId> {
        self.friends.iter()
    }

    /// Sorted slice view.
    pub fn as_slice(&self) -> &[AccountId] {
        &self.friends
    }
}

impl From<Vec<AccountId>> for FriendSet {
    fn from(friends: Vec<AccountId>) -> Self {
        Self::new(friends)
    }
}

impl From<FriendSet> for Vec<AccountId> {
    fn from(set: FriendSet) -> Self {
        set.friends
    }
}

impl FromIterator<AccountId> for FriendSet {
    fn from_iter<I: IntoIterator<Item = AccountId>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a FriendSet {
    type Item = &'a AccountId;
    type IntoIter = std::slice::Iter<'a, AccountId>;

    fn into_iter(self) -> Self::IntoIter {
        self.friends.iter()
    }
}

/// The owner's on-chain recovery policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryConfig {
    /// Blocks that must elapse after initiation before the rescue can be claimed
    pub delay_period: BlockNumber,
    /// Amount the owner reserved when configuring recovery
    pub deposit: Balance,
    /// Accounts allowed to vouch
    pub friends: FriendSet,
    /// Vouches required before the rescue can be claimed
    pub threshold: u16,
}

impl RecoveryConfig {
    /// Whether `account` may vouch for rescues of this account.
    pub fn is_friend(&self, account: &AccountId) -> bool {
        self.friends.contains(account)
    }
}

/// An in-progress rescue for one (lost, rescuer) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveRecoveryAttempt {
    /// Block at which the rescuer initiated recovery
    pub created: BlockNumber,
    /// Amount the rescuer reserved to initiate
    pub deposit: Balance,
    /// Friends that have vouched so far
    pub friends: FriendSet,
}

impl ActiveRecoveryAttempt {
    /// Number of vouches collected. This is the only voucher count the
    /// engines trust.
    pub fn voucher_count(&self) -> usize {
        self.friends.len()
    }

    /// Whether `friend` has already vouched.
    pub fn has_vouched(&self, friend: &AccountId) -> bool {
        self.friends.contains(friend)
    }
}

/// Balance snapshot of an account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSnapshot {
    /// Free balance
    pub free: Balance,
    /// Reserved balance (recovery deposits live here)
    pub reserved: Balance,
    /// Portion of `free` locked by staking, vesting and similar
    #[serde(default)]
    pub frozen: Balance,
}

impl BalanceSnapshot {
    /// Free balance not held by any lock.
    pub fn available(&self) -> Balance {
        self.free.saturating_sub(self.frozen)
    }
}

/// A chunk of stake scheduled to unlock at `era`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockChunk {
    /// Amount unlocking
    pub value: Balance,
    /// Era at which the chunk becomes redeemable
    pub era: EraIndex,
}

/// Staking ledger of a stash account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakingLedger {
    /// Stash account owning the bond
    pub stash: AccountId,
    /// Total bonded, including unlocking chunks
    pub total: Balance,
    /// Actively bonded amount
    pub active: Balance,
    /// Chunks scheduled to unlock
    #[serde(default)]
    pub unlocking: Vec<UnlockChunk>,
}

/// Slashing spans recorded for a stash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlashingSpans {
    /// Index of the current span
    pub span_index: u32,
    /// Era the current span started
    pub last_start: EraIndex,
    /// Last era with a non-zero slash
    #[serde(default)]
    pub last_nonzero_slash: EraIndex,
    /// Start eras of prior spans
    #[serde(default)]
    pub prior: Vec<EraIndex>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(seed: u8) -> AccountId {
        AccountId::new([seed; 32])
    }

    #[test]
    fn test_friend_set_normalizes() {
        let set = FriendSet::new(vec![account(3), account(1), account(3), account(2)]);
        assert_eq!(set.len(), 3);
        assert_eq!(set.as_slice(), &[account(1), account(2), account(3)]);
    }

    #[test]
    fn test_friend_set_insert_is_idempotent() {
        let mut set = FriendSet::default();
        assert!(set.insert(account(5)));
        assert!(!set.insert(account(5)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_friend_set_deserialize_normalizes() {
        let json = serde_json::to_string(&vec![account(9), account(4), account(9)]).unwrap();
        let set: FriendSet = serde_json::from_str(&json).unwrap();
        assert_eq!(set.as_slice(), &[account(4), account(9)]);
    }

    #[test]
    fn test_recovery_config_decodes_camel_case() {
        let json = serde_json::json!({
            "delayPeriod": 10,
            "deposit": 500,
            "friends": [account(2).to_string(), account(1).to_string()],
            "threshold": 2,
        });
        let config: RecoveryConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.delay_period, 10);
        assert!(config.is_friend(&account(1)));
        assert!(!config.is_friend(&account(3)));
    }

    #[test]
    fn test_available_never_underflows() {
        let snapshot = BalanceSnapshot {
            free: 10,
            reserved: 0,
            frozen: 25,
        };
        assert_eq!(snapshot.available(), 0);
    }
}
