//! Controllable chain double.
//!
//! `MockChain` answers [`ChainQueryEffects`] from a [`ChainSnapshot`] and
//! lets a test:
//! - hold answers for a target until it is released, to reorder responses
//! - inject failures per target
//! - count queries per target
//! - mutate chain state between reads (vouch, advance blocks, set proxy)
//!
//! # Blocking Lock Usage
//!
//! Uses `std::sync::Mutex`; the lock is never held across an await.

use async_trait::async_trait;
use rescue_core::{
    AccountId, ActiveRecoveryAttempt, Balance, BalanceSnapshot, BlockNumber, ChainConstant,
    ChainError, ChainQueryEffects, EraIndex, RecoveryConfig, RecoveryPair, SlashingSpans,
    StakingLedger, StorageKey, StoragePrefix,
};
use rescue_effects::ChainSnapshot;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// What a query reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryTarget {
    /// A single storage item
    Storage(StorageKey),
    /// A prefix scan
    Prefix(StoragePrefix),
    /// The current block height
    BlockHeight,
}

impl From<StorageKey> for QueryTarget {
    fn from(key: StorageKey) -> Self {
        Self::Storage(key)
    }
}

impl From<StoragePrefix> for QueryTarget {
    fn from(prefix: StoragePrefix) -> Self {
        Self::Prefix(prefix)
    }
}

/// Releases answers held by [`MockChain::hold`].
#[derive(Debug)]
pub struct Gate {
    open: watch::Sender<bool>,
}

impl Gate {
    /// Let every held and future query through.
    pub fn release(&self) {
        self.open.send_replace(true);
    }
}

#[derive(Debug, Default)]
struct MockChainState {
    snapshot: ChainSnapshot,
    gates: HashMap<QueryTarget, watch::Receiver<bool>>,
    failures: HashMap<QueryTarget, ChainError>,
    queries: HashMap<QueryTarget, usize>,
}

/// Chain double with gating and failure injection.
#[derive(Debug, Clone, Default)]
pub struct MockChain {
    state: Arc<Mutex<MockChainState>>,
}

impl MockChain {
    /// Empty chain at block 0 with no constants.
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain answering from `snapshot`.
    pub fn from_snapshot(snapshot: ChainSnapshot) -> Self {
        let chain = Self::new();
        chain.with_state(|state| state.snapshot = snapshot);
        chain
    }

    /// Copy of the current chain state.
    pub fn snapshot(&self) -> ChainSnapshot {
        self.with_state(|state| state.snapshot.clone())
    }

    /// Hold every answer for `target` until the returned gate is released.
    ///
    /// Queries still count as issued while held.
    pub fn hold(&self, target: impl Into<QueryTarget>) -> Gate {
        let (open, receiver) = watch::channel(false);
        self.with_state(|state| {
            state.gates.insert(target.into(), receiver);
        });
        Gate { open }
    }

    /// Fail every query for `target` with `error`.
    pub fn fail(&self, target: impl Into<QueryTarget>, error: ChainError) {
        self.with_state(|state| {
            state.failures.insert(target.into(), error);
        });
    }

    /// Stop failing queries for `target`.
    pub fn clear_failure(&self, target: impl Into<QueryTarget>) {
        self.with_state(|state| {
            state.failures.remove(&target.into());
        });
    }

    /// Number of queries issued for `target`.
    pub fn query_count(&self, target: impl Into<QueryTarget>) -> usize {
        let target = target.into();
        self.with_state(|state| state.queries.get(&target).copied().unwrap_or(0))
    }

    /// Store `config` as the recovery config of `account`.
    pub fn set_recovery_config(&self, account: AccountId, config: &RecoveryConfig) {
        self.set_record(StorageKey::Recoverable { account }, Some(config));
    }

    /// Remove the recovery config of `account`.
    pub fn remove_recovery_config(&self, account: AccountId) {
        self.set_record::<RecoveryConfig>(StorageKey::Recoverable { account }, None);
    }

    /// Store `attempt` for `pair`, or remove it.
    pub fn set_active_recovery(&self, pair: RecoveryPair, attempt: Option<&ActiveRecoveryAttempt>) {
        self.set_record(StorageKey::active_recovery(&pair), attempt);
    }

    /// Record a vouch by `friend` on the attempt of `pair`.
    ///
    /// Returns whether the voucher set grew; vouching twice is a no-op.
    pub fn vouch(&self, pair: RecoveryPair, friend: AccountId) -> bool {
        let key = StorageKey::active_recovery(&pair);
        self.with_state(|state| {
            let Some(value) = state.snapshot.get(&key).cloned() else {
                return false;
            };
            let Ok(mut attempt) = serde_json::from_value::<ActiveRecoveryAttempt>(value) else {
                return false;
            };
            let grew = attempt.friends.insert(friend);
            if grew {
                insert_record(&mut state.snapshot, key, &attempt);
            }
            grew
        })
    }

    /// Install `rescuer` as proxy of `lost`, or remove the proxy.
    pub fn set_proxy(&self, rescuer: AccountId, lost: Option<AccountId>) {
        self.set_record(StorageKey::Proxy { rescuer }, lost.as_ref());
    }

    /// Set the current block height.
    pub fn set_block_height(&self, height: BlockNumber) {
        self.with_state(|state| state.snapshot.set_block_height(height));
    }

    /// Advance the block height by `blocks`.
    pub fn advance_blocks(&self, blocks: BlockNumber) {
        self.with_state(|state| {
            let height = state.snapshot.block_height().saturating_add(blocks);
            state.snapshot.set_block_height(height);
        });
    }

    /// Store the balance of `account`.
    pub fn set_balance(&self, account: AccountId, balance: BalanceSnapshot) {
        self.set_record(StorageKey::Account { account }, Some(&balance));
    }

    /// Store the staking ledger of `stash`.
    pub fn set_ledger(&self, stash: AccountId, ledger: &StakingLedger) {
        self.set_record(StorageKey::StakingLedger { stash }, Some(ledger));
    }

    /// Set the current staking era.
    pub fn set_current_era(&self, era: EraIndex) {
        self.set_record(StorageKey::CurrentEra, Some(&era));
    }

    /// Store the slashing spans of `stash`.
    pub fn set_slashing_spans(&self, stash: AccountId, spans: &SlashingSpans) {
        self.set_record(StorageKey::SlashingSpans { stash }, Some(spans));
    }

    /// Set a protocol constant.
    pub fn set_constant(&self, constant: ChainConstant, value: impl Serialize) {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.with_state(|state| state.snapshot.set_constant(constant, value));
    }

    /// Set the four recovery constants.
    pub fn set_recovery_constants(
        &self,
        config_deposit_base: Balance,
        friend_deposit_factor: Balance,
        max_friends: u32,
        recovery_deposit: Balance,
    ) {
        self.set_constant(ChainConstant::ConfigDepositBase, config_deposit_base);
        self.set_constant(ChainConstant::FriendDepositFactor, friend_deposit_factor);
        self.set_constant(ChainConstant::MaxFriends, max_friends);
        self.set_constant(ChainConstant::RecoveryDeposit, recovery_deposit);
    }

    /// Store an arbitrary value, e.g. one with the wrong shape.
    pub fn set_raw(&self, key: StorageKey, value: Value) {
        self.with_state(|state| state.snapshot.insert_raw(key, value));
    }

    fn set_record<T: Serialize>(&self, key: StorageKey, record: Option<&T>) {
        self.with_state(|state| match record {
            Some(record) => insert_record(&mut state.snapshot, key, record),
            None => {
                state.snapshot.remove(&key);
            }
        });
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MockChainState) -> R) -> R {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut state)
    }

    /// Count the query, wait on its gate, then report an injected failure.
    async fn enter(&self, target: QueryTarget) -> Result<(), ChainError> {
        let gate = self.with_state(|state| {
            *state.queries.entry(target).or_default() += 1;
            state.gates.get(&target).cloned()
        });
        if let Some(mut gate) = gate {
            tracing::debug!(?target, "mock chain holding query");
            if gate.wait_for(|open| *open).await.is_err() {
                tracing::debug!(?target, "gate dropped, answering");
            }
        }
        match self.with_state(|state| state.failures.get(&target).cloned()) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn insert_record<T: Serialize>(snapshot: &mut ChainSnapshot, key: StorageKey, record: &T) {
    match serde_json::to_value(record) {
        Ok(value) => snapshot.insert_raw(key, value),
        Err(err) => tracing::error!(%key, error = %err, "could not encode mock record"),
    }
}

#[async_trait]
impl ChainQueryEffects for MockChain {
    async fn read_optional(&self, key: &StorageKey) -> Result<Option<Value>, ChainError> {
        self.enter(QueryTarget::Storage(*key)).await?;
        Ok(self.with_state(|state| state.snapshot.get(key).cloned()))
    }

    fn read_constant(&self, constant: ChainConstant) -> Result<Value, ChainError> {
        self.with_state(|state| state.snapshot.constant(constant).cloned())
            .ok_or_else(|| ChainError::UnknownConstant {
                name: constant.name().to_string(),
            })
    }

    async fn current_block_height(&self) -> Result<BlockNumber, ChainError> {
        self.enter(QueryTarget::BlockHeight).await?;
        Ok(self.with_state(|state| state.snapshot.block_height()))
    }

    async fn enumerate_entries(
        &self,
        prefix: &StoragePrefix,
    ) -> Result<Vec<(StorageKey, Option<Value>)>, ChainError> {
        self.enter(QueryTarget::Prefix(*prefix)).await?;
        Ok(self.with_state(|state| state.snapshot.entries_with_prefix(prefix)))
    }
}
