//! Chain query effect trait.
//!
//! The chain client is a supplied capability. Rescue only needs four
//! primitives from it: a single-shot optional-record read, a constant read,
//! the current block height, and a prefix scan. Storage keys are structured
//! values; handlers are responsible for encoding them for their transport and
//! for decoding scanned keys back into [`StorageKey`]s.
//!
//! Values travel as `serde_json::Value` and are decoded into the typed
//! records of [`crate::types`] with [`read_decoded`].

use crate::identifiers::{AccountId, RecoveryPair};
use crate::types::BlockNumber;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Error type for chain queries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum ChainError {
    /// The query was rejected by the transport
    #[error("Chain query failed: {reason}")]
    Network {
        /// Transport message describing the rejection
        reason: String,
    },

    /// A value came back in an unexpected shape
    #[error("Failed to decode {item}: {reason}")]
    Decode {
        /// Storage item or constant that failed to decode
        item: String,
        /// Decoder message describing the mismatch
        reason: String,
    },

    /// The runtime does not expose the requested constant
    #[error("Unknown constant: {name}")]
    UnknownConstant {
        /// Pallet-qualified constant name
        name: String,
    },
}

impl ChainError {
    /// Create a network error
    pub fn network(reason: impl Into<String>) -> Self {
        Self::Network {
            reason: reason.into(),
        }
    }

    /// Create a decode error for a storage item
    pub fn decode(item: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            item: item.into(),
            reason: reason.into(),
        }
    }

    /// Network failures may succeed on a manual refresh; nothing else will.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Whether this is a payload shape mismatch.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

impl From<ChainError> for crate::RescueError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::Network { reason } => Self::network(reason),
            ChainError::Decode { item, reason } => Self::decode(format!("{item}: {reason}")),
            ChainError::UnknownConstant { name } => {
                Self::not_found(format!("constant {name} is not exposed by the runtime"))
            }
        }
    }
}

/// Structured storage key.
///
/// Each variant names one storage item and carries its key parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "item", rename_all = "snake_case")]
pub enum StorageKey {
    /// `Recovery.Recoverable(account)`: the owner's recovery config
    Recoverable { account: AccountId },
    /// `Recovery.ActiveRecoveries(lost, rescuer)`: an in-progress rescue
    ActiveRecovery { lost: AccountId, rescuer: AccountId },
    /// `Recovery.Proxy(rescuer)`: the account a rescuer may act for
    Proxy { rescuer: AccountId },
    /// `System.Account(account)`: balance snapshot
    Account { account: AccountId },
    /// `Staking.Ledger(stash)`: staking ledger
    StakingLedger { stash: AccountId },
    /// `Staking.CurrentEra`: current era index
    CurrentEra,
    /// `Staking.SlashingSpans(stash)`: slashing spans
    SlashingSpans { stash: AccountId },
}

impl StorageKey {
    /// Key for the active recovery of a pair.
    pub fn active_recovery(pair: &RecoveryPair) -> Self {
        Self::ActiveRecovery {
            lost: pair.lost,
            rescuer: pair.rescuer,
        }
    }

    /// `Pallet.Item` name for logs and error messages.
    pub fn item_name(&self) -> &'static str {
        match self {
            Self::Recoverable { .. } => "Recovery.Recoverable",
            Self::ActiveRecovery { .. } => "Recovery.ActiveRecoveries",
            Self::Proxy { .. } => "Recovery.Proxy",
            Self::Account { .. } => "System.Account",
            Self::StakingLedger { .. } => "Staking.Ledger",
            Self::CurrentEra => "Staking.CurrentEra",
            Self::SlashingSpans { .. } => "Staking.SlashingSpans",
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recoverable { account }
            | Self::Account { account }
            | Self::StakingLedger { stash: account }
            | Self::SlashingSpans { stash: account }
            | Self::Proxy { rescuer: account } => {
                write!(f, "{}({})", self.item_name(), account.short())
            }
            Self::ActiveRecovery { lost, rescuer } => {
                write!(f, "{}({}, {})", self.item_name(), lost.short(), rescuer.short())
            }
            Self::CurrentEra => write!(f, "{}", self.item_name()),
        }
    }
}

/// Prefix of a storage map, for scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "item", rename_all = "snake_case")]
pub enum StoragePrefix {
    /// Every `Recovery.ActiveRecoveries(lost, _)` entry
    ActiveRecoveries { lost: AccountId },
}

impl StoragePrefix {
    /// Whether `key` lies under this prefix.
    pub fn matches(&self, key: &StorageKey) -> bool {
        match (self, key) {
            (Self::ActiveRecoveries { lost }, StorageKey::ActiveRecovery { lost: other, .. }) => {
                lost == other
            }
            _ => false,
        }
    }
}

impl fmt::Display for StoragePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ActiveRecoveries { lost } => {
                write!(f, "Recovery.ActiveRecoveries({}, *)", lost.short())
            }
        }
    }
}

/// Protocol constants of the recovery pallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainConstant {
    /// Base reservation for creating a recovery config
    ConfigDepositBase,
    /// Additional reservation per friend
    FriendDepositFactor,
    /// Maximum number of friends in a config
    MaxFriends,
    /// Reservation a rescuer makes to initiate a recovery
    RecoveryDeposit,
}

impl ChainConstant {
    /// `pallet.constant` name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConfigDepositBase => "recovery.configDepositBase",
            Self::FriendDepositFactor => "recovery.friendDepositFactor",
            Self::MaxFriends => "recovery.maxFriends",
            Self::RecoveryDeposit => "recovery.recoveryDeposit",
        }
    }
}

/// Query primitives supplied by the chain client.
///
/// Every async method is single-shot: no retries, no subscriptions. Callers
/// tag requests themselves and discard stale answers.
#[async_trait]
pub trait ChainQueryEffects: Send + Sync {
    /// Read a storage item that may be absent.
    async fn read_optional(&self, key: &StorageKey) -> Result<Option<Value>, ChainError>;

    /// Read a runtime constant. Clients cache constants per connection, so
    /// this is synchronous.
    fn read_constant(&self, constant: ChainConstant) -> Result<Value, ChainError>;

    /// Current best block height.
    async fn current_block_height(&self) -> Result<BlockNumber, ChainError>;

    /// Scan every entry under `prefix`, with keys decoded back into
    /// structured form.
    async fn enumerate_entries(
        &self,
        prefix: &StoragePrefix,
    ) -> Result<Vec<(StorageKey, Option<Value>)>, ChainError>;
}

/// Blanket implementation for Arc<T> where T: ChainQueryEffects
#[async_trait]
impl<T: ChainQueryEffects + ?Sized> ChainQueryEffects for std::sync::Arc<T> {
    async fn read_optional(&self, key: &StorageKey) -> Result<Option<Value>, ChainError> {
        (**self).read_optional(key).await
    }

    fn read_constant(&self, constant: ChainConstant) -> Result<Value, ChainError> {
        (**self).read_constant(constant)
    }

    async fn current_block_height(&self) -> Result<BlockNumber, ChainError> {
        (**self).current_block_height().await
    }

    async fn enumerate_entries(
        &self,
        prefix: &StoragePrefix,
    ) -> Result<Vec<(StorageKey, Option<Value>)>, ChainError> {
        (**self).enumerate_entries(prefix).await
    }
}

/// Decode a storage value into `T`, attributing failures to `item`.
pub fn decode_value<T: DeserializeOwned>(item: &str, value: Value) -> Result<T, ChainError> {
    serde_json::from_value(value).map_err(|e| ChainError::decode(item, e.to_string()))
}

/// Read an optional storage item and decode it.
pub async fn read_decoded<C, T>(chain: &C, key: &StorageKey) -> Result<Option<T>, ChainError>
where
    C: ChainQueryEffects + ?Sized,
    T: DeserializeOwned,
{
    match chain.read_optional(key).await? {
        Some(value) => decode_value(key.item_name(), value).map(Some),
        None => Ok(None),
    }
}

/// Read a constant and decode it.
pub fn read_constant_decoded<C, T>(chain: &C, constant: ChainConstant) -> Result<T, ChainError>
where
    C: ChainQueryEffects + ?Sized,
    T: DeserializeOwned,
{
    decode_value(constant.name(), chain.read_constant(constant)?)
}
