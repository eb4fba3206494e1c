//! Snapshot-backed chain handler.

use async_trait::async_trait;
use rescue_core::{
    BlockNumber, ChainConstant, ChainError, ChainQueryEffects, RescueError, StorageKey,
    StoragePrefix,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// One storage entry in the on-disk snapshot format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageEntry {
    /// Structured key
    pub key: StorageKey,
    /// Stored value
    pub value: Value,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotDocument {
    #[serde(default)]
    block_height: BlockNumber,
    #[serde(default)]
    constants: BTreeMap<ChainConstant, Value>,
    #[serde(default)]
    entries: Vec<StorageEntry>,
}

/// In-memory image of the chain state the engines read.
///
/// Serialized as `{ "blockHeight", "constants", "entries": [{key, value}] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "SnapshotDocument", into = "SnapshotDocument")]
pub struct ChainSnapshot {
    block_height: BlockNumber,
    constants: BTreeMap<ChainConstant, Value>,
    storage: BTreeMap<StorageKey, Value>,
}

impl From<SnapshotDocument> for ChainSnapshot {
    fn from(doc: SnapshotDocument) -> Self {
        Self {
            block_height: doc.block_height,
            constants: doc.constants,
            storage: doc
                .entries
                .into_iter()
                .map(|entry| (entry.key, entry.value))
                .collect(),
        }
    }
}

impl From<ChainSnapshot> for SnapshotDocument {
    fn from(snapshot: ChainSnapshot) -> Self {
        Self {
            block_height: snapshot.block_height,
            constants: snapshot.constants,
            entries: snapshot
                .storage
                .into_iter()
                .map(|(key, value)| StorageEntry { key, value })
                .collect(),
        }
    }
}

impl ChainSnapshot {
    /// Empty snapshot at block 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the JSON snapshot format.
    pub fn from_json_str(json: &str) -> Result<Self, RescueError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON snapshot file.
    pub fn load(path: &Path) -> Result<Self, RescueError> {
        let content = std::fs::read_to_string(path)?;
        let snapshot = Self::from_json_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            entries = snapshot.storage.len(),
            block = snapshot.block_height,
            "loaded chain snapshot"
        );
        Ok(snapshot)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, RescueError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Current block height.
    pub fn block_height(&self) -> BlockNumber {
        self.block_height
    }

    /// Set the block height.
    pub fn set_block_height(&mut self, height: BlockNumber) {
        self.block_height = height;
    }

    /// Raw value under `key`.
    pub fn get(&self, key: &StorageKey) -> Option<&Value> {
        self.storage.get(key)
    }

    /// Store a raw value.
    pub fn insert_raw(&mut self, key: StorageKey, value: Value) {
        self.storage.insert(key, value);
    }

    /// Store a typed record.
    pub fn insert<T: Serialize>(&mut self, key: StorageKey, record: &T) -> Result<(), RescueError> {
        let value = serde_json::to_value(record)?;
        self.storage.insert(key, value);
        Ok(())
    }

    /// Remove an entry, returning the previous value.
    pub fn remove(&mut self, key: &StorageKey) -> Option<Value> {
        self.storage.remove(key)
    }

    /// Entries under `prefix`, in key order.
    pub fn entries_with_prefix(&self, prefix: &StoragePrefix) -> Vec<(StorageKey, Option<Value>)> {
        self.storage
            .iter()
            .filter(|(key, _)| prefix.matches(key))
            .map(|(key, value)| (*key, Some(value.clone())))
            .collect()
    }

    /// Raw constant value.
    pub fn constant(&self, constant: ChainConstant) -> Option<&Value> {
        self.constants.get(&constant)
    }

    /// Set a constant.
    pub fn set_constant(&mut self, constant: ChainConstant, value: Value) {
        self.constants.insert(constant, value);
    }

    /// Number of storage entries.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Whether no storage entries exist.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

/// Read-only chain handler over a [`ChainSnapshot`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryChainHandler {
    snapshot: ChainSnapshot,
}

impl InMemoryChainHandler {
    /// Wrap a snapshot.
    pub fn new(snapshot: ChainSnapshot) -> Self {
        Self { snapshot }
    }

    /// Load a JSON snapshot file.
    pub fn from_file(path: &Path) -> Result<Self, RescueError> {
        Ok(Self::new(ChainSnapshot::load(path)?))
    }

    /// Underlying snapshot.
    pub fn snapshot(&self) -> &ChainSnapshot {
        &self.snapshot
    }
}

#[async_trait]
impl ChainQueryEffects for InMemoryChainHandler {
    async fn read_optional(&self, key: &StorageKey) -> Result<Option<Value>, ChainError> {
        Ok(self.snapshot.get(key).cloned())
    }

    fn read_constant(&self, constant: ChainConstant) -> Result<Value, ChainError> {
        self.snapshot
            .constant(constant)
            .cloned()
            .ok_or_else(|| ChainError::UnknownConstant {
                name: constant.name().to_string(),
            })
    }

    async fn current_block_height(&self) -> Result<BlockNumber, ChainError> {
        Ok(self.snapshot.block_height())
    }

    async fn enumerate_entries(
        &self,
        prefix: &StoragePrefix,
    ) -> Result<Vec<(StorageKey, Option<Value>)>, ChainError> {
        Ok(self.snapshot.entries_with_prefix(prefix))
    }
}
