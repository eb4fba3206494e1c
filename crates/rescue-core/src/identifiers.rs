//! Account identifiers.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 32-byte on-chain account identifier.
///
/// Rendered as `0x`-prefixed lowercase hex. Parsing accepts the prefix as
/// optional.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AccountId([u8; 32]);

impl AccountId {
    /// Wrap raw public key bytes.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Shortened form for log lines (`0x1234…cdef`).
    pub fn short(&self) -> String {
        let full = hex::encode(self.0);
        format!("0x{}…{}", &full[..4], &full[full.len() - 4..])
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.short())
    }
}

/// Error returned when parsing an [`AccountId`] from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseAccountIdError {
    /// Input was not valid hex
    #[error("account id is not valid hex: {0}")]
    InvalidHex(String),
    /// Input decoded to the wrong number of bytes
    #[error("account id must be 32 bytes, got {0}")]
    InvalidLength(usize),
}

impl FromStr for AccountId {
    type Err = ParseAccountIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes =
            hex::decode(digits).map_err(|e| ParseAccountIdError::InvalidHex(e.to_string()))?;
        let len = bytes.len();
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ParseAccountIdError::InvalidLength(len))?;
        Ok(Self(array))
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The (lost account, rescuer account) pair a rescue is scoped to.
///
/// At most one active recovery attempt exists on chain per pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecoveryPair {
    /// Account being recovered
    pub lost: AccountId,
    /// Account attempting the recovery
    pub rescuer: AccountId,
}

impl RecoveryPair {
    /// Build a pair.
    pub fn new(lost: AccountId, rescuer: AccountId) -> Self {
        Self { lost, rescuer }
    }

    /// Build a pair only when both sides are resolved.
    pub fn resolve(lost: Option<AccountId>, rescuer: Option<AccountId>) -> Option<Self> {
        Some(Self::new(lost?, rescuer?))
    }
}

impl fmt::Display for RecoveryPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <- {}", self.lost.short(), self.rescuer.short())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_parse_roundtrip() {
        let id = AccountId::new([0xab; 32]);
        let text = id.to_string();
        assert!(text.starts_with("0xabab"));
        assert_eq!(text.parse::<AccountId>().unwrap(), id);
    }

    #[test]
    fn test_parse_without_prefix() {
        let digits = "11".repeat(32);
        assert_eq!(
            digits.parse::<AccountId>().unwrap(),
            AccountId::new([0x11; 32])
        );
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert_eq!(
            "0x1234".parse::<AccountId>(),
            Err(ParseAccountIdError::InvalidLength(2))
        );
        assert!(matches!(
            "0xzz".parse::<AccountId>(),
            Err(ParseAccountIdError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_serde_as_string() {
        let id = AccountId::new([7; 32]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let back: AccountId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_pair_requires_both_sides() {
        let a = AccountId::new([1; 32]);
        assert!(RecoveryPair::resolve(Some(a), None).is_none());
        assert!(RecoveryPair::resolve(None, Some(a)).is_none());
        assert!(RecoveryPair::resolve(Some(a), Some(a)).is_some());
    }
}
