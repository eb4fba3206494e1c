//! Tagged, tri-state probes over optional on-chain records.
//!
//! A [`Probe`] tracks one optional record for the key currently selected by
//! its owner. Selecting a new key invalidates the probe to
//! [`ProbeState::Unknown`] immediately and hands back a [`ProbeTicket`]. The
//! ticket is carried by the async query and returned inside a
//! [`ProbeResponse`]; [`Probe::apply`] drops any response whose ticket no
//! longer matches the current key and generation. Responses are never
//! aborted, only ignored.
//!
//! Outcome mapping at the probe boundary:
//!
//! | Query outcome            | Probe state        |
//! |--------------------------|--------------------|
//! | `Ok(None)`               | `Absent`           |
//! | `Ok(Some(record))`       | `Present(record)`  |
//! | `Err(Decode)`            | `Unknown` (logged) |
//! | `Err(Network)` and other | `Failed`           |

pub mod active_recovery;
pub mod proxy;
pub mod recoverability;

pub use active_recovery::ActiveRecoveryProbe;
pub use proxy::ProxyProbe;
pub use recoverability::RecoverabilityProbe;

use rescue_core::ChainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a probe could not reach a definitive answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeFailure {
    /// Human-readable cause
    pub reason: String,
    /// Whether a manual refresh may help
    pub retryable: bool,
}

impl From<&ChainError> for ProbeFailure {
    fn from(err: &ChainError) -> Self {
        Self {
            reason: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

/// Result of probing an optional on-chain record.
///
/// `Unknown` means "not asked yet or still in flight". It is never the same
/// as `Absent`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum ProbeState<T> {
    /// Query not issued or not yet answered
    #[default]
    Unknown,
    /// The record definitively does not exist
    Absent,
    /// The record exists
    Present(T),
    /// The query was rejected
    Failed(ProbeFailure),
}

impl<T> ProbeState<T> {
    /// Whether a definitive answer (`Present` or `Absent`) is known.
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Present(_) | Self::Absent)
    }

    /// Whether the record definitively does not exist.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Whether the last query was rejected.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Whether the answer is still pending.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// The record, if present.
    pub fn present(&self) -> Option<&T> {
        match self {
            Self::Present(value) => Some(value),
            _ => None,
        }
    }

    /// Failure details, if failed.
    pub fn failure(&self) -> Option<&ProbeFailure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// Borrowing view.
    pub fn as_ref(&self) -> ProbeState<&T> {
        match self {
            Self::Unknown => ProbeState::Unknown,
            Self::Absent => ProbeState::Absent,
            Self::Present(value) => ProbeState::Present(value),
            Self::Failed(failure) => ProbeState::Failed(failure.clone()),
        }
    }

    /// Map the payload.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ProbeState<U> {
        match self {
            Self::Unknown => ProbeState::Unknown,
            Self::Absent => ProbeState::Absent,
            Self::Present(value) => ProbeState::Present(f(value)),
            Self::Failed(failure) => ProbeState::Failed(failure),
        }
    }
}

/// Tag attached to an in-flight query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProbeTicket<K> {
    /// Key the query was issued for
    pub key: K,
    /// Probe generation at issue time
    pub generation: u64,
}

/// A tagged query answer.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResponse<K, T> {
    /// Ticket the query was issued with
    pub ticket: ProbeTicket<K>,
    /// What the chain said
    pub outcome: Result<Option<T>, ChainError>,
}

impl<K, T> ProbeResponse<K, T> {
    /// Pair a ticket with a query outcome.
    pub fn new(ticket: ProbeTicket<K>, outcome: Result<Option<T>, ChainError>) -> Self {
        Self { ticket, outcome }
    }
}

/// Tri-state tracker for one optional record keyed by `K`.
#[derive(Debug, Clone)]
pub struct Probe<K, T> {
    label: &'static str,
    key: Option<K>,
    generation: u64,
    state: ProbeState<T>,
}

impl<K, T> Probe<K, T>
where
    K: Clone + PartialEq + fmt::Display,
{
    /// Create an idle probe. `label` names it in logs.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            key: None,
            generation: 0,
            state: ProbeState::Unknown,
        }
    }

    /// Log label.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Currently selected key.
    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    /// Current state.
    pub fn state(&self) -> &ProbeState<T> {
        &self.state
    }

    /// Generation counter; bumps on every issued query.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Select the key to probe.
    ///
    /// Returns a ticket to query with when the key changed to a resolved
    /// value. The state drops to `Unknown` on any change, before the new
    /// query resolves. Re-selecting the current key is a no-op.
    pub fn select(&mut self, key: Option<K>) -> Option<ProbeTicket<K>> {
        if self.key == key {
            return None;
        }
        self.key = key;
        self.state = ProbeState::Unknown;
        self.generation += 1;
        let ticket = self.key.clone().map(|key| ProbeTicket {
            key,
            generation: self.generation,
        });
        if let Some(ticket) = &ticket {
            tracing::debug!(probe = self.label, key = %ticket.key, "probe issued");
        }
        ticket
    }

    /// Re-issue the query for the current key.
    ///
    /// A known answer is kept while the refresh is in flight; a failed probe
    /// goes back to `Unknown` so the "checking" indicator shows again.
    pub fn refresh(&mut self) -> Option<ProbeTicket<K>> {
        let key = self.key.clone()?;
        self.generation += 1;
        if self.state.is_failed() {
            self.state = ProbeState::Unknown;
        }
        tracing::debug!(probe = self.label, key = %key, "probe refreshed");
        Some(ProbeTicket {
            key,
            generation: self.generation,
        })
    }

    /// Drop the selection and any answer.
    pub fn reset(&mut self) {
        self.key = None;
        self.state = ProbeState::Unknown;
        self.generation += 1;
    }

    /// Fold a response into the probe.
    ///
    /// Returns `false` (and changes nothing) when the response was issued for
    /// a key or generation that is no longer current.
    pub fn apply(&mut self, response: ProbeResponse<K, T>) -> bool {
        let ProbeResponse { ticket, outcome } = response;
        if self.key.as_ref() != Some(&ticket.key) || ticket.generation != self.generation {
            tracing::debug!(
                probe = self.label,
                key = %ticket.key,
                generation = ticket.generation,
                current = self.generation,
                "discarding stale probe response"
            );
            return false;
        }

        self.state = match outcome {
            Ok(Some(record)) => ProbeState::Present(record),
            Ok(None) => ProbeState::Absent,
            Err(err) if err.is_decode() => {
                tracing::error!(
                    probe = self.label,
                    key = %ticket.key,
                    error = %err,
                    "on-chain record has unexpected shape"
                );
                ProbeState::Unknown
            }
            Err(err) => {
                tracing::warn!(probe = self.label, key = %ticket.key, error = %err, "probe failed");
                ProbeState::Failed(ProbeFailure::from(&err))
            }
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rescue_core::AccountId;

    fn account(seed: u8) -> AccountId {
        AccountId::new([seed; 32])
    }

    #[test]
    fn test_select_invalidates_before_answer() {
        let mut probe: Probe<AccountId, u32> = Probe::new("test");
        let ticket = probe.select(Some(account(1))).unwrap();
        assert!(probe.apply(ProbeResponse::new(ticket, Ok(Some(5)))));
        assert_eq!(probe.state(), &ProbeState::Present(5));

        let _ = probe.select(Some(account(2)));
        assert_eq!(probe.state(), &ProbeState::Unknown);
    }

    #[test]
    fn test_stale_key_response_is_discarded() {
        let mut probe: Probe<AccountId, u32> = Probe::new("test");
        let old = probe.select(Some(account(1))).unwrap();
        let new = probe.select(Some(account(2))).unwrap();

        assert!(!probe.apply(ProbeResponse::new(old, Ok(None))));
        assert_eq!(probe.state(), &ProbeState::Unknown);

        assert!(probe.apply(ProbeResponse::new(new, Ok(Some(9)))));
        assert_eq!(probe.state(), &ProbeState::Present(9));
    }

    #[test]
    fn test_superseded_refresh_is_discarded() {
        let mut probe: Probe<AccountId, u32> = Probe::new("test");
        let first = probe.select(Some(account(1))).unwrap();
        let second = probe.refresh().unwrap();

        assert!(!probe.apply(ProbeResponse::new(first, Ok(Some(1)))));
        assert!(probe.apply(ProbeResponse::new(second, Ok(Some(2)))));
        assert_eq!(probe.state(), &ProbeState::Present(2));
    }

    #[test]
    fn test_reselecting_same_key_is_noop() {
        let mut probe: Probe<AccountId, u32> = Probe::new("test");
        assert!(probe.select(Some(account(1))).is_some());
        assert!(probe.select(Some(account(1))).is_none());
    }

    #[test]
    fn test_unresolved_key_issues_nothing() {
        let mut probe: Probe<AccountId, u32> = Probe::new("test");
        let _ = probe.select(Some(account(1)));
        assert!(probe.select(None).is_none());
        assert!(probe.state().is_unknown());
        assert!(probe.refresh().is_none());
    }

    #[test]
    fn test_network_error_is_failed_not_absent() {
        let mut probe: Probe<AccountId, u32> = Probe::new("test");
        let ticket = probe.select(Some(account(1))).unwrap();
        probe.apply(ProbeResponse::new(ticket, Err(ChainError::network("down"))));
        assert_matches!(probe.state(), ProbeState::Failed(f) if f.retryable);
        assert!(!probe.state().is_absent());
    }

    #[test]
    fn test_decode_error_stays_unknown() {
        let mut probe: Probe<AccountId, u32> = Probe::new("test");
        let ticket = probe.select(Some(account(1))).unwrap();
        probe.apply(ProbeResponse::new(
            ticket,
            Err(ChainError::decode("Recovery.Recoverable", "missing field")),
        ));
        assert!(probe.state().is_unknown());
    }

    #[test]
    fn test_refresh_after_failure_shows_checking() {
        let mut probe: Probe<AccountId, u32> = Probe::new("test");
        let ticket = probe.select(Some(account(1))).unwrap();
        probe.apply(ProbeResponse::new(ticket, Err(ChainError::network("down"))));
        let retry = probe.refresh().unwrap();
        assert!(probe.state().is_unknown());
        probe.apply(ProbeResponse::new(retry, Ok(None)));
        assert!(probe.state().is_absent());
    }
}
