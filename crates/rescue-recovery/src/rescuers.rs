//! Other rescuers with an active attempt on the same lost account.
//!
//! Found by scanning `Recovery.ActiveRecoveries(lost, *)`. The chain handler
//! hands back structured keys, so the rescuer account is read straight off
//! [`StorageKey::ActiveRecovery`].

use rescue_core::effects::chain::decode_value;
use rescue_core::{
    AccountId, ActiveRecoveryAttempt, Balance, ChainError, ChainQueryEffects, RecoveryPair,
    StorageKey, StoragePrefix,
};
use serde::{Deserialize, Serialize};

/// A rescuer other than the current user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescuerRecord {
    /// Rescuer account
    pub account: AccountId,
    /// Their attempt, when the stored value could be decoded
    pub attempt: Option<ActiveRecoveryAttempt>,
}

impl RescuerRecord {
    /// Deposit the rescuer reserved, zero when unknown.
    pub fn deposit(&self) -> Balance {
        self.attempt.as_ref().map_or(0, |attempt| attempt.deposit)
    }
}

/// Enumerate active attempts on `pair.lost` by anyone but `pair.rescuer`.
///
/// Undecodable values keep their record with `attempt: None`; the rescuer
/// still has to be closed out even if its attempt cannot be read.
pub async fn query_other_rescuers<C>(
    chain: &C,
    pair: &RecoveryPair,
) -> Result<Option<Vec<RescuerRecord>>, ChainError>
where
    C: ChainQueryEffects + ?Sized,
{
    let prefix = StoragePrefix::ActiveRecoveries { lost: pair.lost };
    let entries = chain.enumerate_entries(&prefix).await?;

    let mut records: Vec<RescuerRecord> = entries
        .into_iter()
        .filter_map(|(key, value)| {
            let StorageKey::ActiveRecovery { lost, rescuer } = key else {
                tracing::debug!(%key, "ignoring unexpected key in active recovery scan");
                return None;
            };
            if lost != pair.lost || rescuer == pair.rescuer {
                return None;
            }
            let attempt = value.and_then(|value| {
                decode_value::<ActiveRecoveryAttempt>(key.item_name(), value)
                    .map_err(|err| {
                        tracing::error!(%key, error = %err, "undecodable active recovery");
                    })
                    .ok()
            });
            Some(RescuerRecord {
                account: rescuer,
                attempt,
            })
        })
        .collect();
    records.sort_by(|a, b| a.account.cmp(&b.account));

    // A scan always answers; "no other rescuers" is an empty list.
    Ok(Some(records))
}

/// Sum of the deposits of `records`, unknown deposits counted as zero.
pub fn total_deposits(records: &[RescuerRecord]) -> Balance {
    records
        .iter()
        .fold(0, |sum: Balance, record| sum.saturating_add(record.deposit()))
}
