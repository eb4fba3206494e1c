//! Whether a rescuer has an active recovery attempt on a lost account.

use super::Probe;
use rescue_core::{
    read_decoded, ActiveRecoveryAttempt, ChainError, ChainQueryEffects, RecoveryPair, StorageKey,
};

/// Probe of `Recovery.ActiveRecoveries(lost, rescuer)`.
///
/// Only queried once both accounts of the pair are resolved. The
/// `friends` of a present attempt is the authoritative voucher count.
pub type ActiveRecoveryProbe = Probe<RecoveryPair, ActiveRecoveryAttempt>;

/// Create an idle active-recovery probe.
pub fn active_recovery_probe() -> ActiveRecoveryProbe {
    Probe::new("active_recovery")
}

/// Read the active recovery attempt for `pair`.
pub async fn query_active_recovery<C>(
    chain: &C,
    pair: &RecoveryPair,
) -> Result<Option<ActiveRecoveryAttempt>, ChainError>
where
    C: ChainQueryEffects + ?Sized,
{
    read_decoded(chain, &StorageKey::active_recovery(pair)).await
}
