//! Whether an account has a recovery configuration.

use super::Probe;
use rescue_core::{read_decoded, AccountId, ChainError, ChainQueryEffects, RecoveryConfig, StorageKey};

/// Probe of `Recovery.Recoverable(account)`.
///
/// `Absent` means the account is not recoverable.
pub type RecoverabilityProbe = Probe<AccountId, RecoveryConfig>;

/// Create an idle recoverability probe.
pub fn recoverability_probe() -> RecoverabilityProbe {
    Probe::new("recoverable")
}

/// Read the recovery configuration of `account`.
pub async fn query_recovery_config<C>(
    chain: &C,
    account: &AccountId,
) -> Result<Option<RecoveryConfig>, ChainError>
where
    C: ChainQueryEffects + ?Sized,
{
    read_decoded(chain, &StorageKey::Recoverable { account: *account }).await
}
