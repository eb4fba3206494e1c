//! Whether a rescuer has already been installed as proxy of the lost account.
//!
//! `Recovery.Proxy` is keyed by the rescuer and names the account the
//! rescuer may act for. A rescuer is the proxy of the lost account exactly
//! when that entry exists and names the lost account. A live proxy means the
//! recovery was claimed on chain, which unlocks withdrawal regardless of the
//! delay timer.

use super::{Probe, ProbeState};
use rescue_core::{read_decoded, AccountId, ChainError, ChainQueryEffects, RecoveryPair, StorageKey};

/// Probe of `Recovery.Proxy(rescuer)` for a (lost, rescuer) pair.
///
/// The payload is the account the rescuer currently proxies.
pub type ProxyProbe = Probe<RecoveryPair, AccountId>;

/// Create an idle proxy probe.
pub fn proxy_probe() -> ProxyProbe {
    Probe::new("proxy")
}

/// Read the account `pair.rescuer` proxies, if any.
pub async fn query_proxy<C>(chain: &C, pair: &RecoveryPair) -> Result<Option<AccountId>, ChainError>
where
    C: ChainQueryEffects + ?Sized,
{
    read_decoded(
        chain,
        &StorageKey::Proxy {
            rescuer: pair.rescuer,
        },
    )
    .await
}

/// Tri-state answer to "is the rescuer the proxy of the lost account?".
///
/// Reads the answer to `Recovery.Proxy(pair.rescuer)`, the storage entry
/// `claim_recovery` writes, and compares the account it names with
/// `pair.lost`. The pallet keeps no entry keyed by the lost account, so the
/// lost account's installed proxy is found from the rescuer side.
///
/// `None` while unknown or failed.
pub fn is_proxy_of(probe: &ProxyProbe) -> Option<bool> {
    let pair = probe.key()?;
    match probe.state() {
        ProbeState::Present(proxied) => Some(*proxied == pair.lost),
        ProbeState::Absent => Some(false),
        ProbeState::Unknown | ProbeState::Failed(_) => None,
    }
}
