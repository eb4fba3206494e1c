//! Withdrawable amount of a recovered account.
//!
//! Pure arithmetic over balance, staking and deposit snapshots. Every input
//! is optional and an unknown input contributes zero, so a partially loaded
//! withdraw step still shows a lower bound rather than nothing.

use crate::rescuers::{total_deposits, RescuerRecord};
use rescue_core::{Balance, BalanceSnapshot, EraIndex, SlashingSpans, StakingLedger};
use serde::{Deserialize, Serialize};

/// Amounts shown on the withdraw step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawAmounts {
    /// Free balance not held by locks
    pub available: Balance,
    /// Unlocking stake whose era has passed
    pub redeemable: Balance,
    /// Unlocking stake still waiting for its era
    pub staked: Balance,
    /// Actively bonded stake (informational, not withdrawable)
    pub bonded: Balance,
    /// `available + redeemable + recovery deposit + other rescuers' deposits`
    pub total_withdrawable: Balance,
    /// Slashing span count to pass to `withdraw_unbonded`
    pub span_count: u32,
}

/// Snapshot inputs of [`compute`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WithdrawalInputs<'a> {
    /// Balance of the lost account
    pub balance: Option<&'a BalanceSnapshot>,
    /// Staking ledger of the lost account
    pub ledger: Option<&'a StakingLedger>,
    /// Current staking era
    pub current_era: Option<EraIndex>,
    /// Deposit the owner reserved for the recovery config
    pub recovery_deposit: Option<Balance>,
    /// Other rescuers, whose deposits return to the lost account on close
    pub other_rescuers: &'a [RescuerRecord],
    /// Slashing spans of the lost account
    pub slashing_spans: Option<&'a SlashingSpans>,
}

/// Unlocking stake redeemable at `current_era`.
///
/// Zero while the ledger or era is unknown.
pub fn redeemable(ledger: Option<&StakingLedger>, current_era: Option<EraIndex>) -> Balance {
    match (ledger, current_era) {
        (Some(ledger), Some(era)) => ledger
            .unlocking
            .iter()
            .filter(|chunk| chunk.era < era)
            .fold(0, |sum: Balance, chunk| sum.saturating_add(chunk.value)),
        _ => 0,
    }
}

/// Unlocking stake not yet redeemable at `current_era`.
///
/// While the era is unknown no chunk counts as redeemable, so every chunk
/// counts here.
pub fn still_unlocking(ledger: Option<&StakingLedger>, current_era: Option<EraIndex>) -> Balance {
    let Some(ledger) = ledger else {
        return 0;
    };
    ledger
        .unlocking
        .iter()
        .filter(|chunk| current_era.map_or(true, |era| chunk.era >= era))
        .fold(0, |sum: Balance, chunk| sum.saturating_add(chunk.value))
}

/// Whether the slashing span query is needed at all.
pub fn needs_span_count(ledger: Option<&StakingLedger>, current_era: Option<EraIndex>) -> bool {
    redeemable(ledger, current_era) > 0
}

/// Span count for `withdraw_unbonded`: zero when nothing is redeemable,
/// otherwise one plus the prior spans.
pub fn span_count(redeemable: Balance, spans: Option<&SlashingSpans>) -> u32 {
    if redeemable == 0 {
        return 0;
    }
    let prior = spans.map_or(0, |spans| spans.prior.len());
    u32::try_from(prior).unwrap_or(u32::MAX).saturating_add(1)
}

/// Compute the withdraw amounts.
pub fn compute(inputs: &WithdrawalInputs<'_>) -> WithdrawAmounts {
    let available = inputs.balance.map_or(0, BalanceSnapshot::available);
    let redeemable = redeemable(inputs.ledger, inputs.current_era);
    let staked = still_unlocking(inputs.ledger, inputs.current_era);
    let bonded = inputs.ledger.map_or(0, |ledger| ledger.active);
    let others = total_deposits(inputs.other_rescuers);

    let total_withdrawable = available
        .saturating_add(redeemable)
        .saturating_add(inputs.recovery_deposit.unwrap_or(0))
        .saturating_add(others);

    WithdrawAmounts {
        available,
        redeemable,
        staked,
        bonded,
        total_withdrawable,
        span_count: span_count(redeemable, inputs.slashing_spans),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rescue_core::{AccountId, ActiveRecoveryAttempt, FriendSet, UnlockChunk};

    fn rival(seed: u8, deposit: Balance) -> RescuerRecord {
        RescuerRecord {
            account: AccountId::new([seed; 32]),
            attempt: Some(ActiveRecoveryAttempt {
                created: 1,
                deposit,
                friends: FriendSet::default(),
            }),
        }
    }

    fn ledger(chunks: &[(Balance, EraIndex)]) -> StakingLedger {
        StakingLedger {
            stash: AccountId::new([1; 32]),
            total: chunks.iter().map(|(v, _)| v).sum::<Balance>() + 1_000,
            active: 1_000,
            unlocking: chunks
                .iter()
                .map(|&(value, era)| UnlockChunk { value, era })
                .collect(),
        }
    }

    #[test]
    fn test_all_inputs_unknown_is_zero() {
        assert_eq!(compute(&WithdrawalInputs::default()), WithdrawAmounts::default());
    }

    #[test]
    fn test_chunks_split_on_current_era() {
        let ledger = ledger(&[(10, 3), (20, 5), (40, 6)]);
        let amounts = compute(&WithdrawalInputs {
            ledger: Some(&ledger),
            current_era: Some(5),
            ..WithdrawalInputs::default()
        });
        assert_eq!(amounts.redeemable, 10);
        assert_eq!(amounts.staked, 60);
        assert_eq!(amounts.bonded, 1_000);
    }

    #[test]
    fn test_unknown_era_redeems_nothing() {
        let ledger = ledger(&[(10, 1)]);
        let amounts = compute(&WithdrawalInputs {
            ledger: Some(&ledger),
            ..WithdrawalInputs::default()
        });
        assert_eq!(amounts.redeemable, 0);
        assert_eq!(amounts.staked, 10);
        assert_eq!(amounts.span_count, 0);
    }

    #[test]
    fn test_span_count_only_when_redeemable() {
        let spans = SlashingSpans {
            span_index: 3,
            last_start: 10,
            last_nonzero_slash: 0,
            prior: vec![2, 4],
        };
        assert_eq!(span_count(0, Some(&spans)), 0);
        assert_eq!(span_count(5, Some(&spans)), 3);
        assert_eq!(span_count(5, None), 1);
    }

    #[test]
    fn test_total_sums_every_addend() {
        let balance = BalanceSnapshot {
            free: 500,
            reserved: 80,
            frozen: 100,
        };
        let ledger = ledger(&[(25, 1)]);
        let amounts = compute(&WithdrawalInputs {
            balance: Some(&balance),
            ledger: Some(&ledger),
            current_era: Some(2),
            recovery_deposit: Some(30),
            other_rescuers: &[rival(7, 7), rival(8, 3)],
            slashing_spans: None,
        });
        assert_eq!(amounts.available, 400);
        assert_eq!(amounts.total_withdrawable, 400 + 25 + 30 + 10);
        assert_eq!(amounts.span_count, 1);
    }

    proptest! {
        #[test]
        fn prop_compute_is_pure_and_bounded_below(
            free in 0u64..1_000_000,
            frozen in 0u64..1_000_000,
            chunks in proptest::collection::vec((0u64..10_000, 0u32..20), 0..6),
            era in proptest::option::of(0u32..20),
            deposit in proptest::option::of(0u64..10_000),
            others in proptest::collection::vec(0u64..10_000, 0..4),
        ) {
            let balance = BalanceSnapshot {
                free: Balance::from(free),
                reserved: 0,
                frozen: Balance::from(frozen),
            };
            let chunks: Vec<(Balance, EraIndex)> =
                chunks.into_iter().map(|(v, e)| (Balance::from(v), e)).collect();
            let ledger = ledger(&chunks);
            let others: Vec<RescuerRecord> = others
                .into_iter()
                .enumerate()
                .map(|(index, deposit)| rival(index as u8 + 10, Balance::from(deposit)))
                .collect();
            let inputs = WithdrawalInputs {
                balance: Some(&balance),
                ledger: Some(&ledger),
                current_era: era,
                recovery_deposit: deposit.map(Balance::from),
                other_rescuers: &others,
                slashing_spans: None,
            };

            let first = compute(&inputs);
            let second = compute(&inputs);
            prop_assert_eq!(first, second);
            prop_assert!(first.total_withdrawable >= first.available);
            prop_assert_eq!(
                first.redeemable + first.staked,
                chunks.iter().map(|(v, _)| *v).sum::<Balance>()
            );
        }
    }
}
