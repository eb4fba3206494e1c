//! Probe requests and the tagged events they resolve into.
//!
//! Engines are synchronous reducers: selecting accounts or folding an event
//! yields [`ProbeRequest`]s, and the session runs each one as an independent
//! task that reports back a [`ProbeEvent`]. Every event except block height
//! carries the ticket it was issued with, so the owning probe can tell
//! whether it is still wanted.

use crate::probes::active_recovery::query_active_recovery;
use crate::probes::proxy::query_proxy;
use crate::probes::recoverability::query_recovery_config;
use crate::probes::{ProbeResponse, ProbeTicket};
use crate::rescuers::{query_other_rescuers, RescuerRecord};
use rescue_core::{
    read_decoded, AccountId, ActiveRecoveryAttempt, BalanceSnapshot, BlockNumber, ChainError,
    ChainQueryEffects, EraIndex, RecoveryConfig, RecoveryPair, SlashingSpans, StakingLedger,
    StorageKey,
};

/// A query an engine wants issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeRequest {
    /// Recovery config of an account
    Recoverability(ProbeTicket<AccountId>),
    /// Active attempt of a pair
    ActiveRecovery(ProbeTicket<RecoveryPair>),
    /// Proxy installed for the pair's rescuer
    Proxy(ProbeTicket<RecoveryPair>),
    /// Current block height
    BlockHeight,
    /// Balance of the lost account
    Balance(ProbeTicket<AccountId>),
    /// Staking ledger of the lost account
    StakingLedger(ProbeTicket<AccountId>),
    /// Current era, scoped to the lost account's session
    CurrentEra(ProbeTicket<AccountId>),
    /// Slashing spans of the lost account
    SlashingSpans(ProbeTicket<AccountId>),
    /// Other rescuers of the pair's lost account
    OtherRescuers(ProbeTicket<RecoveryPair>),
}

impl ProbeRequest {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Recoverability(_) => "recoverability",
            Self::ActiveRecovery(_) => "active_recovery",
            Self::Proxy(_) => "proxy",
            Self::BlockHeight => "block_height",
            Self::Balance(_) => "balance",
            Self::StakingLedger(_) => "staking_ledger",
            Self::CurrentEra(_) => "current_era",
            Self::SlashingSpans(_) => "slashing_spans",
            Self::OtherRescuers(_) => "other_rescuers",
        }
    }

    /// Run the query against `chain`.
    pub async fn execute<C: ChainQueryEffects + ?Sized>(self, chain: &C) -> ProbeEvent {
        match self {
            Self::Recoverability(ticket) => {
                let outcome = query_recovery_config(chain, &ticket.key).await;
                ProbeEvent::Recoverability(ProbeResponse::new(ticket, outcome))
            }
            Self::ActiveRecovery(ticket) => {
                let outcome = query_active_recovery(chain, &ticket.key).await;
                ProbeEvent::ActiveRecovery(ProbeResponse::new(ticket, outcome))
            }
            Self::Proxy(ticket) => {
                let outcome = query_proxy(chain, &ticket.key).await;
                ProbeEvent::Proxy(ProbeResponse::new(ticket, outcome))
            }
            Self::BlockHeight => ProbeEvent::BlockHeight(chain.current_block_height().await),
            Self::Balance(ticket) => {
                let key = StorageKey::Account {
                    account: ticket.key,
                };
                let outcome = read_decoded(chain, &key).await;
                ProbeEvent::Balance(ProbeResponse::new(ticket, outcome))
            }
            Self::StakingLedger(ticket) => {
                let key = StorageKey::StakingLedger { stash: ticket.key };
                let outcome = read_decoded(chain, &key).await;
                ProbeEvent::StakingLedger(ProbeResponse::new(ticket, outcome))
            }
            Self::CurrentEra(ticket) => {
                let outcome = read_decoded(chain, &StorageKey::CurrentEra).await;
                ProbeEvent::CurrentEra(ProbeResponse::new(ticket, outcome))
            }
            Self::SlashingSpans(ticket) => {
                let key = StorageKey::SlashingSpans { stash: ticket.key };
                let outcome = read_decoded(chain, &key).await;
                ProbeEvent::SlashingSpans(ProbeResponse::new(ticket, outcome))
            }
            Self::OtherRescuers(ticket) => {
                let outcome = query_other_rescuers(chain, &ticket.key).await;
                ProbeEvent::OtherRescuers(ProbeResponse::new(ticket, outcome))
            }
        }
    }
}

/// A query answer, tagged with the ticket it was issued for.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeEvent {
    /// Recovery config answer
    Recoverability(ProbeResponse<AccountId, RecoveryConfig>),
    /// Active attempt answer
    ActiveRecovery(ProbeResponse<RecoveryPair, ActiveRecoveryAttempt>),
    /// Proxy answer
    Proxy(ProbeResponse<RecoveryPair, AccountId>),
    /// Block height answer
    BlockHeight(Result<BlockNumber, ChainError>),
    /// Balance answer
    Balance(ProbeResponse<AccountId, BalanceSnapshot>),
    /// Staking ledger answer
    StakingLedger(ProbeResponse<AccountId, StakingLedger>),
    /// Current era answer
    CurrentEra(ProbeResponse<AccountId, EraIndex>),
    /// Slashing spans answer
    SlashingSpans(ProbeResponse<AccountId, SlashingSpans>),
    /// Other rescuers answer
    OtherRescuers(ProbeResponse<RecoveryPair, Vec<RescuerRecord>>),
}
