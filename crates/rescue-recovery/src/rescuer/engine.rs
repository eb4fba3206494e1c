//! Rescuer step engine.
//!
//! A synchronous reducer over probe events. Every mutation returns the probe
//! requests it implies; nothing here awaits. The phase is recomputed from
//! scratch by [`derive_phase`] after each event and combined with the held
//! phase so it never moves backwards within a (lost, rescuer) session.

use super::countdown::{Countdown, CountdownAnchor};
use super::phase::{derive_phase, remaining_for, PhaseInputs, RescuerPhase};
use crate::calls::RecoveryCall;
use crate::constants::RecoveryConstants;
use crate::probes::active_recovery::active_recovery_probe;
use crate::probes::proxy::{is_proxy_of, proxy_probe};
use crate::probes::recoverability::recoverability_probe;
use crate::probes::{
    ActiveRecoveryProbe, Probe, ProbeFailure, ProbeState, ProxyProbe, RecoverabilityProbe,
};
use crate::requests::{ProbeEvent, ProbeRequest};
use crate::rescuers::RescuerRecord;
use crate::view::RescuerView;
use crate::withdrawal::{self, WithdrawAmounts, WithdrawalInputs};
use rescue_core::{
    AccountId, ActiveRecoveryAttempt, BalanceSnapshot, BlockNumber, EngineConfig, EraIndex,
    RecoveryConfig, RecoveryPair, RescueError, SlashingSpans, StakingLedger,
};
use std::fmt;

/// Drives a rescuer through initiate, wait and withdraw.
#[derive(Debug, Clone)]
pub struct RescuerStepEngine {
    config: EngineConfig,
    constants: Option<RecoveryConstants>,

    lost: Option<AccountId>,
    rescuer: Option<AccountId>,

    recoverability: RecoverabilityProbe,
    active: ActiveRecoveryProbe,
    proxy: ProxyProbe,
    block_height: Option<BlockNumber>,
    block_height_failure: Option<ProbeFailure>,

    balance: Probe<AccountId, BalanceSnapshot>,
    ledger: Probe<AccountId, StakingLedger>,
    era: Probe<AccountId, EraIndex>,
    spans: Probe<AccountId, SlashingSpans>,
    others: Probe<RecoveryPair, Vec<RescuerRecord>>,
    withdraw_loaded: bool,

    phase: RescuerPhase,
    countdown: Countdown,
}

impl RescuerStepEngine {
    /// Create an engine with nothing selected.
    pub fn new(config: EngineConfig) -> Self {
        let countdown = Countdown::new(config.block_time_secs);
        Self {
            config,
            constants: None,
            lost: None,
            rescuer: None,
            recoverability: recoverability_probe(),
            active: active_recovery_probe(),
            proxy: proxy_probe(),
            block_height: None,
            block_height_failure: None,
            balance: Probe::new("balance"),
            ledger: Probe::new("staking_ledger"),
            era: Probe::new("current_era"),
            spans: Probe::new("slashing_spans"),
            others: Probe::new("other_rescuers"),
            withdraw_loaded: false,
            phase: RescuerPhase::Initiate,
            countdown,
        }
    }

    /// Provide the protocol constants read for this connection.
    pub fn set_constants(&mut self, constants: RecoveryConstants) {
        self.constants = Some(constants);
    }

    /// Protocol constants, once provided.
    pub fn constants(&self) -> Option<&RecoveryConstants> {
        self.constants.as_ref()
    }

    /// Select the account being recovered.
    pub fn select_lost_account(&mut self, lost: Option<AccountId>) -> Vec<ProbeRequest> {
        if self.lost == lost {
            return Vec::new();
        }
        self.lost = lost;
        self.reset_session();
        self.bind()
    }

    /// Select the account doing the recovering.
    pub fn select_rescuer(&mut self, rescuer: Option<AccountId>) -> Vec<ProbeRequest> {
        if self.rescuer == rescuer {
            return Vec::new();
        }
        self.rescuer = rescuer;
        self.reset_session();
        self.bind()
    }

    /// Re-read everything the current step depends on.
    pub fn refresh(&mut self) -> Vec<ProbeRequest> {
        let mut requests = Vec::new();
        if let Some(ticket) = self.recoverability.refresh() {
            requests.push(ProbeRequest::Recoverability(ticket));
        }
        if let Some(ticket) = self.active.refresh() {
            requests.push(ProbeRequest::ActiveRecovery(ticket));
        }
        if let Some(ticket) = self.proxy.refresh() {
            requests.push(ProbeRequest::Proxy(ticket));
        }
        if self.pair().is_some() {
            self.block_height_failure = None;
            requests.push(ProbeRequest::BlockHeight);
        }
        if self.withdraw_loaded {
            requests.extend(self.refresh_withdraw_probes());
        }
        requests
    }

    /// Fold a probe event into the engine.
    pub fn apply(&mut self, event: ProbeEvent) -> Vec<ProbeRequest> {
        let mut fresh_height = false;
        let changed = match event {
            ProbeEvent::Recoverability(response) => self.recoverability.apply(response),
            ProbeEvent::ActiveRecovery(response) => self.active.apply(response),
            ProbeEvent::Proxy(response) => self.proxy.apply(response),
            ProbeEvent::BlockHeight(Ok(height)) => {
                self.block_height_failure = None;
                if self.block_height.map_or(true, |known| height >= known) {
                    self.block_height = Some(height);
                    fresh_height = true;
                    true
                } else {
                    tracing::debug!(height, known = ?self.block_height, "ignoring older block height");
                    false
                }
            }
            ProbeEvent::BlockHeight(Err(err)) => {
                if err.is_decode() {
                    tracing::error!(error = %err, "block height has unexpected shape");
                } else {
                    tracing::warn!(error = %err, "block height read failed");
                    self.block_height_failure = Some(ProbeFailure::from(&err));
                }
                true
            }
            ProbeEvent::Balance(response) => self.balance.apply(response),
            ProbeEvent::StakingLedger(response) => self.ledger.apply(response),
            ProbeEvent::CurrentEra(response) => self.era.apply(response),
            ProbeEvent::SlashingSpans(response) => self.spans.apply(response),
            ProbeEvent::OtherRescuers(response) => self.others.apply(response),
        };
        if !changed {
            return Vec::new();
        }
        self.recompute(fresh_height)
    }

    /// Advance the local countdown by one tick period.
    pub fn tick(&mut self) {
        self.countdown.tick(self.config.countdown_tick_ms);
    }

    /// Current phase.
    pub fn phase(&self) -> RescuerPhase {
        self.phase
    }

    /// Selected lost account.
    pub fn lost(&self) -> Option<&AccountId> {
        self.lost.as_ref()
    }

    /// Selected rescuer.
    pub fn rescuer(&self) -> Option<&AccountId> {
        self.rescuer.as_ref()
    }

    /// Recovery config of the lost account.
    pub fn recoverability(&self) -> &ProbeState<RecoveryConfig> {
        self.recoverability.state()
    }

    /// Attempt of the selected pair.
    pub fn attempt(&self) -> &ProbeState<ActiveRecoveryAttempt> {
        self.active.state()
    }

    /// Whether the rescuer already proxies the lost account.
    pub fn is_proxy(&self) -> Option<bool> {
        is_proxy_of(&self.proxy)
    }

    /// Latest block height seen.
    pub fn block_height(&self) -> Option<BlockNumber> {
        self.block_height
    }

    /// Blocks left on the delay, once attempt, config and height are known.
    pub fn remaining_blocks(&self) -> Option<i64> {
        remaining_for(&self.phase_inputs())
    }

    /// Seconds left on the local countdown.
    pub fn countdown_secs(&self) -> Option<u64> {
        self.countdown.seconds()
    }

    /// Other rescuers of the lost account, once enumerated.
    pub fn other_rescuers(&self) -> &[RescuerRecord] {
        self.others.state().present().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Withdraw amounts from whatever snapshots are loaded.
    pub fn amounts(&self) -> WithdrawAmounts {
        withdrawal::compute(&WithdrawalInputs {
            balance: self.balance.state().present(),
            ledger: self.ledger.state().present(),
            current_era: self.era.state().present().copied(),
            recovery_deposit: self
                .recoverability
                .state()
                .present()
                .map(|config| config.deposit),
            other_rescuers: self.other_rescuers(),
            slashing_spans: self.spans.state().present(),
        })
    }

    /// Whether the step's action is enabled.
    pub fn can_proceed(&self) -> bool {
        match self.phase {
            RescuerPhase::Initiate => {
                self.recoverability.state().present().is_some() && self.active.state().is_absent()
            }
            RescuerPhase::Wait => false,
            RescuerPhase::Withdraw => {
                self.withdraw_blocker().is_none() && self.amounts().total_withdrawable > 0
            }
        }
    }

    /// First failure among the probes, if any.
    pub fn failure(&self) -> Option<&ProbeFailure> {
        self.recoverability
            .state()
            .failure()
            .or_else(|| self.active.state().failure())
            .or_else(|| self.proxy.state().failure())
            .or(self.block_height_failure.as_ref())
            .or_else(|| self.balance.state().failure())
            .or_else(|| self.ledger.state().failure())
            .or_else(|| self.era.state().failure())
            .or_else(|| self.spans.state().failure())
            .or_else(|| self.others.state().failure())
    }

    /// Whether any probe failed.
    pub fn has_error(&self) -> bool {
        self.failure().is_some()
    }

    /// Whether a selected probe is still waiting for a definitive answer.
    pub fn is_checking(&self) -> bool {
        let waiting = |selected: bool, unknown: bool| selected && unknown;
        waiting(self.lost.is_some(), self.recoverability.state().is_unknown())
            || waiting(self.active.key().is_some(), self.active.state().is_unknown())
            || waiting(self.proxy.key().is_some(), self.proxy.state().is_unknown())
            || waiting(
                self.pair().is_some(),
                self.block_height.is_none() && self.block_height_failure.is_none(),
            )
            || (self.withdraw_loaded
                && [
                    self.balance.key().is_some() && self.balance.state().is_unknown(),
                    self.ledger.key().is_some() && self.ledger.state().is_unknown(),
                    self.era.key().is_some() && self.era.state().is_unknown(),
                    self.spans.key().is_some() && self.spans.state().is_unknown(),
                    self.others.key().is_some() && self.others.state().is_unknown(),
                ]
                .into_iter()
                .any(|pending| pending))
    }

    /// Build the `initiate_recovery` call.
    pub fn initiate(&self) -> Result<RecoveryCall, RescueError> {
        let lost = self
            .lost
            .ok_or_else(|| RescueError::precondition("no lost account selected"))?;
        if self.rescuer.is_none() {
            return Err(RescueError::precondition("no rescuer selected"));
        }
        if self.phase != RescuerPhase::Initiate {
            return Err(RescueError::precondition(format!(
                "recovery already initiated (phase {})",
                self.phase
            )));
        }
        match self.recoverability.state() {
            ProbeState::Present(_) => {}
            ProbeState::Absent => {
                return Err(RescueError::precondition(format!(
                    "account {lost} is not recoverable"
                )))
            }
            ProbeState::Unknown | ProbeState::Failed(_) => {
                return Err(RescueError::precondition(
                    "recoverability of the lost account is not known yet",
                ))
            }
        }
        if !self.active.state().is_absent() {
            return Err(RescueError::precondition(
                "an attempt for this rescuer may already exist",
            ));
        }
        Ok(RecoveryCall::InitiateRecovery { account: lost })
    }

    /// Build the batch that claims the lost account (when not yet claimed)
    /// and moves everything withdrawable to the rescuer.
    pub fn withdraw(&self) -> Result<RecoveryCall, RescueError> {
        let pair = self
            .pair()
            .ok_or_else(|| RescueError::precondition("lost account and rescuer must be selected"))?;
        if self.phase != RescuerPhase::Withdraw {
            return Err(RescueError::precondition(format!(
                "cannot withdraw during the {} phase",
                self.phase
            )));
        }
        if let Some(reason) = self.withdraw_blocker() {
            return Err(RescueError::precondition(reason));
        }
        let amounts = self.amounts();
        if amounts.total_withdrawable == 0 {
            return Err(RescueError::precondition("nothing to withdraw"));
        }

        // Active attempts block remove_recovery, so close them first.
        let mut inner = Vec::new();
        if self.active.state().present().is_some() {
            inner.push(RecoveryCall::CloseRecovery {
                rescuer: pair.rescuer,
            });
        }
        inner.extend(
            self.other_rescuers()
                .iter()
                .map(|record| RecoveryCall::CloseRecovery {
                    rescuer: record.account,
                }),
        );
        if self.recoverability.state().present().is_some() {
            inner.push(RecoveryCall::RemoveRecovery);
        }
        if amounts.span_count > 0 {
            inner.push(RecoveryCall::WithdrawUnbonded {
                num_slashing_spans: amounts.span_count,
            });
        }
        inner.push(RecoveryCall::TransferAll {
            dest: pair.rescuer,
            keep_alive: false,
        });

        let recovered = RecoveryCall::AsRecovered {
            account: pair.lost,
            inner: Box::new(RecoveryCall::BatchAll { calls: inner }),
        };
        if self.is_proxy() == Some(true) {
            return Ok(recovered);
        }
        Ok(RecoveryCall::BatchAll {
            calls: vec![
                RecoveryCall::ClaimRecovery { account: pair.lost },
                recovered,
            ],
        })
    }

    /// Read-only snapshot for presentation.
    pub fn view(&self) -> RescuerView {
        let config = self.recoverability.state().present();
        RescuerView {
            lost: self.lost,
            rescuer: self.rescuer,
            phase: self.phase,
            recoverability: self.recoverability.state().clone(),
            attempt: self.active.state().clone(),
            is_proxy: self.is_proxy(),
            block_height: self.block_height,
            remaining_blocks: self.remaining_blocks(),
            countdown_secs: self.countdown_secs(),
            vouchers: self.active.state().present().map(|a| a.voucher_count()),
            threshold: config.map(|config| config.threshold),
            initiate_deposit: self.constants.map(|c| c.recovery_deposit),
            can_proceed: self.can_proceed(),
            checking: self.is_checking(),
            error: self.failure().cloned(),
            amounts: (self.phase == RescuerPhase::Withdraw).then(|| self.amounts()),
            other_rescuers: self.other_rescuers().to_vec(),
        }
    }

    fn pair(&self) -> Option<RecoveryPair> {
        RecoveryPair::resolve(self.lost, self.rescuer)
    }

    fn phase_inputs(&self) -> PhaseInputs<'_> {
        PhaseInputs {
            config: self.recoverability.state(),
            attempt: self.active.state(),
            is_proxy: self.is_proxy(),
            block_height: self.block_height,
        }
    }

    fn phase_inputs_failed(&self) -> bool {
        self.recoverability.state().is_failed()
            || self.active.state().is_failed()
            || self.proxy.state().is_failed()
            || self.block_height_failure.is_some()
    }

    /// Why the withdraw batch cannot be built from what is loaded, if it
    /// cannot. Every snapshot the batch reads must be Present or Absent.
    fn withdraw_blocker(&self) -> Option<String> {
        fn unsettled<K, T>(probe: &Probe<K, T>) -> Option<String>
        where
            K: Clone + PartialEq + fmt::Display,
        {
            match probe.state() {
                ProbeState::Present(_) | ProbeState::Absent => None,
                ProbeState::Unknown => Some(format!("{} is still loading", probe.label())),
                ProbeState::Failed(failure) => {
                    Some(format!("{} could not be read: {}", probe.label(), failure.reason))
                }
            }
        }

        if self.phase_inputs_failed() {
            return Some("recovery state could not be read, refresh to retry".to_string());
        }
        let spans_needed = withdrawal::needs_span_count(
            self.ledger.state().present(),
            self.era.state().present().copied(),
        );
        unsettled(&self.proxy)
            .or_else(|| unsettled(&self.balance))
            .or_else(|| unsettled(&self.ledger))
            .or_else(|| unsettled(&self.era))
            .or_else(|| unsettled(&self.others))
            .or_else(|| spans_needed.then(|| unsettled(&self.spans)).flatten())
    }

    fn reset_session(&mut self) {
        if self.phase != RescuerPhase::Initiate {
            tracing::info!(from = %self.phase, "selection changed, phase reset");
        }
        self.phase = RescuerPhase::Initiate;
        self.countdown.clear();
        self.withdraw_loaded = false;
        self.balance.reset();
        self.ledger.reset();
        self.era.reset();
        self.spans.reset();
        self.others.reset();
    }

    fn bind(&mut self) -> Vec<ProbeRequest> {
        let pair = self.pair();
        let mut requests = Vec::new();
        if let Some(ticket) = self.recoverability.select(self.lost) {
            requests.push(ProbeRequest::Recoverability(ticket));
        }
        if let Some(ticket) = self.active.select(pair) {
            requests.push(ProbeRequest::ActiveRecovery(ticket));
        }
        if let Some(ticket) = self.proxy.select(pair) {
            requests.push(ProbeRequest::Proxy(ticket));
        }
        if pair.is_some() {
            requests.push(ProbeRequest::BlockHeight);
        }
        requests
    }

    fn recompute(&mut self, fresh_height: bool) -> Vec<ProbeRequest> {
        let inputs = self.phase_inputs();
        let anchor = match (inputs.attempt.present(), inputs.config.present(), inputs.block_height)
        {
            (Some(attempt), Some(config), Some(height)) => Some(CountdownAnchor {
                created: attempt.created,
                delay_period: config.delay_period,
                height,
            }),
            _ => None,
        };
        self.countdown.sync(anchor, fresh_height);

        if self.phase_inputs_failed() {
            tracing::debug!(phase = %self.phase, "probe failure, phase frozen");
        } else {
            let derived = derive_phase(&self.phase_inputs());
            let next = self.phase.max(derived);
            if next != self.phase {
                tracing::info!(from = %self.phase, to = %next, pair = ?self.pair(), "rescuer phase advanced");
                self.phase = next;
            }
        }

        let mut requests = Vec::new();
        if self.phase == RescuerPhase::Withdraw && !self.withdraw_loaded {
            requests.extend(self.load_withdraw_probes());
        }
        if self.withdraw_loaded {
            requests.extend(self.load_span_probe());
        }
        requests
    }

    fn load_withdraw_probes(&mut self) -> Vec<ProbeRequest> {
        let Some(pair) = self.pair() else {
            return Vec::new();
        };
        self.withdraw_loaded = true;
        let mut requests = Vec::new();
        if let Some(ticket) = self.balance.select(Some(pair.lost)) {
            requests.push(ProbeRequest::Balance(ticket));
        }
        if let Some(ticket) = self.ledger.select(Some(pair.lost)) {
            requests.push(ProbeRequest::StakingLedger(ticket));
        }
        if let Some(ticket) = self.era.select(Some(pair.lost)) {
            requests.push(ProbeRequest::CurrentEra(ticket));
        }
        if let Some(ticket) = self.others.select(Some(pair)) {
            requests.push(ProbeRequest::OtherRescuers(ticket));
        }
        requests
    }

    fn refresh_withdraw_probes(&mut self) -> Vec<ProbeRequest> {
        let mut requests = Vec::new();
        if let Some(ticket) = self.balance.refresh() {
            requests.push(ProbeRequest::Balance(ticket));
        }
        if let Some(ticket) = self.ledger.refresh() {
            requests.push(ProbeRequest::StakingLedger(ticket));
        }
        if let Some(ticket) = self.era.refresh() {
            requests.push(ProbeRequest::CurrentEra(ticket));
        }
        if let Some(ticket) = self.spans.refresh() {
            requests.push(ProbeRequest::SlashingSpans(ticket));
        }
        if let Some(ticket) = self.others.refresh() {
            requests.push(ProbeRequest::OtherRescuers(ticket));
        }
        requests
    }

    // The span count only matters when something is redeemable.
    fn load_span_probe(&mut self) -> Vec<ProbeRequest> {
        let needed = withdrawal::needs_span_count(
            self.ledger.state().present(),
            self.era.state().present().copied(),
        );
        if !needed {
            return Vec::new();
        }
        self.spans
            .select(self.lost)
            .map(ProbeRequest::SlashingSpans)
            .into_iter()
            .collect()
    }
}
