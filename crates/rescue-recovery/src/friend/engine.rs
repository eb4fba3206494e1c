//! Friend vouch engine.

use super::decision::{decide_vouch, VouchStatus};
use crate::calls::RecoveryCall;
use crate::probes::active_recovery::active_recovery_probe;
use crate::probes::recoverability::recoverability_probe;
use crate::probes::{ActiveRecoveryProbe, ProbeState, RecoverabilityProbe};
use crate::requests::{ProbeEvent, ProbeRequest};
use crate::view::FriendView;
use rescue_core::{AccountId, ActiveRecoveryAttempt, RecoveryConfig, RecoveryPair, RescueError};

/// Result of the vouch trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VouchOutcome {
    /// Submit this call
    Submit(RecoveryCall),
    /// The caller's vouch is already on chain; nothing to submit
    AlreadySatisfied,
}

/// Decides whether the calling friend may vouch for a rescuer.
#[derive(Debug, Clone)]
pub struct FriendVouchEngine {
    caller: AccountId,
    lost: Option<AccountId>,
    rescuer: Option<AccountId>,
    recoverability: RecoverabilityProbe,
    active: ActiveRecoveryProbe,
}

impl FriendVouchEngine {
    /// Engine acting for `caller`.
    pub fn new(caller: AccountId) -> Self {
        Self {
            caller,
            lost: None,
            rescuer: None,
            recoverability: recoverability_probe(),
            active: active_recovery_probe(),
        }
    }

    /// The friend using this engine.
    pub fn caller(&self) -> &AccountId {
        &self.caller
    }

    /// Select the account being recovered.
    pub fn select_lost_account(&mut self, lost: Option<AccountId>) -> Vec<ProbeRequest> {
        if self.lost == lost {
            return Vec::new();
        }
        self.lost = lost;
        self.bind()
    }

    /// Select the rescuer to vouch for.
    pub fn select_rescuer(&mut self, rescuer: Option<AccountId>) -> Vec<ProbeRequest> {
        if self.rescuer == rescuer {
            return Vec::new();
        }
        self.rescuer = rescuer;
        self.bind()
    }

    /// Re-read recoverability and the attempt.
    pub fn refresh(&mut self) -> Vec<ProbeRequest> {
        let mut requests = Vec::new();
        if let Some(ticket) = self.recoverability.refresh() {
            requests.push(ProbeRequest::Recoverability(ticket));
        }
        if let Some(ticket) = self.active.refresh() {
            requests.push(ProbeRequest::ActiveRecovery(ticket));
        }
        requests
    }

    /// Fold a probe event. Friends never issue follow-up reads.
    pub fn apply(&mut self, event: ProbeEvent) -> Vec<ProbeRequest> {
        match event {
            ProbeEvent::Recoverability(response) => {
                self.recoverability.apply(response);
            }
            ProbeEvent::ActiveRecovery(response) => {
                self.active.apply(response);
            }
            other => {
                tracing::debug!(?other, "friend engine ignoring unrelated event");
            }
        }
        Vec::new()
    }

    /// Recovery config of the lost account.
    pub fn recoverability(&self) -> &ProbeState<RecoveryConfig> {
        self.recoverability.state()
    }

    /// Attempt of the selected pair.
    pub fn attempt(&self) -> &ProbeState<ActiveRecoveryAttempt> {
        self.active.state()
    }

    /// Current decision.
    pub fn decision(&self) -> VouchStatus {
        decide_vouch(
            self.recoverability.state(),
            self.active.state(),
            &self.caller,
            self.rescuer.as_ref(),
        )
    }

    /// Build the `vouch_recovery` call.
    ///
    /// A vouch already on chain is reported as satisfied rather than as an
    /// error.
    pub fn vouch(&self) -> Result<VouchOutcome, RescueError> {
        let pair = RecoveryPair::resolve(self.lost, self.rescuer)
            .ok_or_else(|| RescueError::precondition("lost account and rescuer must be selected"))?;
        match self.decision() {
            VouchStatus::Ready => Ok(VouchOutcome::Submit(RecoveryCall::VouchRecovery {
                lost: pair.lost,
                rescuer: pair.rescuer,
            })),
            VouchStatus::AlreadyVouched => Ok(VouchOutcome::AlreadySatisfied),
            status => Err(RescueError::precondition(status.message())),
        }
    }

    /// Read-only snapshot for presentation.
    pub fn view(&self) -> FriendView {
        let status = self.decision();
        FriendView {
            caller: self.caller,
            lost: self.lost,
            rescuer: self.rescuer,
            message: status.message().to_string(),
            can_vouch: status.can_vouch(),
            checking: matches!(status, VouchStatus::Checking),
            vouchers: self.active.state().present().map(|a| a.voucher_count()),
            threshold: self.recoverability.state().present().map(|c| c.threshold),
            status,
        }
    }

    fn bind(&mut self) -> Vec<ProbeRequest> {
        let mut requests = Vec::new();
        if let Some(ticket) = self.recoverability.select(self.lost) {
            requests.push(ProbeRequest::Recoverability(ticket));
        }
        let pair = RecoveryPair::resolve(self.lost, self.rescuer);
        if let Some(ticket) = self.active.select(pair) {
            requests.push(ProbeRequest::ActiveRecovery(ticket));
        }
        requests
    }
}
