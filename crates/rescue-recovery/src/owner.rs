//! Owner side: making an account recoverable and removing that again.

use crate::calls::RecoveryCall;
use crate::constants::RecoveryConstants;
use crate::probes::recoverability::recoverability_probe;
use crate::probes::{ProbeState, RecoverabilityProbe};
use crate::requests::{ProbeEvent, ProbeRequest};
use crate::view::OwnerView;
use rescue_core::{AccountId, Balance, BlockNumber, FriendSet, RecoveryConfig, RescueError};
use serde::{Deserialize, Serialize};

/// A proposed recovery config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerSetup {
    /// Friends allowed to vouch, in any order
    pub friends: Vec<AccountId>,
    /// Vouches required
    pub threshold: u16,
    /// Delay in blocks between initiation and claim
    pub delay_period: BlockNumber,
}

/// A setup that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSetup {
    /// Sorted, unique friends
    pub friends: FriendSet,
    /// Vouches required
    pub threshold: u16,
    /// Delay in blocks
    pub delay_period: BlockNumber,
    /// Amount reserved on creation
    pub deposit: Balance,
}

impl ValidatedSetup {
    /// The `create_recovery` call for this setup.
    pub fn call(&self) -> RecoveryCall {
        RecoveryCall::CreateRecovery {
            friends: self.friends.as_slice().to_vec(),
            threshold: self.threshold,
            delay_period: self.delay_period,
        }
    }
}

impl OwnerSetup {
    /// Check the proposal against the protocol constants.
    ///
    /// Friends are sorted here; duplicates are rejected rather than dropped.
    pub fn validate(&self, constants: &RecoveryConstants) -> Result<ValidatedSetup, RescueError> {
        if self.friends.is_empty() {
            return Err(RescueError::precondition("at least one friend is required"));
        }
        let friends = FriendSet::new(self.friends.clone());
        if friends.len() != self.friends.len() {
            return Err(RescueError::precondition("friends must be unique"));
        }
        let max_friends = usize::try_from(constants.max_friends).unwrap_or(usize::MAX);
        if friends.len() > max_friends {
            return Err(RescueError::precondition(format!(
                "at most {} friends are allowed, got {}",
                constants.max_friends,
                friends.len()
            )));
        }
        if self.threshold == 0 || usize::from(self.threshold) > friends.len() {
            return Err(RescueError::precondition(format!(
                "threshold must be between 1 and {}, got {}",
                friends.len(),
                self.threshold
            )));
        }
        Ok(ValidatedSetup {
            deposit: constants.config_deposit(friends.len()),
            friends,
            threshold: self.threshold,
            delay_period: self.delay_period,
        })
    }
}

/// Tracks the owner's own recovery config.
#[derive(Debug, Clone)]
pub struct OwnerEngine {
    account: Option<AccountId>,
    recoverability: RecoverabilityProbe,
    constants: Option<RecoveryConstants>,
    proposal: Option<OwnerSetup>,
}

impl Default for OwnerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl OwnerEngine {
    /// Engine with nothing selected.
    pub fn new() -> Self {
        Self {
            account: None,
            recoverability: recoverability_probe(),
            constants: None,
            proposal: None,
        }
    }

    /// Provide the protocol constants read for this connection.
    pub fn set_constants(&mut self, constants: RecoveryConstants) {
        self.constants = Some(constants);
    }

    /// Select the owner account.
    pub fn select_account(&mut self, account: Option<AccountId>) -> Vec<ProbeRequest> {
        if self.account == account {
            return Vec::new();
        }
        self.account = account;
        self.recoverability
            .select(account)
            .map(ProbeRequest::Recoverability)
            .into_iter()
            .collect()
    }

    /// Replace the proposed config.
    pub fn set_proposal(&mut self, proposal: Option<OwnerSetup>) {
        self.proposal = proposal;
    }

    /// Re-read the owner's config.
    pub fn refresh(&mut self) -> Vec<ProbeRequest> {
        self.recoverability
            .refresh()
            .map(ProbeRequest::Recoverability)
            .into_iter()
            .collect()
    }

    /// Fold a probe event.
    pub fn apply(&mut self, event: ProbeEvent) -> Vec<ProbeRequest> {
        if let ProbeEvent::Recoverability(response) = event {
            self.recoverability.apply(response);
        }
        Vec::new()
    }

    /// Current config.
    pub fn recoverability(&self) -> &ProbeState<RecoveryConfig> {
        self.recoverability.state()
    }

    /// Validate the proposal and build `create_recovery`.
    pub fn create(&self) -> Result<(RecoveryCall, Balance), RescueError> {
        self.ensure_selected()?;
        match self.recoverability.state() {
            ProbeState::Absent => {}
            ProbeState::Present(_) => {
                return Err(RescueError::precondition("account is already recoverable"))
            }
            ProbeState::Unknown | ProbeState::Failed(_) => {
                return Err(RescueError::precondition(
                    "current recovery config is not known yet",
                ))
            }
        }
        let setup = self.validated_proposal()?;
        Ok((setup.call(), setup.deposit))
    }

    /// Build `remove_recovery`.
    pub fn remove(&self) -> Result<RecoveryCall, RescueError> {
        self.ensure_selected()?;
        if self.recoverability.state().present().is_none() {
            return Err(RescueError::precondition("account has no recovery config"));
        }
        Ok(RecoveryCall::RemoveRecovery)
    }

    /// Read-only snapshot for presentation.
    pub fn view(&self) -> OwnerView {
        let proposed = self.validated_proposal().ok();
        OwnerView {
            account: self.account,
            recoverability: self.recoverability.state().clone(),
            proposed_deposit: proposed.as_ref().map(|setup| setup.deposit),
            can_create: self.recoverability.state().is_absent() && proposed.is_some(),
            can_remove: self.recoverability.state().present().is_some(),
            checking: self.account.is_some() && self.recoverability.state().is_unknown(),
            error: self.recoverability.state().failure().cloned(),
        }
    }

    fn ensure_selected(&self) -> Result<AccountId, RescueError> {
        self.account
            .ok_or_else(|| RescueError::precondition("no account selected"))
    }

    fn validated_proposal(&self) -> Result<ValidatedSetup, RescueError> {
        let proposal = self
            .proposal
            .as_ref()
            .ok_or_else(|| RescueError::precondition("no recovery config proposed"))?;
        let constants = self
            .constants
            .as_ref()
            .ok_or_else(|| RescueError::precondition("protocol constants not loaded"))?;
        proposal.validate(constants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probes::ProbeResponse;
    use assert_matches::assert_matches;

    fn account(seed: u8) -> AccountId {
        AccountId::new([seed; 32])
    }

    fn constants() -> RecoveryConstants {
        RecoveryConstants {
            config_deposit_base: 100,
            friend_deposit_factor: 10,
            max_friends: 3,
            recovery_deposit: 50,
        }
    }

    fn setup(friends: &[u8], threshold: u16) -> OwnerSetup {
        OwnerSetup {
            friends: friends.iter().map(|seed| account(*seed)).collect(),
            threshold,
            delay_period: 20,
        }
    }

    #[test]
    fn test_validate_sorts_and_prices() {
        let validated = setup(&[3, 1, 2], 2).validate(&constants()).unwrap();
        assert_eq!(
            validated.friends.as_slice(),
            &[account(1), account(2), account(3)]
        );
        assert_eq!(validated.deposit, 130);
    }

    #[test]
    fn test_validate_rejects_bad_proposals() {
        let constants = constants();
        for bad in [
            setup(&[], 1),
            setup(&[1, 1], 1),
            setup(&[1, 2, 3, 4], 2),
            setup(&[1, 2], 0),
            setup(&[1, 2], 3),
        ] {
            assert_matches!(
                bad.validate(&constants),
                Err(RescueError::PreconditionNotMet { .. }),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn test_create_only_when_not_recoverable() {
        let mut engine = OwnerEngine::new();
        engine.set_constants(constants());
        engine.set_proposal(Some(setup(&[1, 2], 2)));
        let requests = engine.select_account(Some(account(9)));
        let [ProbeRequest::Recoverability(ticket)] = requests.as_slice() else {
            panic!("expected a recoverability request");
        };
        assert!(engine.create().is_err());

        engine.apply(ProbeEvent::Recoverability(ProbeResponse::new(*ticket, Ok(None))));
        let (call, deposit) = engine.create().unwrap();
        assert_eq!(call.name(), "recovery.create_recovery");
        assert_eq!(deposit, 120);
        assert!(engine.remove().is_err());
        assert!(engine.view().can_create);
    }
}
