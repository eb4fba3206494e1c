//! Deterministic accounts and recovery scenarios.

use crate::mock_chain::MockChain;
use rescue_core::{
    AccountId, ActiveRecoveryAttempt, Balance, BlockNumber, FriendSet, RecoveryConfig,
    RecoveryPair,
};

/// Owner deposit used by [`RecoveryScenario`] configs.
pub const CONFIG_DEPOSIT: Balance = 1_000;

/// Deposit a rescuer reserves in [`RecoveryScenario`].
pub const RECOVERY_DEPOSIT: Balance = 500;

/// Deterministic account whose bytes are all `seed`.
pub fn account(seed: u8) -> AccountId {
    AccountId::new([seed; 32])
}

/// The lost account used by scenarios.
pub fn lost_account() -> AccountId {
    account(1)
}

/// The rescuer used by scenarios.
pub fn rescuer_account() -> AccountId {
    account(2)
}

/// Friend number `index` (0-based).
pub fn friend_account(index: u8) -> AccountId {
    account(100 + index)
}

/// Builder for a chain holding a recoverable account and, optionally, an
/// active attempt.
#[derive(Debug, Clone)]
pub struct RecoveryScenario {
    friends: u8,
    threshold: u16,
    delay_period: BlockNumber,
    block_height: BlockNumber,
    attempt_created: Option<BlockNumber>,
    vouchers: Vec<AccountId>,
    recoverable: bool,
}

impl Default for RecoveryScenario {
    fn default() -> Self {
        Self {
            friends: 3,
            threshold: 2,
            delay_period: 100,
            block_height: 1_000,
            attempt_created: None,
            vouchers: Vec::new(),
            recoverable: true,
        }
    }
}

impl RecoveryScenario {
    /// Recoverable lost account, 3 friends, threshold 2, delay 100 blocks,
    /// height 1000, no attempt.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lost account without a recovery config.
    pub fn not_recoverable(mut self) -> Self {
        self.recoverable = false;
        self
    }

    /// Number of friends in the config.
    pub fn with_friends(mut self, friends: u8) -> Self {
        self.friends = friends;
        self
    }

    /// Vouches required.
    pub fn with_threshold(mut self, threshold: u16) -> Self {
        self.threshold = threshold;
        self
    }

    /// Delay period in blocks.
    pub fn with_delay(mut self, delay_period: BlockNumber) -> Self {
        self.delay_period = delay_period;
        self
    }

    /// Current block height.
    pub fn at_height(mut self, block_height: BlockNumber) -> Self {
        self.block_height = block_height;
        self
    }

    /// Attempt by the scenario rescuer, created at `created`.
    pub fn initiated_at(mut self, created: BlockNumber) -> Self {
        self.attempt_created = Some(created);
        self
    }

    /// Friends (by index) that already vouched.
    pub fn vouched_by(mut self, friends: &[u8]) -> Self {
        self.vouchers = friends.iter().map(|index| friend_account(*index)).collect();
        self
    }

    /// The scenario's (lost, rescuer) pair.
    pub fn pair(&self) -> RecoveryPair {
        RecoveryPair::new(lost_account(), rescuer_account())
    }

    /// The config the scenario stores.
    pub fn config(&self) -> RecoveryConfig {
        RecoveryConfig {
            delay_period: self.delay_period,
            deposit: CONFIG_DEPOSIT,
            friends: (0..self.friends).map(friend_account).collect(),
            threshold: self.threshold,
        }
    }

    /// The attempt the scenario stores, if initiated.
    pub fn attempt(&self) -> Option<ActiveRecoveryAttempt> {
        self.attempt_created.map(|created| ActiveRecoveryAttempt {
            created,
            deposit: RECOVERY_DEPOSIT,
            friends: FriendSet::new(self.vouchers.clone()),
        })
    }

    /// Write the scenario into a fresh [`MockChain`] with protocol constants.
    pub fn build(&self) -> MockChain {
        let chain = MockChain::new();
        chain.set_recovery_constants(CONFIG_DEPOSIT, 100, 9, RECOVERY_DEPOSIT);
        chain.set_block_height(self.block_height);
        if self.recoverable {
            chain.set_recovery_config(lost_account(), &self.config());
        }
        if let Some(attempt) = self.attempt() {
            chain.set_active_recovery(self.pair(), Some(&attempt));
        }
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rescue_core::{ChainQueryEffects, StorageKey};

    #[tokio::test]
    async fn test_scenario_writes_config_and_attempt() {
        let scenario = RecoveryScenario::new().initiated_at(950).vouched_by(&[0]);
        let chain = scenario.build();

        let key = StorageKey::active_recovery(&scenario.pair());
        assert!(chain.read_optional(&key).await.unwrap().is_some());
        assert_eq!(chain.current_block_height().await.unwrap(), 1_000);
        assert_eq!(scenario.attempt().unwrap().voucher_count(), 1);
    }

    #[tokio::test]
    async fn test_not_recoverable_scenario() {
        let chain = RecoveryScenario::new().not_recoverable().build();
        let key = StorageKey::Recoverable {
            account: lost_account(),
        };
        assert_eq!(chain.read_optional(&key).await.unwrap(), None);
    }
}
