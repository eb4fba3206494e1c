//! Protocol constants of the recovery pallet.

use once_cell::sync::OnceCell;
use rescue_core::{read_constant_decoded, Balance, ChainConstant, ChainError, ChainQueryEffects};
use serde::{Deserialize, Serialize};

/// Protocol-wide recovery parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryConstants {
    /// Base reservation for creating a recovery config
    pub config_deposit_base: Balance,
    /// Additional reservation per friend
    pub friend_deposit_factor: Balance,
    /// Maximum number of friends in a config
    pub max_friends: u32,
    /// Reservation a rescuer makes to initiate a recovery
    pub recovery_deposit: Balance,
}

impl RecoveryConstants {
    /// Read every constant from the chain.
    pub fn read<C: ChainQueryEffects + ?Sized>(chain: &C) -> Result<Self, ChainError> {
        Ok(Self {
            config_deposit_base: read_constant_decoded(chain, ChainConstant::ConfigDepositBase)?,
            friend_deposit_factor: read_constant_decoded(
                chain,
                ChainConstant::FriendDepositFactor,
            )?,
            max_friends: read_constant_decoded(chain, ChainConstant::MaxFriends)?,
            recovery_deposit: read_constant_decoded(chain, ChainConstant::RecoveryDeposit)?,
        })
    }

    /// Reservation needed for a config with `friends` friends.
    pub fn config_deposit(&self, friends: usize) -> Balance {
        let friends = Balance::try_from(friends).unwrap_or(Balance::MAX);
        self.config_deposit_base
            .saturating_add(self.friend_deposit_factor.saturating_mul(friends))
    }
}

/// Reads [`RecoveryConstants`] once per chain connection.
///
/// Create one reader per connection; a failed read is not cached, so the
/// next call tries again.
#[derive(Debug, Default)]
pub struct RecoveryConfigReader {
    constants: OnceCell<RecoveryConstants>,
}

impl RecoveryConfigReader {
    /// Create an empty reader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Constants for this connection, reading them on first use.
    pub fn constants<C: ChainQueryEffects + ?Sized>(
        &self,
        chain: &C,
    ) -> Result<&RecoveryConstants, ChainError> {
        self.constants.get_or_try_init(|| {
            let constants = RecoveryConstants::read(chain)?;
            tracing::debug!(?constants, "read recovery constants");
            Ok(constants)
        })
    }

    /// Constants if already read.
    pub fn cached(&self) -> Option<&RecoveryConstants> {
        self.constants.get()
    }
}
