//! Owner setup against a mock chain.

use assert_matches::assert_matches;
use rescue_core::{ChainConstant, EngineConfig, RescueError};
use rescue_recovery::{OwnerEngine, OwnerSession, OwnerSetup, RecoveryCall};
use rescue_testkit::{account, friend_account, lost_account, MockChain, RecoveryScenario};
use std::sync::Arc;

fn proposal() -> OwnerSetup {
    OwnerSetup {
        friends: vec![friend_account(2), friend_account(0), friend_account(1)],
        threshold: 2,
        delay_period: 14_400,
    }
}

#[tokio::test]
async fn unconfigured_account_can_create_recovery() {
    let chain = RecoveryScenario::new().not_recoverable().build();
    let mut session: OwnerSession<MockChain> =
        OwnerSession::with_default_engine(Arc::new(chain), &EngineConfig::default());
    session.update(|engine| {
        engine.set_proposal(Some(proposal()));
        engine.select_account(Some(lost_account()))
    });
    session.settle().await;

    let view = session.engine().view();
    assert!(view.can_create);
    assert!(!view.can_remove);
    // Scenario constants: base 1000, 100 per friend.
    assert_eq!(view.proposed_deposit, Some(1_300));

    let (call, deposit) = session.engine().create().unwrap();
    assert_eq!(deposit, 1_300);
    assert_eq!(
        call,
        RecoveryCall::CreateRecovery {
            friends: vec![friend_account(0), friend_account(1), friend_account(2)],
            threshold: 2,
            delay_period: 14_400,
        }
    );
}

#[tokio::test]
async fn configured_account_can_only_remove() {
    let chain = RecoveryScenario::new().build();
    let mut session =
        OwnerSession::new(Arc::new(chain), OwnerEngine::new(), &EngineConfig::default());
    session.update(|engine| {
        engine.set_proposal(Some(proposal()));
        engine.select_account(Some(lost_account()))
    });
    session.settle().await;

    assert_matches!(
        session.engine().create(),
        Err(RescueError::PreconditionNotMet { .. })
    );
    assert_eq!(session.engine().remove().unwrap(), RecoveryCall::RemoveRecovery);
}

#[tokio::test]
async fn too_many_friends_for_the_chain() {
    let chain = RecoveryScenario::new().not_recoverable().build();
    chain.set_constant(ChainConstant::MaxFriends, 2u32);
    let mut session: OwnerSession<MockChain> =
        OwnerSession::with_default_engine(Arc::new(chain), &EngineConfig::default());
    session.update(|engine| {
        engine.set_proposal(Some(proposal()));
        engine.select_account(Some(account(5)))
    });
    session.settle().await;

    assert!(!session.engine().view().can_create);
    assert!(session.engine().create().is_err());
}

#[tokio::test]
async fn constants_missing_then_available() {
    let chain = MockChain::new();
    let mut session: OwnerSession<MockChain> =
        OwnerSession::with_default_engine(Arc::new(chain.clone()), &EngineConfig::default());
    session.update(|engine| {
        engine.set_proposal(Some(proposal()));
        engine.select_account(Some(account(5)))
    });
    session.settle().await;
    assert!(session.engine().create().is_err());

    chain.set_recovery_constants(10, 1, 9, 5);
    let constants = session.constants().unwrap();
    assert_eq!(constants.max_friends, 9);
    let (_, deposit) = session.engine().create().unwrap();
    assert_eq!(deposit, 13);
}
