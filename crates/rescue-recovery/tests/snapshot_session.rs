//! Sessions over the exported demo chain in `demos/rescue-chain.json`.

use rescue_core::{AccountId, EngineConfig};
use rescue_effects::{ChainSnapshot, InMemoryChainHandler};
use rescue_recovery::{FriendSession, RecoveryCall, RescuerPhase, RescuerSession, VouchStatus};
use std::sync::Arc;

const DEMO_CHAIN: &str = include_str!("../../../demos/rescue-chain.json");

fn account(seed: u8) -> AccountId {
    AccountId::new([seed; 32])
}

fn demo_chain() -> Arc<InMemoryChainHandler> {
    let snapshot = ChainSnapshot::from_json_str(DEMO_CHAIN).unwrap();
    Arc::new(InMemoryChainHandler::new(snapshot))
}

#[tokio::test]
async fn demo_rescue_is_ready_to_withdraw() {
    let mut session = RescuerSession::rescuer(demo_chain(), &EngineConfig::default());
    session.update(|engine| {
        let mut requests = engine.select_lost_account(Some(account(1)));
        requests.extend(engine.select_rescuer(Some(account(2))));
        requests
    });
    session.settle().await;

    let engine = session.engine();
    assert_eq!(engine.phase(), RescuerPhase::Withdraw);
    assert_eq!(engine.remaining_blocks(), Some(-100));
    assert_eq!(engine.other_rescuers().len(), 1);

    let amounts = engine.amounts();
    assert_eq!(amounts.available, 20_000);
    assert_eq!(amounts.redeemable, 2_000);
    assert_eq!(amounts.staked, 1_000);
    assert_eq!(amounts.bonded, 5_000);
    // available + redeemable + config deposit + the other rescuer's deposit
    assert_eq!(amounts.total_withdrawable, 23_800);
    assert_eq!(amounts.span_count, 3);

    let RecoveryCall::BatchAll { calls } = engine.withdraw().unwrap() else {
        panic!("expected claim batch");
    };
    assert_eq!(calls[0], RecoveryCall::ClaimRecovery { account: account(1) });
    assert_eq!(
        calls[1].flatten_names(),
        vec![
            "recovery.as_recovered",
            "utility.batch_all",
            "recovery.close_recovery",
            "recovery.close_recovery",
            "recovery.remove_recovery",
            "staking.withdraw_unbonded",
            "balances.transfer_all",
        ]
    );
}

#[tokio::test]
async fn demo_friend_has_already_vouched() {
    let mut session = FriendSession::friend(demo_chain(), account(100), &EngineConfig::default());
    session.update(|engine| {
        let mut requests = engine.select_lost_account(Some(account(1)));
        requests.extend(engine.select_rescuer(Some(account(2))));
        requests
    });
    session.settle().await;
    assert_eq!(session.engine().decision(), VouchStatus::AlreadyVouched);

    let mut session = FriendSession::friend(demo_chain(), account(102), &EngineConfig::default());
    session.update(|engine| {
        let mut requests = engine.select_lost_account(Some(account(1)));
        requests.extend(engine.select_rescuer(Some(account(2))));
        requests
    });
    session.settle().await;
    assert_eq!(session.engine().decision(), VouchStatus::Ready);
}
