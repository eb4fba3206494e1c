//! Properties of the rescuer engine over random chain histories.
//!
//! The engine is driven synchronously: each request is executed against the
//! mock chain with `futures::executor::block_on` and folded straight back in.

use futures::executor::block_on;
use proptest::prelude::*;
use rescue_core::EngineConfig;
use rescue_recovery::{ProbeRequest, RescuerPhase, RescuerStepEngine};
use rescue_testkit::{friend_account, lost_account, rescuer_account, MockChain, RecoveryScenario};

#[derive(Debug, Clone)]
enum ChainStep {
    Advance(u32),
    Vouch(u8),
    InstallProxy,
}

fn chain_step() -> impl Strategy<Value = ChainStep> {
    prop_oneof![
        4 => (1u32..80).prop_map(ChainStep::Advance),
        3 => (0u8..5).prop_map(ChainStep::Vouch),
        1 => Just(ChainStep::InstallProxy),
    ]
}

fn drive(engine: &mut RescuerStepEngine, chain: &MockChain, requests: Vec<ProbeRequest>) {
    let mut pending = requests;
    while let Some(request) = pending.pop() {
        let event = block_on(request.execute(chain));
        pending.extend(engine.apply(event));
    }
}

proptest! {
    #[test]
    fn prop_phase_is_monotone_within_a_session(
        threshold in 1u16..4,
        delay in 0u32..200,
        steps in proptest::collection::vec(chain_step(), 1..25),
    ) {
        let scenario = RecoveryScenario::new()
            .with_friends(5)
            .with_threshold(threshold)
            .with_delay(delay)
            .initiated_at(1_000)
            .at_height(1_000);
        let chain = scenario.build();
        let mut engine = RescuerStepEngine::new(EngineConfig::default());

        let mut requests = engine.select_lost_account(Some(lost_account()));
        requests.extend(engine.select_rescuer(Some(rescuer_account())));
        drive(&mut engine, &chain, requests);
        prop_assert_eq!(engine.phase(), RescuerPhase::Wait);

        let mut previous = engine.phase();
        let mut previous_remaining = engine.remaining_blocks();
        for step in steps {
            let advanced = matches!(step, ChainStep::Advance(_));
            match step {
                ChainStep::Advance(blocks) => chain.advance_blocks(blocks),
                ChainStep::Vouch(index) => {
                    chain.vouch(scenario.pair(), friend_account(index));
                }
                ChainStep::InstallProxy => chain.set_proxy(rescuer_account(), Some(lost_account())),
            }
            let requests = engine.refresh();
            drive(&mut engine, &chain, requests);

            let phase = engine.phase();
            prop_assert!(phase >= previous, "{:?} regressed to {:?}", previous, phase);
            if engine.is_proxy() == Some(true) {
                prop_assert_eq!(phase, RescuerPhase::Withdraw);
            }

            let remaining = engine.remaining_blocks();
            if advanced {
                if let (Some(before), Some(after)) = (previous_remaining, remaining) {
                    prop_assert!(after < before);
                }
            }

            if let (Some(remaining), Some(vouchers)) = (remaining, engine.view().vouchers) {
                if remaining <= 0 && vouchers >= usize::from(threshold) {
                    prop_assert_eq!(phase, RescuerPhase::Withdraw);
                }
            }

            previous = phase;
            previous_remaining = remaining;
        }
    }
}
