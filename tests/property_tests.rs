use coupon_ledger::domain::coupon::CouponKey;
use coupon_ledger::error::RedemptionError;
use proptest::prelude::*;

mod common;

const INITIAL: u64 = 15000;

struct Outcome {
    accepted: Vec<u64>,
    final_balance: u64,
    history_balances: Vec<u64>,
}

fn run(steps: Vec<(i64, bool)>) -> Outcome {
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async move {
        let (engine, remote, _) = common::in_memory_engine();
        let key = CouponKey::monetary("prop");
        engine.load_coupon(&key, INITIAL).await;

        let mut accepted = Vec::new();
        let mut expected = INITIAL;
        for (amount, online) in steps {
            remote.set_online(online);
            match engine.redeem(&key, amount).await {
                Ok(redemption) => {
                    expected -= amount as u64;
                    assert_eq!(redemption.new_balance, expected);
                    accepted.push(amount as u64);
                }
                Err(RedemptionError::InvalidAmount(_)) => assert!(amount <= 0),
                Err(RedemptionError::InsufficientBalance {
                    requested,
                    available,
                }) => {
                    assert_eq!(available, expected);
                    assert!(requested > available);
                }
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        let view = engine.view(&key).await.unwrap();
        let mut history_balances: Vec<u64> =
            view.history.iter().map(|e| e.resulting_balance).collect();
        // The view is most recent first; compare in append order.
        history_balances.reverse();
        Outcome {
            accepted,
            final_balance: view.balance,
            history_balances,
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn balance_is_initial_minus_accepted(
        steps in prop::collection::vec((-50i64..6000, any::<bool>()), 0..16)
    ) {
        let outcome = run(steps);

        let redeemed: u64 = outcome.accepted.iter().sum();
        prop_assert_eq!(outcome.final_balance, INITIAL - redeemed);
        prop_assert_eq!(outcome.history_balances.len(), outcome.accepted.len());

        let mut running = INITIAL;
        for (amount, balance) in outcome.accepted.iter().zip(&outcome.history_balances) {
            running -= amount;
            prop_assert_eq!(*balance, running);
        }
    }
}
