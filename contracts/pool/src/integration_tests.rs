//! Integration Tests
//!
//! Full pool lifecycles driven through [`Pool`] against the mock chain,
//! plus property tests for conservation and the dust bound.

use proptest::prelude::*;

use crate::store::LedgerStore;
use crate::testing::*;
use crate::Pool;
use dxpool_common::constants::pool::MAX_DUST_PER_CLAIM;
use dxpool_common::errors::PoolError;
use dxpool_common::events::{EventType, PoolEvent};
use dxpool_common::types::{Address, CallContext, Phase, Price, Share};

fn at(who: Address, now: u64) -> CallContext {
    CallContext::new(who, now)
}

fn contributor(i: usize) -> Address {
    [0x10 + i as u8; 32]
}

// ============================================================================
// Lifecycle Scenarios
// ============================================================================

#[test]
fn test_single_contributor_round_trip() {
    let mut pool = Pool::in_memory(config()).unwrap();
    let mut chain = MockChain::funded(&[ALICE], 1_000);

    // 1. Alice funds the asset1 leg
    pool.contribute(&mut chain, &at(ALICE, 10), 100, 0, 0).unwrap();

    // 2. Anyone may list
    pool.list_to_exchange(&mut chain, &at(CAROL, 20)).unwrap();
    assert_eq!(pool.phase(), Phase::Listed);

    // 3. Round clears at 2:1
    chain.clear_round(&ASSET1, &ASSET2, 0, Price::new(2, 1));
    pool.collect_from_exchange(&mut chain, &at(CAROL, 30)).unwrap();
    assert_eq!(pool.state().settlement.unwrap().asset2_proceeds, 200);

    // 4. Alice holds 100% and takes it all
    assert_eq!(pool.share_of(&ALICE).asset1, Share { amount: 100, total: 100 });
    pool.claim(&mut chain, &at(ALICE, 40)).unwrap();
    assert_eq!(chain.balance(&ASSET2, &ALICE), 1_200);
    assert_eq!(chain.balance(&ASSET1, &ALICE), 900);

    // 5. Second claim is refused
    assert_eq!(pool.claim(&mut chain, &at(ALICE, 41)), Err(PoolError::AlreadyClaimed));

    let kinds: Vec<_> = pool.events().events().iter().map(PoolEvent::event_type).collect();
    assert_eq!(
        kinds,
        vec![EventType::Contributed, EventType::Listed, EventType::Settled, EventType::Claimed]
    );
}

#[test]
fn test_withdrawn_contributor_is_excluded() {
    let mut pool = Pool::in_memory(config()).unwrap();
    let mut chain = MockChain::funded(&[ALICE, BOB], 1_000);

    pool.contribute(&mut chain, &at(ALICE, 1), 100, 0, 0).unwrap();
    pool.contribute(&mut chain, &at(BOB, 2), 0, 50, 0).unwrap();
    pool.withdraw(&mut chain, &at(BOB, 3)).unwrap();

    // Bob is made whole
    assert_eq!(chain.balance(&ASSET2, &BOB), 1_000);
    assert!(pool.entry(&BOB).unwrap().is_empty());

    pool.list_to_exchange(&mut chain, &at(CAROL, 4)).unwrap();
    let listing = pool.state().listing.unwrap();
    assert_eq!(listing.asset1_sold, 100);
    assert_eq!(listing.asset2_sold, 0);
    assert_eq!(chain.orders().len(), 1);

    // Alice's share is 100%
    assert_eq!(pool.share_of(&ALICE).asset1.bps(), 10_000);

    chain.clear_round(&ASSET1, &ASSET2, 0, Price::new(2, 1));
    pool.collect_from_exchange(&mut chain, &at(CAROL, 5)).unwrap();
    pool.claim(&mut chain, &at(ALICE, 6)).unwrap();
    assert_eq!(chain.balance(&ASSET2, &ALICE), 1_200);
    assert_eq!(pool.claim(&mut chain, &at(BOB, 6)), Err(PoolError::NothingContributed));
}

#[test]
fn test_native_value_joins_asset1_leg() {
    let mut pool = Pool::in_memory(config()).unwrap();
    let mut chain = MockChain::funded(&[ALICE], 1_000);
    // Value delivered alongside the call
    chain.mint(&ASSET1, &POOL, 25);

    pool.contribute(&mut chain, &at(ALICE, 1), 75, 0, 25).unwrap();
    assert_eq!(pool.state().asset1_total, 100);

    pool.list_to_exchange(&mut chain, &at(ALICE, 2)).unwrap();
    assert_eq!(chain.orders()[0].amount, 100);
}

#[test]
fn test_reporting_follows_lifecycle() {
    let mut pool = Pool::in_memory(config()).unwrap();
    let mut chain = MockChain::funded(&[ALICE, BOB], 1_000);

    pool.contribute(&mut chain, &at(ALICE, 1), 0, 100, 0).unwrap();
    pool.contribute(&mut chain, &at(BOB, 1), 2, 0, 0).unwrap();
    assert_eq!(pool.balance_in_reference(&chain).unwrap(), 2_200);

    pool.list_to_exchange(&mut chain, &at(CAROL, 2)).unwrap();
    chain.clear_round(&ASSET1, &ASSET2, 0, Price::new(1, 1));
    chain.clear_round(&ASSET2, &ASSET1, 0, Price::new(1, 10));
    pool.collect_from_exchange(&mut chain, &at(CAROL, 3)).unwrap();

    // 10 asset1 of proceeds await Alice
    assert_eq!(pool.balance_in_reference(&chain).unwrap(), 11_000);
    pool.claim(&mut chain, &at(ALICE, 4)).unwrap();
    assert_eq!(pool.balance_in_reference(&chain).unwrap(), 0);
}

// ============================================================================
// P2: No Late Entry
// ============================================================================

#[test]
fn test_contribution_after_listing_changes_nothing() {
    let mut pool = Pool::in_memory(config()).unwrap();
    let mut chain = MockChain::funded(&[ALICE, BOB], 1_000);
    pool.contribute(&mut chain, &at(ALICE, 1), 100, 0, 0).unwrap();
    pool.list_to_exchange(&mut chain, &at(CAROL, 2)).unwrap();

    for phase in [Phase::Listed, Phase::Settled] {
        if phase == Phase::Settled {
            chain.clear_round(&ASSET1, &ASSET2, 0, Price::new(1, 1));
            pool.collect_from_exchange(&mut chain, &at(CAROL, 3)).unwrap();
        }
        let digest = pool.ledger_digest();
        let events = pool.events().len();

        assert_eq!(
            pool.contribute(&mut chain, &at(BOB, 4), 10, 10, 0),
            Err(PoolError::InvalidPhase { expected: Phase::Open, actual: phase })
        );
        assert_eq!(
            pool.withdraw(&mut chain, &at(ALICE, 4)),
            Err(PoolError::InvalidPhase { expected: Phase::Open, actual: phase })
        );
        assert_eq!(pool.ledger_digest(), digest);
        assert_eq!(pool.events().len(), events);
        assert_eq!(chain.balance(&ASSET1, &BOB), 1_000);
    }
}

// ============================================================================
// P3: One-Shot Settlement
// ============================================================================

#[test]
fn test_settlement_happens_once() {
    let mut pool = Pool::in_memory(config()).unwrap();
    let mut chain = MockChain::funded(&[ALICE], 1_000);
    pool.contribute(&mut chain, &at(ALICE, 1), 100, 0, 0).unwrap();

    pool.list_to_exchange(&mut chain, &at(CAROL, 2)).unwrap();
    assert_eq!(pool.list_to_exchange(&mut chain, &at(BOB, 3)), Err(PoolError::AlreadyListed));

    let digest = pool.ledger_digest();
    let err = pool.collect_from_exchange(&mut chain, &at(BOB, 4)).unwrap_err();
    assert_eq!(err, PoolError::AuctionNotCleared { round: 0 });
    assert!(err.is_recoverable());
    assert_eq!(pool.ledger_digest(), digest);

    chain.clear_round(&ASSET1, &ASSET2, 0, Price::new(3, 2));
    pool.collect_from_exchange(&mut chain, &at(BOB, 5)).unwrap();
    assert_eq!(pool.phase(), Phase::Settled);
    assert_eq!(pool.collect_from_exchange(&mut chain, &at(BOB, 6)), Err(PoolError::AlreadySettled));
    assert_eq!(pool.list_to_exchange(&mut chain, &at(BOB, 6)), Err(PoolError::AlreadyListed));

    assert_eq!(pool.events().filter_by_type(EventType::Listed).len(), 1);
    assert_eq!(pool.events().filter_by_type(EventType::Settled).len(), 1);
}

#[test]
fn test_failed_listing_leaves_pool_open() {
    let mut pool = Pool::in_memory(config()).unwrap();
    let mut chain = MockChain::funded(&[ALICE, BOB], 1_000);
    pool.contribute(&mut chain, &at(ALICE, 1), 100, 0, 0).unwrap();
    pool.contribute(&mut chain, &at(BOB, 1), 0, 60, 0).unwrap();
    let digest = pool.ledger_digest();

    chain.faults.orders_before_failure = Some(1);
    assert!(pool.list_to_exchange(&mut chain, &at(CAROL, 2)).is_err());
    assert_eq!(pool.ledger_digest(), digest);
    assert_eq!(pool.phase(), Phase::Open);

    // Still Open, so contributors keep their rights
    pool.withdraw(&mut chain, &at(BOB, 3)).unwrap();
    assert_eq!(chain.balance(&ASSET2, &BOB), 1_000);

    chain.faults.orders_before_failure = None;
    pool.list_to_exchange(&mut chain, &at(CAROL, 4)).unwrap();
    assert_eq!(pool.state().listing.unwrap().asset2_sold, 0);
}

// ============================================================================
// P4 / P5: Claims and Withdrawals
// ============================================================================

#[test]
fn test_claims_never_exceed_proceeds() {
    let mut pool = Pool::in_memory(config()).unwrap();
    let people = [ALICE, BOB, CAROL];
    let mut chain = MockChain::funded(&people, 1_000);
    for (i, who) in people.iter().enumerate() {
        pool.contribute(&mut chain, &at(*who, 1), 33 + i as u64, 0, 0).unwrap();
    }
    pool.list_to_exchange(&mut chain, &at(ALICE, 2)).unwrap();
    chain.clear_round(&ASSET1, &ASSET2, 0, Price::new(7, 3));
    pool.collect_from_exchange(&mut chain, &at(ALICE, 3)).unwrap();

    let proceeds = pool.state().settlement.unwrap().asset2_proceeds;
    for who in people {
        let expected = proceeds * pool.entry(&who).unwrap().asset1_amount / 102;
        assert_eq!(pool.pending_payout(&who).unwrap().asset2, expected);
        pool.claim(&mut chain, &at(who, 4)).unwrap();
        assert_eq!(pool.entry(&who).unwrap().paid_asset2, expected);
    }

    let state = pool.state();
    assert!(state.distributed_asset2 <= proceeds);
    assert!(pool.residual_dust().asset2 <= state.claim_count * MAX_DUST_PER_CLAIM);
    assert_eq!(chain.balance(&ASSET2, &POOL), pool.residual_dust().asset2);
}

#[test]
fn test_fresh_entry_after_withdrawal() {
    let mut pool = Pool::in_memory(config()).unwrap();
    let mut chain = MockChain::funded(&[ALICE], 1_000);

    pool.contribute(&mut chain, &at(ALICE, 1), 40, 60, 0).unwrap();
    pool.withdraw(&mut chain, &at(ALICE, 2)).unwrap();
    pool.contribute(&mut chain, &at(ALICE, 9), 5, 0, 0).unwrap();

    let entry = pool.entry(&ALICE).unwrap();
    assert_eq!((entry.asset1_amount, entry.asset2_amount), (5, 0));
    assert_eq!(entry.first_contributed_at, 9);
    assert_eq!(pool.state().asset2_total, 0);
}

// ============================================================================
// Property Tests
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    Contribute { who: usize, asset1: u64, asset2: u64 },
    Withdraw { who: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..4usize, 0..10_000u64, 0..10_000u64)
            .prop_map(|(who, asset1, asset2)| Op::Contribute { who, asset1, asset2 }),
        1 => (0..4usize).prop_map(|who| Op::Withdraw { who }),
    ]
}

proptest! {
    /// Entries always sum to the pool totals while Open
    #[test]
    fn prop_open_ledger_conserves(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let people: Vec<Address> = (0..4).map(contributor).collect();
        let mut pool = Pool::in_memory(config()).unwrap();
        let mut chain = MockChain::funded(&people, 1_000_000);

        for (t, op) in ops.into_iter().enumerate() {
            let result = match op {
                Op::Contribute { who, asset1, asset2 } => {
                    pool.contribute(&mut chain, &at(people[who], t as u64), asset1, asset2, 0)
                }
                Op::Withdraw { who } => pool.withdraw(&mut chain, &at(people[who], t as u64)),
            };
            if let Err(err) = result {
                prop_assert_eq!(err, PoolError::NothingToWithdraw);
            }

            let entries = pool.store().entries();
            let sum1: u64 = entries.iter().map(|(_, e)| e.asset1_amount).sum();
            let sum2: u64 = entries.iter().map(|(_, e)| e.asset2_amount).sum();
            prop_assert_eq!(sum1, pool.state().asset1_total);
            prop_assert_eq!(sum2, pool.state().asset2_total);
            prop_assert_eq!(chain.balance(&ASSET1, &POOL), sum1);
            prop_assert_eq!(chain.balance(&ASSET2, &POOL), sum2);
        }
    }

    /// Withdrawal returns exactly what was contributed
    #[test]
    fn prop_withdraw_refunds_exactly(asset1 in 0..5_000u64, asset2 in 0..5_000u64) {
        prop_assume!(asset1 > 0 || asset2 > 0);
        let mut pool = Pool::in_memory(config()).unwrap();
        let mut chain = MockChain::funded(&[ALICE], 5_000);

        pool.contribute(&mut chain, &at(ALICE, 1), asset1, asset2, 0).unwrap();
        pool.withdraw(&mut chain, &at(ALICE, 2)).unwrap();

        prop_assert_eq!(chain.balance(&ASSET1, &ALICE), 5_000);
        prop_assert_eq!(chain.balance(&ASSET2, &ALICE), 5_000);
        prop_assert!(pool.entry(&ALICE).unwrap().is_empty());
    }

    /// Payouts never exceed proceeds and leave less than one unit per claim
    #[test]
    fn prop_distribution_bounded(
        stakes in prop::collection::vec((1..1_000u64, 0..1_000u64), 1..8),
        num_12 in 1..50u64,
        den_12 in 1..50u64,
        num_21 in 1..50u64,
        den_21 in 1..50u64,
    ) {
        let people: Vec<Address> = (0..stakes.len()).map(contributor).collect();
        let mut pool = Pool::in_memory(config()).unwrap();
        let mut chain = MockChain::funded(&people, 1_000);

        for (who, (asset1, asset2)) in people.iter().zip(&stakes) {
            pool.contribute(&mut chain, &at(*who, 1), *asset1, *asset2, 0).unwrap();
        }
        pool.list_to_exchange(&mut chain, &at(ALICE, 2)).unwrap();
        chain.clear_round(&ASSET1, &ASSET2, 0, Price::new(num_12, den_12));
        chain.clear_round(&ASSET2, &ASSET1, 0, Price::new(num_21, den_21));
        pool.collect_from_exchange(&mut chain, &at(ALICE, 3)).unwrap();

        for who in &people {
            pool.claim(&mut chain, &at(*who, 4)).unwrap();
            prop_assert_eq!(pool.claim(&mut chain, &at(*who, 5)), Err(PoolError::AlreadyClaimed));
        }

        let state = pool.state();
        let settlement = state.settlement.unwrap();
        prop_assert!(state.distributed_asset1 <= settlement.asset1_proceeds);
        prop_assert!(state.distributed_asset2 <= settlement.asset2_proceeds);

        let dust = pool.residual_dust();
        prop_assert!(dust.asset1 <= state.claim_count * MAX_DUST_PER_CLAIM);
        prop_assert!(dust.asset2 <= state.claim_count * MAX_DUST_PER_CLAIM);
        prop_assert_eq!(chain.balance(&ASSET1, &POOL), dust.asset1);
        prop_assert_eq!(chain.balance(&ASSET2, &POOL), dust.asset2);
    }
}
