//! Distribution Engine
//!
//! Pays each contributor their pro-rata share of the settlement proceeds,
//! exactly once.
//!
//! ## Payout
//!
//! The auction swaps one asset for the other, so payouts cross legs:
//!
//! ```text
//! asset2_paid = asset2_proceeds * entry.asset1_amount / listing.asset1_sold
//! asset1_paid = asset1_proceeds * entry.asset2_amount / listing.asset2_sold
//! ```
//!
//! Division truncates. What truncation leaves behind stays in the pool as
//! dust, at most one unit per claim and leg.

use dxpool_common::config::PoolConfig;
use dxpool_common::errors::{PoolError, PoolResult};
use dxpool_common::events::PoolEvent;
use dxpool_common::math;
use dxpool_common::traits::AssetLedger;
use dxpool_common::types::{
    Address, CallContext, ContributorEntry, ExternalOp, ListingRecord, Payout, Phase, PoolState,
    SettlementRecord,
};

use crate::ledger::legs;
use crate::store::LedgerStore;

/// Pay the caller's share and mark the entry claimed
pub fn claim<S, A>(
    store: &mut S,
    assets: &mut A,
    config: &PoolConfig,
    ctx: &CallContext,
) -> PoolResult<PoolEvent>
where
    S: LedgerStore,
    A: AssetLedger,
{
    let previous_state = store.state().clone();
    let (listing, settlement) = records(&previous_state)?;

    let previous_entry = store.entry(&ctx.caller).ok_or(PoolError::NothingContributed)?;
    if previous_entry.has_claimed {
        return Err(PoolError::AlreadyClaimed);
    }
    if previous_entry.is_empty() {
        return Err(PoolError::NothingContributed);
    }

    let payout = payout_for(&previous_entry, &listing, &settlement)?;

    let mut state = previous_state.clone();
    state.distributed_asset1 = checked_distribute(
        state.distributed_asset1,
        payout.asset1,
        settlement.asset1_proceeds,
    )?;
    state.distributed_asset2 = checked_distribute(
        state.distributed_asset2,
        payout.asset2,
        settlement.asset2_proceeds,
    )?;
    state.claim_count = math::add(state.claim_count, 1)?;

    // Lock the entry before paying
    let entry = ContributorEntry {
        asset1_amount: 0,
        asset2_amount: 0,
        has_claimed: true,
        paid_asset1: payout.asset1,
        paid_asset2: payout.asset2,
        first_contributed_at: previous_entry.first_contributed_at,
        last_updated: ctx.now,
    };
    store.put_entry(ctx.caller, entry);
    store.put_state(state);

    let payments = legs(config, config.pool_address, ctx.caller, payout.asset1, payout.asset2);
    if !payments.is_empty() {
        if let Err(cause) = assets.transfer_batch(&payments) {
            store.put_entry(ctx.caller, previous_entry);
            store.put_state(previous_state);
            return Err(PoolError::ExternalTransferFailed { op: ExternalOp::PayProceeds, cause });
        }
    }

    Ok(PoolEvent::Claimed {
        contributor: ctx.caller,
        asset1_paid: payout.asset1,
        asset2_paid: payout.asset2,
        timestamp: ctx.now,
    })
}

/// What `who` would receive by claiming now; zero once claimed or if
/// nothing was contributed
pub fn pending_payout<S: LedgerStore>(store: &S, who: &Address) -> PoolResult<Payout> {
    let (listing, settlement) = records(store.state())?;
    match store.entry(who) {
        Some(entry) if !entry.has_claimed => payout_for(&entry, &listing, &settlement),
        _ => Ok(Payout::default()),
    }
}

/// Proceeds not (yet) paid out, per leg
pub fn residual_dust<S: LedgerStore>(store: &S) -> Payout {
    let state = store.state();
    match state.settlement {
        Some(settlement) => Payout {
            asset1: settlement.asset1_proceeds.saturating_sub(state.distributed_asset1),
            asset2: settlement.asset2_proceeds.saturating_sub(state.distributed_asset2),
        },
        None => Payout::default(),
    }
}

fn records(state: &PoolState) -> PoolResult<(ListingRecord, SettlementRecord)> {
    state.phase.require(Phase::Settled)?;
    match (state.listing, state.settlement) {
        (Some(listing), Some(settlement)) => Ok((listing, settlement)),
        _ => Err(PoolError::InvalidPhase { expected: Phase::Settled, actual: state.phase }),
    }
}

fn payout_for(
    entry: &ContributorEntry,
    listing: &ListingRecord,
    settlement: &SettlementRecord,
) -> PoolResult<Payout> {
    Ok(Payout {
        asset1: math::pro_rata(settlement.asset1_proceeds, entry.asset2_amount, listing.asset2_sold)?,
        asset2: math::pro_rata(settlement.asset2_proceeds, entry.asset1_amount, listing.asset1_sold)?,
    })
}

fn checked_distribute(distributed: u64, paying: u64, proceeds: u64) -> PoolResult<u64> {
    let total = math::add(distributed, paying)?;
    if total > proceeds {
        return Err(PoolError::ConservationViolated { proceeds, distributed: total });
    }
    Ok(total)
}
