//! Balance Ledger
//!
//! Per-contributor entries and pool totals while the pool is Open.
//!
//! ## Rules
//!
//! - **Contribute**: assets move first, in one atomic batch, then the entry
//!   and totals are credited. A failed batch credits nothing.
//! - **Withdraw**: entry and totals are zeroed first, then both legs are
//!   refunded in one batch. A failed refund restores the entry.
//! - **Share**: measured against the totals pinned at listing once the pool
//!   has listed, against the running totals before that.

use dxpool_common::config::PoolConfig;
use dxpool_common::errors::{ExternalError, PoolError, PoolResult};
use dxpool_common::events::PoolEvent;
use dxpool_common::math;
use dxpool_common::traits::AssetLedger;
use dxpool_common::types::{
    Address, CallContext, ContributorEntry, ExternalOp, Phase, Share, Transfer,
};

use crate::store::LedgerStore;

/// A contributor's proportional stake in each leg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stake {
    pub asset1: Share,
    pub asset2: Share,
}

/// Add funds to the caller's entry.
///
/// The asset1 leg is credited with `asset1_amount + attached_value`.
/// `attached_value` is native value delivered into the pool's custody with
/// the call, so only `asset1_amount` and `asset2_amount` are pulled from the
/// contributor. Custody must already hold the pooled asset1 total plus the
/// attached value, otherwise the call fails and nothing is credited.
pub fn contribute<S, A>(
    store: &mut S,
    assets: &mut A,
    config: &PoolConfig,
    ctx: &CallContext,
    asset1_amount: u64,
    asset2_amount: u64,
    attached_value: u64,
) -> PoolResult<PoolEvent>
where
    S: LedgerStore,
    A: AssetLedger,
{
    let mut state = store.state().clone();
    state.phase.require(Phase::Open)?;

    let credited1 = math::add(asset1_amount, attached_value)?;
    let new_total1 = math::add(state.asset1_total, credited1)?;
    let new_total2 = math::add(state.asset2_total, asset2_amount)?;

    let existing = store.entry(&ctx.caller);
    let is_new = existing.is_none();
    let mut entry = match existing {
        // A withdrawn entry starts over
        Some(entry) if entry.is_empty() => ContributorEntry::new(ctx.now),
        Some(entry) => entry,
        None => ContributorEntry::new(ctx.now),
    };
    entry.asset1_amount = math::add(entry.asset1_amount, credited1)?;
    entry.asset2_amount = math::add(entry.asset2_amount, asset2_amount)?;
    entry.last_updated = ctx.now;

    if attached_value > 0 {
        let held = assets.balance_of(&config.asset1, &config.pool_address);
        let backed = math::add(state.asset1_total, attached_value)?;
        if held < backed {
            return Err(PoolError::ExternalTransferFailed {
                op: ExternalOp::PullContribution,
                cause: ExternalError::InsufficientFunds {
                    available: held.saturating_sub(state.asset1_total),
                    requested: attached_value,
                },
            });
        }
    }

    let pulls = legs(config, ctx.caller, config.pool_address, asset1_amount, asset2_amount);
    if !pulls.is_empty() {
        assets.transfer_batch(&pulls).map_err(|cause| PoolError::ExternalTransferFailed {
            op: ExternalOp::PullContribution,
            cause,
        })?;
    }

    if is_new {
        state.contributor_count = math::add(state.contributor_count, 1)?;
    }
    state.asset1_total = new_total1;
    state.asset2_total = new_total2;

    store.put_entry(ctx.caller, entry);
    store.put_state(state);

    Ok(PoolEvent::Contributed {
        contributor: ctx.caller,
        asset1_amount: credited1,
        asset2_amount,
        asset1_total: new_total1,
        asset2_total: new_total2,
        timestamp: ctx.now,
    })
}

/// Refund the caller's whole entry while Open
pub fn withdraw<S, A>(
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
    previous_state.phase.require(Phase::Open)?;

    let previous_entry = store
        .entry(&ctx.caller)
        .filter(|e| !e.is_empty())
        .ok_or(PoolError::NothingToWithdraw)?;

    let refund1 = previous_entry.asset1_amount;
    let refund2 = previous_entry.asset2_amount;

    let mut state = previous_state.clone();
    state.asset1_total = math::sub(state.asset1_total, refund1)?;
    state.asset2_total = math::sub(state.asset2_total, refund2)?;

    let mut entry = previous_entry.clone();
    entry.asset1_amount = 0;
    entry.asset2_amount = 0;
    entry.last_updated = ctx.now;

    let (total1, total2) = (state.asset1_total, state.asset2_total);
    store.put_entry(ctx.caller, entry);
    store.put_state(state);

    let refunds = legs(config, config.pool_address, ctx.caller, refund1, refund2);
    if let Err(cause) = assets.transfer_batch(&refunds) {
        store.put_entry(ctx.caller, previous_entry);
        store.put_state(previous_state);
        return Err(PoolError::ExternalTransferFailed {
            op: ExternalOp::RefundContribution,
            cause,
        });
    }

    Ok(PoolEvent::Withdrawn {
        contributor: ctx.caller,
        asset1_amount: refund1,
        asset2_amount: refund2,
        asset1_total: total1,
        asset2_total: total2,
        timestamp: ctx.now,
    })
}

/// Proportional stake of `who` in each leg.
///
/// A claim zeroes the entry, so a claimed contributor's share reads zero;
/// `paid_asset1`/`paid_asset2` on the entry record what the claim paid.
pub fn share_of<S: LedgerStore>(store: &S, who: &Address) -> Stake {
    let state = store.state();
    let (total1, total2) = match state.listing {
        Some(listing) => (listing.asset1_sold, listing.asset2_sold),
        None => (state.asset1_total, state.asset2_total),
    };
    let entry = store.entry(who).unwrap_or_default();

    Stake {
        asset1: Share { amount: entry.asset1_amount, total: total1 },
        asset2: Share { amount: entry.asset2_amount, total: total2 },
    }
}

/// Transfers for both legs between `from` and `to`, skipping empty legs
pub(crate) fn legs(
    config: &PoolConfig,
    from: Address,
    to: Address,
    asset1_amount: u64,
    asset2_amount: u64,
) -> Vec<Transfer> {
    [(config.asset1, asset1_amount), (config.asset2, asset2_amount)]
        .into_iter()
        .filter(|(_, amount)| *amount > 0)
        .map(|(asset, amount)| Transfer { asset, from, to, amount })
        .collect()
}
