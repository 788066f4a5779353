//! Settlement Engine
//!
//! Moves the pooled position onto the exchange and, once the auction round
//! clears, pulls the proceeds back.
//!
//! ## Atomicity
//!
//! The new phase and record are written before any exchange call. Each
//! completed exchange step is journaled; when a later step fails the
//! journal is unwound in reverse and the previous state is restored, so a
//! failed call leaves the ledger and the exchange as they were.

use dxpool_common::config::PoolConfig;
use dxpool_common::constants::exchange::{UNSCHEDULED, WAITING_FOR_FUNDING};
use dxpool_common::errors::{PoolError, PoolResult};
use dxpool_common::events::PoolEvent;
use dxpool_common::math;
use dxpool_common::traits::Exchange;
use dxpool_common::types::{
    Address, AssetId, AuctionStatus, CallContext, ExternalOp, ListingRecord, Phase, Price,
    RoundId, SettlementRecord, Timestamp,
};

use crate::phase;
use crate::store::LedgerStore;

// ============ Journal ============

/// A completed exchange step that can be undone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Deposited { asset: AssetId, amount: u64 },
    Posted { sell: AssetId, buy: AssetId, round: RoundId, amount: u64 },
    Withdrew { asset: AssetId, amount: u64 },
}

impl Step {
    /// The exchange call that reverses this step
    fn undo_op(&self) -> ExternalOp {
        match self {
            Step::Deposited { .. } => ExternalOp::ExchangeWithdraw,
            Step::Posted { .. } => ExternalOp::CancelOrder,
            Step::Withdrew { .. } => ExternalOp::ExchangeDeposit,
        }
    }
}

/// Exchange steps taken on behalf of one account within a single call
#[derive(Debug)]
struct Journal {
    account: Address,
    steps: Vec<Step>,
}

impl Journal {
    fn new(account: Address) -> Self {
        Self { account, steps: Vec::new() }
    }

    fn deposit<X: Exchange>(&mut self, exchange: &mut X, asset: AssetId, amount: u64) -> PoolResult<()> {
        exchange
            .deposit(&self.account, &asset, amount)
            .map_err(|cause| PoolError::ExternalTransferFailed { op: ExternalOp::ExchangeDeposit, cause })?;
        self.steps.push(Step::Deposited { asset, amount });
        Ok(())
    }

    fn post<X: Exchange>(
        &mut self,
        exchange: &mut X,
        sell: AssetId,
        buy: AssetId,
        round: RoundId,
        amount: u64,
    ) -> PoolResult<()> {
        exchange
            .post_order(&self.account, &sell, &buy, round, amount)
            .map_err(|cause| PoolError::ExternalTransferFailed { op: ExternalOp::PostOrder, cause })?;
        self.steps.push(Step::Posted { sell, buy, round, amount });
        Ok(())
    }

    fn withdraw<X: Exchange>(&mut self, exchange: &mut X, asset: AssetId, amount: u64) -> PoolResult<()> {
        exchange
            .withdraw_proceeds(&self.account, &asset, amount)
            .map_err(|cause| PoolError::ExternalTransferFailed { op: ExternalOp::ExchangeWithdraw, cause })?;
        self.steps.push(Step::Withdrew { asset, amount });
        Ok(())
    }

    /// Undo every recorded step, newest first
    fn unwind<X: Exchange>(mut self, exchange: &mut X) -> PoolResult<()> {
        while let Some(step) = self.steps.pop() {
            let undone = match step {
                Step::Deposited { asset, amount } => {
                    exchange.withdraw_proceeds(&self.account, &asset, amount)
                }
                Step::Posted { sell, buy, round, amount } => {
                    exchange.cancel_order(&self.account, &sell, &buy, round, amount)
                }
                Step::Withdrew { asset, amount } => exchange.deposit(&self.account, &asset, amount),
            };
            if undone.is_err() {
                return Err(PoolError::RollbackIncomplete { op: step.undo_op() });
            }
        }
        Ok(())
    }

    /// Unwind after `err`; a failed unwind takes precedence
    fn abort<X: Exchange>(self, exchange: &mut X, err: PoolError) -> PoolError {
        match self.unwind(exchange) {
            Ok(()) => err,
            Err(rollback) => rollback,
        }
    }
}

// ============ Round Selection ============

/// True if a round with this start time is already running at `now`
fn has_started(start: Timestamp, now: Timestamp) -> bool {
    start != UNSCHEDULED && start != WAITING_FOR_FUNDING && start <= now
}

/// Round that accepts new sell orders: the next one once the current round
/// has started, the current one otherwise
pub fn target_round(current: RoundId, start: Timestamp, now: Timestamp) -> PoolResult<RoundId> {
    if has_started(start, now) {
        math::add(current, 1)
    } else {
        Ok(current)
    }
}

/// Expected asset1 -> asset2 price for `round`: the previous round's close
/// if there is one, the configured seed otherwise
fn reference_price<X: Exchange>(exchange: &X, config: &PoolConfig, round: RoundId) -> Price {
    round
        .checked_sub(1)
        .map(|prev| exchange.closing_price(&config.asset1, &config.asset2, prev))
        .filter(Price::is_set)
        .unwrap_or(config.initial_price)
}

// ============ Operations ============

/// Deposit both funded legs and post them as sell orders for the other asset
pub fn list_to_exchange<S, X>(
    store: &mut S,
    exchange: &mut X,
    config: &PoolConfig,
    ctx: &CallContext,
) -> PoolResult<PoolEvent>
where
    S: LedgerStore,
    X: Exchange,
{
    let previous = store.state().clone();
    phase::require_listable(&previous, &config.listing_policy)?;

    let current = exchange.current_round(&config.asset1, &config.asset2);
    let start = exchange.round_start_time(&config.asset1, &config.asset2);
    let round = target_round(current, start, ctx.now)?;

    let listing = ListingRecord {
        round,
        asset1_sold: previous.asset1_total,
        asset2_sold: previous.asset2_total,
        reference_price: reference_price(exchange, config, round),
        listed_at: ctx.now,
    };

    let mut state = previous.clone();
    phase::advance(&mut state, Phase::Listed)?;
    state.listing = Some(listing);
    store.put_state(state);

    let mut journal = Journal::new(config.pool_address);
    let legs = [
        (config.asset1, config.asset2, listing.asset1_sold),
        (config.asset2, config.asset1, listing.asset2_sold),
    ];
    for (sell, buy, amount) in legs {
        if amount == 0 {
            continue;
        }
        let step = journal
            .deposit(exchange, sell, amount)
            .and_then(|_| journal.post(exchange, sell, buy, round, amount));
        if let Err(err) = step {
            store.put_state(previous);
            return Err(journal.abort(exchange, err));
        }
    }

    Ok(PoolEvent::Listed {
        caller: ctx.caller,
        round,
        asset1_sold: listing.asset1_sold,
        asset2_sold: listing.asset2_sold,
        reference_price: listing.reference_price,
        timestamp: ctx.now,
    })
}

/// Withdraw the proceeds of the recorded round once it has cleared
pub fn collect_from_exchange<S, X>(
    store: &mut S,
    exchange: &mut X,
    config: &PoolConfig,
    ctx: &CallContext,
) -> PoolResult<PoolEvent>
where
    S: LedgerStore,
    X: Exchange,
{
    let previous = store.state().clone();
    let listing = phase::require_collectable(&previous)?;

    let price_1_to_2 = exchange.closing_price(&config.asset1, &config.asset2, listing.round);
    let price_2_to_1 = exchange.closing_price(&config.asset2, &config.asset1, listing.round);
    let held2 = exchange.exchange_balance(&config.pool_address, &config.asset2);
    let held1 = exchange.exchange_balance(&config.pool_address, &config.asset1);
    let asset2_proceeds = proceeds(listing.asset1_sold, price_1_to_2, held2, listing.round)?;
    let asset1_proceeds = proceeds(listing.asset2_sold, price_2_to_1, held1, listing.round)?;

    let mut state = previous.clone();
    phase::advance(&mut state, Phase::Settled)?;
    state.settlement = Some(SettlementRecord {
        asset1_proceeds,
        asset2_proceeds,
        price_1_to_2,
        price_2_to_1,
        settled_at: ctx.now,
    });
    store.put_state(state);

    let mut journal = Journal::new(config.pool_address);
    for (asset, amount) in [(config.asset2, asset2_proceeds), (config.asset1, asset1_proceeds)] {
        if amount == 0 {
            continue;
        }
        if let Err(err) = journal.withdraw(exchange, asset, amount) {
            store.put_state(previous);
            return Err(journal.abort(exchange, err));
        }
    }

    Ok(PoolEvent::Settled {
        caller: ctx.caller,
        round: listing.round,
        asset1_proceeds,
        asset2_proceeds,
        timestamp: ctx.now,
    })
}

/// Amount bought by selling `sold` at `price`, capped by what the exchange
/// actually credited (`held`). A sold leg needs a cleared price and, unless
/// it bought nothing, a credited balance.
fn proceeds(sold: u64, price: Price, held: u64, round: RoundId) -> PoolResult<u64> {
    if sold == 0 {
        return Ok(0);
    }
    if !price.is_set() {
        return Err(PoolError::AuctionNotCleared { round });
    }
    let expected = price.apply(sold)?;
    if expected == 0 {
        return Ok(0);
    }
    if held == 0 {
        return Err(PoolError::AuctionNotCleared { round });
    }
    Ok(expected.min(held))
}

/// Where the pool's auction round stands
pub fn auction_status<S, X>(store: &S, exchange: &X, config: &PoolConfig, now: Timestamp) -> AuctionStatus
where
    S: LedgerStore,
    X: Exchange,
{
    let state = store.state();
    let Some(listing) = state.listing else {
        return AuctionStatus::NotListed;
    };
    if state.phase == Phase::Settled {
        return AuctionStatus::Cleared;
    }

    let leg_cleared = |sell: &AssetId, buy: &AssetId, sold: u64| {
        sold == 0 || exchange.closing_price(sell, buy, listing.round).is_set()
    };
    if leg_cleared(&config.asset1, &config.asset2, listing.asset1_sold)
        && leg_cleared(&config.asset2, &config.asset1, listing.asset2_sold)
    {
        return AuctionStatus::Cleared;
    }

    let current = exchange.current_round(&config.asset1, &config.asset2);
    let start = exchange.round_start_time(&config.asset1, &config.asset2);
    if current > listing.round || (current == listing.round && has_started(start, now)) {
        AuctionStatus::Running
    } else {
        AuctionStatus::Waiting
    }
}
