//! dxpool Auction Pool
//!
//! Aggregates many contributors' funds in two assets into one position on a
//! batch double-auction exchange, collects the proceeds once the round
//! clears, and pays them back pro rata.
//!
//! ## Design
//!
//! Each component is a free-standing module over a [`LedgerStore`] and the
//! collaborator traits from `dxpool-common`:
//! - `ledger`: contribute, withdraw, share queries
//! - `phase`: the Open -> Listed -> Settled machine and its guards
//! - `settlement`: listing on the exchange and collecting proceeds
//! - `distribution`: one claim per contributor
//! - `reporting`: informational valuation
//!
//! [`Pool`] ties them to a config and an event log. Every operation either
//! succeeds and logs one event or fails and leaves the ledger untouched.

use dxpool_common::{
    config::PoolConfig,
    errors::PoolResult,
    events::{EventLog, PoolEvent},
    traits::{AssetLedger, Exchange, PriceOracle},
    types::{
        Address, AuctionStatus, CallContext, ContributorEntry, Payout, Phase, PoolAction,
        PoolState, Timestamp,
    },
};

pub mod distribution;
pub mod ledger;
pub mod phase;
pub mod reporting;
pub mod settlement;
pub mod store;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

#[cfg(test)]
mod integration_tests;

pub use ledger::Stake;
pub use store::{ledger_digest, LedgerStore, MemoryStore};

// ============ Pool ============

/// One pool deployment
#[derive(Debug, Clone)]
pub struct Pool<S: LedgerStore = MemoryStore> {
    config: PoolConfig,
    store: S,
    events: EventLog,
}

impl Pool<MemoryStore> {
    /// Pool over a fresh in-memory store
    pub fn in_memory(config: PoolConfig) -> PoolResult<Self> {
        Self::new(config, MemoryStore::new())
    }
}

impl<S: LedgerStore> Pool<S> {
    /// Validate `config` and bind it to `store`
    pub fn new(config: PoolConfig, store: S) -> PoolResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            events: EventLog::new(),
        })
    }

    fn record(&mut self, result: PoolResult<PoolEvent>) -> PoolResult<()> {
        self.events.emit(result?);
        Ok(())
    }

    // ============ Operations ============

    /// Add funds while Open
    pub fn contribute<A: AssetLedger>(
        &mut self,
        assets: &mut A,
        ctx: &CallContext,
        asset1_amount: u64,
        asset2_amount: u64,
        attached_value: u64,
    ) -> PoolResult<()> {
        let result = ledger::contribute(
            &mut self.store,
            assets,
            &self.config,
            ctx,
            asset1_amount,
            asset2_amount,
            attached_value,
        );
        self.record(result)
    }

    /// Refund the caller's entry while Open
    pub fn withdraw<A: AssetLedger>(&mut self, assets: &mut A, ctx: &CallContext) -> PoolResult<()> {
        let result = ledger::withdraw(&mut self.store, assets, &self.config, ctx);
        self.record(result)
    }

    /// Move the pooled funds onto the exchange; callable by anyone
    pub fn list_to_exchange<X: Exchange>(&mut self, exchange: &mut X, ctx: &CallContext) -> PoolResult<()> {
        let result = settlement::list_to_exchange(&mut self.store, exchange, &self.config, ctx);
        self.record(result)
    }

    /// Pull the proceeds back once the round cleared; callable by anyone
    pub fn collect_from_exchange<X: Exchange>(
        &mut self,
        exchange: &mut X,
        ctx: &CallContext,
    ) -> PoolResult<()> {
        let result = settlement::collect_from_exchange(&mut self.store, exchange, &self.config, ctx);
        self.record(result)
    }

    /// Pay the caller's share of the proceeds
    pub fn claim<A: AssetLedger>(&mut self, assets: &mut A, ctx: &CallContext) -> PoolResult<()> {
        let result = distribution::claim(&mut self.store, assets, &self.config, ctx);
        self.record(result)
    }

    /// Main entry point: dispatch a submitted action
    pub fn execute<E>(&mut self, env: &mut E, ctx: &CallContext, action: &PoolAction) -> PoolResult<()>
    where
        E: AssetLedger + Exchange,
    {
        match action {
            PoolAction::Contribute { asset1_amount, asset2_amount, attached_value } => {
                self.contribute(env, ctx, *asset1_amount, *asset2_amount, *attached_value)
            }
            PoolAction::Withdraw => self.withdraw(env, ctx),
            PoolAction::ListToExchange => self.list_to_exchange(env, ctx),
            PoolAction::CollectFromExchange => self.collect_from_exchange(env, ctx),
            PoolAction::Claim => self.claim(env, ctx),
        }
    }

    // ============ Queries ============

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn state(&self) -> &PoolState {
        self.store.state()
    }

    pub fn phase(&self) -> Phase {
        self.store.state().phase
    }

    pub fn entry(&self, who: &Address) -> Option<ContributorEntry> {
        self.store.entry(who)
    }

    /// Proportional stake of `who` in each leg
    pub fn share_of(&self, who: &Address) -> Stake {
        ledger::share_of(&self.store, who)
    }

    /// Claim preview for `who`
    pub fn pending_payout(&self, who: &Address) -> PoolResult<Payout> {
        distribution::pending_payout(&self.store, who)
    }

    /// Proceeds not yet paid out
    pub fn residual_dust(&self) -> Payout {
        distribution::residual_dust(&self.store)
    }

    pub fn auction_status<X: Exchange>(&self, exchange: &X, now: Timestamp) -> AuctionStatus {
        settlement::auction_status(&self.store, exchange, &self.config, now)
    }

    /// Value of the pool's asset1 position in the oracle's reference currency
    pub fn balance_in_reference<O: PriceOracle>(&self, oracle: &O) -> PoolResult<u64> {
        reporting::balance_in_reference(&self.store, oracle)
    }

    /// Digest of the whole ledger; equal digests mean identical ledgers
    pub fn ledger_digest(&self) -> [u8; 32] {
        store::ledger_digest(&self.store)
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Drain the event log
    pub fn take_events(&mut self) -> Vec<PoolEvent> {
        core::mem::take(&mut self.events).into_events()
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
