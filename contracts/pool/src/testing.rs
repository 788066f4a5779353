//! In-memory collaborators for tests
//!
//! `MockChain` plays the asset ledger, the auction exchange and the price
//! feed at once, so token movements between contributors, the pool's
//! custody and the exchange are all visible in one place. Faults can be
//! switched on to exercise rollback paths.

use std::collections::BTreeMap;

use dxpool_common::config::PoolConfig;
use dxpool_common::errors::ExternalError;
use dxpool_common::traits::{AssetLedger, Exchange, PriceOracle};
use dxpool_common::types::{Address, AssetId, Price, RoundId, Timestamp, Transfer};

pub const ASSET1: AssetId = [0xA1; 32];
pub const ASSET2: AssetId = [0xA2; 32];
pub const POOL: Address = [0xB0; 32];
pub const EXCHANGE: Address = [0xDE; 32];
pub const ALICE: Address = [1u8; 32];
pub const BOB: Address = [2u8; 32];
pub const CAROL: Address = [3u8; 32];

/// Standard pool config over the mock chain's addresses
pub fn config() -> PoolConfig {
    PoolConfig::new(POOL, EXCHANGE, ASSET1, ASSET2, Price::new(1, 1))
}

/// Switchable failure points
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// Every asset ledger batch fails
    pub transfers: bool,
    /// Exchange deposits fail
    pub deposits: bool,
    /// Exchange withdrawals fail
    pub withdrawals: bool,
    /// Order cancellation fails
    pub cancels: bool,
    /// Number of orders accepted before posting starts to fail
    pub orders_before_failure: Option<usize>,
    /// Price feed is down
    pub oracle: bool,
}

/// A posted sell order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub account: Address,
    pub sell: AssetId,
    pub buy: AssetId,
    pub round: RoundId,
    pub amount: u64,
}

#[derive(Debug, Clone, Copy, Default)]
struct RoundInfo {
    current: RoundId,
    start: Timestamp,
}

/// Asset ledger + exchange + oracle in one
#[derive(Debug, Clone, Default)]
pub struct MockChain {
    balances: BTreeMap<(AssetId, Address), u64>,
    exchange_balances: BTreeMap<(Address, AssetId), u64>,
    orders: Vec<Order>,
    rounds: BTreeMap<(AssetId, AssetId), RoundInfo>,
    closing_prices: BTreeMap<(AssetId, AssetId, RoundId), Price>,
    oracle_price: Price,
    posted: usize,
    pub faults: Faults,
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            oracle_price: Price::new(1_100, 1),
            ..Self::default()
        }
    }

    /// Chain where each contributor holds `amount` of both assets
    pub fn funded(contributors: &[Address], amount: u64) -> Self {
        let mut chain = Self::new();
        for who in contributors {
            chain.mint(&ASSET1, who, amount);
            chain.mint(&ASSET2, who, amount);
        }
        chain
    }

    pub fn mint(&mut self, asset: &AssetId, owner: &Address, amount: u64) {
        *self.balances.entry((*asset, *owner)).or_default() += amount;
    }

    pub fn balance(&self, asset: &AssetId, owner: &Address) -> u64 {
        self.balances.get(&(*asset, *owner)).copied().unwrap_or(0)
    }

    /// Take a cut of an account's exchange balance, as a venue fee would
    pub fn skim(&mut self, account: &Address, asset: &AssetId, amount: u64) {
        let held = self.exchange_balances.entry((*account, *asset)).or_default();
        *held = held.saturating_sub(amount);
        self.burn(asset, &EXCHANGE, amount);
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Set the pair's current round and its start time
    pub fn set_round(&mut self, a: &AssetId, b: &AssetId, current: RoundId, start: Timestamp) {
        self.rounds.insert(pair(a, b), RoundInfo { current, start });
    }

    pub fn set_oracle_price(&mut self, price: Price) {
        self.oracle_price = price;
    }

    /// Publish a closing price without touching orders
    pub fn set_closing_price(&mut self, sell: &AssetId, buy: &AssetId, round: RoundId, price: Price) {
        self.closing_prices.insert((*sell, *buy, round), price);
    }

    /// Clear `sell -> buy` in `round` at `price`: every matching order is
    /// filled and the bought asset is credited to the seller's exchange balance.
    pub fn clear_round(&mut self, sell: &AssetId, buy: &AssetId, round: RoundId, price: Price) {
        self.set_closing_price(sell, buy, round, price);
        let filled: Vec<Order> = self
            .orders
            .iter()
            .filter(|o| o.sell == *sell && o.buy == *buy && o.round == round)
            .copied()
            .collect();
        for order in filled {
            let bought = price.apply(order.amount).unwrap_or(0);
            // Buyers paid into the exchange's custody, sold funds leave it
            self.mint(buy, &EXCHANGE, bought);
            self.burn(sell, &EXCHANGE, order.amount);
            *self.exchange_balances.entry((order.account, *buy)).or_default() += bought;
        }
    }

    fn burn(&mut self, asset: &AssetId, owner: &Address, amount: u64) {
        let balance = self.balances.entry((*asset, *owner)).or_default();
        *balance = balance.saturating_sub(amount);
    }

    fn move_tokens(
        balances: &mut BTreeMap<(AssetId, Address), u64>,
        t: &Transfer,
    ) -> Result<(), ExternalError> {
        let from = balances.get(&(t.asset, t.from)).copied().unwrap_or(0);
        if from < t.amount {
            return Err(ExternalError::InsufficientFunds { available: from, requested: t.amount });
        }
        balances.insert((t.asset, t.from), from - t.amount);
        *balances.entry((t.asset, t.to)).or_default() += t.amount;
        Ok(())
    }
}

fn pair(a: &AssetId, b: &AssetId) -> (AssetId, AssetId) {
    if a <= b {
        (*a, *b)
    } else {
        (*b, *a)
    }
}

impl AssetLedger for MockChain {
    fn transfer_batch(&mut self, transfers: &[Transfer]) -> Result<(), ExternalError> {
        if self.faults.transfers {
            return Err(ExternalError::Rejected);
        }
        // Stage on a copy so a failing leg leaves nothing applied
        let mut staged = self.balances.clone();
        for t in transfers {
            Self::move_tokens(&mut staged, t)?;
        }
        self.balances = staged;
        Ok(())
    }

    fn balance_of(&self, asset: &AssetId, owner: &Address) -> u64 {
        self.balance(asset, owner)
    }
}

impl Exchange for MockChain {
    fn deposit(&mut self, account: &Address, asset: &AssetId, amount: u64) -> Result<(), ExternalError> {
        if self.faults.deposits {
            return Err(ExternalError::Rejected);
        }
        let t = Transfer { asset: *asset, from: *account, to: EXCHANGE, amount };
        Self::move_tokens(&mut self.balances, &t)?;
        *self.exchange_balances.entry((*account, *asset)).or_default() += amount;
        Ok(())
    }

    fn withdraw_proceeds(
        &mut self,
        account: &Address,
        asset: &AssetId,
        amount: u64,
    ) -> Result<(), ExternalError> {
        if self.faults.withdrawals {
            return Err(ExternalError::Unavailable);
        }
        let held = self.exchange_balance(account, asset);
        if held < amount {
            return Err(ExternalError::InsufficientFunds { available: held, requested: amount });
        }
        let t = Transfer { asset: *asset, from: EXCHANGE, to: *account, amount };
        Self::move_tokens(&mut self.balances, &t)?;
        self.exchange_balances.insert((*account, *asset), held - amount);
        Ok(())
    }

    fn post_order(
        &mut self,
        account: &Address,
        sell: &AssetId,
        buy: &AssetId,
        round: RoundId,
        amount: u64,
    ) -> Result<(), ExternalError> {
        if let Some(limit) = self.faults.orders_before_failure {
            if self.posted >= limit {
                return Err(ExternalError::Rejected);
            }
        }
        let held = self.exchange_balance(account, sell);
        if held < amount {
            return Err(ExternalError::InsufficientFunds { available: held, requested: amount });
        }
        self.exchange_balances.insert((*account, *sell), held - amount);
        self.orders.push(Order { account: *account, sell: *sell, buy: *buy, round, amount });
        self.posted += 1;
        Ok(())
    }

    fn cancel_order(
        &mut self,
        account: &Address,
        sell: &AssetId,
        buy: &AssetId,
        round: RoundId,
        amount: u64,
    ) -> Result<(), ExternalError> {
        if self.faults.cancels {
            return Err(ExternalError::Rejected);
        }
        let wanted = Order { account: *account, sell: *sell, buy: *buy, round, amount };
        let index = self
            .orders
            .iter()
            .position(|o| *o == wanted)
            .ok_or(ExternalError::Rejected)?;
        self.orders.remove(index);
        *self.exchange_balances.entry((*account, *sell)).or_default() += amount;
        Ok(())
    }

    fn exchange_balance(&self, account: &Address, asset: &AssetId) -> u64 {
        self.exchange_balances.get(&(*account, *asset)).copied().unwrap_or(0)
    }

    fn current_round(&self, asset_a: &AssetId, asset_b: &AssetId) -> RoundId {
        self.rounds.get(&pair(asset_a, asset_b)).map(|r| r.current).unwrap_or(0)
    }

    fn round_start_time(&self, asset_a: &AssetId, asset_b: &AssetId) -> Timestamp {
        self.rounds.get(&pair(asset_a, asset_b)).map(|r| r.start).unwrap_or(0)
    }

    fn closing_price(&self, sell: &AssetId, buy: &AssetId, round: RoundId) -> Price {
        self.closing_prices
            .get(&(*sell, *buy, round))
            .copied()
            .unwrap_or(Price::UNSET)
    }
}

impl PriceOracle for MockChain {
    fn value_in_reference(&self, amount: u64) -> Result<u64, ExternalError> {
        if self.faults.oracle {
            return Err(ExternalError::Unavailable);
        }
        self.oracle_price.apply(amount).map_err(|_| ExternalError::Rejected)
    }
}
