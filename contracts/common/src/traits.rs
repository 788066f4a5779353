//! External Collaborators
//!
//! The pool never moves assets itself. It drives three collaborators
//! through these traits: the asset ledger holding both legs, the batch
//! auction exchange, and a read-only price feed for reporting.

use crate::errors::ExternalError;
use crate::types::{Address, AssetId, Price, RoundId, Timestamp, Transfer};

/// Token transfer interface for both asset legs.
///
/// `transfer_batch` is all-or-nothing: either every move in the batch is
/// applied or none is, and failure is always reported.
pub trait AssetLedger {
    /// Apply every transfer or none of them
    fn transfer_batch(&mut self, transfers: &[Transfer]) -> Result<(), ExternalError>;

    /// Balance of `owner` in `asset`
    fn balance_of(&self, asset: &AssetId, owner: &Address) -> u64;

    /// Single transfer
    fn transfer(
        &mut self,
        asset: &AssetId,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<(), ExternalError> {
        self.transfer_batch(&[Transfer { asset: *asset, from: *from, to: *to, amount }])
    }
}

/// Batch double-auction venue (DutchExchange style).
///
/// Balances are held per account inside the exchange. Sell orders are
/// funded from that balance and clear at the round's closing price.
pub trait Exchange {
    /// Move `amount` of `asset` from the account's custody into its exchange balance
    fn deposit(&mut self, account: &Address, asset: &AssetId, amount: u64) -> Result<(), ExternalError>;

    /// Move `amount` of `asset` from the exchange balance back to the account's custody
    fn withdraw_proceeds(
        &mut self,
        account: &Address,
        asset: &AssetId,
        amount: u64,
    ) -> Result<(), ExternalError>;

    /// Sell `amount` of `sell` for `buy` in auction `round`
    fn post_order(
        &mut self,
        account: &Address,
        sell: &AssetId,
        buy: &AssetId,
        round: RoundId,
        amount: u64,
    ) -> Result<(), ExternalError>;

    /// Revoke an order that has not started clearing; funds return to the exchange balance
    fn cancel_order(
        &mut self,
        account: &Address,
        sell: &AssetId,
        buy: &AssetId,
        round: RoundId,
        amount: u64,
    ) -> Result<(), ExternalError>;

    /// Balance of `asset` the account holds inside the exchange
    fn exchange_balance(&self, account: &Address, asset: &AssetId) -> u64;

    /// Latest auction index for the pair
    fn current_round(&self, asset_a: &AssetId, asset_b: &AssetId) -> RoundId;

    /// Start time of the pair's current round (0 = unscheduled)
    fn round_start_time(&self, asset_a: &AssetId, asset_b: &AssetId) -> Timestamp;

    /// Closing price of `sell` in `buy` for `round`; unset until it clears
    fn closing_price(&self, sell: &AssetId, buy: &AssetId, round: RoundId) -> Price;
}

/// Read-only price feed used for informational reporting only
pub trait PriceOracle {
    /// Value of `amount` of the reserve asset in the reference currency
    fn value_in_reference(&self, amount: u64) -> Result<u64, ExternalError>;
}
