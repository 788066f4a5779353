//! Informational valuation through the read-only price feed.
//!
//! Nothing here feeds back into settlement or distribution.

use dxpool_common::errors::{PoolError, PoolResult};
use dxpool_common::math;
use dxpool_common::traits::PriceOracle;
use dxpool_common::types::Phase;

use crate::store::LedgerStore;

/// Reference-currency value of the asset1 the pool is accountable for.
///
/// While Open or Listed that is the pooled asset1 total; once Settled it is
/// the asset1 proceeds still awaiting claims.
pub fn balance_in_reference<S, O>(store: &S, oracle: &O) -> PoolResult<u64>
where
    S: LedgerStore,
    O: PriceOracle,
{
    let state = store.state();
    let held = match (state.phase, state.settlement) {
        (Phase::Settled, Some(settlement)) => {
            math::sub(settlement.asset1_proceeds, state.distributed_asset1)?
        }
        _ => state.asset1_total,
    };
    oracle
        .value_in_reference(held)
        .map_err(|cause| PoolError::OracleFailed { cause })
}
