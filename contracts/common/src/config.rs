//! Pool Configuration
//!
//! Immutable parameters fixed when a pool is deployed. Deployment
//! descriptors travel as CBOR.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::constants::pool::DEFAULT_LISTING_POLICY;
use crate::errors::{PoolError, PoolResult};
use crate::types::{Address, AssetId, ListingPolicy, Price};
use crate::Vec;

/// Construction parameters of one pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PoolConfig {
    /// The pool's own custody account
    pub pool_address: Address,
    /// Address of the auction exchange
    pub exchange: Address,
    /// Reserve asset (e.g. wrapped native currency)
    pub asset1: AssetId,
    /// Target token
    pub asset2: AssetId,
    /// Seed for the first auction's expected asset1 -> asset2 price
    pub initial_price: Price,
    /// When the pool may leave Open
    pub listing_policy: ListingPolicy,
}

impl PoolConfig {
    /// Config with the default listing policy
    pub fn new(
        pool_address: Address,
        exchange: Address,
        asset1: AssetId,
        asset2: AssetId,
        initial_price: Price,
    ) -> Self {
        Self {
            pool_address,
            exchange,
            asset1,
            asset2,
            initial_price,
            listing_policy: DEFAULT_LISTING_POLICY,
        }
    }

    pub fn with_listing_policy(mut self, policy: ListingPolicy) -> Self {
        self.listing_policy = policy;
        self
    }

    /// Check construction invariants
    pub fn validate(&self) -> PoolResult<()> {
        if self.initial_price.den == 0 {
            return Err(PoolError::InvalidConfig {
                param: "initial_price",
                reason: "denominator must be nonzero",
            });
        }
        if self.asset1 == self.asset2 {
            return Err(PoolError::InvalidConfig {
                param: "asset2",
                reason: "must differ from asset1",
            });
        }
        if self.exchange == [0u8; 32] {
            return Err(PoolError::InvalidConfig {
                param: "exchange",
                reason: "zero address",
            });
        }
        if self.pool_address == [0u8; 32] || self.pool_address == self.exchange {
            return Err(PoolError::InvalidConfig {
                param: "pool_address",
                reason: "must be nonzero and distinct from the exchange",
            });
        }
        Ok(())
    }

    /// Decode and validate a CBOR deployment descriptor
    pub fn from_cbor(bytes: &[u8]) -> PoolResult<Self> {
        let config: PoolConfig = ciborium::de::from_reader(bytes).map_err(|_| {
            PoolError::InvalidConfig { param: "descriptor", reason: "malformed CBOR" }
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Encode as a CBOR deployment descriptor
    pub fn to_cbor(&self) -> PoolResult<Vec<u8>> {
        let mut out = Vec::new();
        ciborium::ser::into_writer(self, &mut out).map_err(|_| {
            PoolError::InvalidConfig { param: "descriptor", reason: "encoding failed" }
        })?;
        Ok(out)
    }
}
