//! Pool Constants
//!
//! Values shared with the exchange and defaults for new pools.

/// Exchange conventions (DutchExchange)
pub mod exchange {
    use crate::types::Timestamp;

    /// Round start sentinel: round exists but waits for enough sell volume
    pub const WAITING_FOR_FUNDING: Timestamp = 1;

    /// Round start sentinel: no round scheduled
    pub const UNSCHEDULED: Timestamp = 0;
}

/// Pool defaults
pub mod pool {
    use crate::types::ListingPolicy;

    /// Listing policy used when none is configured
    pub const DEFAULT_LISTING_POLICY: ListingPolicy = ListingPolicy::AnyLegFunded;

    /// Basis points denominator for share reporting
    pub const BPS_DENOMINATOR: u64 = 10_000;

    /// Maximum truncation loss per claim and leg, in smallest units
    pub const MAX_DUST_PER_CLAIM: u64 = 1;
}
