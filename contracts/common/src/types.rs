//! Core Types for the dxpool Pool
//!
//! Data structures shared by the pool engines: the phase machine, the
//! durable pool aggregate, per-contributor entries and the records pinned
//! at listing and settlement time.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::constants::pool::BPS_DENOMINATOR;
use crate::errors::{PoolError, PoolResult};
use crate::math;

/// Type alias for account addresses (32-byte hash)
pub type Address = [u8; 32];

/// Type alias for asset identifiers
pub type AssetId = [u8; 32];

/// Auction round index on the exchange
pub type RoundId = u64;

/// Seconds since the Unix epoch
pub type Timestamp = u64;

// ============ Phase ============

/// Lifecycle phase of the pool. Only ever moves forward.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default,
    Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum Phase {
    /// Accepting contributions and withdrawals
    #[default]
    Open = 0,
    /// Funds are on the exchange, waiting for the round to clear
    Listed = 1,
    /// Proceeds collected, contributors may claim
    Settled = 2,
}

impl Phase {
    /// The only phase reachable from this one, if any
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Open => Some(Phase::Listed),
            Phase::Listed => Some(Phase::Settled),
            Phase::Settled => None,
        }
    }

    /// True if `to` is the immediate successor of `self`
    pub fn can_transition_to(self, to: Phase) -> bool {
        self.next() == Some(to)
    }

    /// Settled has no exit
    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    /// Fail with `InvalidPhase` unless the pool is in `expected`
    pub fn require(self, expected: Phase) -> PoolResult<()> {
        if self != expected {
            return Err(PoolError::InvalidPhase { expected, actual: self });
        }
        Ok(())
    }
}

// ============ Price ============

/// Exchange rate of a sell asset in units of the buy asset.
///
/// A zero denominator means the price is unset, which the exchange uses to
/// signal that a round has not cleared.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default,
    Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct Price {
    pub num: u64,
    pub den: u64,
}

impl Price {
    pub const UNSET: Price = Price { num: 0, den: 0 };

    pub fn new(num: u64, den: u64) -> Self {
        Self { num, den }
    }

    pub fn is_set(&self) -> bool {
        self.den != 0
    }

    /// Convert `amount` of the sell asset into the buy asset (truncating)
    pub fn apply(&self, amount: u64) -> PoolResult<u64> {
        math::mul_div(amount, self.num, self.den)
    }
}

// ============ Listing Policy ============

/// Threshold that must hold for the pool to leave Open
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default,
    Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub enum ListingPolicy {
    /// At least one asset total is nonzero
    #[default]
    AnyLegFunded,
    /// Both asset totals are nonzero
    BothLegsFunded,
    /// Each asset total reaches its minimum
    Minimums { asset1: u64, asset2: u64 },
}

impl ListingPolicy {
    pub fn is_met(&self, asset1_total: u64, asset2_total: u64) -> bool {
        match *self {
            ListingPolicy::AnyLegFunded => asset1_total > 0 || asset2_total > 0,
            ListingPolicy::BothLegsFunded => asset1_total > 0 && asset2_total > 0,
            ListingPolicy::Minimums { asset1, asset2 } => {
                asset1_total >= asset1 && asset2_total >= asset2
                    && (asset1_total > 0 || asset2_total > 0)
            }
        }
    }
}

// ============ Contributor Entry ============

/// One contributor's position, created lazily on first contribution
#[derive(
    Debug, Clone, PartialEq, Eq, Default,
    Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct ContributorEntry {
    /// Amount of asset1 supplied
    pub asset1_amount: u64,
    /// Amount of asset2 supplied
    pub asset2_amount: u64,
    /// Set once by the distribution engine
    pub has_claimed: bool,
    /// asset1 paid out by the claim (proceeds of the asset2 leg)
    pub paid_asset1: u64,
    /// asset2 paid out by the claim (proceeds of the asset1 leg)
    pub paid_asset2: u64,
    /// Time the entry was first created
    pub first_contributed_at: Timestamp,
    /// Time of the last mutation
    pub last_updated: Timestamp,
}

impl ContributorEntry {
    pub fn new(now: Timestamp) -> Self {
        Self {
            first_contributed_at: now,
            last_updated: now,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.asset1_amount == 0 && self.asset2_amount == 0
    }
}

// ============ Pinned Records ============

/// Captured once at the Open -> Listed transition
#[derive(
    Debug, Clone, Copy, PartialEq, Eq,
    Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct ListingRecord {
    /// Auction round the pool's orders were posted to
    pub round: RoundId,
    /// asset1 total sold for asset2 (denominator for asset1 shares)
    pub asset1_sold: u64,
    /// asset2 total sold for asset1 (denominator for asset2 shares)
    pub asset2_sold: u64,
    /// Expected asset1 -> asset2 price at listing time
    pub reference_price: Price,
    /// Time of listing
    pub listed_at: Timestamp,
}

/// Captured once at the Listed -> Settled transition
#[derive(
    Debug, Clone, Copy, PartialEq, Eq,
    Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct SettlementRecord {
    /// asset1 received for the sold asset2 leg
    pub asset1_proceeds: u64,
    /// asset2 received for the sold asset1 leg
    pub asset2_proceeds: u64,
    /// Closing price of the asset1 -> asset2 auction
    pub price_1_to_2: Price,
    /// Closing price of the asset2 -> asset1 auction
    pub price_2_to_1: Price,
    /// Time of settlement
    pub settled_at: Timestamp,
}

// ============ Pool State ============

/// Pool-wide aggregate, one per deployment
#[derive(
    Debug, Clone, PartialEq, Eq, Default,
    Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct PoolState {
    /// Current phase
    pub phase: Phase,
    /// Sum of all asset1 contributions
    pub asset1_total: u64,
    /// Sum of all asset2 contributions
    pub asset2_total: u64,
    /// Number of contributor entries ever created
    pub contributor_count: u64,
    /// Set at listing
    pub listing: Option<ListingRecord>,
    /// Set at settlement
    pub settlement: Option<SettlementRecord>,
    /// asset1 paid out to claimants so far
    pub distributed_asset1: u64,
    /// asset2 paid out to claimants so far
    pub distributed_asset2: u64,
    /// Number of successful claims
    pub claim_count: u64,
}

impl PoolState {
    pub fn new() -> Self {
        Self::default()
    }
}

// ============ Collaborator Types ============

/// External step a pool operation performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalOp {
    /// Contributor -> pool
    PullContribution,
    /// Pool -> contributor, on withdrawal
    RefundContribution,
    /// Pool -> contributor, on claim
    PayProceeds,
    /// Pool custody -> exchange balance
    ExchangeDeposit,
    /// Sell order on the exchange
    PostOrder,
    /// Revoke a posted sell order
    CancelOrder,
    /// Exchange balance -> pool custody
    ExchangeWithdraw,
}

/// A single asset move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub asset: AssetId,
    pub from: Address,
    pub to: Address,
    pub amount: u64,
}

/// Proportional stake expressed as an exact ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Share {
    pub amount: u64,
    pub total: u64,
}

impl Share {
    /// Share in basis points (10_000 = 100%), truncated
    pub fn bps(&self) -> u64 {
        math::mul_div(self.amount, BPS_DENOMINATOR, self.total).unwrap_or(0)
    }
}

/// Amounts owed to (or paid to) a claimant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Payout {
    /// asset1 owed for the contributor's asset2 leg
    pub asset1: u64,
    /// asset2 owed for the contributor's asset1 leg
    pub asset2: u64,
}

/// State of the pool's auction round as seen from the exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuctionStatus {
    /// Pool has not listed yet
    NotListed,
    /// Round is scheduled or waiting for funding
    Waiting,
    /// Round has started and not cleared
    Running,
    /// Closing prices are available
    Cleared,
}

/// Who is calling and when
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    pub now: Timestamp,
}

impl CallContext {
    pub fn new(caller: Address, now: Timestamp) -> Self {
        Self { caller, now }
    }
}

/// Actions a caller can submit to the pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum PoolAction {
    /// Add funds while Open
    Contribute {
        asset1_amount: u64,
        asset2_amount: u64,
        /// Native value delivered with the call, credited to asset1
        attached_value: u64,
    },
    /// Refund the caller's entry while Open
    Withdraw,
    /// Move the pooled funds onto the exchange
    ListToExchange,
    /// Pull proceeds back once the round cleared
    CollectFromExchange,
    /// Take the caller's share of the proceeds
    Claim,
}
