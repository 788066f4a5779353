//! Error Types for the dxpool Pool
//!
//! Every failing call aborts with one of these and leaves the ledger
//! exactly as it was before the call. There is no partial success.

use core::fmt;

use crate::types::{ExternalOp, Phase, RoundId};

/// Result type alias for pool operations
pub type PoolResult<T> = Result<T, PoolError>;

/// Failure reported by an external collaborator (asset ledger or exchange)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalError {
    /// The collaborator refused the call
    Rejected,
    /// Source account cannot cover the amount
    InsufficientFunds { available: u64, requested: u64 },
    /// The collaborator could not be reached or is paused
    Unavailable,
}

/// Main error enum for all pool errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    // ============ Phase Errors ============
    /// Operation is not legal in the current phase
    InvalidPhase { expected: Phase, actual: Phase },

    /// Pool has already been listed on the exchange
    AlreadyListed,

    /// Pool has already collected its proceeds
    AlreadySettled,

    /// Listing policy is not satisfied by the current totals
    ListingThresholdNotMet { asset1_total: u64, asset2_total: u64 },

    // ============ Ledger Errors ============
    /// Contributor entry is empty, nothing to refund
    NothingToWithdraw,

    /// Caller never contributed (or withdrew everything before listing)
    NothingContributed,

    /// Contributor has already claimed proceeds
    AlreadyClaimed,

    // ============ Settlement Errors ============
    /// The auction round holding the pool's orders has not cleared yet
    AuctionNotCleared { round: RoundId },

    /// An asset move to or from a contributor or the exchange failed
    ExternalTransferFailed { op: ExternalOp, cause: ExternalError },

    /// Undoing a completed exchange step failed; `op` is the undo call that failed
    RollbackIncomplete { op: ExternalOp },

    /// The price feed could not value the pool
    OracleFailed { cause: ExternalError },

    // ============ Config Errors ============
    /// Invalid construction parameter
    InvalidConfig { param: &'static str, reason: &'static str },

    // ============ Math Errors ============
    /// Arithmetic overflow occurred
    Overflow,

    /// Arithmetic underflow occurred
    Underflow,

    /// Division by zero
    DivisionByZero,

    /// Payouts would exceed the recorded proceeds
    ConservationViolated { proceeds: u64, distributed: u64 },
}

impl PoolError {
    /// Returns a human-readable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPhase { .. } => "E001_INVALID_PHASE",
            Self::AlreadyListed => "E002_ALREADY_LISTED",
            Self::AlreadySettled => "E003_ALREADY_SETTLED",
            Self::ListingThresholdNotMet { .. } => "E004_THRESHOLD_NOT_MET",
            Self::NothingToWithdraw => "E010_NOTHING_TO_WITHDRAW",
            Self::NothingContributed => "E011_NOTHING_CONTRIBUTED",
            Self::AlreadyClaimed => "E012_ALREADY_CLAIMED",
            Self::AuctionNotCleared { .. } => "E020_AUCTION_NOT_CLEARED",
            Self::ExternalTransferFailed { .. } => "E030_TRANSFER_FAILED",
            Self::RollbackIncomplete { .. } => "E031_ROLLBACK_INCOMPLETE",
            Self::OracleFailed { .. } => "E032_ORACLE_FAILED",
            Self::InvalidConfig { .. } => "E040_INVALID_CONFIG",
            Self::Overflow => "E080_OVERFLOW",
            Self::Underflow => "E081_UNDERFLOW",
            Self::DivisionByZero => "E082_DIV_ZERO",
            Self::ConservationViolated { .. } => "E083_CONSERVATION",
        }
    }

    /// Returns true if retrying the same call later may succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::AuctionNotCleared { .. } => true, // Wait for the round to clear
            Self::ListingThresholdNotMet { .. } => true, // Wait for more contributions
            Self::ExternalTransferFailed { .. } => true, // Fund or approve and retry
            _ => false,
        }
    }
}

impl fmt::Display for ExternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected => write!(f, "rejected"),
            Self::InsufficientFunds { available, requested } => {
                write!(f, "insufficient funds: {available} available, {requested} requested")
            }
            Self::Unavailable => write!(f, "unavailable"),
        }
    }
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPhase { expected, actual } => {
                write!(f, "{}: expected phase {expected:?}, pool is {actual:?}", self.code())
            }
            Self::ListingThresholdNotMet { asset1_total, asset2_total } => write!(
                f,
                "{}: totals {asset1_total}/{asset2_total} do not satisfy the listing policy",
                self.code()
            ),
            Self::AuctionNotCleared { round } => {
                write!(f, "{}: round {round} has no closing price", self.code())
            }
            Self::ExternalTransferFailed { op, cause } => {
                write!(f, "{}: {op:?} failed: {cause}", self.code())
            }
            Self::RollbackIncomplete { op } => {
                write!(f, "{}: {op:?} failed while unwinding", self.code())
            }
            Self::OracleFailed { cause } => write!(f, "{}: {cause}", self.code()),
            Self::InvalidConfig { param, reason } => {
                write!(f, "{}: {param}: {reason}", self.code())
            }
            Self::ConservationViolated { proceeds, distributed } => write!(
                f,
                "{}: distributing {distributed} exceeds proceeds {proceeds}",
                self.code()
            ),
            _ => f.write_str(self.code()),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PoolError {}
