//! Phase State Machine
//!
//! `Open -> Listed -> Settled`, unidirectional, Settled terminal. The
//! guards here decide which error a call out of order receives.

use dxpool_common::errors::{PoolError, PoolResult};
use dxpool_common::types::{ListingPolicy, ListingRecord, Phase, PoolState};

/// Move `state` to `to`, which must be the immediate successor
pub fn advance(state: &mut PoolState, to: Phase) -> PoolResult<()> {
    if state.phase.can_transition_to(to) {
        state.phase = to;
        return Ok(());
    }

    // Repeating a one-time transition gets its own error
    match to {
        Phase::Listed if state.phase >= Phase::Listed => Err(PoolError::AlreadyListed),
        Phase::Settled if state.phase == Phase::Settled => Err(PoolError::AlreadySettled),
        _ => Err(PoolError::InvalidPhase {
            expected: previous(to),
            actual: state.phase,
        }),
    }
}

/// Check the Open -> Listed guard against the totals the transition commits
pub fn require_listable(state: &PoolState, policy: &ListingPolicy) -> PoolResult<()> {
    if state.phase != Phase::Open {
        return Err(PoolError::AlreadyListed);
    }
    if !policy.is_met(state.asset1_total, state.asset2_total) {
        return Err(PoolError::ListingThresholdNotMet {
            asset1_total: state.asset1_total,
            asset2_total: state.asset2_total,
        });
    }
    Ok(())
}

/// Check the Listed -> Settled guard and return the pinned listing
pub fn require_collectable(state: &PoolState) -> PoolResult<ListingRecord> {
    match state.phase {
        Phase::Open => Err(PoolError::InvalidPhase {
            expected: Phase::Listed,
            actual: Phase::Open,
        }),
        Phase::Settled => Err(PoolError::AlreadySettled),
        Phase::Listed => state.listing.ok_or(PoolError::InvalidPhase {
            expected: Phase::Listed,
            actual: state.phase,
        }),
    }
}

fn previous(phase: Phase) -> Phase {
    match phase {
        Phase::Open | Phase::Listed => Phase::Open,
        Phase::Settled => Phase::Listed,
    }
}
