//! Mathematical Utilities for the Pool
//!
//! Checked integer math for pro-rata payouts and price application.
//! All divisions truncate; the remainder stays in the pool as dust.

use crate::errors::{PoolError, PoolResult};

/// Compute `value * numerator / denominator` in 128-bit space.
///
/// # Returns
/// The truncated quotient, or `Overflow` if it does not fit in `u64`.
pub fn mul_div(value: u64, numerator: u64, denominator: u64) -> PoolResult<u64> {
    if denominator == 0 {
        return Err(PoolError::DivisionByZero);
    }

    let result = (value as u128)
        .checked_mul(numerator as u128)
        .ok_or(PoolError::Overflow)?
        .checked_div(denominator as u128)
        .ok_or(PoolError::DivisionByZero)?;

    u64::try_from(result).map_err(|_| PoolError::Overflow)
}

/// Pro-rata share of `pot` owed to `stake` out of `total_stake`.
///
/// A zero `total_stake` means nobody staked this leg, so nothing is owed.
pub fn pro_rata(pot: u64, stake: u64, total_stake: u64) -> PoolResult<u64> {
    if total_stake == 0 || stake == 0 {
        return Ok(0);
    }
    if stake > total_stake {
        return Err(PoolError::ConservationViolated {
            proceeds: total_stake,
            distributed: stake,
        });
    }
    mul_div(pot, stake, total_stake)
}

/// Checked addition returning `Overflow`
pub fn add(a: u64, b: u64) -> PoolResult<u64> {
    a.checked_add(b).ok_or(PoolError::Overflow)
}

/// Checked subtraction returning `Underflow`
pub fn sub(a: u64, b: u64) -> PoolResult<u64> {
    a.checked_sub(b).ok_or(PoolError::Underflow)
}
