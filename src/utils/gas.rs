//! Gas arithmetic helpers.

use crate::constants::{
    FACTOR_PRECISION, INTERNAL_TRANSACTION_ESTIMATED_CORRECTION,
    INTERNAL_TRANSACTION_NATIVE_ESTIMATED_CORRECTION,
};
use alloy::primitives::U256;

/// Multiplies `value` by `factor` using fixed-point arithmetic.
///
/// The factor is rounded to six decimals, the product is rounded down. Non-finite or negative
/// factors yield zero.
pub fn apply_factor(value: U256, factor: f64) -> U256 {
    let scaled = (factor * 1e6).round();
    if !scaled.is_finite() || scaled <= 0.0 {
        return U256::ZERO;
    }
    value.saturating_mul(U256::from(scaled as u128)) / FACTOR_PRECISION
}

/// Returns the internal call correction for a call with the given input.
pub const fn internal_correction(data: &[u8]) -> u64 {
    if data.is_empty() {
        INTERNAL_TRANSACTION_NATIVE_ESTIMATED_CORRECTION
    } else {
        INTERNAL_TRANSACTION_ESTIMATED_CORRECTION
    }
}

/// Subtracts `correction` from an external call estimation.
///
/// Estimations that do not exceed the correction are returned unchanged, so the result is never
/// negative.
pub fn apply_internal_correction(estimation: U256, correction: u64) -> U256 {
    let correction = U256::from(correction);
    if estimation > correction { estimation - correction } else { estimation }
}
