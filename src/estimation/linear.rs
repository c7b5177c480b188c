//! Closed-form gas model for requests that are not signed yet.

use crate::{
    constants::{
        SUBSIDIZED_INTERCEPT, SUBSIDIZED_SLOPE, UNSUBSIDIZED_INTERCEPT, UNSUBSIDIZED_SLOPE,
    },
    utils::gas::apply_factor,
};
use alloy::primitives::U256;

/// Estimates the gas of a relayed transaction from the gas of its internal call and of its
/// token payment.
///
/// The result is rounded down before `correction_factor` is applied.
pub fn linear_fit_gas(internal_gas: U256, token_gas: U256, correction_factor: f64) -> U256 {
    let cost = if token_gas.is_zero() {
        SUBSIDIZED_SLOPE * as_f64(internal_gas) + SUBSIDIZED_INTERCEPT
    } else {
        UNSUBSIDIZED_SLOPE * as_f64(internal_gas.saturating_add(token_gas)) + UNSUBSIDIZED_INTERCEPT
    };

    apply_factor(U256::from(cost.floor() as u128), correction_factor)
}

fn as_f64(gas: U256) -> f64 {
    gas.saturating_to::<u64>() as f64
}
