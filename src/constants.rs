//! Enveloping constants.

use alloy::primitives::U256;

/// Name of the EIP-712 domain used to sign enveloping requests.
pub const EIP712_DOMAIN_NAME: &str = "RSK Enveloping Transaction";

/// Version of the EIP-712 domain used to sign enveloping requests.
pub const EIP712_DOMAIN_VERSION: &str = "2";

/// Gas subtracted from an `eth_estimateGas` result to approximate the cost of the same call
/// executed as an internal call from the forwarder.
pub const INTERNAL_TRANSACTION_ESTIMATED_CORRECTION: u64 = 18_500;

/// Internal call correction for calls without input data, i.e. plain value transfers.
pub const INTERNAL_TRANSACTION_NATIVE_ESTIMATED_CORRECTION: u64 = 10_500;

/// Slope of the linear fit for subsidized requests (no token payment).
pub const SUBSIDIZED_SLOPE: f64 = 1.067;

/// Intercept of the linear fit for subsidized requests (no token payment).
pub const SUBSIDIZED_INTERCEPT: f64 = 85_090.977;

/// Slope of the linear fit for requests paying with a token.
pub const UNSUBSIDIZED_SLOPE: f64 = 1.1114;

/// Intercept of the linear fit for requests paying with a token.
pub const UNSUBSIDIZED_INTERCEPT: f64 = 72_530.9611;

/// Precision used when applying `f64` factors to integer amounts.
pub const FACTOR_PRECISION: U256 = U256::from_limbs([1_000_000, 0, 0, 0]);

/// Base of the default failure-decayed relay score, `score = SCORE_DECAY_BASE ^ failures`.
pub const SCORE_DECAY_BASE: f64 = 0.9;

/// Path of the relay server endpoint reporting its [`HubInfo`](crate::types::HubInfo).
pub const CHAIN_INFO_PATH: &str = "chain-info";

/// Path of the relay server endpoint accepting signed requests.
pub const RELAY_PATH: &str = "relay";

/// Path of the relay server endpoint estimating signed requests.
pub const ESTIMATE_PATH: &str = "estimate";
