//! Serde helpers.

pub mod decimal_u256;
pub mod decimal_u64;
pub mod duration;
