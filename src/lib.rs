//! # Enveloping client
//!
//! Client side of the enveloping meta-transaction protocol: builds and signs enveloping
//! requests, picks a relay server to submit them to, and verifies what the relay broadcast.

pub mod client;
pub mod config;
pub mod constants;
pub mod context;
pub mod eip712;
pub mod error;
pub mod estimation;
pub mod http;
pub mod outcome;
pub mod relays;
pub mod serde;
pub mod signers;
pub mod transport;
pub mod types;
pub mod utils;
pub mod validation;
pub mod version;

#[cfg(test)]
pub(crate) mod test_utils;
