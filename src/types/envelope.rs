//! Wire payloads exchanged with relay servers.

use super::EnvelopingRequest;
use alloy::primitives::{Address, B256, Bytes, U256};
use serde::{Deserialize, Serialize};

/// Data sent along a signed request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopingMetadata {
    /// The hub the request must be relayed through.
    pub relay_hub_address: Address,
    /// Highest relay worker nonce the signer accepts for the relayed transaction.
    #[serde(with = "crate::serde::decimal_u64")]
    pub relay_max_nonce: u64,
    /// EIP-712 signature of the request.
    pub signature: Bytes,
}

/// A signed request as posted to a relay server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopingTxRequest {
    /// The signed request.
    pub relay_request: EnvelopingRequest,
    /// Signature and replay protection.
    pub metadata: EnvelopingMetadata,
}

/// Raw answer of a relay server's `relay` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayServerResponse {
    /// The raw, relay-signed transaction.
    #[serde(default)]
    pub signed_tx: Option<Bytes>,
    /// Hash of the relayed transaction as reported by the relay.
    #[serde(default)]
    pub transaction_hash: Option<B256>,
    /// Error reported by the relay.
    #[serde(default)]
    pub error: Option<String>,
}

/// Answer of a relay server's `estimate` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayEstimation {
    /// Gas price used for the estimation.
    #[serde(with = "crate::serde::decimal_u256")]
    pub gas_price: U256,
    /// Estimated gas of the relayed transaction.
    #[serde(with = "crate::serde::decimal_u256")]
    pub estimation: U256,
    /// Token amount the relay requires.
    #[serde(with = "crate::serde::decimal_u256")]
    pub required_token_amount: U256,
    /// Native amount the relay requires.
    #[serde(with = "crate::serde::decimal_u256")]
    pub required_native_amount: U256,
    /// Token to native exchange rate used by the relay.
    #[serde(default)]
    pub exchange_rate: String,
}

/// Answer of a relay server's `estimate` endpoint, possibly an error.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RelayEstimationResponse {
    /// The relay reported an error.
    Error {
        /// The reported error.
        error: String,
    },
    /// The estimation.
    Estimation(RelayEstimation),
}
