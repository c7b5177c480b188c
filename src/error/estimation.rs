use alloy::transports::{RpcError, TransportErrorKind};
use thiserror::Error;

/// Errors related to gas estimation.
#[derive(Debug, Error)]
pub enum EstimationError {
    /// The linear fit only models relay requests.
    #[error("linear fit estimation is not supported for deploy requests")]
    UnsupportedForDeploy,
    /// A deploy request paying with tokens needs the pre-computed smart wallet address.
    #[error("missing smart wallet address for deploy token estimation")]
    MissingSmartWalletAddress,
    /// The node failed to estimate.
    #[error("gas estimation failed: {0}")]
    Rpc(#[from] RpcError<TransportErrorKind>),
    /// A contract call failed.
    #[error("contract call failed: {0}")]
    Contract(#[from] alloy::contract::Error),
}
