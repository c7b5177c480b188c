//! Enveloping error types.
use alloy::transports::TransportErrorKind;
use thiserror::Error;

mod config;
pub use config::ConfigError;

mod estimation;
pub use estimation::EstimationError;

mod http;
pub use http::HttpError;

mod signing;
pub use signing::SigningError;

mod validation;
pub use validation::ValidationError;

/// The overarching error type returned by the enveloping pipeline.
#[derive(Debug, Error)]
pub enum EnvelopingError {
    /// The request or client configuration is incomplete.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Errors related to gas estimation.
    #[error(transparent)]
    Estimation(#[from] EstimationError),
    /// Errors related to signing.
    #[error(transparent)]
    Signing(#[from] SigningError),
    /// The relay returned a transaction that failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Errors talking to a relay server.
    #[error(transparent)]
    Http(#[from] HttpError),
    /// No relay was ready to serve the request.
    #[error("no relay available")]
    NoRelayAvailable,
    /// The relay did not return a signed transaction.
    #[error("relay {url} did not return a signed transaction")]
    MissingSignedTransaction {
        /// The relay URL.
        url: String,
    },
    /// The transaction receipt did not show up in time.
    #[error("no receipt for transaction {0} after all retries")]
    ReceiptTimeout(alloy::primitives::TxHash),
    /// A contract call failed.
    #[error(transparent)]
    ContractError(#[from] alloy::contract::Error),
    /// An error occurred during ABI encoding/decoding.
    #[error(transparent)]
    AbiError(#[from] alloy::sol_types::Error),
    /// An error occurred talking to RPC.
    #[error(transparent)]
    RpcError(#[from] alloy::transports::RpcError<TransportErrorKind>),
}

impl EnvelopingError {
    /// Whether the error was caused by the relay returning a dishonest transaction.
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
