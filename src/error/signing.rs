use alloy::primitives::Address;
use thiserror::Error;

/// Errors related to signing requests.
#[derive(Debug, Error)]
pub enum SigningError {
    /// The private key does not derive the supplied address.
    #[error("invalid keypair: private key derives {derived}, expected {expected}")]
    InvalidKeypair {
        /// The supplied address.
        expected: Address,
        /// The address derived from the private key.
        derived: Address,
    },
    /// The private key could not be parsed.
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(#[from] alloy::signers::local::LocalSignerError),
    /// The signature does not recover to the request sender.
    #[error("signature mismatch: recovered {recovered}, expected {expected}")]
    SignatureMismatch {
        /// The request sender.
        expected: Address,
        /// The recovered signer.
        recovered: Address,
    },
    /// `callForwarder` or `callVerifier` is the zero address.
    #[error("`{0}` must not be the zero address at signing time")]
    ZeroAddress(&'static str),
    /// The signature could not be produced or parsed.
    #[error("failed to sign request for {address}: {message}")]
    Failed {
        /// The requested signer.
        address: Address,
        /// The underlying failure.
        message: String,
    },
}

impl SigningError {
    /// Wraps a signer failure for `address`.
    pub fn failed(address: Address, err: impl std::fmt::Display) -> Self {
        Self::Failed { address, message: err.to_string() }
    }
}
