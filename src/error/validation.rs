use alloy::primitives::{Address, Bytes};
use thiserror::Error;

/// Reasons a relayed transaction is rejected.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The relay returned bytes that are not a signed transaction.
    #[error("relayed transaction could not be decoded: {0}")]
    Undecodable(String),
    /// The transaction has no recipient.
    #[error("relayed transaction has no recipient")]
    NoRecipient,
    /// The transaction signer could not be recovered.
    #[error("relayed transaction has no signer")]
    NoSigner,
    /// The relay used a nonce beyond the one the client authorized.
    #[error("relayed transaction nonce {nonce} exceeds relay max nonce {relay_max_nonce}")]
    NonceExceeded {
        /// The transaction nonce.
        nonce: u64,
        /// The highest accepted nonce.
        relay_max_nonce: u64,
    },
    /// The transaction is not sent to the relay hub.
    #[error("relayed transaction recipient {got} is not the relay hub {expected}")]
    WrongRecipient {
        /// The configured hub.
        expected: Address,
        /// The transaction recipient.
        got: Address,
    },
    /// The calldata differs from the signed request.
    #[error("relayed transaction data does not match the signed request")]
    DataTampered {
        /// The expected calldata.
        expected: Bytes,
        /// The transaction calldata.
        got: Bytes,
    },
    /// The transaction was not sent by the relay's worker.
    #[error("relayed transaction sender {got} is not the relay worker {expected}")]
    WrongWorker {
        /// The expected worker.
        expected: Address,
        /// The transaction sender.
        got: Address,
    },
}
