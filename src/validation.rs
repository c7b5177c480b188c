//! Validation of transactions returned by relays.
//!
//! A relay answers a signed request with the raw transaction it broadcast. Nothing in that
//! transaction is trusted before it passed [`RelayedTransactionValidator::validate`].

use crate::{error::ValidationError, types::EnvelopingTxRequest};
use alloy::{
    consensus::{Transaction, TxEnvelope, transaction::SignerRecoverable},
    eips::Decodable2718,
    primitives::{Address, Bytes, TxHash},
};
use tracing::{debug, instrument};

/// The fields of a relayed transaction that are checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayedTransaction {
    /// Transaction hash.
    pub hash: TxHash,
    /// Recovered sender, `None` if the signature does not recover.
    pub from: Option<Address>,
    /// Recipient, `None` for contract creations.
    pub to: Option<Address>,
    /// Sender nonce.
    pub nonce: u64,
    /// Calldata.
    pub input: Bytes,
}

impl RelayedTransaction {
    /// Decodes an EIP-2718 encoded signed transaction.
    pub fn decode(raw: &[u8]) -> Result<Self, ValidationError> {
        let envelope = TxEnvelope::decode_2718(&mut &raw[..])
            .map_err(|err| ValidationError::Undecodable(err.to_string()))?;

        Ok(Self {
            hash: *envelope.tx_hash(),
            from: envelope.recover_signer().ok(),
            to: envelope.to(),
            nonce: envelope.nonce(),
            input: envelope.input().clone(),
        })
    }
}

/// Checks that a relay submitted exactly what the client signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayedTransactionValidator {
    relay_hub: Address,
}

impl RelayedTransactionValidator {
    /// Creates a validator for transactions sent through `relay_hub`.
    pub const fn new(relay_hub: Address) -> Self {
        Self { relay_hub }
    }

    /// Validates `transaction`, returned for `request` by the relay whose worker is
    /// `relay_worker`.
    ///
    /// Checks run in a fixed order and the first failing one is returned.
    #[instrument(skip_all, fields(tx_hash = %transaction.hash))]
    pub fn validate(
        &self,
        request: &EnvelopingTxRequest,
        transaction: &RelayedTransaction,
        relay_worker: Address,
    ) -> Result<(), ValidationError> {
        let to = transaction.to.ok_or(ValidationError::NoRecipient)?;
        let from = transaction.from.ok_or(ValidationError::NoSigner)?;

        let relay_max_nonce = request.metadata.relay_max_nonce;
        if transaction.nonce > relay_max_nonce {
            return Err(ValidationError::NonceExceeded {
                nonce: transaction.nonce,
                relay_max_nonce,
            });
        }

        if to != self.relay_hub {
            return Err(ValidationError::WrongRecipient { expected: self.relay_hub, got: to });
        }

        let expected = request.relay_request.encode_hub_call(request.metadata.signature.clone());
        if expected != transaction.input {
            return Err(ValidationError::DataTampered {
                expected,
                got: transaction.input.clone(),
            });
        }

        if from != relay_worker {
            return Err(ValidationError::WrongWorker { expected: relay_worker, got: from });
        }

        debug!("Relayed transaction is valid");
        Ok(())
    }
}
