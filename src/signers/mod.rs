//! Request signers.

mod account;
pub use account::AccountManager;

mod provider;
pub use provider::ProviderSigner;

use crate::error::SigningError;
use alloy::{
    dyn_abi::TypedData,
    primitives::{Address, B256, Signature},
    signers::{SignerSync, local::PrivateKeySigner},
};

/// Trait for an [EIP-712] enveloping request signer.
#[async_trait::async_trait]
pub trait TypedDataSigner: std::fmt::Debug + Send + Sync {
    /// Returns the signer's address.
    fn address(&self) -> Address;

    /// Signs a request given both its digest and its full typed data.
    ///
    /// Signers holding a key only need the digest, remote signers only get the typed data.
    async fn sign_typed_request(
        &self,
        digest: B256,
        typed_data: &TypedData,
    ) -> Result<Signature, SigningError>;
}

#[async_trait::async_trait]
impl TypedDataSigner for PrivateKeySigner {
    fn address(&self) -> Address {
        alloy::signers::Signer::address(self)
    }

    async fn sign_typed_request(
        &self,
        digest: B256,
        _typed_data: &TypedData,
    ) -> Result<Signature, SigningError> {
        self.sign_hash_sync(&digest)
            .map_err(|err| SigningError::failed(TypedDataSigner::address(self), err))
    }
}
