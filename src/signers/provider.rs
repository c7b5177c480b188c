//! Signing delegated to the connected node or wallet.
use super::TypedDataSigner;
use crate::error::SigningError;
use alloy::{
    dyn_abi::TypedData,
    primitives::{Address, B256, Bytes, Signature},
    providers::{DynProvider, Provider},
};
use tracing::debug;

/// Signs through the provider's `eth_signTypedData_v4`.
#[derive(Debug, Clone)]
pub struct ProviderSigner {
    provider: DynProvider,
    address: Address,
}

impl ProviderSigner {
    /// Creates a signer for `address` backed by `provider`.
    pub const fn new(provider: DynProvider, address: Address) -> Self {
        Self { provider, address }
    }
}

#[async_trait::async_trait]
impl TypedDataSigner for ProviderSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_typed_request(
        &self,
        _digest: B256,
        typed_data: &TypedData,
    ) -> Result<Signature, SigningError> {
        debug!(address = %self.address, "Requesting eth_signTypedData_v4");
        let raw: Bytes = self
            .provider
            .raw_request("eth_signTypedData_v4".into(), (self.address, typed_data.clone()))
            .await
            .map_err(|err| SigningError::failed(self.address, err))?;

        Signature::from_raw(&raw).map_err(|err| SigningError::failed(self.address, err))
    }
}
