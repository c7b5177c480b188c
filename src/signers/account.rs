//! Account management and request signing.
use super::{ProviderSigner, TypedDataSigner};
use crate::{eip712::TypedRequestBuilder, error::SigningError, types::EnvelopingRequest};
use alloy::{
    primitives::{Address, Bytes},
    providers::DynProvider,
    signers::local::PrivateKeySigner,
};
use std::{collections::HashMap, str::FromStr};
use tracing::{debug, instrument};

/// Holds local wallets and signs enveloping requests.
///
/// Requests whose sender is not held locally are signed by the connected provider. Either way
/// the signer is recovered from the signature and compared against the request sender.
#[derive(Debug)]
pub struct AccountManager {
    provider: DynProvider,
    builder: TypedRequestBuilder,
    accounts: HashMap<Address, PrivateKeySigner>,
}

impl AccountManager {
    /// Creates an account manager without local wallets.
    pub fn new(provider: DynProvider, builder: TypedRequestBuilder) -> Self {
        Self { provider, builder, accounts: HashMap::new() }
    }

    /// Stores a wallet, after checking that `private_key` derives `address`.
    pub fn add_account(&mut self, address: Address, private_key: &str) -> Result<(), SigningError> {
        let signer = PrivateKeySigner::from_str(private_key)?;
        let derived = TypedDataSigner::address(&signer);
        if derived != address {
            return Err(SigningError::InvalidKeypair { expected: address, derived });
        }
        self.accounts.insert(address, signer);
        Ok(())
    }

    /// Stores a wallet.
    pub fn add_signer(&mut self, signer: PrivateKeySigner) -> Address {
        let address = TypedDataSigner::address(&signer);
        self.accounts.insert(address, signer);
        address
    }

    /// Removes a wallet, returning whether it was held.
    pub fn remove_account(&mut self, address: &Address) -> bool {
        self.accounts.remove(address).is_some()
    }

    /// Returns the addresses of all held wallets.
    pub fn accounts(&self) -> impl Iterator<Item = &Address> {
        self.accounts.keys()
    }

    /// Returns the typed data builder.
    pub const fn builder(&self) -> &TypedRequestBuilder {
        &self.builder
    }

    /// Signs `request`.
    ///
    /// The signer is `signer` if given, else a held wallet matching the request sender, else the
    /// provider.
    #[instrument(skip_all, fields(from = %request.from()))]
    pub async fn sign(
        &self,
        request: &EnvelopingRequest,
        signer: Option<&PrivateKeySigner>,
    ) -> Result<Bytes, SigningError> {
        let relay_data = request.relay_data();
        if relay_data.call_forwarder.is_zero() {
            return Err(SigningError::ZeroAddress("callForwarder"));
        }
        if relay_data.call_verifier.is_zero() {
            return Err(SigningError::ZeroAddress("callVerifier"));
        }

        let from = request.from();
        let (domain, message) = self.builder.build(request);
        let digest = message.signing_hash(&domain);
        let typed_data = message.typed_data(domain);

        let signature = match signer.or_else(|| self.accounts.get(&from)) {
            Some(wallet) => {
                debug!(signer = %TypedDataSigner::address(wallet), "Signing with local wallet");
                wallet.sign_typed_request(digest, &typed_data).await?
            }
            None => {
                ProviderSigner::new(self.provider.clone(), from)
                    .sign_typed_request(digest, &typed_data)
                    .await?
            }
        };

        let recovered = signature
            .recover_address_from_prehash(&digest)
            .map_err(|err| SigningError::failed(from, err))?;
        if recovered != from {
            return Err(SigningError::SignatureMismatch { expected: from, recovered });
        }

        Ok(signature.as_bytes().into())
    }
}
