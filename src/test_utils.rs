//! Helpers shared by unit tests.

use crate::{
    error::HttpError,
    http::RelayServerApi,
    types::{EnvelopingTxRequest, HubInfo, IRelayHub, RelayEstimation, RelayServerResponse},
};
use alloy::{
    consensus::{SignableTransaction, TxEnvelope, TxLegacy},
    eips::Encodable2718,
    primitives::{Address, Bytes, TxKind, address, keccak256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::Log,
    signers::{SignerSync, local::PrivateKeySigner},
    sol_types::{SolCall, SolEvent},
    transports::mock::Asserter,
};
use async_trait::async_trait;
use std::{collections::HashMap, sync::Mutex};

/// First well-known development private key.
pub(crate) const DEV_KEY_0: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Address of [`DEV_KEY_0`].
pub(crate) const DEV_ADDRESS_0: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

/// Second well-known development private key.
pub(crate) const DEV_KEY_1: &str =
    "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

/// Address of [`DEV_KEY_1`].
pub(crate) const DEV_ADDRESS_1: Address = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");

/// Returns a provider answering from the queue of the returned [`Asserter`].
pub(crate) fn mocked_provider() -> (DynProvider, Asserter) {
    let asserter = Asserter::new();
    let provider = ProviderBuilder::new()
        .disable_recommended_fillers()
        .connect_mocked_client(asserter.clone())
        .erased();
    (provider, asserter)
}

/// Parses a development key.
pub(crate) fn dev_signer(key: &str) -> PrivateKeySigner {
    key.parse().unwrap()
}

/// Signs a legacy transaction with a development key and returns it EIP-2718 encoded.
pub(crate) fn signed_legacy_tx(key: &str, to: TxKind, nonce: u64, input: Bytes) -> Bytes {
    let tx = TxLegacy {
        chain_id: Some(33),
        nonce,
        gas_price: 60_000_000,
        gas_limit: 200_000,
        to,
        input,
        ..Default::default()
    };
    let signature = dev_signer(key).sign_hash_sync(&tx.signature_hash()).unwrap();
    TxEnvelope::Legacy(tx.into_signed(signature)).encoded_2718().into()
}

/// A `RelayServerRegistered` log emitted by `hub`.
pub(crate) fn registration_log(hub: Address, manager: Address, url: &str) -> Log {
    Log {
        inner: alloy::primitives::Log {
            address: hub,
            data: IRelayHub::RelayServerRegistered { relayManager: manager, relayUrl: url.into() }
                .encode_log_data(),
        },
        ..Default::default()
    }
}

/// The encoded answer of `getRelayInfo` for a relay, staked and registered when `active`.
pub(crate) fn relay_info_output(manager: Address, url: &str, active: bool) -> Bytes {
    IRelayHub::getRelayInfoCall::abi_encode_returns(&IRelayHub::RelayManagerData {
        manager,
        currentlyStaked: active,
        registered: active,
        url: url.to_string(),
    })
    .into()
}

/// A relay server answering from fixed responses.
///
/// Without a fixed `relay_response`, a relay with a `worker_key` behaves like an honest relay
/// and answers with the hub call signed by its worker.
#[derive(Debug, Default)]
pub(crate) struct MockRelayServer {
    /// Key of the worker signing relayed transactions.
    pub(crate) worker_key: Option<&'static str>,
    /// Flip a byte of the relayed calldata.
    pub(crate) tamper: bool,
    /// `chain-info` answers by relay URL. Relays missing here fail to connect.
    pub(crate) hub_infos: HashMap<String, HubInfo>,
    /// The answer of `relay`, an error message makes the call fail.
    pub(crate) relay_response: Option<Result<RelayServerResponse, String>>,
    /// The answer of `estimate`.
    pub(crate) estimation: Option<RelayEstimation>,
    /// URLs pinged so far.
    pub(crate) pinged: Mutex<Vec<String>>,
    /// Requests submitted so far.
    pub(crate) submitted: Mutex<Vec<EnvelopingTxRequest>>,
}

impl MockRelayServer {
    pub(crate) fn with_relay(mut self, url: &str, hub_info: HubInfo) -> Self {
        self.hub_infos.insert(url.to_string(), hub_info);
        self
    }

    pub(crate) fn pinged(&self) -> Vec<String> {
        let mut pinged = self.pinged.lock().unwrap().clone();
        pinged.sort();
        pinged
    }
}

#[async_trait]
impl RelayServerApi for MockRelayServer {
    async fn chain_info(
        &self,
        url: &str,
        _verifier: Option<Address>,
    ) -> Result<HubInfo, HttpError> {
        self.pinged.lock().unwrap().push(url.to_string());
        self.hub_infos.get(url).cloned().ok_or_else(|| HttpError::Relay {
            url: url.to_string(),
            message: "connection refused".to_string(),
        })
    }

    async fn relay(
        &self,
        url: &str,
        request: &EnvelopingTxRequest,
    ) -> Result<RelayServerResponse, HttpError> {
        self.submitted.lock().unwrap().push(request.clone());
        match (self.relay_response.clone(), self.worker_key) {
            (Some(Ok(response)), _) => Ok(response),
            (Some(Err(message)), _) => Err(HttpError::Relay { url: url.to_string(), message }),
            (None, Some(key)) => {
                let signature = request.metadata.signature.clone();
                let mut input = request.relay_request.encode_hub_call(signature).to_vec();
                if self.tamper {
                    input[4] ^= 1;
                }
                let signed_tx = signed_legacy_tx(
                    key,
                    TxKind::Call(request.metadata.relay_hub_address),
                    request.metadata.relay_max_nonce,
                    input.into(),
                );
                Ok(RelayServerResponse {
                    transaction_hash: Some(keccak256(&signed_tx)),
                    signed_tx: Some(signed_tx),
                    error: None,
                })
            }
            (None, None) => {
                Err(HttpError::Relay { url: url.to_string(), message: "no response".into() })
            }
        }
    }

    async fn estimate(
        &self,
        url: &str,
        request: &EnvelopingTxRequest,
    ) -> Result<RelayEstimation, HttpError> {
        self.submitted.lock().unwrap().push(request.clone());
        self.estimation.clone().ok_or_else(|| HttpError::Relay {
            url: url.to_string(),
            message: "no estimation".to_string(),
        })
    }
}
