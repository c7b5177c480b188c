//! EIP-712 related helpers.
//!
//! Enveloping requests are signed flattened: the fields of the `request` block followed by the
//! nested `relayData` struct.

use crate::{
    constants::{EIP712_DOMAIN_NAME, EIP712_DOMAIN_VERSION},
    types::EnvelopingRequest,
};
use alloy::{
    dyn_abi::TypedData,
    primitives::{Address, B256, ChainId, U256},
    sol_types::{Eip712Domain, SolStruct},
};

mod typed {
    use alloy::sol;

    sol! {
        #[derive(Debug, PartialEq, Eq, serde::Serialize)]
        struct RelayData {
            uint256 gasPrice;
            address feesReceiver;
            address callForwarder;
            address callVerifier;
        }

        #[derive(Debug, PartialEq, Eq, serde::Serialize)]
        struct RelayRequest {
            address relayHub;
            address from;
            address to;
            address tokenContract;
            uint256 value;
            uint256 gas;
            uint256 nonce;
            uint256 tokenAmount;
            uint256 tokenGas;
            uint256 validUntilTime;
            bytes data;
            RelayData relayData;
        }

        #[derive(Debug, PartialEq, Eq, serde::Serialize)]
        struct DeployRequest {
            address relayHub;
            address from;
            address to;
            address tokenContract;
            address recoverer;
            uint256 value;
            uint256 nonce;
            uint256 tokenAmount;
            uint256 tokenGas;
            uint256 validUntilTime;
            uint256 index;
            bytes data;
            RelayData relayData;
        }
    }
}

pub use typed::{
    DeployRequest as TypedDeployRequest, RelayData as TypedRelayData,
    RelayRequest as TypedRelayRequest,
};

/// The EIP-712 message of an [`EnvelopingRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedRequest {
    /// Message of a relay request.
    Relay(TypedRelayRequest),
    /// Message of a deploy request.
    Deploy(TypedDeployRequest),
}

impl TypedRequest {
    /// Computes the EIP-712 signing hash under `domain`.
    pub fn signing_hash(&self, domain: &Eip712Domain) -> B256 {
        match self {
            Self::Relay(msg) => msg.eip712_signing_hash(domain),
            Self::Deploy(msg) => msg.eip712_signing_hash(domain),
        }
    }

    /// Builds the `eth_signTypedData_v4` payload.
    pub fn typed_data(&self, domain: Eip712Domain) -> TypedData {
        match self {
            Self::Relay(msg) => TypedData::from_struct(msg, Some(domain)),
            Self::Deploy(msg) => TypedData::from_struct(msg, Some(domain)),
        }
    }
}

impl From<&EnvelopingRequest> for TypedRequest {
    fn from(request: &EnvelopingRequest) -> Self {
        let relay_data = request.relay_data();
        let typed_relay_data = TypedRelayData {
            gasPrice: relay_data.gas_price,
            feesReceiver: relay_data.fees_receiver,
            callForwarder: relay_data.call_forwarder,
            callVerifier: relay_data.call_verifier,
        };

        match request {
            EnvelopingRequest::Relay(req) => {
                let req = &req.request;
                Self::Relay(TypedRelayRequest {
                    relayHub: req.relay_hub,
                    from: req.from,
                    to: req.to,
                    tokenContract: req.token_contract,
                    value: req.value,
                    gas: req.gas,
                    nonce: req.nonce,
                    tokenAmount: req.token_amount,
                    tokenGas: req.token_gas,
                    validUntilTime: req.valid_until_time,
                    data: req.data.clone(),
                    relayData: typed_relay_data,
                })
            }
            EnvelopingRequest::Deploy(req) => {
                let req = &req.request;
                Self::Deploy(TypedDeployRequest {
                    relayHub: req.relay_hub,
                    from: req.from,
                    to: req.to,
                    tokenContract: req.token_contract,
                    recoverer: req.recoverer,
                    value: req.value,
                    nonce: req.nonce,
                    tokenAmount: req.token_amount,
                    tokenGas: req.token_gas,
                    validUntilTime: req.valid_until_time,
                    index: req.index,
                    data: req.data.clone(),
                    relayData: typed_relay_data,
                })
            }
        }
    }
}

/// Builds the EIP-712 domain, types and message of enveloping requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypedRequestBuilder {
    chain_id: ChainId,
}

impl TypedRequestBuilder {
    /// Creates a builder for requests signed on `chain_id`.
    pub const fn new(chain_id: ChainId) -> Self {
        Self { chain_id }
    }

    /// Returns the chain ID.
    pub const fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// Returns the domain of requests executed by `call_forwarder`.
    pub fn domain(&self, call_forwarder: Address) -> Eip712Domain {
        Eip712Domain::new(
            Some(EIP712_DOMAIN_NAME.into()),
            Some(EIP712_DOMAIN_VERSION.into()),
            Some(U256::from(self.chain_id)),
            Some(call_forwarder),
            None,
        )
    }

    /// Returns the domain and message of `request`.
    pub fn build(&self, request: &EnvelopingRequest) -> (Eip712Domain, TypedRequest) {
        (self.domain(request.relay_data().call_forwarder), request.into())
    }

    /// Computes the digest that the sender must sign.
    pub fn signing_hash(&self, request: &EnvelopingRequest) -> B256 {
        let (domain, message) = self.build(request);
        message.signing_hash(&domain)
    }

    /// Returns the full typed data payload of `request`.
    pub fn typed_data(&self, request: &EnvelopingRequest) -> TypedData {
        let (domain, message) = self.build(request);
        let digest = message.signing_hash(&domain);
        let typed_data = message.typed_data(domain);

        debug_assert_eq!(Ok(digest), typed_data.eip712_signing_hash());

        typed_data
    }
}
