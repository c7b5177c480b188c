//! Enveloping requests.
//!
//! An [`EnvelopingRequest`] is either a plain [`RelayRequest`] executing a call through a smart
//! wallet, or a [`DeployRequest`] deploying a new smart wallet. On the wire both variants are
//! told apart by their fields only, internally they always carry an explicit tag.

use super::IRelayHub::{self, deployCallCall, relayCallCall};
use alloy::{
    primitives::{Address, Bytes, U256},
    sol_types::SolCall,
};
use serde::{Deserialize, Serialize};

/// Gas economics and routing shared by both request variants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayData {
    /// Gas price the relay worker must use.
    #[serde(with = "crate::serde::decimal_u256")]
    pub gas_price: U256,
    /// Address receiving the token payment.
    pub fees_receiver: Address,
    /// The smart wallet (or forwarder) executing the call.
    pub call_forwarder: Address,
    /// The verifier consulted before relaying.
    pub call_verifier: Address,
}

/// The `request` block of a [`RelayRequest`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardRequest {
    /// The hub the request must be relayed through.
    pub relay_hub: Address,
    /// The signer of the request.
    pub from: Address,
    /// The destination of the call.
    pub to: Address,
    /// Token used to pay the relay, zero if subsidized.
    pub token_contract: Address,
    /// Native value forwarded to the destination.
    #[serde(with = "crate::serde::decimal_u256")]
    pub value: U256,
    /// Gas limit of the destination call.
    #[serde(with = "crate::serde::decimal_u256")]
    pub gas: U256,
    /// Forwarder nonce.
    #[serde(with = "crate::serde::decimal_u256")]
    pub nonce: U256,
    /// Amount of tokens paid to the relay.
    #[serde(with = "crate::serde::decimal_u256")]
    pub token_amount: U256,
    /// Gas limit of the token payment.
    #[serde(with = "crate::serde::decimal_u256")]
    pub token_gas: U256,
    /// Unix timestamp after which the request is no longer valid.
    #[serde(with = "crate::serde::decimal_u256")]
    pub valid_until_time: U256,
    /// Calldata of the destination call.
    pub data: Bytes,
}

/// The `request` block of a [`DeployRequest`].
///
/// Unknown fields are rejected so that a relay request, which always carries `gas`, is never
/// read as a deploy request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeployForwardRequest {
    /// The hub the request must be relayed through.
    pub relay_hub: Address,
    /// The owner of the smart wallet.
    pub from: Address,
    /// Optional initialization call target, zero for none.
    pub to: Address,
    /// Token used to pay the relay, zero if subsidized.
    pub token_contract: Address,
    /// Address allowed to recover the smart wallet.
    pub recoverer: Address,
    /// Native value forwarded to the initialization call.
    #[serde(with = "crate::serde::decimal_u256")]
    pub value: U256,
    /// Factory nonce.
    #[serde(with = "crate::serde::decimal_u256")]
    pub nonce: U256,
    /// Amount of tokens paid to the relay.
    #[serde(with = "crate::serde::decimal_u256")]
    pub token_amount: U256,
    /// Gas limit of the token payment.
    #[serde(with = "crate::serde::decimal_u256")]
    pub token_gas: U256,
    /// Unix timestamp after which the request is no longer valid.
    #[serde(with = "crate::serde::decimal_u256")]
    pub valid_until_time: U256,
    /// Salt distinguishing smart wallet instances of the same owner.
    #[serde(with = "crate::serde::decimal_u256")]
    pub index: U256,
    /// Initialization calldata.
    pub data: Bytes,
}

/// A request executing a call through an existing smart wallet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    /// The call.
    pub request: ForwardRequest,
    /// Gas economics and routing.
    pub relay_data: RelayData,
}

/// A request deploying a smart wallet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    /// The deployment.
    pub request: DeployForwardRequest,
    /// Gas economics and routing.
    pub relay_data: RelayData,
}

/// A fully resolved enveloping request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvelopingRequest {
    /// Smart wallet deployment. Listed first so deserialization probes the stricter shape first.
    Deploy(DeployRequest),
    /// Call through a smart wallet.
    Relay(RelayRequest),
}

macro_rules! request_field {
    ($($name:ident: $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Returns `request.", stringify!($name), "`.")]
            pub fn $name(&self) -> $ty {
                match self {
                    Self::Deploy(req) => req.request.$name,
                    Self::Relay(req) => req.request.$name,
                }
            }
        )*
    };
}

impl EnvelopingRequest {
    request_field!(
        relay_hub: Address,
        from: Address,
        to: Address,
        token_contract: Address,
        value: U256,
        nonce: U256,
        token_amount: U256,
        token_gas: U256,
        valid_until_time: U256,
    );

    /// Whether this is a smart wallet deployment.
    pub const fn is_deploy(&self) -> bool {
        matches!(self, Self::Deploy(_))
    }

    /// Returns the calldata of the request.
    pub fn data(&self) -> &Bytes {
        match self {
            Self::Deploy(req) => &req.request.data,
            Self::Relay(req) => &req.request.data,
        }
    }

    /// Returns the gas limit of the destination call, `None` for deployments.
    pub fn gas(&self) -> Option<U256> {
        match self {
            Self::Deploy(_) => None,
            Self::Relay(req) => Some(req.request.gas),
        }
    }

    /// Returns the relay data.
    pub fn relay_data(&self) -> &RelayData {
        match self {
            Self::Deploy(req) => &req.relay_data,
            Self::Relay(req) => &req.relay_data,
        }
    }

    /// Returns the relay data mutably.
    pub fn relay_data_mut(&mut self) -> &mut RelayData {
        match self {
            Self::Deploy(req) => &mut req.relay_data,
            Self::Relay(req) => &mut req.relay_data,
        }
    }

    /// Sets the gas limit of the token payment.
    pub fn set_token_gas(&mut self, token_gas: U256) {
        match self {
            Self::Deploy(req) => req.request.token_gas = token_gas,
            Self::Relay(req) => req.request.token_gas = token_gas,
        }
    }

    /// Sets the gas limit of the destination call. Deployments have none and are left untouched.
    pub fn set_gas(&mut self, gas: U256) {
        if let Self::Relay(req) = self {
            req.request.gas = gas;
        }
    }

    /// ABI encodes the `relayCall`/`deployCall` hub call carrying this request and `signature`.
    pub fn encode_hub_call(&self, signature: Bytes) -> Bytes {
        match self {
            Self::Deploy(req) => {
                deployCallCall { deployRequest: req.into(), signature }.abi_encode().into()
            }
            Self::Relay(req) => {
                relayCallCall { relayRequest: req.into(), signature }.abi_encode().into()
            }
        }
    }
}

impl From<RelayRequest> for EnvelopingRequest {
    fn from(value: RelayRequest) -> Self {
        Self::Relay(value)
    }
}

impl From<DeployRequest> for EnvelopingRequest {
    fn from(value: DeployRequest) -> Self {
        Self::Deploy(value)
    }
}

impl From<&RelayData> for IRelayHub::RelayData {
    fn from(value: &RelayData) -> Self {
        Self {
            gasPrice: value.gas_price,
            feesReceiver: value.fees_receiver,
            callForwarder: value.call_forwarder,
            callVerifier: value.call_verifier,
        }
    }
}

impl From<&RelayRequest> for IRelayHub::RelayRequest {
    fn from(value: &RelayRequest) -> Self {
        let req = &value.request;
        Self {
            request: IRelayHub::ForwardRequest {
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
            },
            relayData: (&value.relay_data).into(),
        }
    }
}

impl From<&DeployRequest> for IRelayHub::DeployRequest {
    fn from(value: &DeployRequest) -> Self {
        let req = &value.request;
        Self {
            request: IRelayHub::DeployForwardRequest {
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
            },
            relayData: (&value.relay_data).into(),
        }
    }
}

/// The variant specific part of a [`UserDefinedRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserRequestKind {
    /// A call through an existing smart wallet.
    Relay {
        /// Gas limit of the destination call, estimated when unset.
        gas: Option<U256>,
    },
    /// A smart wallet deployment.
    Deploy {
        /// Smart wallet instance salt.
        index: U256,
        /// Address allowed to recover the smart wallet.
        recoverer: Address,
    },
}

impl Default for UserRequestKind {
    fn default() -> Self {
        Self::Relay { gas: None }
    }
}

/// Relay data as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDefinedRelayData {
    /// Gas price, resolved from the network when unset.
    pub gas_price: Option<U256>,
    /// The smart wallet executing the call. Required.
    pub call_forwarder: Option<Address>,
    /// The verifier, defaults to the configured relay or deploy verifier.
    pub call_verifier: Option<Address>,
}

/// An enveloping request as supplied by the caller.
///
/// Unset fields are resolved by the [`RelayClient`](crate::client::RelayClient) before signing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDefinedRequest {
    /// The signer. Required.
    pub from: Option<Address>,
    /// The destination. Required, may be the zero address for deployments without init call.
    pub to: Option<Address>,
    /// The calldata. Required.
    pub data: Option<Bytes>,
    /// Native value.
    pub value: U256,
    /// Forwarder nonce, read from the forwarder when unset.
    pub nonce: Option<U256>,
    /// Payment token. Required, the zero address for subsidized requests.
    pub token_contract: Option<Address>,
    /// Payment amount.
    pub token_amount: U256,
    /// Gas limit of the payment, estimated when unset.
    pub token_gas: Option<U256>,
    /// Expiry, defaults to now plus the configured validity window.
    pub valid_until_time: Option<U256>,
    /// Relay hub, must match the configured hub when set.
    pub relay_hub: Option<Address>,
    /// Variant specific fields.
    pub kind: UserRequestKind,
    /// Relay data.
    pub relay_data: UserDefinedRelayData,
}

impl UserDefinedRequest {
    /// Whether this is a smart wallet deployment.
    pub const fn is_deploy(&self) -> bool {
        matches!(self.kind, UserRequestKind::Deploy { .. })
    }
}
