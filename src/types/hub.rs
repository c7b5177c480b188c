//! Relay server and registry types.

use super::IRelayHub;
use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A relay server's self-reported state, as returned by its `chain-info` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubInfo {
    /// The account that submits transactions.
    pub relay_worker_address: Address,
    /// The operator account that registered the relay.
    pub relay_manager_address: Address,
    /// The hub the relay submits through.
    pub relay_hub_address: Address,
    /// Address receiving token payments.
    pub fees_receiver: Address,
    /// Minimum gas price the relay accepts.
    #[serde(with = "crate::serde::decimal_u256")]
    pub min_gas_price: U256,
    /// Whether the relay currently accepts requests.
    pub ready: bool,
    /// Relay server protocol version.
    #[serde(default)]
    pub version: String,
}

/// A relay registry entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayManagerData {
    /// The relay manager, zero for configured relays that have not been pinged yet.
    pub manager: Address,
    /// Base URL of the relay server.
    pub url: String,
    /// Whether the manager is currently staked.
    pub currently_staked: bool,
    /// Whether the manager is registered in the hub.
    pub registered: bool,
}

impl RelayManagerData {
    /// A configured relay known only by its URL.
    pub fn preferred(url: impl Into<String>) -> Self {
        Self { url: url.into(), ..Default::default() }
    }

    /// Whether this relay may be used for new requests.
    pub const fn is_active(&self) -> bool {
        self.currently_staked && self.registered
    }
}

impl From<IRelayHub::RelayManagerData> for RelayManagerData {
    fn from(value: IRelayHub::RelayManagerData) -> Self {
        Self {
            manager: value.manager,
            url: value.url,
            currently_staked: value.currentlyStaked,
            registered: value.registered,
        }
    }
}

/// A relay selected to serve a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayInfo {
    /// The relay's answer to the availability ping.
    pub hub_info: HubInfo,
    /// The registry entry the relay was selected from.
    pub manager_data: RelayManagerData,
}

/// A recorded relay failure, used to lower the relay's score for a while.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayFailureInfo {
    /// When the failure happened.
    pub last_error_time: DateTime<Utc>,
    /// The failing relay's manager.
    pub relay_manager: Address,
    /// The failing relay's URL.
    pub relay_url: String,
}
