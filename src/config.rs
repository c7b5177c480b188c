//! Enveloping configuration.
use crate::error::ConfigError;
use alloy::primitives::{Address, ChainId, U256};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use url::Url;

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvelopingConfig {
    /// Chain ID the requests are signed for.
    pub chain_id: ChainId,
    /// The relay hub address.
    pub relay_hub_address: Address,
    /// Verifier used for deploy requests that do not set one.
    pub deploy_verifier_address: Address,
    /// Verifier used for relay requests that do not set one.
    pub relay_verifier_address: Address,
    /// The smart wallet factory address.
    pub smart_wallet_factory: Address,
    /// Relays that are always tried first, in order.
    pub preferred_relays: Vec<Url>,
    /// Extra percentage on top of the network gas price, e.g. `0.02` for 2%.
    pub gas_price_factor_percent: f64,
    /// Lower bound for the resolved gas price.
    #[serde(with = "crate::serde::decimal_u256")]
    pub min_gas_price: U256,
    /// How many relay worker nonces ahead of the current one a relay may use.
    pub max_relay_nonce_gap: u64,
    /// How long a relay failure lowers the relay's score.
    #[serde(with = "crate::serde::duration")]
    pub relay_timeout_grace: Duration,
    /// How many blocks back relay registrations are looked up.
    pub relay_lookup_window_blocks: u64,
    /// In how many sub-ranges the lookup window is split.
    pub relay_lookup_window_parts: u64,
    /// How many relays are pinged concurrently.
    pub slice_size: usize,
    /// How long a request stays valid after it was built.
    pub request_valid_seconds: u64,
    /// Multiplier applied to gas estimations.
    pub estimated_gas_correction_factor: f64,
    /// Timeout of relay server HTTP calls.
    #[serde(with = "crate::serde::duration")]
    pub http_timeout: Duration,
}

impl Default for EnvelopingConfig {
    fn default() -> Self {
        Self {
            chain_id: 33,
            relay_hub_address: Address::ZERO,
            deploy_verifier_address: Address::ZERO,
            relay_verifier_address: Address::ZERO,
            smart_wallet_factory: Address::ZERO,
            preferred_relays: Vec::new(),
            gas_price_factor_percent: 0.02,
            min_gas_price: U256::ZERO,
            max_relay_nonce_gap: 3,
            relay_timeout_grace: Duration::from_secs(1800),
            relay_lookup_window_blocks: 60_000,
            relay_lookup_window_parts: 1,
            slice_size: 3,
            request_valid_seconds: 172_800,
            estimated_gas_correction_factor: 1.0,
            http_timeout: Duration::from_secs(10),
        }
    }
}

impl EnvelopingConfig {
    /// Sets the chain ID.
    pub fn with_chain_id(mut self, chain_id: ChainId) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Sets the relay hub address.
    pub fn with_relay_hub(mut self, relay_hub: Address) -> Self {
        self.relay_hub_address = relay_hub;
        self
    }

    /// Sets the default verifiers.
    pub fn with_verifiers(mut self, relay_verifier: Address, deploy_verifier: Address) -> Self {
        self.relay_verifier_address = relay_verifier;
        self.deploy_verifier_address = deploy_verifier;
        self
    }

    /// Sets the smart wallet factory address.
    pub fn with_smart_wallet_factory(mut self, factory: Address) -> Self {
        self.smart_wallet_factory = factory;
        self
    }

    /// Sets the preferred relays.
    pub fn with_preferred_relays(mut self, relays: impl IntoIterator<Item = Url>) -> Self {
        self.preferred_relays = relays.into_iter().collect();
        self
    }

    /// Sets the gas price factor.
    pub fn with_gas_price_factor_percent(mut self, factor: f64) -> Self {
        self.gas_price_factor_percent = factor;
        self
    }

    /// Sets the minimum gas price.
    pub fn with_min_gas_price(mut self, min_gas_price: U256) -> Self {
        self.min_gas_price = min_gas_price;
        self
    }

    /// Sets the relay nonce gap.
    pub fn with_max_relay_nonce_gap(mut self, gap: u64) -> Self {
        self.max_relay_nonce_gap = gap;
        self
    }

    /// Sets the number of relays pinged concurrently.
    pub fn with_slice_size(mut self, slice_size: usize) -> Self {
        self.slice_size = slice_size;
        self
    }

    /// Sets the relay lookup window.
    pub fn with_relay_lookup_window(mut self, blocks: u64, parts: u64) -> Self {
        self.relay_lookup_window_blocks = blocks;
        self.relay_lookup_window_parts = parts;
        self
    }

    /// Sets how long failures lower a relay's score.
    pub fn with_relay_timeout_grace(mut self, grace: Duration) -> Self {
        self.relay_timeout_grace = grace;
        self
    }

    /// Sets the gas correction factor.
    pub fn with_estimated_gas_correction_factor(mut self, factor: f64) -> Self {
        self.estimated_gas_correction_factor = factor;
        self
    }

    /// Returns the verifier configured for the given request kind.
    pub const fn default_verifier(&self, deploy: bool) -> Address {
        if deploy { self.deploy_verifier_address } else { self.relay_verifier_address }
    }

    /// Load from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path.as_ref())
            .map_err(|err| ConfigError::File(format!("{}: {err}", path.as_ref().display())))?;
        serde_yaml::from_reader(&file).map_err(|err| ConfigError::File(err.to_string()))
    }

    /// Save to a YAML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            serde_yaml::to_string(self).map_err(|err| ConfigError::File(err.to_string()))?;
        std::fs::write(path, content).map_err(|err| ConfigError::File(err.to_string()))
    }
}

/// Per-request overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestConfig {
    /// Gas price to use regardless of the request and the network.
    pub force_gas_price: Option<U256>,
    /// Destination call gas limit to use regardless of the request.
    pub force_gas_limit: Option<U256>,
    /// Whether the request should be enveloped at all.
    pub use_enveloping: bool,
    /// Return right after the relay accepted the request, without waiting for the receipt.
    pub ignore_transaction_receipt: bool,
    /// How many times the receipt is polled.
    pub retries: u32,
    /// Delay before the first receipt poll, doubled after each attempt.
    pub initial_backoff: Duration,
    /// Only use the configured relays.
    pub only_preferred_relays: bool,
    /// Pre-computed smart wallet address, required to estimate deploy token payments.
    pub pre_deploy_sw_address: Option<Address>,
    /// Overrides [`EnvelopingConfig::estimated_gas_correction_factor`].
    pub estimated_gas_correction_factor: Option<f64>,
    /// Overrides the internal call correction.
    pub internal_estimation_correction: Option<u64>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            force_gas_price: None,
            force_gas_limit: None,
            use_enveloping: true,
            ignore_transaction_receipt: false,
            retries: 10,
            initial_backoff: Duration::from_secs(1),
            only_preferred_relays: false,
            pre_deploy_sw_address: None,
            estimated_gas_correction_factor: None,
            internal_estimation_correction: None,
        }
    }
}

impl RequestConfig {
    /// Returns the gas correction factor for this request.
    pub fn gas_correction_factor(&self, config: &EnvelopingConfig) -> f64 {
        self.estimated_gas_correction_factor.unwrap_or(config.estimated_gas_correction_factor)
    }
}
