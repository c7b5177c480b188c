//! The enveloping request lifecycle.
//!
//! [`RelayClient::relay`] turns a [`UserDefinedRequest`] into a relayed transaction:
//! 1. required fields are checked, before any network access
//! 2. the gas price is resolved
//! 3. the forwarder nonce is resolved
//! 4. the destination call gas limit is resolved
//! 5. a ready relay is selected
//! 6. the relay's fee receiver, the token payment gas and the relay max nonce are set
//! 7. the request is signed
//! 8. the request is submitted, and the returned transaction validated and rebroadcast
//! 9. the receipt is awaited, unless ignored
//! 10. the receipt is classified
//!
//! Every stage fails fast and nothing is retried.

use crate::{
    config::RequestConfig,
    context::EnvelopingContext,
    error::{ConfigError, EnvelopingError},
    estimation::GasEstimator,
    http::RelayServerApi,
    outcome::RelayOutcome,
    relays::{KnownRelaysManager, PingFilter, RelaySelectionManager},
    signers::AccountManager,
    transport::error::TransportErrExt,
    types::{
        DeployForwardRequest, DeployRequest, EnvelopingMetadata, EnvelopingRequest,
        EnvelopingTxRequest, ForwardRequest, IForwarder, ISmartWalletFactory, RelayData,
        RelayEstimation, RelayInfo, RelayRequest, UserDefinedRequest, UserRequestKind,
    },
    utils::gas::apply_factor,
    validation::{RelayedTransaction, RelayedTransactionValidator},
};
use alloy::{
    primitives::{Address, Bytes, TxHash, U256},
    providers::Provider,
    rpc::types::TransactionReceipt,
};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, trace};

/// Lifecycle notifications emitted by [`RelayClient`], in pipeline order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopingEvent {
    /// Known relays are being refreshed.
    RefreshRelays,
    /// Known relays were refreshed.
    DoneRefreshRelays,
    /// A relay is being selected.
    NextRelay,
    /// The request is being signed.
    SignRequest,
    /// The request is being sent to a relay.
    SendToRelayer {
        /// The relay URL.
        url: String,
    },
    /// The relay answered.
    RelayerResponse {
        /// The relay URL.
        url: String,
        /// Whether the relay accepted the request.
        accepted: bool,
    },
    /// The relayed transaction is being validated.
    ValidateRequest,
}

/// A relayed and validated request.
#[derive(Debug, Clone)]
pub struct RelayedRequest {
    /// Hash of the relayed transaction.
    pub transaction_hash: TxHash,
    /// The relay-signed transaction.
    pub signed_tx: Bytes,
    /// The signed request as sent to the relay.
    pub request: EnvelopingTxRequest,
    /// The relay that served the request.
    pub relay: RelayInfo,
    /// The receipt, unless ignored.
    pub receipt: Option<TransactionReceipt>,
    /// The classified receipt, unless ignored.
    pub outcome: Option<RelayOutcome>,
}

/// A signed request and the relay it is meant for.
#[derive(Debug)]
struct PreparedRequest {
    relay: RelayInfo,
    tx_request: EnvelopingTxRequest,
}

/// Builds, signs and relays enveloping requests.
#[derive(Debug)]
pub struct RelayClient {
    context: EnvelopingContext,
    accounts: AccountManager,
    estimator: GasEstimator,
    known_relays: Arc<KnownRelaysManager>,
    http: Arc<dyn RelayServerApi>,
    events: Option<UnboundedSender<EnvelopingEvent>>,
}

impl RelayClient {
    /// Creates a client talking to relays through `http`.
    pub fn new(context: EnvelopingContext, http: Arc<dyn RelayServerApi>) -> Self {
        Self {
            accounts: AccountManager::new(
                context.provider().clone(),
                context.typed_request_builder(),
            ),
            estimator: GasEstimator::new(context.clone()),
            known_relays: Arc::new(KnownRelaysManager::new(context.clone())),
            context,
            http,
            events: None,
        }
    }

    /// Shares `known_relays` instead of a private one.
    pub fn with_known_relays(mut self, known_relays: Arc<KnownRelaysManager>) -> Self {
        self.known_relays = known_relays;
        self
    }

    /// Sends lifecycle events to `events`.
    pub fn with_events(mut self, events: UnboundedSender<EnvelopingEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Returns the account manager.
    pub const fn accounts(&self) -> &AccountManager {
        &self.accounts
    }

    /// Returns the account manager mutably, to add or remove wallets.
    pub fn accounts_mut(&mut self) -> &mut AccountManager {
        &mut self.accounts
    }

    /// Returns the gas estimator.
    pub const fn estimator(&self) -> &GasEstimator {
        &self.estimator
    }

    /// Returns the known relays.
    pub const fn known_relays(&self) -> &Arc<KnownRelaysManager> {
        &self.known_relays
    }

    fn emit(&self, event: EnvelopingEvent) {
        if let Some(events) = &self.events {
            events.send(event).ok();
        }
    }

    /// Refreshes the known relays.
    pub async fn refresh_relays(&self) -> Result<(), EnvelopingError> {
        self.emit(EnvelopingEvent::RefreshRelays);
        self.known_relays.refresh().await?;
        self.emit(EnvelopingEvent::DoneRefreshRelays);
        Ok(())
    }

    /// Relays `request` and validates what the relay returned.
    #[instrument(skip_all, fields(from = ?request.from))]
    pub async fn relay(
        &self,
        request: &UserDefinedRequest,
        request_config: &RequestConfig,
    ) -> Result<RelayedRequest, EnvelopingError> {
        let PreparedRequest { relay, tx_request } = self.prepare(request, request_config).await?;
        let url = relay.manager_data.url.clone();

        self.emit(EnvelopingEvent::SendToRelayer { url: url.clone() });
        let response = match self.http.relay(&url, &tx_request).await {
            Ok(response) => response,
            Err(err) => {
                self.emit(EnvelopingEvent::RelayerResponse { url: url.clone(), accepted: false });
                self.known_relays
                    .save_relay_failure(Utc::now(), relay.hub_info.relay_manager_address, url)
                    .await;
                return Err(err.into());
            }
        };
        self.emit(EnvelopingEvent::RelayerResponse { url: url.clone(), accepted: true });

        let signed_tx = response
            .signed_tx
            .ok_or_else(|| EnvelopingError::MissingSignedTransaction { url: url.clone() })?;

        self.emit(EnvelopingEvent::ValidateRequest);
        let transaction = RelayedTransaction::decode(&signed_tx)?;
        RelayedTransactionValidator::new(self.context.config().relay_hub_address).validate(
            &tx_request,
            &transaction,
            relay.hub_info.relay_worker_address,
        )?;

        self.broadcast(&signed_tx).await?;
        info!(tx_hash = %transaction.hash, %url, "Request relayed");

        let (receipt, outcome) = if request_config.ignore_transaction_receipt {
            (None, None)
        } else {
            let receipt = self.wait_for_receipt(transaction.hash, request_config).await?;
            let outcome = RelayOutcome::from_receipt(&receipt);
            debug!(%outcome, "Classified receipt");
            (Some(receipt), Some(outcome))
        };

        Ok(RelayedRequest {
            transaction_hash: transaction.hash,
            signed_tx,
            request: tx_request,
            relay,
            receipt,
            outcome,
        })
    }

    /// Builds and signs `request` like [`relay`](Self::relay), then asks the selected relay to
    /// estimate it instead of relaying it.
    #[instrument(skip_all, fields(from = ?request.from))]
    pub async fn estimate_relay_transaction(
        &self,
        request: &UserDefinedRequest,
        request_config: &RequestConfig,
    ) -> Result<RelayEstimation, EnvelopingError> {
        let PreparedRequest { relay, tx_request } = self.prepare(request, request_config).await?;
        Ok(self.http.estimate(&relay.manager_data.url, &tx_request).await?)
    }

    /// Estimates the gas of the transaction relaying `request`.
    ///
    /// With a `signature`, the hub call is simulated from `relay_worker`. Without one, the
    /// linear fit model is used, which only supports relay requests.
    pub async fn estimate_max_possible_gas(
        &self,
        request: &EnvelopingRequest,
        signature: Option<Bytes>,
        relay_worker: Address,
        request_config: &RequestConfig,
    ) -> Result<U256, EnvelopingError> {
        let factor = request_config.gas_correction_factor(self.context.config());
        let gas = match signature {
            Some(signature) => {
                self.estimator
                    .standard_max_possible_gas(
                        request,
                        signature,
                        relay_worker,
                        request_config.pre_deploy_sw_address,
                        factor,
                    )
                    .await?
            }
            None => {
                self.estimator
                    .linear_fit_max_possible_gas(
                        request,
                        request_config.internal_estimation_correction,
                        factor,
                    )
                    .await?
            }
        };
        Ok(gas)
    }

    /// Resolves every field of `request` that does not depend on the serving relay.
    ///
    /// The fee receiver is left zero. The token payment gas is left as given, or zero.
    #[instrument(skip_all)]
    pub async fn build_request(
        &self,
        request: &UserDefinedRequest,
        request_config: &RequestConfig,
    ) -> Result<EnvelopingRequest, EnvelopingError> {
        if !request_config.use_enveloping {
            return Err(ConfigError::EnvelopingDisabled.into());
        }

        let config = self.context.config();
        let deploy = request.is_deploy();

        let call_forwarder =
            request.relay_data.call_forwarder.ok_or(ConfigError::MissingField("callForwarder"))?;
        if call_forwarder.is_zero() {
            return Err(ConfigError::ZeroAddress("callForwarder").into());
        }
        let call_verifier =
            request.relay_data.call_verifier.unwrap_or_else(|| config.default_verifier(deploy));
        if call_verifier.is_zero() {
            let kind = if deploy { "deploy" } else { "relay" };
            return Err(ConfigError::MissingVerifier { kind }.into());
        }
        if config.preferred_relays.is_empty() {
            return Err(ConfigError::MissingRelayUrl.into());
        }
        let data = request.data.clone().ok_or(ConfigError::MissingField("data"))?;
        let from = request.from.ok_or(ConfigError::MissingField("from"))?;
        let to = request.to.ok_or(ConfigError::MissingField("to"))?;
        let token_contract =
            request.token_contract.ok_or(ConfigError::MissingField("tokenContract"))?;
        let relay_hub = config.relay_hub_address;
        if relay_hub.is_zero() {
            return Err(ConfigError::MissingField("relayHub").into());
        }
        if let Some(requested) = request.relay_hub.filter(|requested| *requested != relay_hub) {
            let err = ConfigError::RelayHubMismatch { expected: relay_hub, got: requested };
            return Err(err.into());
        }

        let gas_price = self.resolve_gas_price(request.relay_data.gas_price, request_config).await?;

        let nonce = match request.nonce {
            Some(nonce) => nonce,
            None => self.forwarder_nonce(call_forwarder, from, deploy).await?,
        };

        let valid_until_time = request.valid_until_time.unwrap_or_else(|| {
            let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
            U256::from(now.saturating_add(config.request_valid_seconds))
        });

        let relay_data =
            RelayData { gas_price, fees_receiver: Address::ZERO, call_forwarder, call_verifier };
        let token_gas = request.token_gas.unwrap_or_default();

        let mut envelope: EnvelopingRequest = match request.kind {
            UserRequestKind::Relay { gas } => RelayRequest {
                request: ForwardRequest {
                    relay_hub,
                    from,
                    to,
                    token_contract,
                    value: request.value,
                    gas: gas.unwrap_or_default(),
                    nonce,
                    token_amount: request.token_amount,
                    token_gas,
                    valid_until_time,
                    data,
                },
                relay_data,
            }
            .into(),
            UserRequestKind::Deploy { index, recoverer } => DeployRequest {
                request: DeployForwardRequest {
                    relay_hub,
                    from,
                    to,
                    token_contract,
                    recoverer,
                    value: request.value,
                    nonce,
                    token_amount: request.token_amount,
                    token_gas,
                    valid_until_time,
                    index,
                    data,
                },
                relay_data,
            }
            .into(),
        };

        if let UserRequestKind::Relay { gas } = request.kind {
            let gas = match request_config.force_gas_limit.or(gas) {
                Some(gas) => gas,
                None => {
                    self.estimator
                        .estimate_internal_call_gas(
                            &envelope,
                            request_config.internal_estimation_correction,
                        )
                        .await?
                }
            };
            if gas.is_zero() {
                return Err(ConfigError::ZeroGasLimit.into());
            }
            envelope.set_gas(gas);
        }

        debug!(?envelope, "Built request");
        Ok(envelope)
    }

    /// Resolves the gas price: `forceGasPrice`, else `requested`, else the network gas price
    /// raised by the configured factor and floored at the configured minimum.
    pub async fn resolve_gas_price(
        &self,
        requested: Option<U256>,
        request_config: &RequestConfig,
    ) -> Result<U256, EnvelopingError> {
        let gas_price = match request_config.force_gas_price.or(requested) {
            Some(gas_price) => gas_price,
            None => {
                let config = self.context.config();
                let network = U256::from(self.context.provider().get_gas_price().await?);
                apply_factor(network, 1.0 + config.gas_price_factor_percent)
                    .max(config.min_gas_price)
            }
        };

        if gas_price.is_zero() {
            return Err(ConfigError::ZeroGasPrice.into());
        }
        Ok(gas_price)
    }

    /// Reads the next nonce of `from` from the forwarder, or from the factory for deployments.
    async fn forwarder_nonce(
        &self,
        call_forwarder: Address,
        from: Address,
        deploy: bool,
    ) -> Result<U256, EnvelopingError> {
        let provider = self.context.provider();
        let nonce = if deploy {
            ISmartWalletFactory::new(call_forwarder, provider).nonce(from).call().await?
        } else {
            IForwarder::new(call_forwarder, provider).nonce().call().await?
        };
        Ok(nonce)
    }

    /// Builds `request`, selects a relay for it and signs it.
    async fn prepare(
        &self,
        request: &UserDefinedRequest,
        request_config: &RequestConfig,
    ) -> Result<PreparedRequest, EnvelopingError> {
        let mut envelope = self.build_request(request, request_config).await?;

        self.emit(EnvelopingEvent::NextRelay);
        let filter = PingFilter {
            relay_hub: envelope.relay_hub(),
            gas_price: envelope.relay_data().gas_price,
        };
        let relay = RelaySelectionManager::new(
            self.http.clone(),
            self.known_relays.clone(),
            filter,
            Some(envelope.relay_data().call_verifier),
            request_config.only_preferred_relays,
        )
        .await
        .select_next_relay()
        .await
        .ok_or(EnvelopingError::NoRelayAvailable)?;

        envelope.relay_data_mut().fees_receiver = relay.hub_info.fees_receiver;
        if request.token_gas.is_none() {
            let token_gas = self
                .estimator
                .estimate_token_transfer_gas(&envelope, request_config.pre_deploy_sw_address)
                .await?;
            envelope.set_token_gas(token_gas);
        }

        let worker_nonce = self
            .context
            .provider()
            .get_transaction_count(relay.hub_info.relay_worker_address)
            .await?;
        let relay_max_nonce =
            worker_nonce.saturating_add(self.context.config().max_relay_nonce_gap);

        self.emit(EnvelopingEvent::SignRequest);
        let signature = self.accounts.sign(&envelope, None).await?;

        trace!(url = %relay.manager_data.url, relay_max_nonce, "Prepared request");
        Ok(PreparedRequest {
            tx_request: EnvelopingTxRequest {
                metadata: EnvelopingMetadata {
                    relay_hub_address: envelope.relay_hub(),
                    relay_max_nonce,
                    signature,
                },
                relay_request: envelope,
            },
            relay,
        })
    }

    /// Sends the relay-signed transaction to the node, in case the relay did not.
    async fn broadcast(&self, signed_tx: &Bytes) -> Result<(), EnvelopingError> {
        match self.context.provider().send_raw_transaction(signed_tx).await {
            Ok(_) => Ok(()),
            Err(err) if err.is_already_known() => {
                trace!("Relayed transaction already known");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Polls the receipt of `tx_hash`, doubling the delay after every attempt.
    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        request_config: &RequestConfig,
    ) -> Result<TransactionReceipt, EnvelopingError> {
        let mut backoff = request_config.initial_backoff;
        for attempt in 1..=request_config.retries.max(1) {
            tokio::time::sleep(backoff).await;
            if let Some(receipt) = self.context.provider().get_transaction_receipt(tx_hash).await?
            {
                return Ok(receipt);
            }
            trace!(%tx_hash, attempt, "Receipt not available yet");
            backoff = backoff.saturating_mul(2);
        }

        Err(EnvelopingError::ReceiptTimeout(tx_hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::EnvelopingConfig,
        error::{HttpError, ValidationError},
        test_utils::{
            DEV_ADDRESS_0, DEV_ADDRESS_1, DEV_KEY_0, DEV_KEY_1, MockRelayServer, mocked_provider,
        },
        types::{HubInfo, IRelayHub},
    };
    use alloy::{
        primitives::{B256, Bloom, U64, address, bytes},
        rpc::types::Log,
        sol_types::SolEvent,
        transports::mock::Asserter,
    };
    use std::time::Duration;
    use tokio::sync::mpsc;

    const HUB: Address = address!("0x3bA95e1cccd397b5124BcdCC5bf0952114E6A701");
    const FORWARDER: Address = address!("0xeaB5b9fA91aeFFaA9c33F9b33d12AB7088fa7f6f");
    const VERIFIER: Address = address!("0x56ccdB6D312307Db7A4847c3Ea8Ce2449e9B79e9");
    const RECIPIENT: Address = address!("0x1Af2844A588759D0DE58abD568ADD96BB8B3B6D8");
    const FEES_RECEIVER: Address = address!("0x9C34f2225987b0725A4201F1C6EC1adB35562126");
    const RELAY_URL: &str = "https://relay.example.org/";

    fn config() -> EnvelopingConfig {
        EnvelopingConfig::default()
            .with_relay_hub(HUB)
            .with_verifiers(VERIFIER, VERIFIER)
            .with_preferred_relays([RELAY_URL.parse().unwrap()])
    }

    fn hub_info() -> HubInfo {
        HubInfo {
            relay_worker_address: DEV_ADDRESS_1,
            relay_manager_address: address!("0x4a6a175c1140f01679525ca3612364f5384cde46"),
            relay_hub_address: HUB,
            fees_receiver: FEES_RECEIVER,
            min_gas_price: U256::from(1_000),
            ready: true,
            version: "2.0.1".to_string(),
        }
    }

    fn honest_relay() -> MockRelayServer {
        MockRelayServer { worker_key: Some(DEV_KEY_1), ..Default::default() }
            .with_relay(RELAY_URL, hub_info())
    }

    fn setup(
        http: MockRelayServer,
        config: EnvelopingConfig,
    ) -> (RelayClient, Asserter, Arc<MockRelayServer>) {
        let (provider, asserter) = mocked_provider();
        let http = Arc::new(http);
        let mut client = RelayClient::new(EnvelopingContext::new(provider, config), http.clone());
        client.accounts_mut().add_account(DEV_ADDRESS_0, DEV_KEY_0).unwrap();
        (client, asserter, http)
    }

    fn user_request() -> UserDefinedRequest {
        UserDefinedRequest {
            from: Some(DEV_ADDRESS_0),
            to: Some(RECIPIENT),
            data: Some(bytes!("0xa9059cbb")),
            nonce: Some(U256::from(3)),
            token_contract: Some(Address::ZERO),
            valid_until_time: Some(U256::from(1_900_000_000u64)),
            kind: UserRequestKind::Relay { gas: Some(U256::from(30_000)) },
            relay_data: crate::types::UserDefinedRelayData {
                gas_price: Some(U256::from(60_000_000u64)),
                call_forwarder: Some(FORWARDER),
                call_verifier: None,
            },
            ..Default::default()
        }
    }

    fn relayed_receipt() -> serde_json::Value {
        let log = Log {
            inner: alloy::primitives::Log {
                address: HUB,
                data: IRelayHub::TransactionRelayed {
                    relayManager: hub_info().relay_manager_address,
                    relayWorker: DEV_ADDRESS_1,
                    relayRequestSigHash: B256::ZERO,
                    relayedCallReturnValue: Bytes::new(),
                }
                .encode_log_data(),
            },
            ..Default::default()
        };
        serde_json::json!({
            "type": "0x0",
            "status": "0x1",
            "cumulativeGasUsed": "0x1d4c0",
            "logs": [log],
            "logsBloom": Bloom::ZERO,
            "transactionHash": B256::ZERO,
            "transactionIndex": "0x0",
            "blockHash": B256::repeat_byte(1),
            "blockNumber": "0x1",
            "gasUsed": "0x1d4c0",
            "effectiveGasPrice": "0x3938700",
            "from": DEV_ADDRESS_1,
            "to": HUB,
            "contractAddress": null,
        })
    }

    fn no_receipt() -> RequestConfig {
        RequestConfig { ignore_transaction_receipt: true, ..Default::default() }
    }

    #[tokio::test]
    async fn relays_and_validates() {
        let (client, asserter, http) = setup(honest_relay(), config());
        let (events, mut rx) = mpsc::unbounded_channel();
        let client = client.with_events(events);

        // relay worker nonce, then the rebroadcast
        asserter.push_success(&U64::from(4));
        asserter.push_success(&B256::ZERO);

        let relayed = client.relay(&user_request(), &no_receipt()).await.unwrap();
        assert_eq!(relayed.request.metadata.relay_max_nonce, 7);
        assert_eq!(relayed.request.metadata.relay_hub_address, HUB);
        assert_eq!(relayed.request.relay_request.relay_data().fees_receiver, FEES_RECEIVER);
        assert_eq!(relayed.request.relay_request.relay_data().call_verifier, VERIFIER);
        assert_eq!(relayed.request.relay_request.token_gas(), U256::ZERO);
        assert_eq!(relayed.relay.manager_data.url, RELAY_URL);
        assert!(relayed.receipt.is_none() && relayed.outcome.is_none());
        assert_eq!(http.submitted.lock().unwrap().as_slice(), [relayed.request.clone()]);

        let mut received = Vec::new();
        while let Ok(event) = rx.try_recv() {
            received.push(event);
        }
        assert_eq!(
            received,
            vec![
                EnvelopingEvent::NextRelay,
                EnvelopingEvent::SignRequest,
                EnvelopingEvent::SendToRelayer { url: RELAY_URL.to_string() },
                EnvelopingEvent::RelayerResponse { url: RELAY_URL.to_string(), accepted: true },
                EnvelopingEvent::ValidateRequest,
            ]
        );
    }

    #[tokio::test]
    async fn already_known_rebroadcast_is_success() {
        let (client, asserter, _) = setup(honest_relay(), config());
        asserter.push_success(&U64::from(0));
        asserter.push_failure_msg("already known");

        let relayed = client.relay(&user_request(), &no_receipt()).await.unwrap();
        assert_eq!(relayed.request.metadata.relay_max_nonce, 3);
    }

    #[tokio::test]
    async fn rejects_tampering_relay() {
        let http = MockRelayServer { tamper: true, ..honest_relay() };
        let (client, asserter, _) = setup(http, config());
        asserter.push_success(&U64::from(4));

        let err = client.relay(&user_request(), &no_receipt()).await.unwrap_err();
        assert!(err.is_validation());
        assert!(matches!(err, EnvelopingError::Validation(ValidationError::DataTampered { .. })));
    }

    #[tokio::test]
    async fn relay_error_is_recorded() {
        let http = MockRelayServer {
            relay_response: Some(Err("verifier rejected request".to_string())),
            ..honest_relay()
        };
        let (client, asserter, _) = setup(http, config());
        asserter.push_success(&U64::from(4));

        let err = client.relay(&user_request(), &no_receipt()).await.unwrap_err();
        assert!(matches!(err, EnvelopingError::Http(HttpError::Relay { .. })));
        let failures = client.known_relays().failures(RELAY_URL).await;
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].relay_manager, hub_info().relay_manager_address);
    }

    #[tokio::test]
    async fn classifies_awaited_receipt() {
        let (client, asserter, _) = setup(honest_relay(), config());
        asserter.push_success(&U64::from(4));
        asserter.push_success(&B256::ZERO);
        asserter.push_success(&serde_json::Value::Null);
        asserter.push_success(&relayed_receipt());

        let request_config = RequestConfig {
            retries: 3,
            initial_backoff: Duration::from_millis(1),
            ..Default::default()
        };
        let relayed = client.relay(&user_request(), &request_config).await.unwrap();
        assert_eq!(relayed.outcome, Some(RelayOutcome::Relayed));

        let receipt = relayed.receipt.unwrap();
        assert!(receipt.status());
        assert_eq!(receipt.inner.logs().len(), 1);
    }

    #[tokio::test]
    async fn rejects_foreign_relay_hub() {
        let (client, _, _) = setup(honest_relay(), config());
        let mut request = user_request();

        request.relay_hub = Some(FORWARDER);
        assert!(matches!(
            client.build_request(&request, &no_receipt()).await.unwrap_err(),
            EnvelopingError::Config(ConfigError::RelayHubMismatch { expected, got })
                if expected == HUB && got == FORWARDER
        ));

        request.relay_hub = Some(HUB);
        let built = client.build_request(&request, &no_receipt()).await.unwrap();
        assert_eq!(built.relay_hub(), HUB);
    }

    #[tokio::test]
    async fn waits_for_receipt() {
        let (client, asserter, _) = setup(honest_relay(), config());
        asserter.push_success(&U64::from(4));
        asserter.push_success(&B256::ZERO);
        asserter.push_success(&serde_json::Value::Null);
        asserter.push_success(&serde_json::Value::Null);

        let request_config = RequestConfig {
            retries: 2,
            initial_backoff: Duration::from_millis(1),
            ..Default::default()
        };
        let err = client.relay(&user_request(), &request_config).await.unwrap_err();
        assert!(matches!(err, EnvelopingError::ReceiptTimeout(_)));
    }

    #[tokio::test]
    async fn no_ready_relay() {
        let (client, _, http) = setup(MockRelayServer::default(), config());
        assert!(matches!(
            client.relay(&user_request(), &no_receipt()).await.unwrap_err(),
            EnvelopingError::NoRelayAvailable
        ));
        assert_eq!(http.pinged(), vec![RELAY_URL.to_string()]);
    }

    #[tokio::test]
    async fn checks_fields_before_network() {
        // no responses are queued, any network access would fail differently
        let (client, _, http) = setup(honest_relay(), config());

        let mut request = user_request();
        request.relay_data.call_forwarder = None;
        assert!(matches!(
            client.relay(&request, &no_receipt()).await.unwrap_err(),
            EnvelopingError::Config(ConfigError::MissingField("callForwarder"))
        ));

        let mut request = user_request();
        request.data = None;
        assert!(matches!(
            client.relay(&request, &no_receipt()).await.unwrap_err(),
            EnvelopingError::Config(ConfigError::MissingField("data"))
        ));

        let request_config = RequestConfig { use_enveloping: false, ..no_receipt() };
        assert!(matches!(
            client.relay(&user_request(), &request_config).await.unwrap_err(),
            EnvelopingError::Config(ConfigError::EnvelopingDisabled)
        ));

        let request_config = RequestConfig { force_gas_limit: Some(U256::ZERO), ..no_receipt() };
        assert!(matches!(
            client.relay(&user_request(), &request_config).await.unwrap_err(),
            EnvelopingError::Config(ConfigError::ZeroGasLimit)
        ));

        assert!(http.pinged().is_empty());
    }

    #[tokio::test]
    async fn requires_verifier_and_relay_url() {
        let without_deploy_verifier = config().with_verifiers(VERIFIER, Address::ZERO);
        let (client, _, _) = setup(honest_relay(), without_deploy_verifier);
        let mut request = user_request();
        request.kind = UserRequestKind::Deploy { index: U256::ZERO, recoverer: Address::ZERO };
        assert!(matches!(
            client.relay(&request, &no_receipt()).await.unwrap_err(),
            EnvelopingError::Config(ConfigError::MissingVerifier { kind: "deploy" })
        ));

        let (client, _, _) = setup(honest_relay(), config().with_preferred_relays(Vec::new()));
        assert!(matches!(
            client.relay(&user_request(), &no_receipt()).await.unwrap_err(),
            EnvelopingError::Config(ConfigError::MissingRelayUrl)
        ));
    }

    #[tokio::test]
    async fn gas_price_is_floored_at_minimum() {
        let config = config()
            .with_gas_price_factor_percent(0.02)
            .with_min_gas_price(U256::from(150));
        let (client, asserter, _) = setup(MockRelayServer::default(), config);

        asserter.push_success(&U64::from(100));
        assert_eq!(
            client.resolve_gas_price(None, &RequestConfig::default()).await.unwrap(),
            U256::from(150)
        );

        asserter.push_success(&U64::from(1_000));
        assert_eq!(
            client.resolve_gas_price(None, &RequestConfig::default()).await.unwrap(),
            U256::from(1_020)
        );

        let forced = RequestConfig { force_gas_price: Some(U256::from(7)), ..Default::default() };
        assert_eq!(
            client.resolve_gas_price(Some(U256::from(9)), &forced).await.unwrap(),
            U256::from(7)
        );

        let zero = RequestConfig { force_gas_price: Some(U256::ZERO), ..Default::default() };
        assert!(matches!(
            client.resolve_gas_price(None, &zero).await.unwrap_err(),
            EnvelopingError::Config(ConfigError::ZeroGasPrice)
        ));
    }

    #[tokio::test]
    async fn resolves_nonce_gas_and_expiry() {
        let (client, asserter, _) = setup(MockRelayServer::default(), config());
        let mut request = user_request();
        request.nonce = None;
        request.valid_until_time = None;
        request.kind = UserRequestKind::Relay { gas: None };

        // forwarder nonce, then the internal call estimation
        asserter.push_success(&Bytes::from(U256::from(9).to_be_bytes::<32>()));
        asserter.push_success(&U64::from(50_000));

        let before = Utc::now().timestamp() as u64;
        let built = client.build_request(&request, &RequestConfig::default()).await.unwrap();
        assert_eq!(built.nonce(), U256::from(9));
        assert_eq!(built.gas(), Some(U256::from(31_500)));
        assert_eq!(built.relay_data().fees_receiver, Address::ZERO);

        let valid_until_time = built.valid_until_time().to::<u64>();
        assert!(valid_until_time >= before + 172_800);
        assert!(valid_until_time <= Utc::now().timestamp() as u64 + 172_800);
    }

    #[tokio::test]
    async fn deploy_nonce_comes_from_factory() {
        let (client, asserter, _) = setup(MockRelayServer::default(), config());
        let mut request = user_request();
        request.nonce = None;
        request.kind = UserRequestKind::Deploy { index: U256::from(1), recoverer: Address::ZERO };

        asserter.push_success(&Bytes::from(U256::from(2).to_be_bytes::<32>()));

        let built = client.build_request(&request, &RequestConfig::default()).await.unwrap();
        assert!(built.is_deploy());
        assert_eq!(built.nonce(), U256::from(2));
        assert_eq!(built.gas(), None);
    }

    #[tokio::test]
    async fn estimates_with_relay() {
        let estimation = RelayEstimation {
            gas_price: U256::from(60_000_000u64),
            estimation: U256::from(145_000),
            ..Default::default()
        };
        let http = MockRelayServer { estimation: Some(estimation.clone()), ..honest_relay() };
        let (client, asserter, http) = setup(http, config());
        asserter.push_success(&U64::from(4));

        assert_eq!(
            client.estimate_relay_transaction(&user_request(), &no_receipt()).await.unwrap(),
            estimation
        );
        assert_eq!(http.submitted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn max_possible_gas_without_signature_uses_linear_fit() {
        let (client, asserter, _) = setup(MockRelayServer::default(), config());
        let request = client.build_request(&user_request(), &no_receipt()).await.unwrap();

        asserter.push_success(&U64::from(58_500));
        assert_eq!(
            client
                .estimate_max_possible_gas(&request, None, DEV_ADDRESS_1, &no_receipt())
                .await
                .unwrap(),
            U256::from(127_770)
        );
    }
}
