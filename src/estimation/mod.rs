//! Gas estimation of enveloping requests.
//!
//! Two strategies are available:
//! - **standard**: the signed request is simulated through the hub from the relay worker
//! - **linear fit**: unsigned relay requests are modelled from the gas of their internal call
//!
//! Both add the gas of the token payment to the relay, which is estimated separately.

mod linear;
pub use linear::linear_fit_gas;

use crate::{
    constants::INTERNAL_TRANSACTION_ESTIMATED_CORRECTION,
    context::EnvelopingContext,
    error::EstimationError,
    types::{EnvelopingRequest, IERC20, ISmartWalletFactory},
    utils::gas::{apply_factor, apply_internal_correction, internal_correction},
};
use alloy::{
    primitives::{Address, Bytes, U256},
    providers::Provider,
    rpc::types::TransactionRequest,
};
use tracing::{debug, instrument};

/// Estimates the gas enveloping requests need.
#[derive(Debug, Clone)]
pub struct GasEstimator {
    context: EnvelopingContext,
}

impl GasEstimator {
    /// Creates a new estimator.
    pub const fn new(context: EnvelopingContext) -> Self {
        Self { context }
    }

    /// Estimates the relayed transaction of a signed request by simulating the hub call as
    /// sent by `relay_worker`.
    ///
    /// The token payment is estimated separately and added before `correction_factor` is
    /// applied.
    #[instrument(skip_all, fields(from = %request.from(), worker = %relay_worker))]
    pub async fn standard_max_possible_gas(
        &self,
        request: &EnvelopingRequest,
        signature: Bytes,
        relay_worker: Address,
        pre_deploy_sw_address: Option<Address>,
        correction_factor: f64,
    ) -> Result<U256, EstimationError> {
        let token_gas = self.estimate_token_transfer_gas(request, pre_deploy_sw_address).await?;

        let tx = TransactionRequest::default()
            .from(relay_worker)
            .to(request.relay_hub())
            .input(request.encode_hub_call(signature).into())
            .gas_price(request.relay_data().gas_price.saturating_to());
        let relay_gas = self.context.provider().estimate_gas(tx).await?;

        debug!(relay_gas, %token_gas, "Estimated relayed transaction");

        Ok(apply_factor(U256::from(relay_gas).saturating_add(token_gas), correction_factor))
    }

    /// Estimates the relayed transaction of an unsigned relay request with [`linear_fit_gas`].
    #[instrument(skip_all, fields(from = %request.from()))]
    pub async fn linear_fit_max_possible_gas(
        &self,
        request: &EnvelopingRequest,
        internal_correction: Option<u64>,
        correction_factor: f64,
    ) -> Result<U256, EstimationError> {
        if request.is_deploy() {
            return Err(EstimationError::UnsupportedForDeploy);
        }

        let internal_gas = self.estimate_internal_call_gas(request, internal_correction).await?;
        let token_gas = self.estimate_token_transfer_gas(request, None).await?;

        Ok(linear_fit_gas(internal_gas, token_gas, correction_factor))
    }

    /// Estimates the destination call as executed by the smart wallet.
    ///
    /// The node estimation includes the intrinsic cost of a transaction, which the internal
    /// call does not pay. It is subtracted unless the estimation is smaller than the
    /// correction.
    pub async fn estimate_internal_call_gas(
        &self,
        request: &EnvelopingRequest,
        correction: Option<u64>,
    ) -> Result<U256, EstimationError> {
        let tx = TransactionRequest::default()
            .from(request.relay_data().call_forwarder)
            .to(request.to())
            .input(request.data().clone().into())
            .gas_price(request.relay_data().gas_price.saturating_to());
        let estimation = self.context.provider().estimate_gas(tx).await?;

        let correction = correction.unwrap_or_else(|| internal_correction(request.data()));
        Ok(apply_internal_correction(U256::from(estimation), correction))
    }

    /// Estimates the ERC-20 transfer paying the relay.
    ///
    /// Subsidized requests cost nothing. The payer is the smart wallet: the call forwarder of a
    /// relay request, or `pre_deploy_sw_address` for a deployment.
    pub async fn estimate_token_transfer_gas(
        &self,
        request: &EnvelopingRequest,
        pre_deploy_sw_address: Option<Address>,
    ) -> Result<U256, EstimationError> {
        let token = request.token_contract();
        let amount = request.token_amount();
        if token.is_zero() || amount.is_zero() {
            return Ok(U256::ZERO);
        }

        let payer = if request.is_deploy() {
            pre_deploy_sw_address.ok_or(EstimationError::MissingSmartWalletAddress)?
        } else {
            request.relay_data().call_forwarder
        };

        let estimation = IERC20::new(token, self.context.provider())
            .transfer(request.relay_data().fees_receiver, amount)
            .from(payer)
            .gas_price(request.relay_data().gas_price.saturating_to())
            .estimate_gas()
            .await?;

        Ok(apply_internal_correction(
            U256::from(estimation),
            INTERNAL_TRANSACTION_ESTIMATED_CORRECTION,
        ))
    }

    /// Returns the address the factory deploys the smart wallet of `owner` to.
    pub async fn smart_wallet_address(
        &self,
        owner: Address,
        recoverer: Address,
        index: U256,
    ) -> Result<Address, EstimationError> {
        let factory = self.context.config().smart_wallet_factory;
        Ok(ISmartWalletFactory::new(factory, self.context.provider())
            .getSmartWalletAddress(owner, recoverer, index)
            .call()
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::EnvelopingConfig,
        test_utils::{DEV_ADDRESS_0, DEV_ADDRESS_1, mocked_provider},
        types::{DeployForwardRequest, DeployRequest, ForwardRequest, RelayData, RelayRequest},
    };
    use alloy::{
        primitives::{U64, address, bytes},
        transports::mock::Asserter,
    };

    const TOKEN: Address = address!("0x1Af2844A588759D0DE58abD568ADD96BB8B3B6D8");

    fn estimator() -> (GasEstimator, Asserter) {
        let (provider, asserter) = mocked_provider();
        let config = EnvelopingConfig::default()
            .with_smart_wallet_factory(address!("0x8C1A6F9dC3a9dE8aE7b7Ac4F7C1B3f6C1d2E3f40"));
        (GasEstimator::new(EnvelopingContext::new(provider, config)), asserter)
    }

    fn relay_request(token_amount: U256) -> EnvelopingRequest {
        RelayRequest {
            request: ForwardRequest {
                from: DEV_ADDRESS_0,
                to: address!("0x3bA95e1cccd397b5124BcdCC5bf0952114E6A701"),
                token_contract: TOKEN,
                token_amount,
                data: bytes!("0xa9059cbb"),
                ..Default::default()
            },
            relay_data: RelayData {
                gas_price: U256::from(60_000_000u64),
                call_forwarder: address!("0xeaB5b9fA91aeFFaA9c33F9b33d12AB7088fa7f6f"),
                ..Default::default()
            },
        }
        .into()
    }

    fn deploy_request(token_amount: U256) -> EnvelopingRequest {
        DeployRequest {
            request: DeployForwardRequest {
                from: DEV_ADDRESS_0,
                token_contract: TOKEN,
                token_amount,
                ..Default::default()
            },
            relay_data: RelayData::default(),
        }
        .into()
    }

    #[tokio::test]
    async fn subsidized_payment_needs_no_rpc() {
        // the asserter has no responses queued, any call would fail
        let (estimator, _asserter) = estimator();
        assert_eq!(
            estimator.estimate_token_transfer_gas(&relay_request(U256::ZERO), None).await.unwrap(),
            U256::ZERO
        );
        assert_eq!(
            estimator.estimate_token_transfer_gas(&deploy_request(U256::ZERO), None).await.unwrap(),
            U256::ZERO
        );
    }

    #[tokio::test]
    async fn deploy_payment_needs_smart_wallet() {
        let (estimator, asserter) = estimator();
        let request = deploy_request(U256::from(10));
        assert!(matches!(
            estimator.estimate_token_transfer_gas(&request, None).await.unwrap_err(),
            EstimationError::MissingSmartWalletAddress
        ));

        asserter.push_success(&U64::from(40_000));
        assert_eq!(
            estimator.estimate_token_transfer_gas(&request, Some(DEV_ADDRESS_1)).await.unwrap(),
            U256::from(21_500)
        );
    }

    #[tokio::test]
    async fn internal_call_is_corrected() {
        let (estimator, asserter) = estimator();
        asserter.push_success(&U64::from(50_000));
        assert_eq!(
            estimator.estimate_internal_call_gas(&relay_request(U256::ZERO), None).await.unwrap(),
            U256::from(31_500)
        );

        // estimations below the correction are kept
        asserter.push_success(&U64::from(15_000));
        assert_eq!(
            estimator.estimate_internal_call_gas(&relay_request(U256::ZERO), None).await.unwrap(),
            U256::from(15_000)
        );

        asserter.push_success(&U64::from(50_000));
        assert_eq!(
            estimator
                .estimate_internal_call_gas(&relay_request(U256::ZERO), Some(0))
                .await
                .unwrap(),
            U256::from(50_000)
        );
    }

    #[tokio::test]
    async fn linear_fit_of_subsidized_request() {
        let (estimator, asserter) = estimator();
        // 58500 - 18500 = 40000 internal gas
        asserter.push_success(&U64::from(58_500));
        assert_eq!(
            estimator
                .linear_fit_max_possible_gas(&relay_request(U256::ZERO), None, 1.0)
                .await
                .unwrap(),
            U256::from(127_770)
        );
    }

    #[tokio::test]
    async fn linear_fit_rejects_deploy() {
        let (estimator, _asserter) = estimator();
        assert!(matches!(
            estimator
                .linear_fit_max_possible_gas(&deploy_request(U256::ZERO), None, 1.0)
                .await
                .unwrap_err(),
            EstimationError::UnsupportedForDeploy
        ));
    }

    #[tokio::test]
    async fn standard_adds_token_payment() {
        let (estimator, asserter) = estimator();
        // token transfer, then the hub call
        asserter.push_success(&U64::from(40_000));
        asserter.push_success(&U64::from(100_000));
        let gas = estimator
            .standard_max_possible_gas(
                &relay_request(U256::from(10)),
                Bytes::from([0u8; 65]),
                DEV_ADDRESS_1,
                None,
                1.5,
            )
            .await
            .unwrap();
        assert_eq!(gas, U256::from(182_250));
    }

    #[tokio::test]
    async fn reads_smart_wallet_address() {
        let (estimator, asserter) = estimator();
        asserter.push_success(&Bytes::from(DEV_ADDRESS_1.into_word()));
        assert_eq!(
            estimator
                .smart_wallet_address(DEV_ADDRESS_0, Address::ZERO, U256::ZERO)
                .await
                .unwrap(),
            DEV_ADDRESS_1
        );
    }
}
