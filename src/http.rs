//! Relay server HTTP API.
use crate::{
    constants::{CHAIN_INFO_PATH, ESTIMATE_PATH, RELAY_PATH},
    error::HttpError,
    types::{
        EnvelopingTxRequest, HubInfo, RelayEstimation, RelayEstimationResponse,
        RelayServerResponse,
    },
};
use alloy::primitives::Address;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::{fmt::Debug, time::Duration};
use tracing::{debug, instrument};
use url::Url;

/// The endpoints a relay server exposes.
#[async_trait]
pub trait RelayServerApi: Debug + Send + Sync {
    /// Fetches the relay's hub info, optionally scoped to `verifier`.
    async fn chain_info(
        &self,
        url: &str,
        verifier: Option<Address>,
    ) -> Result<HubInfo, HttpError>;

    /// Submits a signed request for relaying.
    ///
    /// Fails with [`HttpError::Relay`] if the relay reports an error.
    async fn relay(
        &self,
        url: &str,
        request: &EnvelopingTxRequest,
    ) -> Result<RelayServerResponse, HttpError>;

    /// Asks the relay to estimate a signed request.
    async fn estimate(
        &self,
        url: &str,
        request: &EnvelopingTxRequest,
    ) -> Result<RelayEstimation, HttpError>;
}

/// [`RelayServerApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRelayClient {
    client: reqwest::Client,
}

impl HttpRelayClient {
    /// Creates a client whose calls time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, HttpError> {
        Ok(Self { client: reqwest::Client::builder().timeout(timeout).build()? })
    }

    async fn read<T: DeserializeOwned>(
        url: &str,
        response: reqwest::Response,
    ) -> Result<T, HttpError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| HttpError::Transport { url: url.to_string(), source })?;

        serde_json::from_str(&body).map_err(|err| {
            if status.is_success() {
                HttpError::InvalidResponse { url: url.to_string(), message: err.to_string() }
            } else {
                HttpError::Relay { url: url.to_string(), message: format!("{status}: {body}") }
            }
        })
    }
}

#[async_trait]
impl RelayServerApi for HttpRelayClient {
    #[instrument(skip(self))]
    async fn chain_info(
        &self,
        url: &str,
        verifier: Option<Address>,
    ) -> Result<HubInfo, HttpError> {
        let mut endpoint = endpoint(url, CHAIN_INFO_PATH)?;
        if let Some(verifier) = verifier {
            endpoint.query_pairs_mut().append_pair("verifier", &verifier.to_string());
        }

        let response = self
            .client
            .get(endpoint)
            .send()
            .await
            .map_err(|source| HttpError::Transport { url: url.to_string(), source })?;

        Self::read(url, response).await
    }

    #[instrument(skip_all, fields(%url))]
    async fn relay(
        &self,
        url: &str,
        request: &EnvelopingTxRequest,
    ) -> Result<RelayServerResponse, HttpError> {
        let response = self
            .client
            .post(endpoint(url, RELAY_PATH)?)
            .json(request)
            .send()
            .await
            .map_err(|source| HttpError::Transport { url: url.to_string(), source })?;

        let response: RelayServerResponse = Self::read(url, response).await?;
        if let Some(message) = response.error {
            return Err(HttpError::Relay { url: url.to_string(), message });
        }

        debug!(tx_hash = ?response.transaction_hash, "Relay accepted request");
        Ok(response)
    }

    #[instrument(skip_all, fields(%url))]
    async fn estimate(
        &self,
        url: &str,
        request: &EnvelopingTxRequest,
    ) -> Result<RelayEstimation, HttpError> {
        let response = self
            .client
            .post(endpoint(url, ESTIMATE_PATH)?)
            .json(request)
            .send()
            .await
            .map_err(|source| HttpError::Transport { url: url.to_string(), source })?;

        match Self::read(url, response).await? {
            RelayEstimationResponse::Estimation(estimation) => Ok(estimation),
            RelayEstimationResponse::Error { error } => {
                Err(HttpError::Relay { url: url.to_string(), message: error })
            }
        }
    }
}

/// Appends `path` to the relay base URL, keeping any path the base already has.
pub fn endpoint(url: &str, path: &str) -> Result<Url, HttpError> {
    let mut base = Url::parse(url).map_err(|_| HttpError::InvalidUrl(url.to_string()))?;
    if !base.path().ends_with('/') {
        base.set_path(&format!("{}/", base.path()));
    }
    base.join(path).map_err(|_| HttpError::InvalidUrl(url.to_string()))
}
