use super::KnownRelaysManager;
use crate::{
    error::HttpError,
    http::RelayServerApi,
    types::{HubInfo, RelayInfo, RelayManagerData},
};
use alloy::primitives::{Address, U256};
use chrono::Utc;
use futures_util::{StreamExt, stream::FuturesUnordered};
use std::{collections::HashSet, sync::Arc};
use tracing::{debug, instrument};

/// Rejects ready relays that cannot serve a particular request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingFilter {
    /// The hub the relay must serve.
    pub relay_hub: Address,
    /// The gas price of the request.
    pub gas_price: U256,
}

impl PingFilter {
    /// Checks the answer of the relay at `url`.
    pub fn check(&self, url: &str, hub_info: &HubInfo) -> Result<(), HttpError> {
        if hub_info.min_gas_price > self.gas_price {
            return Err(HttpError::GasPriceTooLow {
                url: url.to_string(),
                min_gas_price: hub_info.min_gas_price,
                gas_price: self.gas_price,
            });
        }
        if hub_info.relay_hub_address != self.relay_hub {
            return Err(HttpError::WrongHub {
                url: url.to_string(),
                expected: self.relay_hub,
                got: hub_info.relay_hub_address,
            });
        }
        Ok(())
    }
}

/// Picks a relay that is ready to serve a request.
///
/// Candidates are pinged tier by tier in slices of
/// [`slice_size`](crate::config::EnvelopingConfig::slice_size) concurrent pings. The first ready
/// relay wins and the remaining pings of its slice are dropped. A candidate is pinged at most once
/// per selection.
#[derive(Debug)]
pub struct RelaySelectionManager {
    http: Arc<dyn RelayServerApi>,
    known_relays: Arc<KnownRelaysManager>,
    tiers: Vec<Vec<RelayManagerData>>,
    tried: HashSet<String>,
    slice_size: usize,
    filter: PingFilter,
    verifier: Option<Address>,
}

impl RelaySelectionManager {
    /// Snapshots the ranked candidates of `known_relays`.
    ///
    /// With `only_preferred`, discovered relays are not considered.
    pub async fn new(
        http: Arc<dyn RelayServerApi>,
        known_relays: Arc<KnownRelaysManager>,
        filter: PingFilter,
        verifier: Option<Address>,
        only_preferred: bool,
    ) -> Self {
        let [preferred, discovered] = known_relays.relays_sorted_for_transaction().await;
        let tiers = if only_preferred { vec![preferred] } else { vec![preferred, discovered] };
        let slice_size = known_relays.context().config().slice_size.max(1);

        Self { http, known_relays, tiers, tried: HashSet::new(), slice_size, filter, verifier }
    }

    /// Returns the next ready relay, or `None` once every candidate was tried.
    #[instrument(skip_all)]
    pub async fn select_next_relay(&mut self) -> Option<RelayInfo> {
        for tier in 0..self.tiers.len() {
            loop {
                let slice = self.tiers[tier]
                    .iter()
                    .filter(|relay| !self.tried.contains(&relay.url))
                    .take(self.slice_size)
                    .cloned()
                    .collect::<Vec<_>>();
                if slice.is_empty() {
                    break;
                }

                if let Some(relay) = self.race(slice).await {
                    debug!(url = %relay.manager_data.url, tier, "Selected relay");
                    return Some(relay);
                }
            }
        }

        debug!(tried = self.tried.len(), "No relay available");
        None
    }

    async fn race(&mut self, slice: Vec<RelayManagerData>) -> Option<RelayInfo> {
        self.tried.extend(slice.iter().map(|relay| relay.url.clone()));

        let http = &*self.http;
        let filter = &self.filter;
        let verifier = self.verifier;
        let mut pings = slice
            .into_iter()
            .map(|relay| async move {
                let result = ping(http, filter, &relay.url, verifier).await;
                (relay, result)
            })
            .collect::<FuturesUnordered<_>>();

        let mut failed = Vec::new();
        let mut winner = None;
        while let Some((relay, result)) = pings.next().await {
            match result {
                Ok(hub_info) => {
                    winner = Some(RelayInfo { hub_info, manager_data: relay });
                    break;
                }
                Err(failure) => {
                    debug!(url = %relay.url, err = %failure.error, "Relay ping failed");
                    let manager = failure.relay_manager.unwrap_or(relay.manager);
                    failed.push((manager, relay.url));
                }
            }
        }
        drop(pings);

        for (manager, url) in failed {
            self.known_relays.save_relay_failure(Utc::now(), manager, url).await;
        }

        winner
    }
}

/// A failed ping.
#[derive(Debug)]
struct PingFailure {
    error: HttpError,
    /// The manager the relay reported, if it answered.
    relay_manager: Option<Address>,
}

async fn ping(
    http: &dyn RelayServerApi,
    filter: &PingFilter,
    url: &str,
    verifier: Option<Address>,
) -> Result<HubInfo, PingFailure> {
    let hub_info = http
        .chain_info(url, verifier)
        .await
        .map_err(|error| PingFailure { error, relay_manager: None })?;

    let relay_manager = Some(hub_info.relay_manager_address);
    if !hub_info.ready {
        let error = HttpError::NotReady { url: url.to_string() };
        return Err(PingFailure { error, relay_manager });
    }
    filter.check(url, &hub_info).map_err(|error| PingFailure { error, relay_manager })?;
    Ok(hub_info)
}
