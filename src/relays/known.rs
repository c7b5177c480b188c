use super::{AcceptAll, DefaultScoreCalculator, RelayFilter, ScoreCalculator};
use crate::{
    context::EnvelopingContext,
    error::EnvelopingError,
    types::{IRelayHub, RelayFailureInfo, RelayManagerData},
};
use alloy::{
    primitives::Address,
    providers::Provider,
    rpc::types::Filter,
    sol_types::SolEvent,
};
use chrono::{DateTime, TimeDelta, Utc};
use std::{collections::HashSet, sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

#[derive(Debug, Default)]
struct KnownRelays {
    /// Relays discovered from hub registrations, in discovery order.
    discovered: Vec<RelayManagerData>,
    /// Failures not yet evicted.
    failures: Vec<RelayFailureInfo>,
}

/// Keeps the relays a request may be sent to.
///
/// Candidates come in two tiers: the configured relays, always in configured order, and the
/// relays registered in the hub, ranked by the [`ScoreCalculator`].
#[derive(Debug)]
pub struct KnownRelaysManager {
    context: EnvelopingContext,
    score_calculator: Arc<dyn ScoreCalculator>,
    filter: Arc<dyn RelayFilter>,
    state: RwLock<KnownRelays>,
}

impl KnownRelaysManager {
    /// Creates a manager with the default score and no filter.
    pub fn new(context: EnvelopingContext) -> Self {
        Self {
            context,
            score_calculator: Arc::new(DefaultScoreCalculator),
            filter: Arc::new(AcceptAll),
            state: Default::default(),
        }
    }

    /// Returns the context.
    pub const fn context(&self) -> &EnvelopingContext {
        &self.context
    }

    /// Sets the score calculator.
    pub fn with_score_calculator(mut self, calculator: impl ScoreCalculator + 'static) -> Self {
        self.score_calculator = Arc::new(calculator);
        self
    }

    /// Sets the relay filter.
    pub fn with_filter(mut self, filter: impl RelayFilter + 'static) -> Self {
        self.filter = Arc::new(filter);
        self
    }

    /// Evicts stale failures and rediscovers the relays registered in the hub.
    #[instrument(skip_all)]
    pub async fn refresh(&self) -> Result<(), EnvelopingError> {
        let config = self.context.config();

        {
            let mut state = self.state.write().await;
            evict_stale_failures(&mut state.failures, Utc::now(), config.relay_timeout_grace);
        }

        let hub = config.relay_hub_address;
        if hub.is_zero() {
            warn!("No relay hub configured, skipping relay discovery");
            return Ok(());
        }

        let provider = self.context.provider();
        let latest = provider.get_block_number().await?;
        let from = latest.saturating_sub(config.relay_lookup_window_blocks);

        let mut managers = Vec::new();
        let mut seen = HashSet::new();
        for (from_block, to_block) in split_range(from, latest, config.relay_lookup_window_parts) {
            let filter = Filter::new()
                .address(hub)
                .event_signature(IRelayHub::RelayServerRegistered::SIGNATURE_HASH)
                .from_block(from_block)
                .to_block(to_block);

            for log in provider.get_logs(&filter).await? {
                let Ok(event) = log.log_decode::<IRelayHub::RelayServerRegistered>() else {
                    debug!(?log, "Skipping undecodable registration");
                    continue;
                };
                let manager = event.inner.data.relayManager;
                if seen.insert(manager) {
                    managers.push(manager);
                }
            }
        }

        let contract = IRelayHub::new(hub, provider);
        let mut discovered = Vec::with_capacity(managers.len());
        for manager in managers {
            let relay = RelayManagerData::from(contract.getRelayInfo(manager).call().await?);
            if relay.is_active() && self.filter.accept(&relay) {
                discovered.push(relay);
            }
        }

        debug!(from, latest, relays = discovered.len(), "Refreshed known relays");
        self.state.write().await.discovered = discovered;

        Ok(())
    }

    /// Records a failed interaction with a relay.
    ///
    /// Stale failures are only evicted by the next [`refresh`](Self::refresh).
    pub async fn save_relay_failure(
        &self,
        last_error_time: DateTime<Utc>,
        relay_manager: Address,
        relay_url: impl Into<String>,
    ) {
        let failure =
            RelayFailureInfo { last_error_time, relay_manager, relay_url: relay_url.into() };
        debug!(?failure, "Saving relay failure");
        self.state.write().await.failures.push(failure);
    }

    /// Returns the failures recorded for the relay at `relay_url`.
    pub async fn failures(&self, relay_url: &str) -> Vec<RelayFailureInfo> {
        self.state
            .read()
            .await
            .failures
            .iter()
            .filter(|failure| failure.relay_url == relay_url)
            .cloned()
            .collect()
    }

    /// Returns the configured relays.
    pub fn preferred_relays(&self) -> Vec<RelayManagerData> {
        self.context
            .config()
            .preferred_relays
            .iter()
            .map(|url| RelayManagerData::preferred(url.as_str()))
            .collect()
    }

    /// Returns both candidate tiers: the configured relays, then the discovered ones sorted by
    /// descending score.
    pub async fn relays_sorted_for_transaction(&self) -> [Vec<RelayManagerData>; 2] {
        let state = self.state.read().await;

        let mut scored = Vec::with_capacity(state.discovered.len());
        for relay in &state.discovered {
            let failures = state
                .failures
                .iter()
                .filter(|failure| failure.relay_manager == relay.manager)
                .cloned()
                .collect::<Vec<_>>();
            let score = self.score_calculator.score(relay, &failures).await;
            scored.push((score, relay.clone()));
        }
        drop(state);

        scored.sort_by(|(a, _), (b, _)| b.total_cmp(a));

        [self.preferred_relays(), scored.into_iter().map(|(_, relay)| relay).collect()]
    }
}

/// Drops failures older than `grace`.
fn evict_stale_failures(
    failures: &mut Vec<RelayFailureInfo>,
    now: DateTime<Utc>,
    grace: Duration,
) {
    let cutoff = TimeDelta::from_std(grace).ok().and_then(|grace| now.checked_sub_signed(grace));
    if let Some(cutoff) = cutoff {
        failures.retain(|failure| failure.last_error_time > cutoff);
    }
}

/// Splits the inclusive block range `[from, to]` into at most `parts` consecutive ranges.
fn split_range(from: u64, to: u64, parts: u64) -> Vec<(u64, u64)> {
    if from > to {
        return Vec::new();
    }

    let total = to - from + 1;
    let size = total.div_ceil(parts.clamp(1, total));

    let mut ranges = Vec::new();
    let mut start = from;
    loop {
        let end = start.saturating_add(size - 1).min(to);
        ranges.push((start, end));
        if end == to {
            break ranges;
        }
        start = end + 1;
    }
}
