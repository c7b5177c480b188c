//! Relay ranking hooks.
use crate::{
    constants::SCORE_DECAY_BASE,
    types::{RelayFailureInfo, RelayManagerData},
};
use async_trait::async_trait;
use std::fmt::Debug;

/// Scores discovered relays. Higher scores are tried first.
#[async_trait]
pub trait ScoreCalculator: Debug + Send + Sync {
    /// Scores `relay` given its recent `failures`.
    async fn score(&self, relay: &RelayManagerData, failures: &[RelayFailureInfo]) -> f64;
}

/// Scores a relay `0.9^failures`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultScoreCalculator;

#[async_trait]
impl ScoreCalculator for DefaultScoreCalculator {
    async fn score(&self, _relay: &RelayManagerData, failures: &[RelayFailureInfo]) -> f64 {
        SCORE_DECAY_BASE.powi(failures.len().min(i32::MAX as usize) as i32)
    }
}

/// Decides which discovered relays are candidates at all.
pub trait RelayFilter: Debug + Send + Sync {
    /// Whether `relay` may be used.
    fn accept(&self, relay: &RelayManagerData) -> bool;
}

/// Accepts every relay.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl RelayFilter for AcceptAll {
    fn accept(&self, _relay: &RelayManagerData) -> bool {
        true
    }
}
