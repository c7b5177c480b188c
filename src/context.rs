//! Shared client context.
use crate::{config::EnvelopingConfig, eip712::TypedRequestBuilder};
use alloy::providers::DynProvider;
use std::sync::Arc;

/// Provider and configuration handed to every component.
#[derive(Debug, Clone)]
pub struct EnvelopingContext {
    provider: DynProvider,
    config: Arc<EnvelopingConfig>,
}

impl EnvelopingContext {
    /// Creates a new context.
    pub fn new(provider: DynProvider, config: EnvelopingConfig) -> Self {
        Self { provider, config: Arc::new(config) }
    }

    /// Returns the provider.
    pub const fn provider(&self) -> &DynProvider {
        &self.provider
    }

    /// Returns the configuration.
    pub fn config(&self) -> &EnvelopingConfig {
        &self.config
    }

    /// Returns a typed data builder for the configured chain.
    pub fn typed_request_builder(&self) -> TypedRequestBuilder {
        TypedRequestBuilder::new(self.config.chain_id)
    }
}
