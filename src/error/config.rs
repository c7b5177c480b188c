use alloy::primitives::Address;
use thiserror::Error;

/// Errors detected before any network access.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required request field is not set.
    #[error("field `{0}` is not defined in the request")]
    MissingField(&'static str),
    /// No verifier was set in the request and none is configured.
    #[error("no {kind} verifier configured and none set in the request")]
    MissingVerifier {
        /// `relay` or `deploy`.
        kind: &'static str,
    },
    /// No relay URL is configured.
    #[error("no relay url configured")]
    MissingRelayUrl,
    /// The resolved gas price is zero.
    #[error("could not resolve a gas price")]
    ZeroGasPrice,
    /// A relay request resolved to a zero gas limit.
    #[error("gas limit value (`gas`) is required in a relay request")]
    ZeroGasLimit,
    /// `callForwarder` or `callVerifier` is the zero address.
    #[error("`{0}` must not be the zero address")]
    ZeroAddress(&'static str),
    /// The request names a relay hub other than the configured one.
    #[error("request relay hub {got} differs from the configured relay hub {expected}")]
    RelayHubMismatch {
        /// The configured hub.
        expected: Address,
        /// The hub named by the request.
        got: Address,
    },
    /// The request asked not to use enveloping.
    #[error("enveloping is disabled for this request")]
    EnvelopingDisabled,
    /// The configuration file could not be read or parsed.
    #[error("invalid configuration file: {0}")]
    File(String),
}
