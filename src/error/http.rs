use thiserror::Error;

/// Errors talking to a relay server.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The request could not be sent or the response could not be read.
    #[error("request to {url} failed: {source}")]
    Transport {
        /// The requested URL.
        url: String,
        /// The underlying error.
        #[source]
        source: reqwest::Error,
    },
    /// The HTTP client could not be built.
    #[error("could not build http client: {0}")]
    Client(#[from] reqwest::Error),
    /// The relay URL could not be joined with an endpoint path.
    #[error("invalid relay url {0}")]
    InvalidUrl(String),
    /// The relay response could not be parsed.
    #[error("invalid response from relay {url}: {message}")]
    InvalidResponse {
        /// The relay URL.
        url: String,
        /// What failed to parse.
        message: String,
    },
    /// The relay answered with an error.
    #[error("relay {url} responded with error: {message}")]
    Relay {
        /// The relay URL.
        url: String,
        /// The reported error.
        message: String,
    },
    /// The relay is not ready to serve requests.
    #[error("relay {url} is not ready")]
    NotReady {
        /// The relay URL.
        url: String,
    },
    /// The relay does not accept the request's gas price.
    #[error("relay {url} requires gas price {min_gas_price}, request offers {gas_price}")]
    GasPriceTooLow {
        /// The relay URL.
        url: String,
        /// The relay's minimum.
        min_gas_price: alloy::primitives::U256,
        /// The request's gas price.
        gas_price: alloy::primitives::U256,
    },
    /// The relay serves a different hub.
    #[error("relay {url} serves hub {got}, expected {expected}")]
    WrongHub {
        /// The relay URL.
        url: String,
        /// The configured hub.
        expected: alloy::primitives::Address,
        /// The relay's hub.
        got: alloy::primitives::Address,
    },
}
