//! RPC error classification.

use alloy::transports::TransportError;

/// Extension trait for [`TransportError`].
pub trait TransportErrExt {
    /// Whether the node rejected a raw transaction because its pool already holds it.
    ///
    /// Relays broadcast the transactions they sign, so a rebroadcast by the client usually hits
    /// this.
    fn is_already_known(&self) -> bool;
}

impl TransportErrExt for TransportError {
    fn is_already_known(&self) -> bool {
        self.as_error_resp().is_some_and(|err| {
            let message = err.message.to_ascii_lowercase();
            message == "already known" || message.starts_with("known transaction")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::rpc::json_rpc::ErrorPayload;

    fn error(message: &str) -> TransportError {
        TransportError::ErrorResp(ErrorPayload {
            code: -32000,
            message: message.to_string().into(),
            data: None,
        })
    }

    #[test]
    fn detects_known_transactions() {
        assert!(error("already known").is_already_known());
        assert!(error("known transaction: 0x01").is_already_known());
        assert!(!error("nonce too low").is_already_known());
        assert!(!TransportError::local_usage_str("closed").is_already_known());
    }
}
