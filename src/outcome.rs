//! Classification of relayed transaction receipts.
use crate::types::{IRelayHub, ISmartWalletFactory};
use alloy::{
    primitives::{Address, Bytes},
    rpc::types::{Log, TransactionReceipt},
    sol_types::decode_revert_reason,
};
use std::fmt;

/// What a relayed transaction did on chain, according to its logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The receipt has no logs, the transaction may not be an enveloping one.
    Ambiguous,
    /// The request was relayed and the destination call succeeded.
    Relayed,
    /// A smart wallet was deployed.
    Deployed {
        /// The deployed smart wallet.
        address: Address,
    },
    /// The request was relayed but the destination call reverted.
    RevertedByRecipient {
        /// The decoded revert reason, or the raw revert data as hex.
        reason: String,
    },
    /// No known event was emitted, the transaction may not be an enveloping one.
    Unrecognized,
}

impl RelayOutcome {
    /// Classifies a receipt.
    pub fn from_receipt(receipt: &TransactionReceipt) -> Self {
        Self::from_logs(receipt.inner.logs())
    }

    /// Classifies the logs of a receipt.
    pub fn from_logs(logs: &[Log]) -> Self {
        if logs.is_empty() {
            return Self::Ambiguous;
        }

        let mut outcome = Self::Unrecognized;
        for log in logs {
            if let Ok(event) =
                log.log_decode::<IRelayHub::TransactionRelayedButRevertedByRecipient>()
            {
                let reason = revert_reason(&event.inner.data.reason);
                return Self::RevertedByRecipient { reason };
            }
            if log.log_decode::<IRelayHub::TransactionRelayed>().is_ok() {
                outcome = Self::Relayed;
            } else if let Ok(event) = log.log_decode::<ISmartWalletFactory::Deployed>() {
                if outcome == Self::Unrecognized {
                    outcome = Self::Deployed { address: event.inner.data.addr };
                }
            }
        }
        outcome
    }

    /// Whether the relayed call succeeded.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Relayed | Self::Deployed { .. })
    }
}

impl fmt::Display for RelayOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ambiguous => f.write_str("no logs, possibly not an enveloping transaction"),
            Self::Relayed => f.write_str("relayed"),
            Self::Deployed { address } => write!(f, "deployed smart wallet {address}"),
            Self::RevertedByRecipient { reason } => write!(f, "reverted by recipient: {reason}"),
            Self::Unrecognized => {
                f.write_str("no enveloping event, possibly not an enveloping transaction")
            }
        }
    }
}

fn revert_reason(reason: &Bytes) -> String {
    decode_revert_reason(reason).unwrap_or_else(|| reason.to_string())
}
