use donkeys_core::error::CoreError;

/// Errors from the chain access layer.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// Bad RPC URL, contract address or signing key.
    #[error("Invalid chain configuration: {0}")]
    Config(String),

    /// The RPC endpoint failed a read or setup call.
    #[error("RPC call on {network} failed: {message}")]
    Rpc { network: String, message: String },

    /// The node refused to accept the transaction.
    #[error("Transaction submission failed: {0}")]
    Submit(String),

    /// The transaction was mined with status 0.
    #[error("Transaction {0} reverted")]
    Reverted(String),

    /// The transaction disappeared from the mempool.
    #[error("Transaction {0} was dropped")]
    Dropped(String),

    /// No receipt arrived within the confirmation bound.
    #[error("Transaction {tx_hash} not confirmed within {timeout_secs}s")]
    Timeout { tx_hash: String, timeout_secs: u64 },
}

impl From<ChainError> for CoreError {
    fn from(e: ChainError) -> Self {
        match e {
            ChainError::Config(msg) => CoreError::Configuration(msg),
            ChainError::Rpc { network, message } => {
                CoreError::NetworkUnavailable { network, message }
            }
            ChainError::Timeout {
                tx_hash,
                timeout_secs,
            } => CoreError::TransactionTimeout {
                tx_hash,
                timeout_secs,
            },
            other @ (ChainError::Submit(_) | ChainError::Reverted(_) | ChainError::Dropped(_)) => {
                CoreError::TransactionRejected(other.to_string())
            }
        }
    }
}
