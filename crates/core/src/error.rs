//! Error taxonomy shared across the worker.
//!
//! Variants fall into three classes:
//!
//! - **configuration**: fatal, never retried ([`CoreError::Configuration`],
//!   [`CoreError::MissingTemplate`], [`CoreError::MissingDescription`],
//!   [`CoreError::InvalidReward`]);
//! - **transient external**: recoverable per purchase
//!   ([`CoreError::NetworkUnavailable`], [`CoreError::GenerationFailed`],
//!   [`CoreError::DownloadFailed`], [`CoreError::PinningFailed`]);
//! - **chain write**: a batch mint that did not land
//!   ([`CoreError::TransactionRejected`], [`CoreError::TransactionTimeout`]).
//!
//! [`CoreError::GenerationRejected`] belongs to none of them: it is not
//! retried within a cycle but still counts as a failed attempt.

use crate::types::Reward;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Invalid or incomplete configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No prompt template is configured for the purchase's era.
    #[error("Prompt template for era {era_id} not found")]
    MissingTemplate { era_id: u64 },

    /// No description is configured for the purchase's era.
    #[error("Description for era {era_id} not found")]
    MissingDescription { era_id: u64 },

    /// The reward variant has no special prompt.
    #[error("Invalid reward: {0}")]
    InvalidReward(Reward),

    /// The RPC endpoint could not be reached or the read call failed.
    #[error("Network {network} unavailable: {message}")]
    NetworkUnavailable { network: String, message: String },

    /// The image service returned no usable image.
    #[error("Image generation failed: {0}")]
    GenerationFailed(String),

    /// The image service refused the request; repeating it unchanged will
    /// not help.
    #[error("Image generation rejected: {0}")]
    GenerationRejected(String),

    /// The transient image could not be downloaded.
    #[error("Image download failed: {0}")]
    DownloadFailed(String),

    /// The pinning service rejected or failed the upload.
    #[error("Pinning failed: {0}")]
    PinningFailed(String),

    /// The mint transaction reverted or was dropped.
    #[error("Transaction rejected: {0}")]
    TransactionRejected(String),

    /// The mint transaction was not confirmed in time.
    #[error("Transaction {tx_hash} not confirmed within {timeout_secs}s")]
    TransactionTimeout { tx_hash: String, timeout_secs: u64 },
}

impl CoreError {
    /// Whether retrying the same call can reasonably succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NetworkUnavailable { .. }
                | Self::GenerationFailed(_)
                | Self::DownloadFailed(_)
                | Self::PinningFailed(_)
        )
    }

    /// Whether the error stems from configuration rather than the outside
    /// world.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::MissingTemplate { .. }
                | Self::MissingDescription { .. }
                | Self::InvalidReward(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(CoreError::GenerationFailed("empty".into()).is_transient());
        assert!(CoreError::DownloadFailed("404".into()).is_transient());
        assert!(CoreError::PinningFailed("401".into()).is_transient());
        assert!(CoreError::NetworkUnavailable {
            network: "sepolia".into(),
            message: "refused".into(),
        }
        .is_transient());
    }

    #[test]
    fn configuration_errors_are_not_transient() {
        let err = CoreError::MissingTemplate { era_id: 3 };
        assert!(err.is_configuration());
        assert!(!err.is_transient());
        assert!(CoreError::InvalidReward(Reward::None).is_configuration());
    }

    #[test]
    fn rejected_generation_is_not_retried() {
        let err = CoreError::GenerationRejected("content_policy_violation".into());
        assert!(!err.is_transient());
        assert!(!err.is_configuration());
    }

    #[test]
    fn chain_write_errors_are_neither() {
        let err = CoreError::TransactionTimeout {
            tx_hash: "0xabc".into(),
            timeout_secs: 300,
        };
        assert!(!err.is_transient());
        assert!(!err.is_configuration());
    }

    #[test]
    fn display_messages() {
        assert_eq!(
            CoreError::MissingTemplate { era_id: 2 }.to_string(),
            "Prompt template for era 2 not found"
        );
        assert_eq!(
            CoreError::InvalidReward(Reward::Unknown(9)).to_string(),
            "Invalid reward: UNKNOWN(9)"
        );
    }
}
