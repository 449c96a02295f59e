//! Service seams of the fulfillment pipeline.
//!
//! The pipeline is generic over these traits. Production implementations
//! live in the adapter crates (`donkeys-chain`, `donkeys-imagegen`,
//! `donkeys-pinning`); tests substitute in-memory fakes. Implementations
//! report failures as [`CoreError`] so the pipeline can classify them.

use crate::batch::MintRun;
use crate::config::ImageSize;
use crate::error::CoreError;
use crate::types::{MintReceipt, Purchase, PublishedImage};

/// Reads pending purchases from the on-chain ledger.
#[async_trait::async_trait]
pub trait PurchaseReader: Send + Sync {
    /// Current ordered list of pending purchases on `network`.
    async fn list_purchases(&self, network: &str) -> Result<Vec<Purchase>, CoreError>;
}

/// Submits batch mint transactions.
#[async_trait::async_trait]
pub trait BatchMinter: Send + Sync {
    /// Mint every purchase in `run` in one transaction and wait for it to
    /// be included in a block.
    async fn mint_batch(&self, network: &str, run: &MintRun) -> Result<MintReceipt, CoreError>;
}

/// Produces an image for a prompt.
#[async_trait::async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Returns a short-lived URL of the generated image.
    async fn generate_image(&self, prompt: &str, size: ImageSize) -> Result<String, CoreError>;
}

/// Persists content to content-addressed storage.
#[async_trait::async_trait]
pub trait ContentPublisher: Send + Sync {
    /// Download the image at `transient_url` and pin it.
    async fn publish_image(&self, transient_url: &str) -> Result<PublishedImage, CoreError>;

    /// Pin a JSON document and return its gateway URL.
    async fn publish_json(&self, document: &serde_json::Value) -> Result<String, CoreError>;
}
