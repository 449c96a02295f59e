//! Per-purchase pipeline: prompt, image, pin image, metadata, pin metadata.

use std::sync::Arc;

use donkeys_core::config::{ImageSize, WorkerConfig};
use donkeys_core::error::CoreError;
use donkeys_core::metadata::{MetadataBuilder, NftMetadata};
use donkeys_core::prompt::PromptResolver;
use donkeys_core::retry::RetryPolicy;
use donkeys_core::services::{ContentPublisher, ImageGenerator};
use donkeys_core::types::{PublishedImage, Purchase, PurchaseId};

use crate::retry::with_retry;

/// Everything produced for one successfully processed purchase.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub prompt: String,
    /// Short-lived URL returned by the image service.
    pub transient_url: String,
    pub image: PublishedImage,
    pub metadata: NftMetadata,
    /// Gateway URL of the pinned metadata; becomes the token URI.
    pub metadata_url: String,
}

/// Result of processing one purchase.
#[derive(Debug)]
pub struct PurchaseOutcome {
    pub id: PurchaseId,
    pub result: Result<GenerationResult, CoreError>,
}

impl PurchaseOutcome {
    /// Token URI if the purchase is ready to mint.
    pub fn token_uri(&self) -> Option<String> {
        self.result.as_ref().ok().map(|r| r.metadata_url.clone())
    }
}

/// Runs the publishing steps for a single purchase.
pub struct PurchaseProcessor {
    prompts: PromptResolver,
    metadata: MetadataBuilder,
    images: Arc<dyn ImageGenerator>,
    publisher: Arc<dyn ContentPublisher>,
    size: ImageSize,
    retry: RetryPolicy,
}

impl PurchaseProcessor {
    pub fn new(
        config: &WorkerConfig,
        images: Arc<dyn ImageGenerator>,
        publisher: Arc<dyn ContentPublisher>,
    ) -> Self {
        Self {
            prompts: PromptResolver::new(config),
            metadata: MetadataBuilder::new(config),
            images,
            publisher,
            size: config.img,
            retry: config.worker.retry.policy(),
        }
    }

    /// Process `purchase`. Never panics or short-circuits the caller; the
    /// failure, if any, is carried in the outcome.
    pub async fn process(&self, purchase: &Purchase) -> PurchaseOutcome {
        let result = self.run(purchase).await;
        match &result {
            Ok(generated) => tracing::info!(
                purchase_id = purchase.id,
                metadata_url = %generated.metadata_url,
                "Purchase ready to mint",
            ),
            Err(e) => tracing::error!(
                purchase_id = purchase.id,
                error = %e,
                "Purchase processing failed",
            ),
        }
        PurchaseOutcome {
            id: purchase.id,
            result,
        }
    }

    async fn run(&self, purchase: &Purchase) -> Result<GenerationResult, CoreError> {
        let id = purchase.id;

        let prompt = self.prompts.resolve(purchase)?;
        tracing::debug!(purchase_id = id, reward = %purchase.reward, prompt = %prompt, "Prompt resolved");

        let transient_url = with_retry(&self.retry, "generate_image", id, || {
            self.images.generate_image(&prompt, self.size)
        })
        .await?;
        tracing::debug!(purchase_id = id, "Image generated");

        let image = with_retry(&self.retry, "publish_image", id, || {
            self.publisher.publish_image(&transient_url)
        })
        .await?;
        tracing::info!(purchase_id = id, cid = %image.content_id, "Image pinned");

        let metadata = self
            .metadata
            .build(purchase, &image.native_url, &image.gateway_url)?;
        let document = serde_json::to_value(&metadata)
            .map_err(|e| CoreError::PinningFailed(format!("cannot serialize metadata: {e}")))?;

        let metadata_url = with_retry(&self.retry, "publish_metadata", id, || {
            self.publisher.publish_json(&document)
        })
        .await?;

        Ok(GenerationResult {
            prompt,
            transient_url,
            image,
            metadata,
            metadata_url,
        })
    }
}
