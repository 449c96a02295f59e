//! ERC-721 token metadata documents.
//!
//! [`MetadataBuilder::build`] is pure: the same purchase and image URLs
//! always serialize to byte-identical JSON. Keys follow struct declaration
//! order, including after a round trip through `serde_json::Value` (the
//! workspace enables `preserve_order`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::WorkerConfig;
use crate::error::CoreError;
use crate::types::{Purchase, PurchaseId, Reward};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const TRAIT_ERA: &str = "Era";
pub const TRAIT_REWARD: &str = "Reward";

pub const NAME_KING: &str = "His Majesty the King";
pub const NAME_QUEEN: &str = "Her Majesty the Queen";
pub const NAME_KNIGHT: &str = "Protector of the Kingdom";

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Top-level token metadata as pinned to IPFS.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NftMetadata {
    pub name: String,
    pub description: String,
    /// Content-addressed image URL (`ipfs://...`).
    pub image: String,
    /// HTTP gateway URL of the same image.
    pub external_url: String,
    pub attributes: Vec<Attribute>,
    #[serde(rename = "purchaseInfo")]
    pub purchase_info: PurchaseInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attribute {
    pub trait_type: String,
    pub value: String,
}

/// Echo of the purchase for downstream auditing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseInfo {
    pub id: PurchaseId,
    pub telegram_id: String,
    pub purchase_price: String,
    pub era_id: String,
    pub purchaser: String,
    pub reward: String,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builds metadata documents from the configured era descriptions.
#[derive(Debug, Clone)]
pub struct MetadataBuilder {
    descriptions: BTreeMap<String, String>,
}

impl MetadataBuilder {
    pub fn new(config: &WorkerConfig) -> Self {
        Self {
            descriptions: config.description_for_era.clone(),
        }
    }

    /// Assemble the metadata for `purchase`.
    ///
    /// Fails with [`CoreError::MissingDescription`] if the era has no
    /// configured description.
    pub fn build(
        &self,
        purchase: &Purchase,
        image_native_url: &str,
        image_gateway_url: &str,
    ) -> Result<NftMetadata, CoreError> {
        let prefix = self
            .descriptions
            .get(&purchase.era_key())
            .ok_or(CoreError::MissingDescription {
                era_id: purchase.era_id,
            })?;

        let era = purchase.era_key();
        let reward = purchase.reward.name();

        Ok(NftMetadata {
            name: nft_name(purchase),
            description: format!("{prefix}{}", purchase.text),
            image: image_native_url.to_string(),
            external_url: image_gateway_url.to_string(),
            attributes: vec![
                Attribute {
                    trait_type: TRAIT_ERA.to_string(),
                    value: era.clone(),
                },
                Attribute {
                    trait_type: TRAIT_REWARD.to_string(),
                    value: reward.clone(),
                },
            ],
            purchase_info: PurchaseInfo {
                id: purchase.id,
                telegram_id: purchase.telegram_id.clone(),
                purchase_price: purchase.purchase_price.clone(),
                era_id: era,
                purchaser: purchase.purchaser.clone(),
                reward,
            },
        })
    }
}

/// Display name of the token.
///
/// Regular purchases are named after the purchaser; reward tokens carry a
/// fixed title.
pub fn nft_name(purchase: &Purchase) -> String {
    match purchase.reward {
        Reward::King => NAME_KING.to_string(),
        Reward::Queen => NAME_QUEEN.to_string(),
        Reward::Knight => NAME_KNIGHT.to_string(),
        Reward::None | Reward::Unknown(_) => format!("AI Donkey By #{}", purchase.purchaser),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
