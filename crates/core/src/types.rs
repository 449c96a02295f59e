use std::fmt;

use serde::{Deserialize, Serialize};

/// Purchase ids are assigned by the on-chain ledger (`uint64`).
pub type PurchaseId = u64;

/// Era ids are `uint64` on chain; config maps key them by decimal string.
pub type EraId = u64;

// ---------------------------------------------------------------------------
// Reward
// ---------------------------------------------------------------------------

/// Reward designation attached to a purchase by the contract's reward logic.
///
/// Mirrors the on-chain `uint8` enum. Discriminants the worker does not
/// know are preserved as [`Reward::Unknown`] so they can be rejected
/// downstream instead of being silently coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reward {
    None,
    King,
    Queen,
    Knight,
    Unknown(u8),
}

impl Reward {
    /// Decode the on-chain discriminant.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::None,
            1 => Self::King,
            2 => Self::Queen,
            3 => Self::Knight,
            other => Self::Unknown(other),
        }
    }

    /// Enumeration name as rendered in NFT metadata.
    pub fn name(self) -> String {
        match self {
            Self::None => "NONE".to_string(),
            Self::King => "KING".to_string(),
            Self::Queen => "QUEEN".to_string(),
            Self::Knight => "KNIGHT".to_string(),
            Self::Unknown(v) => format!("UNKNOWN({v})"),
        }
    }

    pub fn is_none(self) -> bool {
        self == Self::None
    }
}

impl fmt::Display for Reward {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

// ---------------------------------------------------------------------------
// Purchase
// ---------------------------------------------------------------------------

/// A pending purchase as reported by `listPurchases()`.
///
/// The chain is the source of truth; the worker never mutates these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    pub id: PurchaseId,
    /// Free-form description written by the purchaser.
    pub text: String,
    /// Contact handle; empty when the purchaser left none.
    pub telegram_id: String,
    /// Price paid in wei, as a decimal string (`uint256`).
    pub purchase_price: String,
    pub era_id: EraId,
    /// Checksummed `0x` address of the payer.
    pub purchaser: String,
    pub reward: Reward,
}

impl Purchase {
    /// Key used to look the era up in the configuration maps.
    pub fn era_key(&self) -> String {
        self.era_id.to_string()
    }
}

// ---------------------------------------------------------------------------
// Published content references
// ---------------------------------------------------------------------------

/// Result of pinning an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedImage {
    /// Content identifier returned by the pinning service.
    pub content_id: String,
    /// `ipfs://<cid>`
    pub native_url: String,
    /// `https://<gateway>/ipfs/<cid>`
    pub gateway_url: String,
}

/// Confirmation of a landed mint transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintReceipt {
    pub tx_hash: String,
    pub block_number: Option<u64>,
}
