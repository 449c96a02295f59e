//! In-memory fakes of the service traits.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use donkeys_core::batch::MintRun;
use donkeys_core::config::{ImageSize, WorkerConfig};
use donkeys_core::error::CoreError;
use donkeys_core::services::{BatchMinter, ContentPublisher, ImageGenerator, PurchaseReader};
use donkeys_core::types::{MintReceipt, PublishedImage, Purchase, PurchaseId, Reward};
use donkeys_pipeline::Services;
use tokio_util::sync::CancellationToken;

/// Prompts containing this marker make the fake image service fail.
pub const FAIL_MARKER: &str = "FAIL";

/// Config for two networks with instant retries and no waits.
pub fn test_config() -> serde_json::Value {
    serde_json::json!({
        "providers": { "sepolia": "http://localhost:8545", "base": "http://localhost:8546" },
        "contract": {
            "sepolia": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
            "base": "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512"
        },
        "execution": ["sepolia", "base"],
        "api": { "openai": "sk-test", "pinata_key": "pk", "pinata_secret": "ps" },
        "promptTemplateForEra": { "1": "Era1: <<>>" },
        "descriptionForEra": { "1": "Era1 description: " },
        "specialPrompts": {
            "king": "A royal donkey king",
            "queen": "A royal donkey queen",
            "knight": "A donkey knight"
        },
        "img": { "width": 512, "height": 512 },
        "worker": {
            "batch_size": 20,
            "poll_interval_secs": 0,
            "idle_wait_secs": 0,
            "max_attempts": 2,
            "retry": { "attempts": 1, "initial_delay_ms": 0, "max_delay_ms": 0 }
        }
    })
}

pub fn config_from(json: serde_json::Value) -> WorkerConfig {
    WorkerConfig::from_json(&json.to_string()).unwrap()
}

pub fn purchase(id: PurchaseId, text: &str) -> Purchase {
    Purchase {
        id,
        text: text.to_string(),
        telegram_id: format!("@buyer{id}"),
        purchase_price: "1000000000000000000".into(),
        era_id: 1,
        purchaser: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".into(),
        reward: Reward::None,
    }
}

/// `count` ordinary purchases with ids `0..count`.
pub fn purchases(count: u64) -> Vec<Purchase> {
    (0..count).map(|id| purchase(id, &format!("donkey {id}"))).collect()
}

/// Metadata URL the fake publisher returns for a purchase.
pub fn metadata_url(id: PurchaseId) -> String {
    format!("https://gateway.test/ipfs/QmMeta{id}")
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeReader {
    purchases: Mutex<HashMap<String, Vec<Purchase>>>,
    /// Networks whose RPC endpoint is unreachable.
    unreachable: Mutex<HashSet<String>>,
    pub calls: AtomicUsize,
}

impl FakeReader {
    pub fn with(network: &str, purchases: Vec<Purchase>) -> Self {
        let reader = Self::default();
        reader.set(network, purchases);
        reader
    }

    pub fn set(&self, network: &str, purchases: Vec<Purchase>) {
        self.purchases
            .lock()
            .unwrap()
            .insert(network.to_string(), purchases);
    }

    pub fn make_unreachable(&self, network: &str) {
        self.unreachable
            .lock()
            .unwrap()
            .insert(network.to_string());
    }
}

#[async_trait::async_trait]
impl PurchaseReader for FakeReader {
    async fn list_purchases(&self, network: &str) -> Result<Vec<Purchase>, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable.lock().unwrap().contains(network) {
            return Err(CoreError::NetworkUnavailable {
                network: network.to_string(),
                message: "connection refused".into(),
            });
        }
        Ok(self
            .purchases
            .lock()
            .unwrap()
            .get(network)
            .cloned()
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Minter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintCall {
    pub network: String,
    pub from: PurchaseId,
    pub to: PurchaseId,
    pub token_uris: Vec<String>,
}

/// Records mint calls instead of sending transactions.
#[derive(Default)]
pub struct RecordingMinter {
    pub calls: Mutex<Vec<MintCall>>,
    pub reject: bool,
}

impl RecordingMinter {
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<MintCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl BatchMinter for RecordingMinter {
    async fn mint_batch(&self, network: &str, run: &MintRun) -> Result<MintReceipt, CoreError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(MintCall {
            network: network.to_string(),
            from: run.from_index(),
            to: run.to_index_inclusive(),
            token_uris: run.token_uris().to_vec(),
        });
        if self.reject {
            return Err(CoreError::TransactionRejected("execution reverted".into()));
        }
        Ok(MintReceipt {
            tx_hash: format!("0x{:064x}", calls.len()),
            block_number: Some(calls.len() as u64),
        })
    }
}

// ---------------------------------------------------------------------------
// Image generator
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeImages {
    pub prompts: Mutex<Vec<String>>,
    /// Cancel the token once this many images were requested.
    pub cancel_after: Option<(usize, CancellationToken)>,
}

impl FakeImages {
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ImageGenerator for FakeImages {
    async fn generate_image(&self, prompt: &str, size: ImageSize) -> Result<String, CoreError> {
        let count = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len()
        };
        if let Some((limit, token)) = &self.cancel_after {
            if count >= *limit {
                token.cancel();
            }
        }
        if prompt.contains(FAIL_MARKER) {
            return Err(CoreError::GenerationFailed("content policy violation".into()));
        }
        Ok(format!("https://images.test/{count}.png?size={}", size.size_string()))
    }
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakePublisher {
    pub documents: Mutex<Vec<serde_json::Value>>,
}

#[async_trait::async_trait]
impl ContentPublisher for FakePublisher {
    async fn publish_image(&self, transient_url: &str) -> Result<PublishedImage, CoreError> {
        let cid = format!("QmImage{}", transient_url.len());
        Ok(PublishedImage {
            native_url: format!("ipfs://{cid}"),
            gateway_url: format!("https://gateway.test/ipfs/{cid}"),
            content_id: cid,
        })
    }

    async fn publish_json(&self, document: &serde_json::Value) -> Result<String, CoreError> {
        let id = document["purchaseInfo"]["id"].as_u64().unwrap_or(u64::MAX);
        self.documents.lock().unwrap().push(document.clone());
        Ok(metadata_url(id))
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

pub struct Harness {
    pub reader: Arc<FakeReader>,
    pub minter: Arc<RecordingMinter>,
    pub images: Arc<FakeImages>,
    pub publisher: Arc<FakePublisher>,
}

impl Harness {
    pub fn new(reader: FakeReader, minter: RecordingMinter, images: FakeImages) -> Self {
        Self {
            reader: Arc::new(reader),
            minter: Arc::new(minter),
            images: Arc::new(images),
            publisher: Arc::new(FakePublisher::default()),
        }
    }

    pub fn services(&self) -> Services {
        Services {
            reader: self.reader.clone(),
            minter: self.minter.clone(),
            images: self.images.clone(),
            publisher: self.publisher.clone(),
        }
    }
}
