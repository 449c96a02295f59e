//! JSON-RPC client for the configured networks.
//!
//! [`EthChain`] holds one signing wallet and the endpoint of every
//! network in the execution list. Contract handles are connected lazily
//! on first use (the chain id must be fetched before signing) and cached
//! for the life of the process. A handle whose call fails is evicted so
//! the next cycle reconnects.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use donkeys_core::batch::MintRun;
use donkeys_core::config::{NetworkEndpoint, WorkerConfig};
use donkeys_core::error::CoreError;
use donkeys_core::services::{BatchMinter, PurchaseReader};
use donkeys_core::types::{MintReceipt, Purchase, Reward};
use ethers::prelude::{
    Address, Http, LocalWallet, Middleware, Provider, Signer, SignerMiddleware, U64,
};
use tokio::sync::Mutex;

use crate::bindings::{EraNft, RawPurchase};
use crate::error::ChainError;

/// Polling interval for pending transactions.
const TX_POLL_INTERVAL: Duration = Duration::from_secs(2);

type SignedClient = SignerMiddleware<Provider<Http>, LocalWallet>;
type Contract = EraNft<SignedClient>;

/// Chain access for every configured network.
#[derive(Debug)]
pub struct EthChain {
    wallet: LocalWallet,
    endpoints: HashMap<String, NetworkEndpoint>,
    contracts: Mutex<HashMap<String, Arc<Contract>>>,
    gas_limit: u64,
    confirmation_timeout: Duration,
}

impl EthChain {
    /// Validate the signing key and every network endpoint.
    ///
    /// No RPC call is made here.
    pub fn new(config: &WorkerConfig, private_key: &str) -> Result<Self, ChainError> {
        let wallet: LocalWallet = private_key
            .parse()
            .map_err(|e| ChainError::Config(format!("invalid signing key: {e}")))?;

        let mut endpoints = HashMap::new();
        for endpoint in config
            .networks()
            .map_err(|e| ChainError::Config(e.to_string()))?
        {
            parse_address(&endpoint.contract_address)?;
            Provider::<Http>::try_from(endpoint.rpc_url.as_str()).map_err(|e| {
                ChainError::Config(format!("invalid RPC URL for {}: {e}", endpoint.name))
            })?;
            endpoints.insert(endpoint.name.clone(), endpoint);
        }

        tracing::info!(
            signer = ?wallet.address(),
            networks = endpoints.len(),
            "Chain client configured",
        );

        Ok(Self {
            wallet,
            endpoints,
            contracts: Mutex::new(HashMap::new()),
            gas_limit: config.worker.gas_limit,
            confirmation_timeout: config.worker.confirmation_timeout(),
        })
    }

    /// Address minting transactions are signed with.
    pub fn signer_address(&self) -> Address {
        self.wallet.address()
    }

    /// Connected contract handle for `network`, created on first use.
    async fn contract(&self, network: &str) -> Result<Arc<Contract>, ChainError> {
        let mut contracts = self.contracts.lock().await;
        if let Some(contract) = contracts.get(network) {
            return Ok(Arc::clone(contract));
        }

        let endpoint = self.endpoints.get(network).ok_or_else(|| {
            ChainError::Config(format!("Provider URL for network {network} not found"))
        })?;

        tracing::info!(network, rpc_url = %endpoint.rpc_url, "Connecting to network");

        let provider = Provider::<Http>::try_from(endpoint.rpc_url.as_str())
            .map_err(|e| ChainError::Config(e.to_string()))?
            .interval(TX_POLL_INTERVAL);
        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| rpc_error(network, e))?;

        let wallet = self.wallet.clone().with_chain_id(chain_id.as_u64());
        let client = Arc::new(SignerMiddleware::new(provider, wallet));
        let contract = Arc::new(EraNft::new(
            parse_address(&endpoint.contract_address)?,
            client,
        ));

        contracts.insert(network.to_string(), Arc::clone(&contract));
        Ok(contract)
    }

    async fn evict(&self, network: &str) {
        self.contracts.lock().await.remove(network);
    }

    async fn fetch(&self, network: &str) -> Result<Vec<Purchase>, ChainError> {
        let contract = self.contract(network).await?;
        let raw = contract
            .list_purchases()
            .call()
            .await
            .map_err(|e| rpc_error(network, e))?;
        Ok(raw.into_iter().map(decode_purchase).collect())
    }

    async fn submit(&self, network: &str, run: &MintRun) -> Result<MintReceipt, ChainError> {
        let contract = self.contract(network).await?;
        let call = contract
            .multiple_mint_token_for_purchase(
                run.from_index(),
                run.to_index_inclusive(),
                run.token_uris().to_vec(),
            )
            .gas(self.gas_limit);

        let pending = call
            .send()
            .await
            .map_err(|e| ChainError::Submit(e.to_string()))?;
        let tx_hash = format!("{:?}", pending.tx_hash());

        tracing::info!(
            network,
            tx_hash = %tx_hash,
            from = run.from_index(),
            to = run.to_index_inclusive(),
            "Waiting for transaction receipt",
        );

        let receipt = tokio::time::timeout(self.confirmation_timeout, pending)
            .await
            .map_err(|_| ChainError::Timeout {
                tx_hash: tx_hash.clone(),
                timeout_secs: self.confirmation_timeout.as_secs(),
            })?
            .map_err(|e| rpc_error(network, e))?
            .ok_or_else(|| ChainError::Dropped(tx_hash.clone()))?;

        if receipt.status == Some(U64::zero()) {
            return Err(ChainError::Reverted(tx_hash));
        }

        Ok(MintReceipt {
            tx_hash,
            block_number: receipt.block_number.map(|b| b.as_u64()),
        })
    }
}

#[async_trait::async_trait]
impl PurchaseReader for EthChain {
    async fn list_purchases(&self, network: &str) -> Result<Vec<Purchase>, CoreError> {
        match self.fetch(network).await {
            Ok(purchases) => Ok(purchases),
            Err(e) => {
                self.evict(network).await;
                Err(e.into())
            }
        }
    }
}

#[async_trait::async_trait]
impl BatchMinter for EthChain {
    async fn mint_batch(&self, network: &str, run: &MintRun) -> Result<MintReceipt, CoreError> {
        match self.submit(network, run).await {
            Ok(receipt) => Ok(receipt),
            Err(e) => {
                if matches!(e, ChainError::Rpc { .. } | ChainError::Submit(_)) {
                    self.evict(network).await;
                }
                Err(e.into())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Convert the ABI tuple into the domain type.
pub fn decode_purchase(raw: RawPurchase) -> Purchase {
    let (id, text, telegram_id, purchase_price, era_id, purchaser, reward) = raw;
    Purchase {
        id,
        text,
        telegram_id,
        purchase_price: purchase_price.to_string(),
        era_id,
        purchaser: ethers::utils::to_checksum(&purchaser, None),
        reward: Reward::from_u8(reward),
    }
}

fn parse_address(raw: &str) -> Result<Address, ChainError> {
    raw.trim()
        .parse::<Address>()
        .map_err(|e| ChainError::Config(format!("invalid contract address '{raw}': {e}")))
}

fn rpc_error(network: &str, e: impl std::fmt::Display) -> ChainError {
    ChainError::Rpc {
        network: network.to_string(),
        message: e.to_string(),
    }
}
