//! Polling loop over the configured networks.
//!
//! One cycle per network: fetch pending purchases, drop the ones that have
//! exhausted their attempts, partition into batches, process every purchase
//! sequentially, fold the outcomes into mint runs and mint each run. After
//! all networks the loop sleeps for the poll interval. Every wait point
//! observes the [`CancellationToken`].

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use donkeys_core::batch::{assemble_runs, partition};
use donkeys_core::config::WorkerConfig;
use donkeys_core::error::CoreError;
use donkeys_core::services::{BatchMinter, ContentPublisher, ImageGenerator, PurchaseReader};
use donkeys_core::types::{Purchase, PurchaseId};
use tokio_util::sync::CancellationToken;

use crate::attempts::AttemptLedger;
use crate::processor::PurchaseProcessor;

/// External services the orchestrator drives.
#[derive(Clone)]
pub struct Services {
    pub reader: Arc<dyn PurchaseReader>,
    pub minter: Arc<dyn BatchMinter>,
    pub images: Arc<dyn ImageGenerator>,
    pub publisher: Arc<dyn ContentPublisher>,
}

/// Summary of one network cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub network: String,
    /// Purchases returned by the chain.
    pub fetched: usize,
    /// Purchases skipped because their attempts are used up.
    pub skipped: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Mint transactions confirmed.
    pub runs_minted: usize,
    pub tokens_minted: usize,
    /// Nothing was pending.
    pub idle: bool,
    /// Stopped early on shutdown.
    pub cancelled: bool,
}

impl CycleReport {
    fn new(network: &str) -> Self {
        Self {
            network: network.to_string(),
            ..Default::default()
        }
    }
}

pub struct Orchestrator {
    networks: Vec<String>,
    batch_size: usize,
    poll_interval: Duration,
    idle_wait: Duration,
    services: Services,
    processor: PurchaseProcessor,
    ledger: AttemptLedger,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(config: &WorkerConfig, services: Services, cancel: CancellationToken) -> Self {
        let processor = PurchaseProcessor::new(
            config,
            Arc::clone(&services.images),
            Arc::clone(&services.publisher),
        );
        Self {
            networks: config.execution.clone(),
            batch_size: config.worker.batch_size.max(1),
            poll_interval: config.worker.poll_interval(),
            idle_wait: config.worker.idle_wait(),
            services,
            processor,
            ledger: AttemptLedger::new(config.worker.max_attempts),
            cancel,
        }
    }

    pub fn ledger(&self) -> &AttemptLedger {
        &self.ledger
    }

    /// Poll every network until cancelled.
    pub async fn run(&mut self) {
        tracing::info!(
            networks = ?self.networks,
            batch_size = self.batch_size,
            poll_interval_secs = self.poll_interval.as_secs(),
            "Worker started",
        );

        while !self.cancel.is_cancelled() {
            self.run_iteration().await;
            if !self.pause(self.poll_interval).await {
                break;
            }
        }

        tracing::info!("Worker stopped");
    }

    /// One cycle for the first configured network, without idle wait.
    pub async fn run_once(&mut self) -> Result<CycleReport, CoreError> {
        let network = self
            .networks
            .first()
            .cloned()
            .ok_or_else(|| CoreError::Configuration("execution list is empty".into()))?;
        self.run_cycle(&network).await
    }

    /// One cycle for every network, in configured order.
    pub async fn run_iteration(&mut self) {
        for network in self.networks.clone() {
            if self.cancel.is_cancelled() {
                return;
            }

            match self.run_cycle(&network).await {
                Ok(report) if report.idle => {
                    tracing::info!(
                        network = %network,
                        wait_secs = self.idle_wait.as_secs(),
                        "No purchases found, waiting",
                    );
                    if !self.pause(self.idle_wait).await {
                        return;
                    }
                }
                Ok(report) => tracing::info!(
                    network = %network,
                    fetched = report.fetched,
                    skipped = report.skipped,
                    succeeded = report.succeeded,
                    failed = report.failed,
                    tokens_minted = report.tokens_minted,
                    "Cycle complete",
                ),
                Err(e) => tracing::error!(network = %network, error = %e, "Cycle failed"),
            }
        }
    }

    /// Fetch, process and mint everything pending on `network`.
    ///
    /// Per-purchase failures are recorded and reported; only a failed fetch
    /// or mint aborts the cycle with an error.
    pub async fn run_cycle(&mut self, network: &str) -> Result<CycleReport, CoreError> {
        let mut report = CycleReport::new(network);

        let purchases = self.services.reader.list_purchases(network).await?;
        report.fetched = purchases.len();
        if purchases.is_empty() {
            report.idle = true;
            return Ok(report);
        }

        tracing::info!(network, count = purchases.len(), "Fetched pending purchases");

        let pending: HashSet<PurchaseId> = purchases.iter().map(|p| p.id).collect();
        self.ledger.retain_pending(network, &pending);

        for batch in partition(&purchases, self.batch_size) {
            tracing::debug!(
                network,
                first_position = batch.first_position(),
                last_position = batch.last_position(),
                "Processing batch",
            );

            let results = self.process_batch(network, batch.purchases, &mut report).await;
            self.mint(network, results, &mut report).await?;

            if report.cancelled {
                break;
            }
        }

        Ok(report)
    }

    /// Process each purchase in order; `None` marks one that will not be
    /// minted this cycle.
    async fn process_batch(
        &mut self,
        network: &str,
        purchases: &[Purchase],
        report: &mut CycleReport,
    ) -> Vec<(PurchaseId, Option<String>)> {
        let mut results = Vec::with_capacity(purchases.len());

        for purchase in purchases {
            if self.cancel.is_cancelled() {
                tracing::info!(network, "Shutdown requested, stopping batch");
                report.cancelled = true;
                break;
            }

            if self.ledger.is_exhausted(network, purchase.id) {
                tracing::warn!(
                    network,
                    purchase_id = purchase.id,
                    failures = self.ledger.failures(network, purchase.id),
                    "Attempts exhausted, skipping purchase",
                );
                report.skipped += 1;
                results.push((purchase.id, None));
                continue;
            }

            let outcome = self.processor.process(purchase).await;
            match &outcome.result {
                Ok(_) => report.succeeded += 1,
                Err(e) if e.is_configuration() => {
                    report.failed += 1;
                    self.ledger.exhaust(network, purchase.id);
                }
                Err(_) => {
                    report.failed += 1;
                    let failures = self.ledger.record_failure(network, purchase.id);
                    tracing::debug!(network, purchase_id = purchase.id, failures, "Failure recorded");
                }
            }
            results.push((outcome.id, outcome.token_uri()));
        }

        results
    }

    async fn mint(
        &mut self,
        network: &str,
        results: Vec<(PurchaseId, Option<String>)>,
        report: &mut CycleReport,
    ) -> Result<(), CoreError> {
        for run in assemble_runs(results) {
            tracing::info!(
                network,
                from = run.from_index(),
                to = run.to_index_inclusive(),
                tokens = run.len(),
                "Minting",
            );

            let receipt = match self.services.minter.mint_batch(network, &run).await {
                Ok(receipt) => receipt,
                Err(e) => {
                    tracing::error!(
                        network,
                        from = run.from_index(),
                        to = run.to_index_inclusive(),
                        error = %e,
                        "Mint failed",
                    );
                    // A run that keeps failing to mint counts against each
                    // of its purchases like any other failed step.
                    for id in run.from_index()..=run.to_index_inclusive() {
                        self.ledger.record_failure(network, id);
                    }
                    return Err(e);
                }
            };

            tracing::info!(
                network,
                tx_hash = %receipt.tx_hash,
                block = ?receipt.block_number,
                "Minted",
            );

            for id in run.from_index()..=run.to_index_inclusive() {
                self.ledger.clear(network, id);
            }
            report.runs_minted += 1;
            report.tokens_minted += run.len();
        }
        Ok(())
    }

    /// Sleep for `duration`; `false` if cancelled first.
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}
