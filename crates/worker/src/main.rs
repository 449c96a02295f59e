//! `donkeys-worker` -- purchase-to-mint fulfillment daemon.
//!
//! Polls the EraNFT contract on every configured network, generates and
//! pins an image plus metadata for each pending purchase, and batch-mints
//! the results.
//!
//! # Environment variables
//!
//! | Variable      | Required | Default                      | Description                   |
//! |---------------|----------|------------------------------|-------------------------------|
//! | `PRIVATE_KEY` | yes      | --                           | Signing key of the minter     |
//! | `CONFIG_FILE` | no       | `./localConfig/config.json`  | JSON configuration file       |
//! | `RUST_LOG`    | no       | `donkeys_worker=info,...`    | Log filter                    |
//! | `LOG_FORMAT`  | no       | `pretty`                     | `json` for structured output  |
//!
//! Variables are also read from `./localConfig/.env` and `./.env`.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use donkeys_chain::EthChain;
use donkeys_core::config::{signing_key_from_env, WorkerConfig};
use donkeys_imagegen::ImageApi;
use donkeys_pinning::IpfsPublisher;
use donkeys_pipeline::{Orchestrator, Services};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const LOCAL_ENV_FILE: &str = "./localConfig/.env";

const DEFAULT_LOG_FILTER: &str =
    "donkeys_worker=info,donkeys_pipeline=info,donkeys_chain=info,donkeys_pinning=info,donkeys_imagegen=info";

#[derive(Debug, Parser)]
#[command(version, about = "Generates, pins and mints AI Donkey NFTs for pending purchases")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a single cycle for the first configured network, then exit.
    Once,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::from_path(LOCAL_ENV_FILE).ok();
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();

    let config = WorkerConfig::from_env().context("failed to load configuration")?;
    let private_key = signing_key_from_env()?;

    let chain = Arc::new(EthChain::new(&config, &private_key)?);
    let services = Services {
        reader: chain.clone(),
        minter: chain,
        images: Arc::new(ImageApi::from_config(&config)),
        publisher: Arc::new(IpfsPublisher::from_config(&config)),
    };

    let cancel = CancellationToken::new();
    let mut orchestrator = Orchestrator::new(&config, services, cancel.clone());

    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, finishing current step");
        cancel.cancel();
    });

    match cli.command {
        Some(Command::Once) => {
            let report = orchestrator.run_once().await?;
            tracing::info!(
                network = %report.network,
                fetched = report.fetched,
                succeeded = report.succeeded,
                failed = report.failed,
                tokens_minted = report.tokens_minted,
                "Single cycle complete",
            );
        }
        None => orchestrator.run().await,
    }

    Ok(())
}

/// Pretty output by default; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
