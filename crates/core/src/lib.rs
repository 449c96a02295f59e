//! Domain logic for the AI Donkeys fulfillment worker.
//!
//! Pure functions and types shared by the adapter crates and the
//! pipeline: purchase records, configuration, prompt resolution, NFT
//! metadata, batching, retry policy and the async service traits the
//! pipeline is generic over. No network or disk access lives here except
//! reading the configuration file.

pub mod batch;
pub mod config;
pub mod error;
pub mod metadata;
pub mod naming;
pub mod prompt;
pub mod retry;
pub mod services;
pub mod types;
