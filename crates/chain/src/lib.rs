//! On-chain access for the EraNFT collection contract.
//!
//! Reads pending purchases and submits batch mints over JSON-RPC using
//! ethers-rs, behind the [`donkeys_core::services::PurchaseReader`] and
//! [`donkeys_core::services::BatchMinter`] seams.

pub mod bindings;
pub mod client;
pub mod error;

pub use client::EthChain;
pub use error::ChainError;
