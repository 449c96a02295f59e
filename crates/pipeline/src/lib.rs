//! Purchase-to-mint fulfillment pipeline.
//!
//! [`processor::PurchaseProcessor`] turns one purchase into a pinned
//! metadata URL (prompt, image, pin image, metadata, pin metadata), with
//! retry on transient failures. [`orchestrator::Orchestrator`] drives it
//! over every configured network: fetch, partition, process, assemble
//! mint runs, mint, sleep.

pub mod attempts;
pub mod orchestrator;
pub mod processor;
pub mod retry;

pub use orchestrator::{CycleReport, Orchestrator, Services};
pub use processor::{GenerationResult, PurchaseOutcome, PurchaseProcessor};
