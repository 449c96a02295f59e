//! IPFS pinning through the Pinata HTTP API.
//!
//! [`api::PinataApi`] wraps the raw endpoints; [`publisher::IpfsPublisher`]
//! implements [`donkeys_core::services::ContentPublisher`] on top of it,
//! including the download of transient images into scoped temp files.

pub mod api;
pub mod publisher;

pub use api::{PinResponse, PinataApi, PinataError};
pub use publisher::IpfsPublisher;
