//! Image-generation client.
//!
//! Wraps an OpenAI-compatible `/images/generations` endpoint and exposes
//! it to the pipeline through [`donkeys_core::services::ImageGenerator`].

pub mod api;

pub use api::{ImageApi, ImageApiError};
