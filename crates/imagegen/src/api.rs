//! REST client for the image-generation HTTP endpoint.
//!
//! Sends `POST {api_url}/images/generations` with bearer auth, asking for
//! exactly one image at the requested size, and returns the URL of the
//! first image in the response. Those URLs expire after a short while and
//! must be downloaded promptly.

use std::time::Duration;

use donkeys_core::config::{ImageSize, WorkerConfig};
use donkeys_core::error::CoreError;
use donkeys_core::services::ImageGenerator;
use serde::{Deserialize, Serialize};

/// HTTP client for one image-generation service.
pub struct ImageApi {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: Option<String>,
}

/// Request body of `/images/generations`.
#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub prompt: &'a str,
    pub n: u32,
    pub size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
}

/// Response of `/images/generations`.
#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
pub struct GeneratedImage {
    pub url: Option<String>,
    /// Some models rewrite the prompt before generating.
    pub revised_prompt: Option<String>,
}

impl GenerateResponse {
    /// URL of the first image, if the service returned a usable one.
    pub fn first_url(&self) -> Option<&str> {
        self.data
            .first()
            .and_then(|img| img.url.as_deref())
            .filter(|url| !url.trim().is_empty())
    }
}

/// Errors from the image API layer.
#[derive(Debug, thiserror::Error)]
pub enum ImageApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Image API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A 2xx response without an image URL.
    #[error("Image API response contained no image URL")]
    NoImage,
}

impl From<ImageApiError> for CoreError {
    fn from(e: ImageApiError) -> Self {
        match &e {
            // Client errors other than rate limiting will fail the same way
            // on every retry.
            ImageApiError::ApiError { status, .. }
                if (400..500).contains(status) && *status != 429 =>
            {
                CoreError::GenerationRejected(e.to_string())
            }
            _ => CoreError::GenerationFailed(e.to_string()),
        }
    }
}

impl ImageApi {
    /// Create a client with a per-request timeout.
    ///
    /// * `api_url` - Base URL, e.g. `https://api.openai.com/v1`.
    pub fn new(api_url: String, api_key: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self::with_client(client, api_url, api_key)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: String, api_key: String) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            model: None,
        }
    }

    /// Build the client from the worker configuration.
    pub fn from_config(config: &WorkerConfig) -> Self {
        let api = Self::new(
            config.worker.image_api_url.clone(),
            config.api.openai.clone(),
            config.worker.image_timeout(),
        );
        match &config.worker.image_model {
            Some(model) => api.with_model(model.clone()),
            None => api,
        }
    }

    /// Pin requests to a specific model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Request one image and return its URL.
    pub async fn generate(&self, prompt: &str, size: ImageSize) -> Result<String, ImageApiError> {
        let body = GenerateRequest {
            prompt,
            n: 1,
            size: size.size_string(),
            model: self.model.as_deref(),
        };

        let response = self
            .client
            .post(format!("{}/images/generations", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let parsed: GenerateResponse = Self::parse_response(response).await?;
        if let Some(revised) = parsed.data.first().and_then(|i| i.revised_prompt.as_deref()) {
            tracing::debug!(revised_prompt = %revised, "Image service revised the prompt");
        }
        parsed
            .first_url()
            .map(str::to_string)
            .ok_or(ImageApiError::NoImage)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code, otherwise capture
    /// the status and body text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ImageApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ImageApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ImageApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait::async_trait]
impl ImageGenerator for ImageApi {
    async fn generate_image(&self, prompt: &str, size: ImageSize) -> Result<String, CoreError> {
        Ok(self.generate(prompt, size).await?)
    }
}
