//! REST client for the Pinata pinning endpoints.
//!
//! - `POST /pinning/pinFileToIPFS` (multipart: `file`, `pinataMetadata`,
//!   `pinataOptions`)
//! - `POST /pinning/pinJSONToIPFS` (`pinataContent`, `pinataMetadata`)
//!
//! Both authenticate with the `pinata_api_key` / `pinata_secret_api_key`
//! header pair and answer with the content identifier of the pinned data.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// CID version requested for pinned files. v0 keeps `Qm...` hashes.
pub const CID_VERSION: u8 = 0;

/// HTTP client for the Pinata API.
pub struct PinataApi {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    secret_key: String,
}

/// Response of both pin endpoints.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PinResponse {
    #[serde(rename = "IpfsHash")]
    pub ipfs_hash: String,
    #[serde(rename = "PinSize", default)]
    pub pin_size: u64,
    #[serde(rename = "Timestamp", default)]
    pub timestamp: Option<String>,
    /// Set when the same content was already pinned.
    #[serde(rename = "isDuplicate", default)]
    pub is_duplicate: Option<bool>,
}

/// Errors from the Pinata API layer.
#[derive(Debug, thiserror::Error)]
pub enum PinataError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Pinata returned a non-2xx status code.
    #[error("Pinata API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The file to pin could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl PinataApi {
    /// Create a client with a per-request timeout.
    ///
    /// * `api_url` - Base URL, e.g. `https://api.pinata.cloud`.
    pub fn new(api_url: String, api_key: String, secret_key: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self::with_client(client, api_url, api_key, secret_key)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        api_url: String,
        api_key: String,
        secret_key: String,
    ) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            secret_key,
        }
    }

    /// Pin a file from disk under `name`.
    pub async fn pin_file(&self, path: &Path, name: &str) -> Result<PinResponse, PinataError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| PinataError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let part = reqwest::multipart::Part::bytes(bytes).file_name(name.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("pinataMetadata", pin_metadata(name).to_string())
            .text("pinataOptions", pin_options().to_string());

        let response = self
            .authorized(self.client.post(format!("{}/pinning/pinFileToIPFS", self.api_url)))
            .multipart(form)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Pin a JSON document under `name`.
    pub async fn pin_json(
        &self,
        document: &serde_json::Value,
        name: &str,
    ) -> Result<PinResponse, PinataError> {
        let body = serde_json::json!({
            "pinataContent": document,
            "pinataMetadata": pin_metadata(name),
        });

        let response = self
            .authorized(self.client.post(format!("{}/pinning/pinJSONToIPFS", self.api_url)))
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("pinata_api_key", &self.api_key)
            .header("pinata_secret_api_key", &self.secret_key)
    }

    /// Ensure the response has a success status code, otherwise capture
    /// the status and body text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, PinataError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(PinataError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PinataError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

fn pin_metadata(name: &str) -> serde_json::Value {
    serde_json::json!({ "name": name })
}

fn pin_options() -> serde_json::Value {
    serde_json::json!({ "cidVersion": CID_VERSION })
}
