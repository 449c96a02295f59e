//! Content publisher backed by Pinata.
//!
//! Images arrive as short-lived URLs from the image service. They are
//! downloaded fully into a uniquely named temporary file, pinned from
//! there, and the file is removed when the [`tempfile::NamedTempFile`]
//! guard drops, whichever way the call returns.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use donkeys_core::config::WorkerConfig;
use donkeys_core::error::CoreError;
use donkeys_core::naming::{gateway_url, image_pin_name, metadata_pin_name, native_url};
use donkeys_core::services::ContentPublisher;
use donkeys_core::types::PublishedImage;

use crate::api::PinataApi;

/// Publishes images and metadata to IPFS via Pinata.
pub struct IpfsPublisher {
    api: PinataApi,
    download: reqwest::Client,
    gateway_host: String,
    /// Directory downloads are staged in before pinning.
    temp_dir: PathBuf,
}

impl IpfsPublisher {
    pub fn new(api: PinataApi, gateway_host: String, download_timeout: Duration) -> Self {
        let download = reqwest::Client::builder()
            .timeout(download_timeout)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            api,
            download,
            gateway_host,
            temp_dir: std::env::temp_dir(),
        }
    }

    /// Stage downloads in `dir` instead of the system temp directory.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    /// Build the publisher from the worker configuration.
    pub fn from_config(config: &WorkerConfig) -> Self {
        let api = PinataApi::new(
            config.worker.pinata_api_url.clone(),
            config.api.pinata_key.clone(),
            config.api.pinata_secret.clone(),
            config.worker.pinning_timeout(),
        );
        let publisher = Self::new(
            api,
            config.worker.gateway_host.clone(),
            config.worker.pinning_timeout(),
        );
        match &config.worker.temp_dir {
            Some(dir) => publisher.with_temp_dir(dir.clone()),
            None => publisher,
        }
    }

    /// Fetch the full body of `url`.
    async fn download(&self, url: &str) -> Result<Vec<u8>, CoreError> {
        let response = self
            .download
            .get(url)
            .send()
            .await
            .map_err(|e| CoreError::DownloadFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::DownloadFailed(format!(
                "GET returned HTTP {}",
                status.as_u16()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CoreError::DownloadFailed(e.to_string()))?;
        if bytes.is_empty() {
            return Err(CoreError::DownloadFailed("empty image body".into()));
        }
        Ok(bytes.to_vec())
    }

    fn published(&self, content_id: String) -> PublishedImage {
        PublishedImage {
            native_url: native_url(&content_id),
            gateway_url: gateway_url(&self.gateway_host, &content_id),
            content_id,
        }
    }
}

#[async_trait::async_trait]
impl ContentPublisher for IpfsPublisher {
    async fn publish_image(&self, transient_url: &str) -> Result<PublishedImage, CoreError> {
        let bytes = self.download(transient_url).await?;

        let temp = tempfile::Builder::new()
            .prefix("ai-donkey-")
            .suffix(".png")
            .tempfile_in(&self.temp_dir)
            .map_err(|e| CoreError::DownloadFailed(format!("cannot create temp file: {e}")))?;
        tokio::fs::write(temp.path(), &bytes)
            .await
            .map_err(|e| CoreError::DownloadFailed(format!("cannot write temp file: {e}")))?;

        let name = image_pin_name(Utc::now());
        tracing::debug!(
            path = %temp.path().display(),
            size = bytes.len(),
            name = %name,
            "Pinning image",
        );

        let pinned = self
            .api
            .pin_file(temp.path(), &name)
            .await
            .map_err(|e| CoreError::PinningFailed(e.to_string()))?;

        Ok(self.published(pinned.ipfs_hash))
    }

    async fn publish_json(&self, document: &serde_json::Value) -> Result<String, CoreError> {
        let name = metadata_pin_name(Utc::now());
        let pinned = self
            .api
            .pin_json(document, &name)
            .await
            .map_err(|e| CoreError::PinningFailed(e.to_string()))?;

        Ok(gateway_url(&self.gateway_host, &pinned.ipfs_hash))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    /// Serve `body` as a PNG to the first request on a local port.
    async fn serve_image_once(body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(body).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}/img.png")
    }

    fn publisher() -> IpfsPublisher {
        let api = PinataApi::new(
            "http://127.0.0.1:9".into(),
            "k".into(),
            "s".into(),
            Duration::from_secs(2),
        );
        IpfsPublisher::new(api, "gateway.pinata.cloud".into(), Duration::from_secs(2))
    }

    #[test]
    fn published_urls() {
        let image = publisher().published("QmHash".into());
        assert_eq!(image.content_id, "QmHash");
        assert_eq!(image.native_url, "ipfs://QmHash");
        assert_eq!(image.gateway_url, "https://gateway.pinata.cloud/ipfs/QmHash");
    }

    #[tokio::test]
    async fn unreachable_image_is_download_failure() {
        let err = publisher()
            .publish_image("http://127.0.0.1:9/img.png")
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::DownloadFailed(_));
    }

    #[tokio::test]
    async fn unreachable_pinning_is_pinning_failure() {
        let err = publisher()
            .publish_json(&serde_json::json!({ "name": "x" }))
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::PinningFailed(_));
    }

    #[tokio::test]
    async fn temp_file_removed_when_pinning_fails() {
        let staging = tempfile::tempdir().unwrap();
        let url = serve_image_once(b"\x89PNG\r\n\x1a\nfake image").await;

        let err = publisher()
            .with_temp_dir(staging.path())
            .publish_image(&url)
            .await
            .unwrap_err();

        assert_matches!(err, CoreError::PinningFailed(_));
        let leftovers: Vec<_> = std::fs::read_dir(staging.path()).unwrap().collect();
        assert!(leftovers.is_empty(), "staged files left behind: {leftovers:?}");
    }
}
