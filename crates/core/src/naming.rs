//! Names under which content is pinned.
//!
//! Names carry the generation timestamp in unix milliseconds so that
//! successive uploads never collide in the pinning dashboard.

use chrono::{DateTime, Utc};

/// Pin name for a generated image.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use donkeys_core::naming::image_pin_name;
///
/// let at = Utc.timestamp_millis_opt(1_738_368_000_123).unwrap();
/// assert_eq!(image_pin_name(at), "ai-donkey-1738368000123.png");
/// ```
pub fn image_pin_name(at: DateTime<Utc>) -> String {
    format!("ai-donkey-{}.png", at.timestamp_millis())
}

/// Pin name for a metadata document.
pub fn metadata_pin_name(at: DateTime<Utc>) -> String {
    format!("nft-metadata-{}", at.timestamp_millis())
}

/// `ipfs://<cid>`
pub fn native_url(content_id: &str) -> String {
    format!("ipfs://{content_id}")
}

/// `https://<gateway>/ipfs/<cid>`
pub fn gateway_url(gateway_host: &str, content_id: &str) -> String {
    format!(
        "https://{}/ipfs/{content_id}",
        gateway_host.trim_end_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn metadata_name() {
        let at = Utc.timestamp_millis_opt(42).unwrap();
        assert_eq!(metadata_pin_name(at), "nft-metadata-42");
    }

    #[test]
    fn urls() {
        assert_eq!(native_url("QmAbc"), "ipfs://QmAbc");
        assert_eq!(
            gateway_url("gateway.pinata.cloud", "QmAbc"),
            "https://gateway.pinata.cloud/ipfs/QmAbc"
        );
        assert_eq!(
            gateway_url("example.mypinata.cloud/", "QmAbc"),
            "https://example.mypinata.cloud/ipfs/QmAbc"
        );
    }
}
