//! Worker configuration loaded once at startup.
//!
//! The JSON file carries per-network endpoints, era prompt templates and
//! descriptions, reward prompts, image dimensions and API credentials.
//! An optional `worker` block tunes batching, polling and retry. The
//! resulting [`WorkerConfig`] is passed by reference into each component
//! constructor.
//!
//! | Env Var       | Default                        |
//! |---------------|--------------------------------|
//! | `CONFIG_FILE` | `./localConfig/config.json`    |
//! | `PRIVATE_KEY` | -- (required, see [`signing_key_from_env`]) |

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::batch::DEFAULT_BATCH_SIZE;
use crate::error::CoreError;
use crate::prompt::PLACEHOLDER;
use crate::retry::RetryPolicy;

/// Config file used when `CONFIG_FILE` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "./localConfig/config.json";

/// Env var holding the chain-write account's signing key.
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

// ---------------------------------------------------------------------------
// File schema
// ---------------------------------------------------------------------------

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerConfig {
    /// RPC endpoint per network name.
    pub providers: BTreeMap<String, String>,
    /// Contract address per network name.
    pub contract: BTreeMap<String, String>,
    /// Networks serviced each cycle, in order.
    pub execution: Vec<String>,
    pub api: ApiCredentials,
    /// Era id (decimal) -> template containing [`PLACEHOLDER`].
    pub prompt_template_for_era: BTreeMap<String, String>,
    /// Era id (decimal) -> description prefix.
    pub description_for_era: BTreeMap<String, String>,
    pub special_prompts: SpecialPrompts,
    pub img: ImageSize,
    #[serde(default)]
    pub worker: WorkerSettings,
}

#[derive(Clone, Deserialize)]
pub struct ApiCredentials {
    pub openai: String,
    pub pinata_key: String,
    pub pinata_secret: String,
}

// Secrets stay out of logs.
impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("openai", &"<redacted>")
            .field("pinata_key", &"<redacted>")
            .field("pinata_secret", &"<redacted>")
            .finish()
    }
}

/// Fixed prompts for reward purchases.
#[derive(Debug, Clone, Deserialize)]
pub struct SpecialPrompts {
    pub king: String,
    pub queen: String,
    pub knight: String,
}

/// Target pixel dimensions of generated images.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    /// `"<width>x<height>"` as expected by the image API.
    pub fn size_string(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// Tuning knobs; every field has a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkerSettings {
    pub batch_size: usize,
    pub poll_interval_secs: u64,
    pub idle_wait_secs: u64,
    pub gas_limit: u64,
    pub confirmation_timeout_secs: u64,
    /// Failed pipeline runs tolerated per purchase before it is skipped.
    pub max_attempts: u32,
    pub retry: RetrySettings,
    pub image_timeout_secs: u64,
    pub pinning_timeout_secs: u64,
    pub image_api_url: String,
    pub image_model: Option<String>,
    pub pinata_api_url: String,
    pub gateway_host: String,
    /// Where downloaded images are staged; the system temp dir if unset.
    pub temp_dir: Option<PathBuf>,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            poll_interval_secs: 60,
            idle_wait_secs: 15,
            gas_limit: 7_000_000,
            confirmation_timeout_secs: 300,
            max_attempts: 5,
            retry: RetrySettings::default(),
            image_timeout_secs: 120,
            pinning_timeout_secs: 60,
            image_api_url: "https://api.openai.com/v1".to_string(),
            image_model: None,
            pinata_api_url: "https://api.pinata.cloud".to_string(),
            gateway_host: "gateway.pinata.cloud".to_string(),
            temp_dir: None,
        }
    }
}

impl WorkerSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn idle_wait(&self) -> Duration {
        Duration::from_secs(self.idle_wait_secs)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn image_timeout(&self) -> Duration {
        Duration::from_secs(self.image_timeout_secs)
    }

    pub fn pinning_timeout(&self) -> Duration {
        Duration::from_secs(self.pinning_timeout_secs)
    }
}

/// In-cycle retry tuning, converted into a [`RetryPolicy`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            attempts: 3,
            initial_delay_ms: 1_000,
            max_delay_ms: 30_000,
            multiplier: 2.0,
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.attempts.max(1),
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            multiplier: self.multiplier,
        }
    }
}

/// Endpoint and contract address of one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkEndpoint {
    pub name: String,
    pub rpc_url: String,
    pub contract_address: String,
}

// ---------------------------------------------------------------------------
// Loading and validation
// ---------------------------------------------------------------------------

impl WorkerConfig {
    /// Read and validate the file named by `CONFIG_FILE`, falling back to
    /// [`DEFAULT_CONFIG_FILE`].
    pub fn from_env() -> Result<Self, CoreError> {
        let path =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load(&path)
    }

    /// Read and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&raw)
    }

    /// Parse and validate configuration from a JSON string.
    pub fn from_json(raw: &str) -> Result<Self, CoreError> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| CoreError::Configuration(format!("invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.execution.is_empty() {
            return Err(CoreError::Configuration(
                "execution must list at least one network".into(),
            ));
        }
        for network in &self.execution {
            self.network(network)?;
        }

        for (era, template) in &self.prompt_template_for_era {
            if !template.contains(PLACEHOLDER) {
                return Err(CoreError::Configuration(format!(
                    "prompt template for era {era} has no '{PLACEHOLDER}' placeholder"
                )));
            }
            if !self.description_for_era.contains_key(era) {
                return Err(CoreError::Configuration(format!(
                    "era {era} has a prompt template but no description"
                )));
            }
        }

        if self.img.width == 0 || self.img.height == 0 {
            return Err(CoreError::Configuration(format!(
                "image dimensions must be non-zero, got {}",
                self.img.size_string()
            )));
        }
        if self.worker.batch_size == 0 {
            return Err(CoreError::Configuration("batch_size must be >= 1".into()));
        }
        if self.worker.max_attempts == 0 {
            return Err(CoreError::Configuration("max_attempts must be >= 1".into()));
        }
        Ok(())
    }

    /// Resolve the endpoint and contract of a network.
    pub fn network(&self, name: &str) -> Result<NetworkEndpoint, CoreError> {
        let rpc_url = self
            .providers
            .get(name)
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                CoreError::Configuration(format!("Provider URL for network {name} not found"))
            })?;
        let contract_address = self
            .contract
            .get(name)
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| {
                CoreError::Configuration(format!("Contract address for network {name} not found"))
            })?;

        Ok(NetworkEndpoint {
            name: name.to_string(),
            rpc_url: rpc_url.clone(),
            contract_address: contract_address.clone(),
        })
    }

    /// Endpoints of every network in `execution`, in order.
    pub fn networks(&self) -> Result<Vec<NetworkEndpoint>, CoreError> {
        self.execution.iter().map(|n| self.network(n)).collect()
    }
}

/// Read the signing key for the chain-write account.
///
/// Absence is a fatal startup condition.
pub fn signing_key_from_env() -> Result<String, CoreError> {
    match std::env::var(PRIVATE_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(CoreError::Configuration(format!(
            "{PRIVATE_KEY_ENV} is not set"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write;

    use assert_matches::assert_matches;

    use super::*;

    pub(crate) fn sample_json() -> serde_json::Value {
        serde_json::json!({
            "providers": { "sepolia": "http://localhost:8545" },
            "contract": { "sepolia": "0x5FbDB2315678afecb367f032d93F642f64180aa3" },
            "execution": ["sepolia"],
            "api": { "openai": "sk-test", "pinata_key": "pk", "pinata_secret": "ps" },
            "promptTemplateForEra": { "1": "Era1: <<>>" },
            "descriptionForEra": { "1": "Era1 description: " },
            "specialPrompts": {
                "king": "A royal donkey king",
                "queen": "A royal donkey queen",
                "knight": "A donkey knight"
            },
            "img": { "width": 1024, "height": 1024 }
        })
    }

    pub(crate) fn sample_config() -> WorkerConfig {
        WorkerConfig::from_json(&sample_json().to_string()).unwrap()
    }

    #[test]
    fn parses_minimal_config_with_defaults() {
        let config = sample_config();
        assert_eq!(config.execution, vec!["sepolia".to_string()]);
        assert_eq!(config.worker.batch_size, 20);
        assert_eq!(config.worker.poll_interval_secs, 60);
        assert_eq!(config.worker.idle_wait_secs, 15);
        assert_eq!(config.worker.gas_limit, 7_000_000);
        assert_eq!(config.img.size_string(), "1024x1024");
    }

    #[test]
    fn worker_block_overrides_defaults() {
        let mut json = sample_json();
        json["worker"] = serde_json::json!({ "batch_size": 5, "retry": { "attempts": 7 } });
        let config = WorkerConfig::from_json(&json.to_string()).unwrap();
        assert_eq!(config.worker.batch_size, 5);
        assert_eq!(config.worker.retry.attempts, 7);
        assert_eq!(config.worker.retry.initial_delay_ms, 1_000);
        assert_eq!(config.worker.poll_interval_secs, 60);
    }

    #[test]
    fn network_lookup() {
        let config = sample_config();
        let net = config.network("sepolia").unwrap();
        assert_eq!(net.rpc_url, "http://localhost:8545");
        assert_matches!(config.network("mainnet"), Err(CoreError::Configuration(_)));
    }

    #[test]
    fn rejects_executed_network_without_provider() {
        let mut json = sample_json();
        json["execution"] = serde_json::json!(["sepolia", "base"]);
        let err = WorkerConfig::from_json(&json.to_string()).unwrap_err();
        assert!(err.to_string().contains("base"));
    }

    #[test]
    fn rejects_empty_execution() {
        let mut json = sample_json();
        json["execution"] = serde_json::json!([]);
        assert_matches!(
            WorkerConfig::from_json(&json.to_string()),
            Err(CoreError::Configuration(_))
        );
    }

    #[test]
    fn rejects_template_without_placeholder() {
        let mut json = sample_json();
        json["promptTemplateForEra"]["1"] = serde_json::json!("no placeholder");
        assert_matches!(
            WorkerConfig::from_json(&json.to_string()),
            Err(CoreError::Configuration(_))
        );
    }

    #[test]
    fn rejects_template_without_description() {
        let mut json = sample_json();
        json["promptTemplateForEra"]["2"] = serde_json::json!("Era2: <<>>");
        assert_matches!(
            WorkerConfig::from_json(&json.to_string()),
            Err(CoreError::Configuration(_))
        );
    }

    #[test]
    fn rejects_zero_dimensions_and_batch_size() {
        let mut json = sample_json();
        json["img"]["width"] = serde_json::json!(0);
        assert!(WorkerConfig::from_json(&json.to_string()).is_err());

        let mut json = sample_json();
        json["worker"] = serde_json::json!({ "batch_size": 0 });
        assert!(WorkerConfig::from_json(&json.to_string()).is_err());
    }

    #[test]
    fn rejects_malformed_json() {
        assert_matches!(
            WorkerConfig::from_json("{ not json"),
            Err(CoreError::Configuration(_))
        );
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", sample_json()).unwrap();
        let config = WorkerConfig::load(file.path()).unwrap();
        assert_eq!(config.special_prompts.king, "A royal donkey king");
    }

    #[test]
    fn load_missing_file_is_configuration_error() {
        assert_matches!(
            WorkerConfig::load("/definitely/not/here.json"),
            Err(CoreError::Configuration(_))
        );
    }

    #[test]
    fn credentials_are_redacted_in_debug() {
        let config = sample_config();
        let rendered = format!("{:?}", config.api);
        assert!(!rendered.contains("sk-test"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn retry_policy_from_settings() {
        let policy = RetrySettings {
            attempts: 0,
            ..Default::default()
        }
        .policy();
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.initial_delay, Duration::from_secs(1));
    }
}
