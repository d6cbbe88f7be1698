use crate::error::{MgnregaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

pub const DEFAULT_STATE_CODE: &str = "MP";
pub const DEFAULT_STATE_NAME: &str = "MADHYA PRADESH";
pub const DEFAULT_API_BASE_URL: &str = "https://api.data.gov.in/resource";
pub const DEFAULT_RESOURCE_ID: &str = "ee03643a-ee4c-48c2-ac30-9f2ff26ab722";

/// Layered configuration: defaults < file < environment < CLI
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub default_state_code: ConfigValue<String>,
    pub default_state_name: ConfigValue<String>,
    pub api_base_url: ConfigValue<String>,
    pub resource_id: ConfigValue<String>,
    pub api_key: ConfigValue<String>,
    pub page_limit: ConfigValue<usize>,
    pub request_timeout_ms: ConfigValue<u64>,
    pub page_backoff_ms: ConfigValue<u64>,
    pub max_retries: ConfigValue<u32>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            default_state_code: ConfigValue::new(DEFAULT_STATE_CODE.to_string(), ConfigSource::Default),
            default_state_name: ConfigValue::new(DEFAULT_STATE_NAME.to_string(), ConfigSource::Default),
            api_base_url: ConfigValue::new(DEFAULT_API_BASE_URL.to_string(), ConfigSource::Default),
            resource_id: ConfigValue::new(DEFAULT_RESOURCE_ID.to_string(), ConfigSource::Default),
            api_key: ConfigValue::new(String::new(), ConfigSource::Default),
            page_limit: ConfigValue::new(500, ConfigSource::Default),
            request_timeout_ms: ConfigValue::new(60_000, ConfigSource::Default),
            page_backoff_ms: ConfigValue::new(1_500, ConfigSource::Default),
            max_retries: ConfigValue::new(3, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| MgnregaError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| MgnregaError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(code) = file_config.default_state_code {
            self.default_state_code.update(code, ConfigSource::File);
        }
        if let Some(name) = file_config.default_state_name {
            self.default_state_name.update(name, ConfigSource::File);
        }

        if let Some(data_gov) = file_config.data_gov {
            if let Some(url) = data_gov.api_base_url {
                self.api_base_url.update(url, ConfigSource::File);
            }
            if let Some(id) = data_gov.resource_id {
                self.resource_id.update(id, ConfigSource::File);
            }
            if let Some(key) = data_gov.api_key {
                self.api_key.update(key, ConfigSource::File);
            }
            if let Some(limit) = data_gov.page_limit {
                self.page_limit.update(limit, ConfigSource::File);
            }
            if let Some(timeout) = data_gov.request_timeout_ms {
                self.request_timeout_ms.update(timeout, ConfigSource::File);
            }
            if let Some(backoff) = data_gov.page_backoff_ms {
                self.page_backoff_ms.update(backoff, ConfigSource::File);
            }
            if let Some(retries) = data_gov.max_retries {
                self.max_retries.update(retries, ConfigSource::File);
            }
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        if let Some(code) = env_string("DEFAULT_STATE_CODE") {
            self.default_state_code.update(code, ConfigSource::Environment);
        }
        if let Some(name) = env_string("DEFAULT_STATE_NAME") {
            self.default_state_name.update(name, ConfigSource::Environment);
        }
        if let Some(url) = env_string("DATA_GOV_API_BASE") {
            self.api_base_url.update(url, ConfigSource::Environment);
        }
        if let Some(id) = env_string("DATA_GOV_RESOURCE_ID") {
            self.resource_id.update(id, ConfigSource::Environment);
        }
        if let Some(key) = env_string("DATA_GOV_API_KEY") {
            self.api_key.update(key, ConfigSource::Environment);
        }

        // Numeric knobs warn and keep the previous value when unparseable
        if let Some(limit) = env_number("DATA_GOV_PAGE_LIMIT") {
            self.page_limit.update(limit, ConfigSource::Environment);
        }
        if let Some(timeout) = env_number("DATA_GOV_TIMEOUT_MS") {
            self.request_timeout_ms.update(timeout, ConfigSource::Environment);
        }
        if let Some(backoff) = env_number("DATA_GOV_PAGE_BACKOFF_MS") {
            self.page_backoff_ms.update(backoff, ConfigSource::Environment);
        }
        if let Some(retries) = env_number("DATA_GOV_MAX_RETRIES") {
            self.max_retries.update(retries, ConfigSource::Environment);
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(code) = overrides.default_state_code {
            self.default_state_code.update(code, ConfigSource::Cli);
        }
        if let Some(limit) = overrides.page_limit {
            self.page_limit.update(limit, ConfigSource::Cli);
        }
        if let Some(timeout) = overrides.request_timeout_ms {
            self.request_timeout_ms.update(timeout, ConfigSource::Cli);
        }
        if let Some(backoff) = overrides.page_backoff_ms {
            self.page_backoff_ms.update(backoff, ConfigSource::Cli);
        }
    }

    /// Get all configuration values as a map for inspection.
    ///
    /// The API key is masked.
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "default_state_code".to_string(),
            (self.default_state_code.value.clone(), self.default_state_code.source),
        );
        map.insert(
            "default_state_name".to_string(),
            (self.default_state_name.value.clone(), self.default_state_name.source),
        );
        map.insert(
            "api_base_url".to_string(),
            (self.api_base_url.value.clone(), self.api_base_url.source),
        );
        map.insert(
            "resource_id".to_string(),
            (self.resource_id.value.clone(), self.resource_id.source),
        );
        map.insert(
            "api_key".to_string(),
            (mask_secret(&self.api_key.value), self.api_key.source),
        );
        map.insert(
            "page_limit".to_string(),
            (self.page_limit.value.to_string(), self.page_limit.source),
        );
        map.insert(
            "request_timeout_ms".to_string(),
            (self.request_timeout_ms.value.to_string(), self.request_timeout_ms.source),
        );
        map.insert(
            "page_backoff_ms".to_string(),
            (self.page_backoff_ms.value.to_string(), self.page_backoff_ms.source),
        );
        map.insert(
            "max_retries".to_string(),
            (self.max_retries.value.to_string(), self.max_retries.source),
        );

        map
    }

    /// Resolve into the immutable configuration handed to the client and pipeline
    pub fn build(&self) -> Result<AppConfig> {
        if self.page_limit.value == 0 {
            return Err(MgnregaError::ConfigInvalid {
                key: "page_limit".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(AppConfig {
            default_state_code: self.default_state_code.value.clone(),
            default_state_name: self.default_state_name.value.clone(),
            data_gov: DataGovConfig {
                api_base_url: self.api_base_url.value.trim_end_matches('/').to_string(),
                resource_id: self.resource_id.value.clone(),
                api_key: self.api_key.value.clone(),
                page_limit: self.page_limit.value,
                request_timeout: Duration::from_millis(self.request_timeout_ms.value),
            },
            pipeline: PipelineConfig {
                page_delay: Duration::from_millis(self.page_backoff_ms.value),
                max_timeout_retries: self.max_retries.value,
                ..PipelineConfig::default()
            },
        })
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_number<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env_string(key)?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Invalid {} value '{}': expected a non-negative integer", key, raw);
            None
        }
    }
}

fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        "(not set)".to_string()
    } else {
        let visible: String = secret.chars().take(4).collect();
        format!("{}****", visible)
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    default_state_code: Option<String>,
    default_state_name: Option<String>,
    data_gov: Option<FileDataGovConfig>,
}

#[derive(Debug, Deserialize, Serialize)]
struct FileDataGovConfig {
    api_base_url: Option<String>,
    resource_id: Option<String>,
    api_key: Option<String>,
    page_limit: Option<usize>,
    request_timeout_ms: Option<u64>,
    page_backoff_ms: Option<u64>,
    max_retries: Option<u32>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub default_state_code: Option<String>,
    pub page_limit: Option<usize>,
    pub request_timeout_ms: Option<u64>,
    pub page_backoff_ms: Option<u64>,
}

/// Resolved, immutable application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub default_state_code: String,
    pub default_state_name: String,
    pub data_gov: DataGovConfig,
    pub pipeline: PipelineConfig,
}

impl AppConfig {
    /// Load defaults, then environment
    pub fn from_env() -> Result<Self> {
        LayeredConfig::with_defaults().load_from_env().build()
    }

    /// Check that everything a live upstream fetch needs is present
    pub fn require_upstream(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.data_gov.api_key.is_empty() {
            missing.push("DATA_GOV_API_KEY");
        }
        if self.data_gov.resource_id.is_empty() {
            missing.push("DATA_GOV_RESOURCE_ID");
        }
        if self.default_state_name.is_empty() {
            missing.push("DEFAULT_STATE_NAME");
        }
        if self.default_state_code.is_empty() {
            missing.push("DEFAULT_STATE_CODE");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(MgnregaError::ConfigMissing { key: missing.join(", ") })
        }
    }
}

/// Upstream (data.gov.in) client settings
#[derive(Debug, Clone)]
pub struct DataGovConfig {
    pub api_base_url: String,
    pub resource_id: String,
    pub api_key: String,
    /// Records requested per page
    pub page_limit: usize,
    pub request_timeout: Duration,
}

/// Ingestion pipeline pacing and retry policy
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Pause between successful page fetches
    pub page_delay: Duration,
    /// Timeout retries per offset before the failure counts as an error
    pub max_timeout_retries: u32,
    /// Backoff for the first timeout retry is `base * 2`
    pub timeout_backoff_base: Duration,
    pub timeout_backoff_cap: Duration,
    /// Pause after a non-timeout failure
    pub error_cooldown: Duration,
    /// Consecutive non-timeout failures that abort the run
    pub max_consecutive_errors: u32,
    pub upsert_batch_size: usize,
    /// Lease lifetime for scheduled runs
    pub lease_ttl: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            page_delay: Duration::from_millis(1_500),
            max_timeout_retries: 3,
            timeout_backoff_base: Duration::from_millis(2_000),
            timeout_backoff_cap: Duration::from_millis(10_000),
            error_cooldown: Duration::from_millis(3_000),
            max_consecutive_errors: 3,
            upsert_batch_size: 500,
            lease_ttl: Duration::from_secs(2 * 60 * 60),
        }
    }
}

impl PipelineConfig {
    /// Backoff before timeout retry number `attempt` (1-based)
    pub fn timeout_backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.timeout_backoff_base
            .saturating_mul(factor)
            .min(self.timeout_backoff_cap)
    }

    /// Configuration with every delay set to zero, for tests and dry runs
    pub fn without_delays() -> Self {
        Self {
            page_delay: Duration::ZERO,
            timeout_backoff_base: Duration::ZERO,
            timeout_backoff_cap: Duration::ZERO,
            error_cooldown: Duration::ZERO,
            ..Self::default()
        }
    }
}
