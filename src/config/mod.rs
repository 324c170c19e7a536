//! Handler configuration.
//!
//! Both handlers load their configuration the same way; later sources
//! override earlier ones:
//! 1. `archival.yaml` in the current directory (if exists)
//! 2. File given by argument or by `ARCHIVAL_CONFIG` (if set)
//! 3. Environment variables `ARCHIVAL__SECTION__KEY`
//! 4. Plain environment variables (`BUCKET_NAME`, `TABLE_NAME`), as set on
//!    the Lambda functions

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::archive::{InvalidRecordPolicy, ProcessorOptions};
use crate::keyed_store::DEFAULT_TABLE_NAME;
use crate::object_store::ObjectStoreConfig;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "archival.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "ARCHIVAL_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "ARCHIVAL";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "ARCHIVAL_LOG";
/// Environment variable for log output format (`json` or `pretty`).
pub const LOG_FORMAT_ENV_VAR: &str = "ARCHIVAL_LOG_FORMAT";
/// Environment variable naming the archive bucket.
pub const BUCKET_NAME_ENV_VAR: &str = "BUCKET_NAME";
/// Environment variable naming the record table.
pub const TABLE_NAME_ENV_VAR: &str = "TABLE_NAME";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Required configuration value {0} is not set")]
    Missing(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
}

/// Retry policy for a single archive write.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WriteRetryConfig {
    /// Retries after the first attempt (0 disables retrying).
    pub max_retries: usize,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for WriteRetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            min_delay_ms: 50,
            max_delay_ms: 1000,
        }
    }
}

impl WriteRetryConfig {
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

/// Archival processor configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ArchiverConfig {
    /// Archive bucket. Required.
    pub bucket_name: Option<String>,
    /// Archive destination backend.
    pub object_store: ObjectStoreConfig,
    /// What to do with records that fail validation.
    pub invalid_records: InvalidRecordPolicy,
    /// Archive only TTL removals from the relay path too.
    pub relay_expiry_only: bool,
    /// Per-write retry policy.
    pub retry: WriteRetryConfig,
}

impl ArchiverConfig {
    /// Load and validate. A missing bucket fails here, before any batch is
    /// processed.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let config: Self = load_layered(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bucket()?;
        if self.retry.min_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::Invalid(format!(
                "retry.min_delay_ms ({}) exceeds retry.max_delay_ms ({})",
                self.retry.min_delay_ms, self.retry.max_delay_ms
            )));
        }
        Ok(())
    }

    pub fn bucket(&self) -> Result<&str, ConfigError> {
        self.bucket_name
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .ok_or(ConfigError::Missing(BUCKET_NAME_ENV_VAR))
    }

    pub fn processor_options(&self) -> ProcessorOptions {
        ProcessorOptions {
            key_prefix: self.object_store.prefix.clone(),
            invalid_records: self.invalid_records,
            relay_expiry_only: self.relay_expiry_only,
            retry: self.retry.clone(),
        }
    }
}

/// Seed writer configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Record table.
    pub table_name: String,
    /// Literal `name` of every seeded item.
    pub item_name: String,
    /// Lifetime of a seeded item before its TTL expires.
    pub ttl_seconds: u64,
    /// AWS region. Uses the default provider chain if not set.
    pub region: Option<String>,
    /// Custom endpoint URL (DynamoDB Local, LocalStack).
    pub endpoint: Option<String>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            item_name: "item".to_string(),
            ttl_seconds: 3600,
            region: None,
            endpoint: None,
        }
    }
}

impl SeedConfig {
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let config: Self = load_layered(path)?;
        if config.table_name.trim().is_empty() {
            return Err(ConfigError::Missing(TABLE_NAME_ENV_VAR));
        }
        Ok(config)
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

fn load_layered<T: DeserializeOwned>(path: Option<&str>) -> Result<T, ConfigError> {
    use ::config::{Config as ConfigLib, Environment, File, FileFormat};

    let mut builder = ConfigLib::builder()
        .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

    if let Some(config_path) = path {
        builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
    }

    if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
        builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
    }

    let config = builder
        .add_source(
            Environment::with_prefix(CONFIG_ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        // Plain variables set on the functions; nothing else is read unprefixed
        .set_override_option("bucket_name", std::env::var(BUCKET_NAME_ENV_VAR).ok())?
        .set_override_option("table_name", std::env::var(TABLE_NAME_ENV_VAR).ok())?
        .build()?;

    Ok(config.try_deserialize()?)
}
