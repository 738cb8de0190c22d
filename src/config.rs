use serde::Deserialize;

use crate::ranges::{RangeDescriptor, RangePolicy};
use crate::telemetry_repo::export::DEFAULT_PAGE_SIZE;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub export: ExportConfig,
    /// Overrides the built-in range table when present.
    #[serde(default)]
    pub ranges: Option<Vec<RangeConfig>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Allowed CORS origins; empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_pool_size: u32,
    /// How long a request waits for a pooled connection before failing.
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Rows per page read during export (bounds resident rows).
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Clone, Deserialize)]
pub struct RangeConfig {
    pub key: String,
    pub lookback_secs: u64,
    /// Omit for ranges that always return raw rows.
    #[serde(default)]
    pub interval_secs: Option<u64>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Range table from `[[ranges]]`, or the built-in default.
    pub fn range_policy(&self) -> anyhow::Result<RangePolicy> {
        match &self.ranges {
            None => Ok(RangePolicy::default()),
            Some(ranges) => RangePolicy::new(
                ranges
                    .iter()
                    .map(|r| RangeDescriptor::new(&r.key, r.lookback_secs, r.interval_secs))
                    .collect(),
            ),
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.server.host.is_empty(),
            "server.host must be non-empty"
        );
        anyhow::ensure!(
            !self.database.path.is_empty(),
            "database.path must be non-empty"
        );
        anyhow::ensure!(
            self.database.max_pool_size > 0,
            "database.max_pool_size must be > 0, got {}",
            self.database.max_pool_size
        );
        anyhow::ensure!(
            self.database.acquire_timeout_secs > 0,
            "database.acquire_timeout_secs must be > 0, got {}",
            self.database.acquire_timeout_secs
        );
        anyhow::ensure!(
            self.export.page_size > 0,
            "export.page_size must be > 0, got {}",
            self.export.page_size
        );
        for origin in &self.server.cors_origins {
            anyhow::ensure!(
                axum::http::HeaderValue::from_str(origin).is_ok(),
                "server.cors_origins entry '{}' is not a valid origin",
                origin
            );
        }
        self.range_policy()?;
        Ok(())
    }
}
