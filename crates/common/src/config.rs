use crate::errors::{ConfigError, ConfigResult};
use crate::structured_logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_PAGE_SIZE: usize = 8;

/// Backend connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Bearer token; its presence makes the viewer authenticated
    pub token: Option<String>,
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Defaults applied to sections that don't override them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionDefaults {
    pub page_size: usize,
    /// How many candidates to request per fetch (falls back to page_size)
    pub fetch_limit: Option<usize>,
}

impl Default for SectionDefaults {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            fetch_limit: None,
        }
    }
}

impl SectionDefaults {
    pub fn effective_fetch_limit(&self) -> usize {
        self.fetch_limit.unwrap_or(self.page_size)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorefrontConfig {
    pub api: ApiConfig,
    pub sections: SectionDefaults,
    pub logging: LoggingConfig,
}

impl StorefrontConfig {
    /// Defaults overlaid with the process environment (and `.env` if present)
    pub fn from_env() -> ConfigResult<Self> {
        dotenv::dotenv().ok(); // Загружаем .env если есть

        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// TOML file overlaid with the process environment
    pub fn from_toml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.display().to_string(),
            source,
        })?;
        let mut config: Self = toml::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        info!("Loaded config from {}", path.display());

        dotenv::dotenv().ok();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> ConfigResult<()> {
        if let Some(url) = env_value("STOREFRONT_API_URL") {
            self.api.base_url = url;
        }
        if let Some(token) = env_value("STOREFRONT_API_TOKEN") {
            self.api.token = Some(token);
        }
        if let Some(timeout_ms) = env_parse("STOREFRONT_API_TIMEOUT_MS")? {
            self.api.timeout_ms = timeout_ms;
        }
        if let Some(page_size) = env_parse("STOREFRONT_PAGE_SIZE")? {
            self.sections.page_size = page_size;
        }
        if let Some(fetch_limit) = env_parse("STOREFRONT_FETCH_LIMIT")? {
            self.sections.fetch_limit = Some(fetch_limit);
        }
        if let Some(level) = env_value("STOREFRONT_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = env_parse("STOREFRONT_LOG_JSON")? {
            self.logging.json_output = json;
        }
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        url::Url::parse(&self.api.base_url)
            .map_err(|e| ConfigError::invalid("api.base_url", e.to_string()))?;
        if self.api.timeout_ms == 0 {
            return Err(ConfigError::invalid("api.timeout_ms", "must be greater than 0"));
        }
        if self.sections.page_size == 0 {
            return Err(ConfigError::invalid("sections.page_size", "must be at least 1"));
        }
        if self.sections.fetch_limit == Some(0) {
            return Err(ConfigError::invalid("sections.fetch_limit", "must be at least 1"));
        }
        Ok(())
    }
}

fn env_value(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => {
            debug!("{key} not set, keeping current value");
            None
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> ConfigResult<Option<T>>
where
    T::Err: Display,
{
    env_value(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| ConfigError::invalid(key, format!("{raw:?}: {e}")))
        })
        .transpose()
}
