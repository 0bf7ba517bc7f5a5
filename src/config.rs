//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP transport settings
    #[serde(default)]
    pub http: HttpConfig,

    /// WAF crawling behavior
    #[serde(default)]
    pub waf: WafConfig,

    /// CSW paging behavior
    #[serde(default)]
    pub csw: CswConfig,

    /// ERDDAP directory-listing quirks
    #[serde(default)]
    pub erddap: ErddapConfig,

    /// Public registry and CKAN settings
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Failure notification settings
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Stale-file cleanup settings
    #[serde(default)]
    pub clean: CleanConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::config("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::config("http.timeout_secs must be > 0"));
        }
        if self.csw.page_size == 0 {
            return Err(AppError::config("csw.page_size must be > 0"));
        }
        if self.csw.max_batches == 0 {
            return Err(AppError::config("csw.max_batches must be > 0"));
        }
        if self.registry.waf_url_root.trim().is_empty() {
            return Err(AppError::config("registry.waf_url_root is empty"));
        }
        Ok(())
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between document downloads in milliseconds
    #[serde(default)]
    pub request_delay_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: 0,
        }
    }
}

/// WAF crawl settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WafConfig {
    /// Maximum number of directory links to follow below the root
    #[serde(default = "defaults::max_depth")]
    pub max_depth: usize,
}

impl Default for WafConfig {
    fn default() -> Self {
        Self {
            max_depth: defaults::max_depth(),
        }
    }
}

/// CSW paging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CswConfig {
    /// Records requested per GetRecords page
    #[serde(default = "defaults::page_size")]
    pub page_size: u32,

    /// Upper bound on page requests against one endpoint, a safety
    /// valve for servers that never report completion
    #[serde(default = "defaults::max_batches")]
    pub max_batches: u32,
}

impl Default for CswConfig {
    fn default() -> Self {
        Self {
            page_size: defaults::page_size(),
            max_batches: defaults::max_batches(),
        }
    }
}

/// ERDDAP listing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErddapConfig {
    /// ERDDAP release that moved directory links from a `<pre>` block
    /// into a table; listings reporting an older (or unparsable)
    /// version use the pre-table markup
    #[serde(default = "defaults::erddap_version_threshold")]
    pub version_threshold: String,
}

impl Default for ErddapConfig {
    fn default() -> Self {
        Self {
            version_threshold: defaults::erddap_version_threshold(),
        }
    }
}

/// Public registry and CKAN settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Root URL where harvested documents are republished
    #[serde(default = "defaults::waf_url_root")]
    pub waf_url_root: String,

    /// CKAN API root; registration triggering is disabled when unset
    #[serde(default)]
    pub ckan_api: Option<String>,

    /// CKAN API key sent with job-creation requests
    #[serde(default)]
    pub ckan_api_key: Option<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            waf_url_root: defaults::waf_url_root(),
            ckan_api: None,
            ckan_api_key: None,
        }
    }
}

/// Failure notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// From address on failure notifications
    #[serde(default = "defaults::mail_sender")]
    pub sender: String,

    /// Seconds to wait before the same recipient can be mailed again
    #[serde(default = "defaults::throttle_secs")]
    pub throttle_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            sender: defaults::mail_sender(),
            throttle_secs: defaults::throttle_secs(),
        }
    }
}

/// Stale-file cleanup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanConfig {
    /// Days to keep an old record file before the sweep removes it
    #[serde(default = "defaults::retention_days")]
    pub retention_days: u64,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            retention_days: defaults::retention_days(),
        }
    }
}

mod defaults {
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; catalog-harvester/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_depth() -> usize {
        2
    }
    pub fn page_size() -> u32 {
        100
    }
    pub fn max_batches() -> u32 {
        10_000
    }
    pub fn erddap_version_threshold() -> String {
        "1.82".into()
    }
    pub fn waf_url_root() -> String {
        "http://registry.ioos.us/".into()
    }
    pub fn mail_sender() -> String {
        "admin@ioos.us".into()
    }
    pub fn throttle_secs() -> u64 {
        3600
    }
    pub fn retention_days() -> u64 {
        3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.http.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_page_size() {
        let mut config = Config::default();
        config.csw.page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [csw]
            page_size = 25
            "#,
        )
        .unwrap();
        assert_eq!(config.csw.page_size, 25);
        assert_eq!(config.csw.max_batches, 10_000);
        assert_eq!(config.waf.max_depth, 2);
        assert_eq!(config.erddap.version_threshold, "1.82");
    }
}
