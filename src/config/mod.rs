//! Configuration management for regwatch.
//!
//! Configuration is read from `~/.config/regwatch/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

pub mod crawler;

pub use crawler::{CrawlerConfig, DEFAULT_WORKERS};

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::{builtin_sites, Dialect, SiteDescriptor};

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub store: StoreConfig,
    pub licenses: LicenseConfig,
    /// Extra sites, or replacements for built-in ones with the same province.
    pub sites: Vec<SiteEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding one database file per schema (default: platform data dir)
    pub data_dir: Option<PathBuf>,
    pub schema: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            schema: "fic".to_string(),
        }
    }
}

/// Central-bank license registries. `{}` in a registry URL is the page number.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseConfig {
    pub registered_url: String,
    pub revoked_url: String,
    pub notice_directory_url: String,
    pub notice_keyword: String,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            registered_url: "https://www.pbc.gov.cn/zhengwugongkai/4081330/4081344/4081407/4081702/4081749/4081783/9398ddc0-{}.html".to_string(),
            revoked_url: "https://www.pbc.gov.cn/zhengwugongkai/4081330/4081344/4081407/4081702/4081749/4081786/63ead9a6-{}.html".to_string(),
            notice_directory_url: "https://www.pbc.gov.cn/zhengwugongkai/4081330/4081344/4081407/4081702/4081749/4693227/index.html".to_string(),
            notice_keyword: "非银行支付机构重大事项变更许可信息公示".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteEntry {
    pub province: String,
    pub base_url: String,
    /// Overrides the template chosen from the province name.
    pub dialect: Option<Dialect>,
}

impl From<&SiteEntry> for SiteDescriptor {
    fn from(entry: &SiteEntry) -> Self {
        let site = SiteDescriptor::new(entry.province.clone(), entry.base_url.clone());
        match entry.dialect {
            Some(dialect) => site.with_dialect(dialect),
            None => site,
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/regwatch/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("regwatch").join("config.toml"))
    }

    /// Built-in sites with configured entries applied on top.
    pub fn sites(&self) -> Vec<SiteDescriptor> {
        let mut sites = builtin_sites();
        for entry in &self.sites {
            let site = SiteDescriptor::from(entry);
            match sites.iter_mut().find(|s| s.province == site.province) {
                Some(existing) => *existing = site,
                None => sites.push(site),
            }
        }
        sites
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> String {
        r##"# regwatch configuration

[crawler]
# Concurrent fetches. Keep this small; branch sites block aggressive clients.
workers = 3

# Request deadlines in seconds
timeout_secs = 5
license_timeout_secs = 15

# Retries after a failed connection attempt
max_retries = 3

# Pause after each detail-page fetch (milliseconds)
detail_delay_ms = 200

# Listing pages visited per site
max_pages = 5

# Visit detail pages to collect attachment links
collect_attachments = true

[store]
# One SQLite file per schema is created here (default: platform data dir)
# data_dir = "/var/lib/regwatch"
schema = "fic"

# Add a site, or replace a built-in one with the same province:
# [[sites]]
# province = "海南省"
# base_url = "https://haikou.pbc.gov.cn/haikou/132982/133000/133007/index.html"
# dialect = "standard"
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_deserializes() {
        let content = Config::default_config_content();
        let config: Config = toml::from_str(&content).expect("Default config should be valid TOML");

        assert_eq!(config.crawler.workers, 3);
        assert_eq!(config.store.schema, "fic");
        assert!(config.sites.is_empty());
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[crawler]
workers = 5
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        assert_eq!(config.crawler.workers, 5);
        assert_eq!(config.crawler.timeout_secs, 5);
        assert!(config.licenses.registered_url.contains("{}"));
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");
        assert_eq!(config.sites().len(), 36);
    }

    #[test]
    fn test_site_overrides() {
        let content = r##"
[[sites]]
province = "海南省"
base_url = "http://localhost/hainan/index.html"
dialect = "special"

[[sites]]
province = "测试省"
base_url = "http://localhost/test/index.html"
"##;
        let config: Config = toml::from_str(content).unwrap();
        let sites = config.sites();
        assert_eq!(sites.len(), 37);

        let hainan = sites.iter().find(|s| s.province == "海南省").unwrap();
        assert_eq!(hainan.base_url, "http://localhost/hainan/index.html");
        assert_eq!(hainan.dialect, Dialect::Special);

        let added = sites.iter().find(|s| s.province == "测试省").unwrap();
        assert_eq!(added.dialect, Dialect::Standard);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[store]\nschema = \"test\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.store.schema, "test");

        fs::write(&path, "[store\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse { .. })));
    }
}
