use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const MIN_REFRESH_INTERVAL_SECS: u64 = 10;
pub const MAX_REFRESH_INTERVAL_SECS: u64 = 600;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub yahoo: Option<YahooProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            yahoo: Some(YahooProviderConfig {
                base_url: "https://query1.finance.yahoo.com".to_string(),
            }),
        }
    }
}

fn default_logo_timeout() -> u64 {
    10
}

fn default_logo_min_bytes() -> usize {
    500
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LogoConfig {
    pub cache_dir: Option<String>,
    #[serde(default = "default_logo_timeout")]
    pub timeout_secs: u64,
    /// Bodies of this size or smaller are taken for placeholder icons.
    #[serde(default = "default_logo_min_bytes")]
    pub min_bytes: usize,
}

impl Default for LogoConfig {
    fn default() -> Self {
        LogoConfig {
            cache_dir: None,
            timeout_secs: default_logo_timeout(),
            min_bytes: default_logo_min_bytes(),
        }
    }
}

impl LogoConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.cache_dir {
            return Ok(PathBuf::from(custom_path));
        }
        let base_dirs = BaseDirs::new().context("Could not determine user cache directory")?;
        Ok(base_dirs.cache_dir().join("stockbar-logos"))
    }
}

fn default_refresh_interval() -> u64 {
    60
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub watchlist: Vec<String>,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub logos: LogoConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "stockbar", "stockbar")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let mut config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config.normalize_watchlist();
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Trims and upper-cases symbols, dropping blanks and repeats.
    pub fn normalize_watchlist(&mut self) {
        let mut seen = HashSet::new();
        self.watchlist = self
            .watchlist
            .iter()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty() && seen.insert(s.clone()))
            .collect();
    }

    pub fn yahoo_base_url(&self) -> &str {
        self.providers
            .yahoo
            .as_ref()
            .map_or("https://query1.finance.yahoo.com", |p| &p.base_url)
    }

    /// Poll interval, clamped to the supported range.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(
            self.refresh_interval_secs
                .clamp(MIN_REFRESH_INTERVAL_SECS, MAX_REFRESH_INTERVAL_SECS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
watchlist:
  - AAPL
  - BTC-USD
  - "^GSPC"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.watchlist, vec!["AAPL", "BTC-USD", "^GSPC"]);
        assert_eq!(config.refresh_interval_secs, 60);
        assert_eq!(config.yahoo_base_url(), "https://query1.finance.yahoo.com");
        assert_eq!(config.logos.timeout_secs, 10);
        assert_eq!(config.logos.min_bytes, 500);
        assert!(config.logos.cache_dir.is_none());

        let yaml_str_with_providers = r#"
watchlist: [MSFT]
refresh_interval_secs: 30
providers:
  yahoo:
    base_url: "http://example.com/yahoo"
logos:
  cache_dir: "/tmp/stockbar-test-logos"
  min_bytes: 64
        "#;
        let config_with_providers: AppConfig =
            serde_yaml::from_str(yaml_str_with_providers).unwrap();
        assert_eq!(
            config_with_providers.yahoo_base_url(),
            "http://example.com/yahoo"
        );
        assert_eq!(config_with_providers.refresh_interval(), Duration::from_secs(30));
        assert_eq!(config_with_providers.logos.min_bytes, 64);
        assert_eq!(config_with_providers.logos.timeout_secs, 10);
        assert_eq!(
            config_with_providers.logos.cache_path().unwrap(),
            PathBuf::from("/tmp/stockbar-test-logos")
        );
    }

    #[test]
    fn test_refresh_interval_is_clamped() {
        let config: AppConfig =
            serde_yaml::from_str("watchlist: []\nrefresh_interval_secs: 1").unwrap();
        assert_eq!(config.refresh_interval(), Duration::from_secs(10));

        let config: AppConfig =
            serde_yaml::from_str("watchlist: []\nrefresh_interval_secs: 3600").unwrap();
        assert_eq!(config.refresh_interval(), Duration::from_secs(600));
    }

    #[test]
    fn test_watchlist_is_normalized_on_load() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.yaml");
        fs::write(&path, "watchlist: [' aapl', btc-usd, AAPL, '  ', \"^gspc\"]\n")?;

        let config = AppConfig::load_from_path(&path)?;
        assert_eq!(config.watchlist, vec!["AAPL", "BTC-USD", "^GSPC"]);
        Ok(())
    }
}
