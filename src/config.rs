// File: ./src/config.rs
// Handles configuration loading and defaults.
use crate::schedule::MonthTable;
use anyhow::{Error, Result, anyhow, bail};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "cake.conf";

fn default_template() -> String {
    "http://%s/rest/api/content/%s".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct UrlConfig {
    /// Confluence host, substituted for the first `%s` of the template.
    #[serde(default)]
    pub host: String,
    /// Article URL with two `%s` placeholders: host, then article ID.
    #[serde(default = "default_template")]
    pub template: String,
}

impl Default for UrlConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            template: default_template(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub url: UrlConfig,
    /// How often the daemon refetches the page; 0 keeps the first fetch forever.
    #[serde(default)]
    pub refresh_interval_mins: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Replaces the built-in month names when not empty.
    #[serde(default)]
    pub months: BTreeMap<String, u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            login: String::new(),
            password: String::new(),
            url: UrlConfig::default(),
            refresh_interval_mins: 0,
            timeout_secs: default_timeout_secs(),
            months: BTreeMap::new(),
        }
    }
}

impl Config {
    /// `cake.conf` inside the user's configuration directory
    /// (`$HOME/.config/cake.conf` on Linux).
    pub fn default_path() -> Result<PathBuf> {
        let dirs = BaseDirs::new().ok_or_else(|| anyhow!("No home directory"))?;
        Ok(dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Load the configuration from `path`.
    /// Returns a contextualized error if reading or parsing fails.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(anyhow!("Config file not found: {}", path.display()));
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;

        Self::parse(&contents)
            .map_err(|e| anyhow!("Failed to parse config file '{}': {}", path.display(), e))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// True when `err`, or anything it wraps, reports a missing config file.
    pub fn is_missing_config_error(err: &Error) -> bool {
        err.chain().any(|cause| {
            cause.to_string().starts_with("Config file not found")
                || cause
                    .downcast_ref::<std::io::Error>()
                    .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound)
        })
    }

    pub fn with_credentials(mut self, login: &str, password: &str) -> Self {
        self.login = login.to_string();
        self.password = password.to_string();
        self
    }

    pub fn ensure_credentials(&self) -> Result<()> {
        if self.login.is_empty() || self.password.is_empty() {
            bail!("Both login and password are required (command line or config file)");
        }
        Ok(())
    }

    /// Builds the article URL for `id` from the configured template.
    pub fn article_url(&self, id: &str) -> Result<String> {
        if self.url.host.is_empty() {
            bail!("No Confluence host configured; set url.host or pass --url");
        }
        if self.url.template.matches("%s").count() != 2 {
            bail!(
                "URL template '{}' must contain exactly two %s placeholders",
                self.url.template
            );
        }
        Ok(self
            .url
            .template
            .replacen("%s", &self.url.host, 1)
            .replacen("%s", id, 1))
    }

    pub fn month_table(&self) -> Result<MonthTable> {
        if self.months.is_empty() {
            return Ok(MonthTable::default());
        }
        if let Some((name, month)) = self.months.iter().find(|(_, m)| !(1..=12).contains(*m)) {
            bail!("Month '{}' maps to {}, expected 1..=12", name, month);
        }
        Ok(MonthTable::from_pairs(
            self.months.iter().map(|(name, month)| (name, *month)),
        ))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_mins > 0).then(|| Duration::from_secs(self.refresh_interval_mins * 60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_file_uses_defaults() {
        let cfg = Config::parse("login = \"bot\"\npassword = \"hunter2\"\n").unwrap();
        assert_eq!(cfg.login, "bot");
        assert_eq!(cfg.url.template, "http://%s/rest/api/content/%s");
        assert_eq!(cfg.timeout(), Duration::from_secs(30));
        assert_eq!(cfg.refresh_interval(), None);
        assert!(cfg.ensure_credentials().is_ok());
    }

    #[test]
    fn test_article_url() {
        let cfg = Config::parse(
            r#"
            login = "bot"
            password = "x"
            [url]
            host = "wiki.example.com"
            "#,
        )
        .unwrap();
        assert_eq!(
            cfg.article_url("12345").unwrap(),
            "http://wiki.example.com/rest/api/content/12345"
        );
    }

    #[test]
    fn test_article_url_needs_host_and_placeholders() {
        let mut cfg = Config::default();
        assert!(cfg.article_url("1").is_err());
        cfg.url.host = "wiki".to_string();
        cfg.url.template = "https://%s/page".to_string();
        assert!(cfg.article_url("1").is_err());
    }

    #[test]
    fn test_missing_credentials() {
        let cfg = Config::parse("[url]\nhost = \"wiki\"\n").unwrap();
        assert!(cfg.ensure_credentials().is_err());
        assert!(cfg.with_credentials("a", "b").ensure_credentials().is_ok());
    }

    #[test]
    fn test_custom_months() {
        let cfg = Config::parse("[months]\njanvier = 1\n\"Février\" = 2\n").unwrap();
        let table = cfg.month_table().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.resolve("Février"), Some(2));
        assert_eq!(table.resolve("January"), None);

        let bad = Config::parse("[months]\nsmarch = 13\n").unwrap();
        assert!(bad.month_table().is_err());
    }

    #[test]
    fn test_refresh_interval() {
        let cfg = Config::parse("refresh_interval_mins = 15\ntimeout_secs = 0\n").unwrap();
        assert_eq!(cfg.refresh_interval(), Some(Duration::from_secs(900)));
        assert_eq!(cfg.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load(Path::new("/nonexistent/cake.conf")).unwrap_err();
        assert!(Config::is_missing_config_error(&err));
        assert!(Config::is_missing_config_error(&err.context("can't load config")));
        assert!(!Config::is_missing_config_error(&anyhow!("boom")));
    }

    #[test]
    fn test_syntax_error_is_reported() {
        assert!(Config::parse("login = ").is_err());
    }
}
