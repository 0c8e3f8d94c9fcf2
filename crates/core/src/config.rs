//! Pipeline configuration.
//!
//! [`ProxyConfig`] holds what the ingestion pipeline needs at run time.
//! [`ConfigFile`] is the on-disk TOML form that also carries fetcher settings
//! and tagging rules.
//!
//! ```toml
//! [proxy]
//! fetch_error_message = "Could not fetch this article."
//! store_article_headers = true
//! reading_speed = 250.0
//! ignored_hosts = ["feedproxy.google.com", "t.co"]
//! ignored_patterns = ['https?://www\.lemonde\.fr/tiny.*']
//!
//! [fetch]
//! timeout = 10
//!
//! [[tagging_rules]]
//! domain = "github.com"
//! tags = ["code"]
//! ```

use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use crate::canonical::UrlParts;
use crate::tagger::TaggingRule;
use crate::{Result, ShelfmarkError};

pub const DEFAULT_FETCH_ERROR_MESSAGE: &str =
    "Shelfmark can't retrieve contents for this article. Please troubleshoot this issue.";

pub const DEFAULT_READING_SPEED: f64 = 200.0;

const DEFAULT_IGNORED_HOSTS: [&str; 2] = ["feedproxy.google.com", "feeds.reuters.com"];
const DEFAULT_IGNORED_PATTERNS: [&str; 1] = [r"https?://www\.lemonde\.fr/tiny.*"];

/// Tracking redirectors whose URLs are replaced outright, without keeping
/// them as the entry's origin.
///
/// Patterns are matched case-insensitively anywhere in the URL.
#[derive(Debug, Clone)]
pub struct IgnoreList {
    hosts: Vec<String>,
    patterns: Vec<Regex>,
}

impl IgnoreList {
    /// Builds an ignore list, compiling each pattern.
    ///
    /// # Errors
    ///
    /// Returns [`ShelfmarkError::ConfigError`] for a pattern that is not a valid regex.
    pub fn new<S: AsRef<str>>(hosts: Vec<String>, patterns: Vec<S>) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p.as_ref())
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| ShelfmarkError::ConfigError(format!("Invalid ignore pattern {:?}: {}", p.as_ref(), e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { hosts, patterns })
    }

    /// An ignore list that matches nothing.
    pub fn empty() -> Self {
        Self { hosts: Vec::new(), patterns: Vec::new() }
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// True when `url`'s host is listed or `url` matches one of the patterns.
    pub fn is_ignored(&self, url: &str) -> bool {
        if let Some(host) = UrlParts::parse(url).host
            && self.hosts.iter().any(|h| h == host)
        {
            return true;
        }

        self.patterns.iter().any(|p| p.is_match(url))
    }
}

impl Default for IgnoreList {
    fn default() -> Self {
        Self {
            hosts: DEFAULT_IGNORED_HOSTS.iter().map(|h| h.to_string()).collect(),
            patterns: DEFAULT_IGNORED_PATTERNS
                .iter()
                .map(|p| RegexBuilder::new(p).case_insensitive(true).build().expect("valid default pattern"))
                .collect(),
        }
    }
}

/// Settings consumed by [`crate::ContentProxy`].
///
/// # Example
///
/// ```rust
/// use shelfmark_core::ProxyConfig;
///
/// let config = ProxyConfig::builder()
///     .fetch_error_message("Nothing to read here.")
///     .store_article_headers(true)
///     .reading_speed(300.0)
///     .build();
/// assert!(config.store_article_headers);
/// ```
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Stored as the article body when fetching fails.
    pub fetch_error_message: String,
    /// Whether response headers are copied onto entries.
    pub store_article_headers: bool,
    /// Words per minute used for reading time.
    pub reading_speed: f64,
    pub ignore: IgnoreList,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            fetch_error_message: DEFAULT_FETCH_ERROR_MESSAGE.to_string(),
            store_article_headers: false,
            reading_speed: DEFAULT_READING_SPEED,
            ignore: IgnoreList::default(),
        }
    }
}

impl ProxyConfig {
    pub fn builder() -> ProxyConfigBuilder {
        ProxyConfigBuilder::new()
    }
}

/// Builder for ProxyConfig.
pub struct ProxyConfigBuilder {
    config: ProxyConfig,
}

impl ProxyConfigBuilder {
    pub fn new() -> Self {
        Self { config: ProxyConfig::default() }
    }

    pub fn fetch_error_message(mut self, value: impl Into<String>) -> Self {
        self.config.fetch_error_message = value.into();
        self
    }

    pub fn store_article_headers(mut self, value: bool) -> Self {
        self.config.store_article_headers = value;
        self
    }

    pub fn reading_speed(mut self, value: f64) -> Self {
        self.config.reading_speed = value;
        self
    }

    pub fn ignore(mut self, value: IgnoreList) -> Self {
        self.config.ignore = value;
        self
    }

    pub fn build(self) -> ProxyConfig {
        self.config
    }
}

impl Default for ProxyConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// `[proxy]` table of the configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProxySection {
    pub fetch_error_message: String,
    pub store_article_headers: bool,
    pub reading_speed: f64,
    pub ignored_hosts: Vec<String>,
    pub ignored_patterns: Vec<String>,
}

impl Default for ProxySection {
    fn default() -> Self {
        Self {
            fetch_error_message: DEFAULT_FETCH_ERROR_MESSAGE.to_string(),
            store_article_headers: false,
            reading_speed: DEFAULT_READING_SPEED,
            ignored_hosts: DEFAULT_IGNORED_HOSTS.iter().map(|h| h.to_string()).collect(),
            ignored_patterns: DEFAULT_IGNORED_PATTERNS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// `[fetch]` table of the configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FetchSection {
    /// Request timeout in seconds.
    pub timeout: Option<u64>,
    pub user_agent: Option<String>,
}

/// The TOML configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub proxy: ProxySection,
    pub fetch: FetchSection,
    pub tagging_rules: Vec<TaggingRule>,
}

impl ConfigFile {
    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ShelfmarkError::Io`] when the file cannot be read and
    /// [`ShelfmarkError::ConfigError`] when it is not valid TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ShelfmarkError::ConfigError(e.to_string()))
    }

    /// `<config dir>/shelfmark/config.toml`, when the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("shelfmark").join("config.toml"))
    }

    /// Builds the pipeline configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ShelfmarkError::ConfigError`] for a non-positive reading speed
    /// or an invalid ignore pattern.
    pub fn proxy_config(&self) -> Result<ProxyConfig> {
        let section = &self.proxy;
        if section.reading_speed.is_nan() || section.reading_speed <= 0.0 {
            return Err(ShelfmarkError::ConfigError(format!(
                "reading_speed must be positive, got {}",
                section.reading_speed
            )));
        }

        Ok(ProxyConfig {
            fetch_error_message: section.fetch_error_message.clone(),
            store_article_headers: section.store_article_headers,
            reading_speed: section.reading_speed,
            ignore: IgnoreList::new(section.ignored_hosts.clone(), section.ignored_patterns.clone())?,
        })
    }
}
