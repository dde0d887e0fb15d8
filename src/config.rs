//! Configuration for the feed pipeline, loaded from an optional TOML
//! file.
//!
//! A missing file yields `FeedConfig::default()`. Unknown keys are
//! silently ignored by serde, though a warning is logged when the file
//! contains potential typos.
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use url::Url;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds the maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// `feed_url` is not an absolute http(s) URL.
    #[error("Invalid feed URL: {0}")]
    InvalidFeedUrl(String),
}

// ============================================================================
// Configuration Struct
// ============================================================================

/// Feed pipeline configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be
/// specified. Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// URL of the RSS/Atom feed to fetch.
    pub feed_url: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Maximum accepted response body size in bytes.
    pub max_response_bytes: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            feed_url: "https://mizuk.elvish.me/atom.xml".to_string(),
            timeout_secs: 30,
            max_response_bytes: 10 * 1024 * 1024,
        }
    }
}

impl FeedConfig {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(FeedConfig::default())`
    /// - Empty file → `Ok(FeedConfig::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted, logged as warning
    /// - Invalid `feed_url` → `Err(ConfigError::InvalidFeedUrl)`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check file size before reading to bound memory use on a
        // corrupted or hostile config file.
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        // Parse as a raw table first to detect unknown keys
        if let Ok(raw) = content.parse::<toml::Table>() {
            let known_keys = ["feed_url", "timeout_secs", "max_response_bytes"];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: FeedConfig = toml::from_str(&content)?;
        config.validate()?;
        tracing::info!(path = %path.display(), url = %config.feed_url, "Loaded configuration");
        Ok(config)
    }

    /// Checks that `feed_url` is an absolute http(s) URL.
    fn validate(&self) -> Result<(), ConfigError> {
        let url =
            Url::parse(&self.feed_url).map_err(|e| ConfigError::InvalidFeedUrl(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ConfigError::InvalidFeedUrl(format!(
                "unsupported scheme: {scheme} (only http/https allowed)"
            ))),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
