//! Configuration file parser for ~/.config/mailcheck/config.toml.
//!
//! The config file is optional. A missing file yields `Config::default()`,
//! whose values are the built-in account constants. Unknown keys are accepted
//! by serde and logged as a warning, since they are usually typos.
use anyhow::Context;
use serde::Deserialize;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV_VAR: &str = "MAILCHECK_CONFIG";

const DEFAULT_FEED_URL: &str = "https://mail.google.com/gmail/feed/atom";
const DEFAULT_USERNAME: &str = "rlblaster";
const DEFAULT_PASSWORD_FILE: &str = "~/.xmonad/.pwd";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid feed URL '{url}': {reason}")]
    InvalidFeedUrl { url: String, reason: String },

    #[error("Cannot expand '~' in password_file: HOME environment variable not set")]
    NoHome,
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Account and transport settings for a single mail check.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// The password itself never lives here, only the path of the file holding it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Atom feed listing the unread messages.
    pub feed_url: String,

    /// Username offered when the feed endpoint asks for Basic credentials.
    pub username: String,

    /// File holding the plaintext password. A leading `~/` expands to `$HOME`.
    pub password_file: PathBuf,

    /// Upper bound for the whole fetch in seconds. Unset or 0 = no explicit
    /// timeout, the transport stack's own limits apply.
    pub timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            password_file: PathBuf::from(DEFAULT_PASSWORD_FILE),
            timeout_secs: None,
        }
    }
}

/// Maximum config file size (1 MB).
const MAX_FILE_SIZE: u64 = 1_048_576;

const KNOWN_KEYS: [&str; 4] = ["feed_url", "username", "password_file", "timeout_secs"];

/// Read the config file, `None` if it does not exist. At most
/// `MAX_FILE_SIZE` bytes are read.
fn read_config_file(path: &Path) -> Result<Option<String>, ConfigError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ConfigError::Io(e)),
    };

    let mut content = String::new();
    file.take(MAX_FILE_SIZE + 1).read_to_string(&mut content)?;
    if content.len() as u64 > MAX_FILE_SIZE {
        return Err(ConfigError::TooLarge(format!(
            "Config file exceeds {MAX_FILE_SIZE} bytes"
        )));
    }
    Ok(Some(content))
}

/// Top-level keys `Config` does not know, usually typos.
fn unknown_keys(raw: &toml::Table) -> Vec<&str> {
    raw.keys()
        .map(String::as_str)
        .filter(|key| !KNOWN_KEYS.contains(key))
        .collect()
}

impl Config {

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)`
    /// - `feed_url` that is not an http(s) URL → `Err(ConfigError::InvalidFeedUrl)`
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let Some(content) = read_config_file(path)? else {
            tracing::debug!(path = %path.display(), "No config file found, using defaults");
            return Ok(Self::default());
        };
        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        let raw: toml::Table = content.parse()?;
        for key in unknown_keys(&raw) {
            tracing::warn!(key = %key, "Unknown key in config file, ignoring");
        }

        let config: Config = toml::Value::Table(raw).try_into()?;
        config.validate()?;
        tracing::debug!(
            path = %path.display(),
            feed_url = %config.feed_url,
            username = %config.username,
            "Loaded configuration"
        );
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidFeedUrl {
            url: self.feed_url.clone(),
            reason,
        };

        let url = Url::parse(&self.feed_url).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(invalid(format!(
                "unsupported scheme '{scheme}' (only http/https allowed)"
            ))),
        }
    }

    /// The fetch timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// The password file path with a leading `~/` expanded against `$HOME`.
    pub fn password_path(&self) -> Result<PathBuf, ConfigError> {
        match self.password_file.strip_prefix("~") {
            Ok(rest) => {
                let home = std::env::var_os("HOME").ok_or(ConfigError::NoHome)?;
                Ok(PathBuf::from(home).join(rest))
            }
            Err(_) => Ok(self.password_file.clone()),
        }
    }
}

/// Resolve the config file location: `$MAILCHECK_CONFIG`, falling back to
/// `~/.config/mailcheck/config.toml`.
pub fn config_path() -> anyhow::Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
        return Ok(PathBuf::from(path));
    }
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("mailcheck")
        .join("config.toml"))
}

// ============================================================================
// Tests
// ============================================================================
