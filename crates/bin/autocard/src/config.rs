//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `autocard.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Card settings.
    pub card: CardConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Output settings.
    pub output: OutputConfig,
}

/// Card header and integration filter settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CardConfig {
    /// Card title override (the catalog default applies when unset).
    pub title: Option<String>,
    /// Integration names override (the catalog default applies when empty).
    pub platforms: Vec<String>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Output configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print the emitted card configuration.
    pub pretty: bool,
}

impl Config {
    /// Load configuration from `autocard.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or a
    /// value fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("autocard.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("AUTOCARD_TITLE") {
            self.card.title = Some(val);
        }
        if let Ok(val) = std::env::var("AUTOCARD_PLATFORMS") {
            self.card.platforms = val
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
        }
        if let Ok(val) = std::env::var("AUTOCARD_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.card.title.as_deref() == Some("") {
            return Err(ConfigError::Validation("title must not be empty".to_string()));
        }
        if self.card.platforms.iter().any(String::is_empty) {
            return Err(ConfigError::Validation(
                "platform names must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "autocard=info".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
