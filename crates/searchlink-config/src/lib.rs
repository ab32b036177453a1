//! Configuration management for SearchLink.
//!
//! Parses `~/.searchlink.toml` with serde. Every option has a default, so a
//! missing file is equivalent to an empty one.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! Secret-bearing values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `pinboard_api_key`
//! - `amazon_partner`
//! - `itunes_affiliate`
//! - `tmdb_api_key`
//! - `lastfm_api_key`

mod history;
mod key;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub use history::{Browser, HistoryStore, HistoryType};
pub use key::{ConfigKey, ConfigValue};

/// Default configuration file, relative to the home directory.
const CONFIG_FILENAME: &str = "~/.searchlink.toml";

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the backup-before-overwrite flag.
    pub backup: Option<bool>,
    /// Override the end-of-run report flag.
    pub report: Option<bool>,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Append an HTML comment describing errors.
    pub debug: bool,
    /// Append an HTML comment reporting every substitution.
    pub report: bool,
    /// Log search progress (searching, throttling, validating) at info level.
    pub notifications: bool,
    /// Back up files to `*.bak` before overwriting them.
    pub backup: bool,
    /// Country used by store searches.
    pub country_code: String,
    /// Emit inline links instead of reference links.
    pub inline: bool,
    /// Prefix reference markers with a random `NNNN-` string.
    pub prefix_random: bool,
    /// Add the result title to emitted links.
    pub include_titles: bool,
    /// Confirm that emitted links resolve.
    pub validate_links: bool,
    /// Use the page title when the link text is empty.
    pub empty_uses_page_title: bool,
    /// Title template for social links (`%service%`, `%user%`, `%url%`).
    pub social_template: String,
    /// Affiliate string appended to iTunes URLs.
    pub itunes_affiliate: String,
    /// Amazon partner tag.
    pub amazon_partner: String,
    /// User-defined triggers mapped to a site or a URL template.
    pub custom_site_searches: BTreeMap<String, String>,
    /// Sources searched by a bare `!h`.
    pub history_types: Vec<HistoryType>,
    /// Pinboard API token (`user:TOKEN`).
    pub pinboard_api_key: String,
    /// The Movie Database API key. Without one, `tmdb` searches IMDb.
    pub tmdb_api_key: String,
    /// Last.fm API key.
    pub lastfm_api_key: String,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: true,
            report: false,
            notifications: false,
            backup: true,
            country_code: "US".to_owned(),
            inline: false,
            prefix_random: false,
            include_titles: false,
            validate_links: false,
            empty_uses_page_title: false,
            social_template: "%service%/%user%".to_owned(),
            itunes_affiliate: "&at=10l4tL&ct=searchlink".to_owned(),
            amazon_partner: String::new(),
            custom_site_searches: BTreeMap::new(),
            history_types: history::default_history_types(),
            pinboard_api_key: String::new(),
            tmdb_api_key: String::new(),
            lastfm_api_key: String::new(),
            config_path: None,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field name (e.g., "`pinboard_api_key`").
        field: String,
        /// Error message (e.g., "${`PINBOARD_TOKEN`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise loads
    /// `~/.searchlink.toml` when it exists and falls back to defaults.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else {
            let default_path = Self::default_path();
            if default_path.exists() {
                Self::load_from_file(&default_path)?
            } else {
                Self::default()
            }
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Location of the default configuration file.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathBuf::from(shellexpand::tilde(CONFIG_FILENAME).as_ref())
    }

    /// Parse configuration from TOML text and validate it.
    ///
    /// # Errors
    ///
    /// Returns error on malformed TOML, unset environment variables or
    /// invalid values.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.expand_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(backup) = settings.backup {
            self.backup = backup;
        }
        if let Some(report) = settings.report {
            self.report = report;
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml(&content)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Read an addressable option.
    #[must_use]
    pub fn get(&self, key: ConfigKey) -> ConfigValue {
        match key {
            ConfigKey::Debug => ConfigValue::Bool(self.debug),
            ConfigKey::Report => ConfigValue::Bool(self.report),
            ConfigKey::CountryCode => ConfigValue::Text(self.country_code.clone()),
            ConfigKey::Inline => ConfigValue::Bool(self.inline),
            ConfigKey::PrefixRandom => ConfigValue::Bool(self.prefix_random),
            ConfigKey::IncludeTitles => ConfigValue::Bool(self.include_titles),
            ConfigKey::ValidateLinks => ConfigValue::Bool(self.validate_links),
            ConfigKey::EmptyUsesPageTitle => ConfigValue::Bool(self.empty_uses_page_title),
        }
    }

    /// Write an addressable option.
    ///
    /// A value of the wrong shape for the key is ignored.
    pub fn set(&mut self, key: ConfigKey, value: ConfigValue) {
        match (key, value) {
            (ConfigKey::CountryCode, ConfigValue::Text(text)) => self.country_code = text,
            (ConfigKey::Debug, ConfigValue::Bool(flag)) => self.debug = flag,
            (ConfigKey::Report, ConfigValue::Bool(flag)) => self.report = flag,
            (ConfigKey::Inline, ConfigValue::Bool(flag)) => self.inline = flag,
            (ConfigKey::PrefixRandom, ConfigValue::Bool(flag)) => self.prefix_random = flag,
            (ConfigKey::IncludeTitles, ConfigValue::Bool(flag)) => self.include_titles = flag,
            (ConfigKey::ValidateLinks, ConfigValue::Bool(flag)) => self.validate_links = flag,
            (ConfigKey::EmptyUsesPageTitle, ConfigValue::Bool(flag)) => {
                self.empty_uses_page_title = flag;
            }
            _ => {}
        }
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.country_code, "country_code")?;
        if self.country_code.len() != 2 || !self.country_code.chars().all(char::is_alphabetic) {
            return Err(ConfigError::Validation(format!(
                "country_code must be a two-letter code, got {:?}",
                self.country_code
            )));
        }

        for (trigger, value) in &self.custom_site_searches {
            require_non_empty(trigger, "custom_site_searches key")?;
            if trigger.chars().any(char::is_whitespace) || trigger.starts_with('!') {
                return Err(ConfigError::Validation(format!(
                    "custom_site_searches key {trigger:?} must be a single word without '!'"
                )));
            }
            require_non_empty(value, &format!("custom_site_searches.{trigger}"))?;
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.pinboard_api_key = expand_env(&self.pinboard_api_key, "pinboard_api_key")?;
        self.amazon_partner = expand_env(&self.amazon_partner, "amazon_partner")?;
        self.itunes_affiliate = expand_env(&self.itunes_affiliate, "itunes_affiliate")?;
        self.tmdb_api_key = expand_env(&self.tmdb_api_key, "tmdb_api_key")?;
        self.lastfm_api_key = expand_env(&self.lastfm_api_key, "lastfm_api_key")?;
        Ok(())
    }
}

/// Expand `${VAR}` and `${VAR:-default}` references in a single value.
fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains('$') {
        return Ok(value.to_owned());
    }
    shellexpand::env(value)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", e.var_name),
        })
}
