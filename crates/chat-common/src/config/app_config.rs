//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub view: ViewConfig,
    pub reactions: ReactionConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Message rendering settings
#[derive(Debug, Clone, Deserialize)]
pub struct ViewConfig {
    /// chrono format string for the short timestamp next to each message
    #[serde(default = "default_time_format")]
    pub time_format: String,
    /// Fade destroyed messages out instead of removing them immediately
    #[serde(default = "default_true")]
    pub animate: bool,
    #[serde(default = "default_fade_out_ms")]
    pub fade_out_ms: u64,
    /// Render image OOB URLs as inline images rather than links
    #[serde(default = "default_true")]
    pub show_images_inline: bool,
    /// Replacement for `geo:` URIs; `$1` is latitude and `$2` longitude
    #[serde(default = "default_geouri_replacement")]
    pub geouri_replacement: String,
}

impl ViewConfig {
    #[must_use]
    pub fn fade_out(&self) -> Duration {
        Duration::from_millis(self.fade_out_ms)
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            time_format: default_time_format(),
            animate: true,
            fade_out_ms: default_fade_out_ms(),
            show_images_inline: true,
            geouri_replacement: default_geouri_replacement(),
        }
    }
}

/// Reaction reconciliation settings
#[derive(Debug, Clone, Deserialize)]
pub struct ReactionConfig {
    /// Period of the sweep that retries reactions whose target was missing
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
    /// Reconcile pending reactions as soon as their target is attached
    #[serde(default = "default_true")]
    pub resolve_on_attach: bool,
}

impl ReactionConfig {
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

impl Default for ReactionConfig {
    fn default() -> Self {
        Self {
            sweep_interval_ms: default_sweep_interval_ms(),
            resolve_on_attach: true,
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "chat-view".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_true() -> bool {
    true
}

fn default_time_format() -> String {
    "%H:%M".to_string()
}

fn default_fade_out_ms() -> u64 {
    600
}

fn default_geouri_replacement() -> String {
    "https://www.openstreetmap.org/?mlat=$1&mlon=$2#map=18/$1/$2".to_string()
}

fn default_sweep_interval_ms() -> u64 {
    2000
}

/// Read and parse an optional variable, failing on unparsable values
fn parse_var<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(name, raw)),
        Err(_) => Ok(None),
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable is set to a value that cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let env = match env::var("APP_ENV") {
            Ok(raw) => Environment::parse(&raw).ok_or(ConfigError::InvalidValue("APP_ENV", raw))?,
            Err(_) => default_env(),
        };

        let sweep_interval_ms =
            parse_var("REACTION_SWEEP_INTERVAL_MS")?.unwrap_or_else(default_sweep_interval_ms);
        if sweep_interval_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "REACTION_SWEEP_INTERVAL_MS",
                "0".to_string(),
            ));
        }

        Ok(Self {
            app: AppSettings {
                name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
                env,
            },
            view: ViewConfig {
                time_format: env::var("VIEW_TIME_FORMAT").unwrap_or_else(|_| default_time_format()),
                animate: parse_var("VIEW_ANIMATE")?.unwrap_or(true),
                fade_out_ms: parse_var("VIEW_FADE_OUT_MS")?.unwrap_or_else(default_fade_out_ms),
                show_images_inline: parse_var("VIEW_SHOW_IMAGES_INLINE")?.unwrap_or(true),
                geouri_replacement: env::var("VIEW_GEOURI_REPLACEMENT")
                    .unwrap_or_else(|_| default_geouri_replacement()),
            },
            reactions: ReactionConfig {
                sweep_interval_ms,
                resolve_on_attach: parse_var("REACTION_RESOLVE_ON_ATTACH")?.unwrap_or(true),
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
