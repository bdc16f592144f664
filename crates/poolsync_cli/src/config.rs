//! Configuration file support for poolsync.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI arguments and flags
//! 2. Environment variables (prefixed with `POOLSYNC_`, sections separated by
//!    `__`, e.g. `POOLSYNC_MAILCHIMP__API_KEY`)
//! 3. Local config file (./poolsync.toml)
//! 4. XDG config file (~/.config/poolsync/config.toml)
//! 5. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [cognito]
//! pool_id = "us-east-1_AbCdEfGhI"
//! page_size = 60
//!
//! [mailchimp]
//! api_key = "0123456789abcdef-us6"  # or use POOLSYNC_MAILCHIMP__API_KEY
//! list_id = "a1b2c3d4e5"
//!
//! [import]
//! max_attempts = 10       # omit to retry failed page fetches forever
//! initial_backoff_ms = 1000
//! max_backoff_ms = 60000
//! backoff_factor = 2.0
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use poolsync::import::{BACKOFF_FACTOR, INITIAL_BACKOFF_MS, MAX_BACKOFF_MS};
use poolsync::{BackoffPolicy, ImportOptions};
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// User pool to read from.
    pub cognito: CognitoConfig,
    /// Audience to write to.
    pub mailchimp: MailchimpConfig,
    /// Retry behaviour for the import.
    pub import: ImportConfig,
}

/// Cognito configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CognitoConfig {
    /// User pool id, `<region>_<id>`.
    pub pool_id: Option<String>,
    /// Users per page (1-60, provider default when unset).
    pub page_size: Option<i32>,
}

/// Mailchimp configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MailchimpConfig {
    /// API key, `<key>-<data center>`.
    /// Can also be set via POOLSYNC_MAILCHIMP__API_KEY environment variable.
    pub api_key: Option<String>,
    /// Audience (list) id.
    pub list_id: Option<String>,
}

/// Import retry configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Give up on a page after this many failed attempts. Unset retries forever.
    pub max_attempts: Option<u32>,
    /// Delay after the first failed fetch.
    pub initial_backoff_ms: u64,
    /// Ceiling for the retry delay.
    pub max_backoff_ms: u64,
    /// Growth factor between consecutive delays.
    pub backoff_factor: f32,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_attempts: None,
            initial_backoff_ms: INITIAL_BACKOFF_MS,
            max_backoff_ms: MAX_BACKOFF_MS,
            backoff_factor: BACKOFF_FACTOR,
        }
    }
}

impl ImportConfig {
    /// The backoff policy these settings describe.
    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_millis(self.initial_backoff_ms),
            Duration::from_millis(self.max_backoff_ms),
        )
        .with_factor(self.backoff_factor)
    }

    /// Session options, with `max_attempts` taken from the CLI when given.
    pub fn import_options(&self, max_attempts: Option<u32>) -> ImportOptions {
        ImportOptions::default()
            .with_backoff(self.backoff_policy())
            .with_max_attempts(max_attempts.or(self.max_attempts))
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/poolsync/config.toml)
    /// 3. Local config file (./poolsync.toml)
    /// 4. Environment variables with POOLSYNC_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            tracing::debug!("Loading config from {:?}", xdg_config);
            builder = builder.add_source(
                File::from(xdg_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let local_config = PathBuf::from("poolsync.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./poolsync.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // POOLSYNC_MAILCHIMP__API_KEY -> mailchimp.api_key
        builder = builder.add_source(Self::environment());

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    fn environment() -> Environment {
        Environment::with_prefix("POOLSYNC")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "poolsync").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
