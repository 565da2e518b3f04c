//! Layered configuration.
//!
//! Values come from built-in defaults, then an optional TOML file, then
//! environment variables such as `BRIGADE__SCHEDULER__POOL_SIZE=4`, each
//! layer overriding the previous one.

use crate::conversation::ConversationSettings;
use crate::conversation::settings::parse_slot;
use crate::reminder::settings::{SchedulerSettings, SettingsError};
use ::config::{Config, Environment, File, FileFormat, Map};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "BRIGADE";

/// Separator between prefix, section, and key in environment variables.
pub const ENV_SEPARATOR: &str = "__";

/// Database connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum pooled connections.
    pub pool_size: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/brigade".to_owned(),
            pool_size: 8,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default `tracing` filter directive, used when `RUST_LOG` is unset.
    pub filter: String,
    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "brigade=info".to_owned(),
            json: false,
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrigadeConfig {
    /// Database connection.
    pub database: DatabaseSettings,
    /// Conversation wizards.
    pub conversation: ConversationSettings,
    /// Reminder scheduler.
    pub scheduler: SchedulerSettings,
    /// Logging.
    pub logging: LoggingSettings,
}

/// Configuration that cannot be loaded or is invalid.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or deserialised.
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    /// Scheduler settings are invalid.
    #[error(transparent)]
    Scheduler(#[from] SettingsError),

    /// A setting is out of range.
    #[error("invalid setting {key}: {reason}")]
    Invalid {
        /// Dotted key of the setting.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl BrigadeConfig {
    /// Loads the configuration from `file` (when given) and the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a source fails to load or a value is
    /// invalid.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_from(file, None)
    }

    /// Loads the configuration from `file` and an explicit environment map
    /// instead of the process environment when `env` is `Some`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a source fails to load or a value is
    /// invalid.
    pub fn load_from(
        file: Option<&Path>,
        env: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }
        let environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .source(env);
        let loaded: Self = builder.add_source(environment).build()?.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Parses a configuration from TOML text, without environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the text does not parse or a value is
    /// invalid.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let loaded: Self = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Checks values the type system cannot.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.pool_size == 0 {
            return Err(invalid("database.pool_size", "must be at least 1"));
        }
        let conversation = &self.conversation;
        if conversation.title_min_chars == 0 {
            return Err(invalid("conversation.title_min_chars", "must be at least 1"));
        }
        if conversation.assignee_page_size == 0 {
            return Err(invalid("conversation.assignee_page_size", "must be at least 1"));
        }
        if conversation.interval_choices_minutes.is_empty() {
            return Err(invalid("conversation.interval_choices_minutes", "must not be empty"));
        }
        if conversation.interval_choices_minutes.contains(&0) {
            return Err(invalid(
                "conversation.interval_choices_minutes",
                "intervals must be positive",
            ));
        }
        if let Some(slot) = conversation
            .time_slots
            .iter()
            .find(|slot| parse_slot(slot).is_none())
        {
            return Err(invalid(
                "conversation.time_slots",
                format!("'{slot}' is not HH:MM"),
            ));
        }
        self.scheduler.validate()?;
        Ok(())
    }
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.into(),
    }
}
