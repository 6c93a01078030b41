//! AlertQL configuration.
//!
//! Values are layered: built-in defaults, then `alertql.toml`, then
//! environment variables prefixed with `ALERTQL_` (nested keys separated by
//! `__`, e.g. `ALERTQL_SQL__KEY_ALIAS=bucket`).
//!
//! # TOML Format
//!
//! ```toml
//! [sql]
//! timestamp_column = "_timestamp"
//! key_alias = "zo_sql_key"
//! value_alias = "zo_sql_val"
//! group_alias = "x_axis_2"
//!
//! [editor]
//! max_group_depth = 2
//! root_label = "or"
//!
//! [logging]
//! level = "info"
//! ```

use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::condition::Conjunction;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "alertql.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "ALERTQL_";

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A source could not be read or has the wrong shape.
    #[error("failed to load configuration: {0}")]
    Load(String),

    /// Configuration could not be written as TOML.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is out of range.
    #[error("invalid value for `{key}`: {message}")]
    Invalid {
        /// Dotted key of the offending value.
        key: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Column names and aliases of the preview query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlConfig {
    /// Timestamp column bucketed by `histogram()`.
    pub timestamp_column: String,
    /// Alias of the time bucket.
    pub key_alias: String,
    /// Alias of the aggregate value.
    pub value_alias: String,
    /// Alias of the concatenated group-by columns.
    pub group_alias: String,
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            timestamp_column: "_timestamp".to_string(),
            key_alias: "zo_sql_key".to_string(),
            value_alias: "zo_sql_val".to_string(),
            group_alias: "x_axis_2".to_string(),
        }
    }
}

/// Condition editor limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Deepest level a nested group may be added at; the root is level 0.
    pub max_group_depth: usize,
    /// Label of the root group of a new alert.
    pub root_label: Conjunction,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_group_depth: 2,
            root_label: Conjunction::Or,
        }
    }
}

/// Logging defaults; `RUST_LOG` takes precedence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertqlConfig {
    /// Preview query settings.
    pub sql: SqlConfig,
    /// Editor settings.
    pub editor: EditorConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl AlertqlConfig {
    /// Loads defaults, `alertql.toml` in the working directory if present,
    /// and the environment.
    ///
    /// # Errors
    ///
    /// See [`AlertqlConfig::load_from`].
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Loads defaults, the given TOML file if it exists, and the
    /// environment, then validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if a source is malformed or a value is invalid.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Loading configuration");
        let figment = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::extract(&figment)
    }

    /// Parses TOML on top of the defaults, ignoring the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or a value is invalid.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let figment =
            Figment::from(Serialized::defaults(Self::default())).merge(Toml::string(toml));
        Self::extract(&figment)
    }

    fn extract(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment
            .extract()
            .map_err(|err| ConfigError::Load(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.editor.max_group_depth == 0 {
            return Err(ConfigError::Invalid {
                key: "editor.max_group_depth",
                message: "must be at least 1".to_string(),
            });
        }

        let SqlConfig {
            timestamp_column,
            key_alias,
            value_alias,
            group_alias,
        } = &self.sql;
        for (key, value) in [
            ("sql.timestamp_column", timestamp_column),
            ("sql.key_alias", key_alias),
            ("sql.value_alias", value_alias),
            ("sql.group_alias", group_alias),
        ] {
            if !is_identifier(value) {
                return Err(ConfigError::Invalid {
                    key,
                    message: format!("`{value}` is not a plain SQL identifier"),
                });
            }
        }
        if key_alias == value_alias || key_alias == group_alias || value_alias == group_alias {
            return Err(ConfigError::Invalid {
                key: "sql",
                message: "query aliases must be distinct".to_string(),
            });
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "logging.level",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Renders the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
