//! Directory runtime configuration.
//!
//! # Responsibility
//! - Resolve search tuning once at startup and pass it into services.
//! - Validate values before any service is constructed.
//!
//! # Invariants
//! - `min_query_length >= 1`.
//! - `identifier_search_template` contains `@SEARCH@` and compiles once the
//!   placeholder is substituted.

use regex::Regex;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Placeholder replaced by the escaped search text.
pub const SEARCH_PLACEHOLDER: &str = "@SEARCH@";

pub const DEFAULT_MIN_QUERY_LENGTH: usize = 3;
/// Leading zeros and an optional `-<check digit>` suffix are tolerated.
pub const DEFAULT_IDENTIFIER_SEARCH_TEMPLATE: &str = "^0*@SEARCH@([A-Z]+-[0-9])?$";

/// Search tuning shared by the service and storage layers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DirectoryConfig {
    /// Free-text queries shorter than this return nothing.
    pub min_query_length: usize,
    /// Regex template used by identifier pattern search.
    pub identifier_search_template: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            min_query_length: DEFAULT_MIN_QUERY_LENGTH,
            identifier_search_template: DEFAULT_IDENTIFIER_SEARCH_TEMPLATE.to_string(),
        }
    }
}

impl DirectoryConfig {
    /// Parses and validates a JSON config document.
    ///
    /// Missing keys fall back to defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_query_length == 0 {
            return Err(ConfigError::InvalidMinQueryLength);
        }
        if !self.identifier_search_template.contains(SEARCH_PLACEHOLDER) {
            return Err(ConfigError::MissingPlaceholder(
                self.identifier_search_template.clone(),
            ));
        }
        Regex::new(&self.identifier_search_template.replace(SEARCH_PLACEHOLDER, "x")).map_err(
            |err| ConfigError::InvalidTemplate {
                template: self.identifier_search_template.clone(),
                message: err.to_string(),
            },
        )?;
        Ok(())
    }

    /// Builds the identifier pattern for `query` with regex metacharacters escaped.
    pub fn identifier_pattern(&self, query: &str) -> String {
        self.identifier_search_template
            .replace(SEARCH_PLACEHOLDER, &regex::escape(query))
    }
}

/// Configuration load/validation errors.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: String, message: String },
    Parse(serde_json::Error),
    InvalidMinQueryLength,
    MissingPlaceholder(String),
    InvalidTemplate { template: String, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "failed to read config `{path}`: {message}"),
            Self::Parse(err) => write!(f, "invalid config document: {err}"),
            Self::InvalidMinQueryLength => write!(f, "min_query_length must be at least 1"),
            Self::MissingPlaceholder(template) => write!(
                f,
                "identifier_search_template `{template}` must contain {SEARCH_PLACEHOLDER}"
            ),
            Self::InvalidTemplate { template, message } => {
                write!(f, "identifier_search_template `{template}` is not a valid regex: {message}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}
