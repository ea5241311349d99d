//! Service configuration for assignment generation and notifications.
//!
//! # Responsibility
//! - Load global defaults (sender, template, format, attempt budget).
//! - Reject misconfiguration once at startup, never per call.
//!
//! # Invariants
//! - A config that passed `validate()` has no blank fields and
//!   `max_attempts >= 1`.

use crate::model::participant::is_valid_email_address;
use crate::model::template::{EffectiveTemplateConfig, EmailFormat};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Global defaults for the exchange service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExchangeServiceConfig {
    /// Display name on outgoing mail unless overridden.
    pub sender_name: String,
    /// Envelope sender address; never overridden.
    pub sender_address: String,
    /// Template group holding every exchange template.
    pub template_group: String,
    pub default_email_format: EmailFormat,
    pub default_template_name: String,
    /// Upper bound on shuffles tried per generation request.
    pub max_attempts: u32,
}

impl ExchangeServiceConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Checks startup invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require("sender_name", &self.sender_name)?;
        require("sender_address", &self.sender_address)?;
        require("template_group", &self.template_group)?;
        require("default_template_name", &self.default_template_name)?;
        if !is_valid_email_address(&self.sender_address) {
            return Err(ConfigError::InvalidSenderAddress(
                self.sender_address.clone(),
            ));
        }
        if self.max_attempts < 1 {
            return Err(ConfigError::InvalidMaxAttempts(self.max_attempts));
        }
        Ok(())
    }

    /// Returns the bottom level of the template cascade.
    pub fn template_defaults(&self) -> EffectiveTemplateConfig {
        EffectiveTemplateConfig {
            sender_name: self.sender_name.clone(),
            email_format: self.default_email_format,
            template_group: self.template_group.clone(),
            template_name: self.default_template_name.clone(),
        }
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingValue(field));
    }
    Ok(())
}

/// Startup configuration failure. Always fatal.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    MissingValue(&'static str),
    InvalidSenderAddress(String),
    InvalidMaxAttempts(u32),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config document: {err}"),
            Self::MissingValue(field) => write!(f, "config value `{field}` is required"),
            Self::InvalidSenderAddress(value) => {
                write!(f, "config sender_address is malformed: `{value}`")
            }
            Self::InvalidMaxAttempts(value) => {
                write!(f, "config max_attempts must be at least 1, got {value}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}
