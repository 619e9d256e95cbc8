//! Connection Settings
//!
//! This module defines the typed connection settings for a database target
//! and their decoding from the generic settings map handed over by the
//! calling orchestrator.
//!
//! # Decoding Strategy
//! - Field-by-field validated extraction (no weak/lossy decode)
//! - Unknown/extra keys are ignored
//! - A known key with the wrong JSON type is a `Config` error naming the key
//! - `host`, `username`, and `password` are required; everything else has a
//!   default or is optional

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::error::{GrantorError, Result};

/// Default MySQL server port
pub const DEFAULT_PORT: u16 = 3306;

/// Connection settings for one logical database target
///
/// Rotation returns an updated copy of this struct with `password`
/// replaced; the orchestrator is expected to persist it.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// Server hostname
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Privileged account name used to manage other accounts
    pub username: String,

    /// Privileged account password
    /// WARNING: Sensitive data, do not log or include in error messages
    pub password: String,

    /// Default database to connect to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Upper bound on one lifecycle operation's database section, in
    /// milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_timeout_ms: Option<u64>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl ConnectionSettings {
    /// Create settings for the given server and privileged account
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
            database: None,
            operation_timeout_ms: None,
        }
    }

    /// Decode settings from a generic settings map
    ///
    /// Extracts each known key with type validation. Extra keys are ignored
    /// so the same map can carry orchestrator- or engine-specific fields.
    pub fn from_settings(settings: &Map<String, Value>) -> Result<Self> {
        let host = require_str(settings, "host")?;
        let username = require_str(settings, "username")?;
        let password = require_str(settings, "password")?;

        let port = match optional_u64(settings, "port")? {
            Some(raw) => u16::try_from(raw).map_err(|_| {
                GrantorError::config(format!("setting 'port' is out of range: {raw}"))
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            host,
            port,
            username,
            password,
            database: optional_str(settings, "database")?,
            operation_timeout_ms: optional_u64(settings, "operation_timeout_ms")?,
        })
    }

    /// Per-operation deadline, if configured
    #[must_use]
    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_ms.map(Duration::from_millis)
    }
}

// Passwords must never reach logs, so Debug redacts the field.
impl std::fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("operation_timeout_ms", &self.operation_timeout_ms)
            .finish()
    }
}

/// Extract a required string setting
fn require_str(settings: &Map<String, Value>, key: &str) -> Result<String> {
    match settings.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(GrantorError::config(format!(
            "setting '{key}' must be a string, got {}",
            json_type_name(other)
        ))),
        None => Err(GrantorError::config(format!("setting '{key}' is required"))),
    }
}

/// Extract an optional string setting
fn optional_str(settings: &Map<String, Value>, key: &str) -> Result<Option<String>> {
    match settings.get(key) {
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Null) | None => Ok(None),
        Some(other) => Err(GrantorError::config(format!(
            "setting '{key}' must be a string, got {}",
            json_type_name(other)
        ))),
    }
}

/// Extract an optional non-negative integer setting
fn optional_u64(settings: &Map<String, Value>, key: &str) -> Result<Option<u64>> {
    match settings.get(key) {
        Some(Value::Number(n)) => n.as_u64().map(Some).ok_or_else(|| {
            GrantorError::config(format!("setting '{key}' must be a non-negative integer"))
        }),
        Some(Value::Null) | None => Ok(None),
        Some(other) => Err(GrantorError::config(format!(
            "setting '{key}' must be an integer, got {}",
            json_type_name(other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
