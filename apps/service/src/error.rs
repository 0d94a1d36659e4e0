use std::io::Error as IoError;

use thiserror::Error;

/// Failures of the record store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record {collection}/{id} not found")]
    NotFound { collection: &'static str, id: String },
    #[error("invalid record id: {0:?}")]
    InvalidId(String),
    #[error("record {collection}/{id} already exists")]
    AlreadyExists { collection: &'static str, id: String },
    #[error("{0:#}")]
    Io(#[from] IoError),
    #[error("record is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures of the per-check result log store
#[derive(Debug, Error)]
pub enum LogStoreError {
    #[error("{0:#}")]
    Io(#[from] IoError),
    #[error("invalid log name: {0:?}")]
    InvalidName(String),
}

/// Failures of the notification gateway
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("no notification gateway is configured")]
    NotConfigured,
    #[error("invalid recipient: {0:?}")]
    InvalidRecipient(String),
    #[error("message must be between 1 and {max} characters, got {len}")]
    InvalidMessage { len: usize, max: usize },
    #[error("gateway request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("gateway rejected the message with status {0}")]
    Rejected(u16),
}

/// Reasons a stored check record is rejected before probing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("missing or malformed field `{0}`")]
    Field(&'static str),
    #[error("`timeoutSeconds` must be an integer between 1 and 5, got {0}")]
    Timeout(String),
    #[error("status code {0} in `successCodes` is out of range")]
    StatusCode(i64),
}

/// Failures while loading or writing the configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[source] IoError),
    #[error("failed to write config: {0}")]
    Write(#[source] IoError),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("no config directory available, set XDG_CONFIG_HOME or HOME")]
    PathUnavailable,
    #[error("invalid config: {0}")]
    Invalid(String),
}
