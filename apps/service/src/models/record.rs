use serde::{Deserialize, Serialize};

use super::check::{Check, CheckState};

/// Why a probe produced no response code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// DNS, connect, TLS or protocol failure
    Transport,
    /// The deadline elapsed before a response arrived
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeError {
    pub kind: ErrorKind,
    pub detail: String,
}

/// Result of a single probe. Exactly one of the two fields is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProbeError>,
}

impl Outcome {
    pub fn response(code: u16) -> Self {
        Self { response_code: Some(code), error: None }
    }

    pub fn transport(detail: impl Into<String>) -> Self {
        Self::failed(ErrorKind::Transport, detail)
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::failed(ErrorKind::Timeout, detail)
    }

    fn failed(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self { response_code: None, error: Some(ProbeError { kind, detail: detail.into() }) }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

/// One line of a check's result log. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub check: Check,
    pub outcome: Outcome,
    pub state: CheckState,
    pub alert: bool,
    /// Epoch milliseconds
    pub time: i64,
}

impl LogRecord {
    pub fn to_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
