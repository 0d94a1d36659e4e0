//! Shape validation for check records read back from storage.
//!
//! Records are written by the CRUD layer, so anything may be on disk. A record
//! that fails here is skipped for the current sweep and never reaches a probe.

use serde_json::{Map, Value};
use url::Url;

use crate::error::ValidationError;
use crate::models::{CHECK_ID_LENGTH, Check, CheckState, HttpMethod, Protocol};

const MIN_TIMEOUT: u64 = 1;
const MAX_TIMEOUT: u64 = 5;

/// Turn a raw stored record into a [`Check`], or explain why it cannot be probed
pub fn validate_check(raw: &Value) -> Result<Check, ValidationError> {
    let record = raw.as_object().ok_or(ValidationError::NotAnObject)?;

    let id = non_empty_str(record, "id")?;
    if id.chars().count() != CHECK_ID_LENGTH {
        return Err(ValidationError::Field("id"));
    }

    let user_phone = non_empty_str(record, "userPhone")?;
    let protocol = parse_protocol(&non_empty_str(record, "protocol")?)?;
    let url = non_empty_str(record, "url")?;
    let target = Url::parse(&format!("{protocol}://{url}")).map_err(|_| ValidationError::Field("url"))?;
    if target.host_str().is_none_or(str::is_empty) {
        return Err(ValidationError::Field("url"));
    }
    let method = parse_method(&non_empty_str(record, "method")?)?;
    let success_codes = parse_success_codes(record.get("successCodes"))?;
    let timeout_seconds = parse_timeout(record.get("timeoutSeconds"))?;

    // Engine-owned fields are optional; anything unexpected means "never probed".
    let state = match record.get("state").and_then(Value::as_str) {
        Some("up") => CheckState::Up,
        Some("down") => CheckState::Down,
        _ => CheckState::Unknown,
    };
    let last_checked = record.get("lastChecked").and_then(Value::as_i64).filter(|ms| *ms > 0);

    Ok(Check {
        id,
        user_phone,
        protocol,
        url,
        method,
        success_codes,
        timeout_seconds,
        state,
        last_checked,
    })
}

fn non_empty_str(record: &Map<String, Value>, field: &'static str) -> Result<String, ValidationError> {
    record
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or(ValidationError::Field(field))
}

fn parse_protocol(raw: &str) -> Result<Protocol, ValidationError> {
    match raw.to_ascii_lowercase().as_str() {
        "http" => Ok(Protocol::Http),
        "https" => Ok(Protocol::Https),
        _ => Err(ValidationError::Field("protocol")),
    }
}

fn parse_method(raw: &str) -> Result<HttpMethod, ValidationError> {
    match raw.to_ascii_lowercase().as_str() {
        "get" => Ok(HttpMethod::Get),
        "post" => Ok(HttpMethod::Post),
        "put" => Ok(HttpMethod::Put),
        "delete" => Ok(HttpMethod::Delete),
        _ => Err(ValidationError::Field("method")),
    }
}

fn parse_success_codes(raw: Option<&Value>) -> Result<Vec<u16>, ValidationError> {
    let codes = raw
        .and_then(Value::as_array)
        .filter(|codes| !codes.is_empty())
        .ok_or(ValidationError::Field("successCodes"))?;

    codes
        .iter()
        .map(|code| {
            let code = code.as_i64().ok_or(ValidationError::Field("successCodes"))?;
            match u16::try_from(code) {
                Ok(code) if (100..=599).contains(&code) => Ok(code),
                _ => Err(ValidationError::StatusCode(code)),
            }
        })
        .collect()
}

fn parse_timeout(raw: Option<&Value>) -> Result<u64, ValidationError> {
    let raw = raw.ok_or(ValidationError::Field("timeoutSeconds"))?;
    match raw.as_u64() {
        Some(seconds) if (MIN_TIMEOUT..=MAX_TIMEOUT).contains(&seconds) => Ok(seconds),
        _ => Err(ValidationError::Timeout(raw.to_string())),
    }
}
