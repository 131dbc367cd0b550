//! Mapping of provider responses onto the shared error vocabulary

use serde_json::Value;
use tracing::warn;

use super::error::{DebridError, Result};
use super::http::RawResponse;

/// Body returned by a provider once its error channel is ruled out
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    /// Body as received, for error reports
    pub fn raw(&self) -> String {
        match self {
            Payload::Json(value) => value.to_string(),
            Payload::Text(text) => text.clone(),
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            Payload::Json(value) => Some(value),
            Payload::Text(_) => None,
        }
    }
}

/// Real-Debrid `error_code` values
fn real_debrid_code(code: i64) -> Option<DebridError> {
    match code {
        8 => Some(DebridError::ExpiredApiKey),
        9 => Some(DebridError::AccessDenied),
        10 | 11 => Some(DebridError::TwoFactorAuth),
        20 => Some(DebridError::NotPremium),
        _ => None,
    }
}

/// Classify a Real-Debrid response.
///
/// An unparseable body is an empty result on success and a transport failure
/// otherwise. Any `error_code` fails, unknown codes carrying the raw body.
pub fn real_debrid(response: RawResponse) -> Result<Value> {
    let Some(data) = response.json() else {
        if response.status.as_u16() >= 400 {
            return Err(DebridError::Transport(format!(
                "empty response {}",
                response.status.as_u16()
            )));
        }
        return Ok(Value::Null);
    };

    let code = match data.get("error_code") {
        None | Some(Value::Null) => return Ok(data),
        Some(code) => code.as_i64().unwrap_or(-1),
    };

    if code == 0 {
        return Ok(data);
    }

    if let Some(err) = real_debrid_code(code) {
        return Err(err);
    }

    let message = data
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
        .to_string();
    warn!(code, %message, "Unrecognized Real-Debrid error");

    Err(DebridError::Provider {
        message: format!("Real-Debrid error {}: {}", code, message),
        raw: data.to_string(),
    })
}

/// Classify a TorrServer response.
///
/// 401 means the credentials were rejected; other non-2xx statuses are
/// transport failures. JSON bodies are parsed only when declared as such.
pub fn torrserver(response: RawResponse) -> Result<Payload> {
    let status = response.status;

    if status.as_u16() == 401 {
        return Err(DebridError::ExpiredApiKey);
    }

    if !status.is_success() {
        return Err(DebridError::Transport(format!(
            "TorrServer error: {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        )));
    }

    if response.is_json() {
        let value = serde_json::from_slice(&response.body)?;
        return Ok(Payload::Json(value));
    }

    Ok(Payload::Text(response.text()))
}
