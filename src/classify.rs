use reqwest::header::{HeaderMap, CONTENT_TYPE};
use serde_json::Value;

use crate::QxError;

/// One transport round trip before classification.
#[derive(Debug)]
pub(crate) struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// Transport-level failure feeding the classifier.
#[derive(Debug)]
pub(crate) enum TransportFailure {
    /// The caller cancelled while the request was in flight.
    Cancelled,
    /// Anything else the transport reported.
    Other(String),
}

/// Classifies one transport round trip into a success value or a typed
/// error.
///
/// `text/html` bodies short-circuit to a raw-text success before the status
/// code is inspected. The upstream service serves maintenance and error
/// pages this way and callers receive them verbatim.
pub(crate) fn classify(
    url: &str,
    raw: Result<Option<RawResponse>, TransportFailure>,
) -> Result<Value, QxError> {
    let response = match raw {
        Err(TransportFailure::Cancelled) => return Err(QxError::RequestCancelled),
        Err(TransportFailure::Other(cause)) => return Err(QxError::Internal(cause)),
        Ok(None) => {
            return Err(QxError::NullResponse {
                url: url.to_owned(),
            })
        }
        Ok(Some(response)) => response,
    };

    let Some(body) = response.body else {
        return Err(QxError::NullResponseData {
            url: url.to_owned(),
        });
    };

    let content_type = response
        .headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if content_type.starts_with("text/html") {
        let text = String::from_utf8(body).map_err(|_| QxError::NullResponseData {
            url: url.to_owned(),
        })?;
        return Ok(Value::String(text));
    }

    let json: Value = serde_json::from_slice(&body)
        .map_err(|err| QxError::Internal(format!("response JSON parse failed: {err}")))?;

    if response.status != 200 {
        return Err(QxError::Http {
            status: response.status,
            message: error_envelope_message(&json),
        });
    }
    Ok(json)
}

/// Assembles a diagnostic from the server's `error` envelope, skipping
/// absent fields.
fn error_envelope_message(json: &Value) -> String {
    let Some(error) = json.get("error") else {
        return String::new();
    };
    let mut parts = Vec::new();
    if let Some(status) = error.get("status").and_then(Value::as_i64) {
        parts.push(format!("Status: {status}"));
    }
    if let Some(code) = error.get("code").and_then(Value::as_str) {
        parts.push(format!("Code: {code}"));
    }
    if let Some(message) = error.get("message").and_then(Value::as_str) {
        parts.push(format!("Msg: {message}"));
    }
    parts.join("; ")
}
