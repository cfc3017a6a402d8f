//! 📬 The response unpacker: where we open the envelope AND read the letter.
//!
//! Some engines hand back a structured error with a perfectly cheerful status code.
//! Transport-level success does not imply application-level success, so we check twice:
//! once for an engine error object in the body, once for the HTTP status.

use anyhow::Result;
use serde_json::Value;
use tracing::trace;

use crate::errors::{EngineError, HttpStatusError, MalformedResponseError};
use crate::transport::{HttpMethod, RawResponse};

/// 📬 Turn a raw response into JSON, or into the right kind of error.
///
/// In order:
/// 1. a body with `error.root_cause` is an [`EngineError`], whatever the status said;
/// 2. any other non-2xx is an [`HttpStatusError`];
/// 3. an empty 2xx body is `null` for HEAD and a [`MalformedResponseError`] for every other verb;
/// 4. a 2xx body that isn't JSON is a [`MalformedResponseError`];
/// 5. everything else comes back parsed and untouched.
pub fn unpack_response(response: RawResponse) -> Result<Value> {
    trace!("📬 Unpacking {} byte response from {} (status {})", response.body.len(), response.url, response.status);

    if response.body.trim().is_empty() {
        return match (response.is_success(), response.method) {
            (true, HttpMethod::Head) => Ok(Value::Null),
            (true, method) => Err(MalformedResponseError {
                url: response.url,
                detail: format!("{method} came back 2xx with an empty body"),
            }
            .into()),
            (false, _) => Err(status_error(response).into()),
        };
    }

    let parsed = serde_json::from_str::<Value>(&response.body);

    match parsed {
        Ok(value) => {
            if let Some(engine_error) = engine_error_from(&value, &response) {
                return Err(engine_error.into());
            }
            if !response.is_success() {
                return Err(status_error(response).into());
            }
            Ok(value)
        }
        Err(_) if !response.is_success() => Err(status_error(response).into()),
        Err(parse_error) => Err(MalformedResponseError {
            url: response.url,
            detail: format!("body is not valid JSON ({parse_error})"),
        }
        .into()),
    }
}

fn status_error(response: RawResponse) -> HttpStatusError {
    HttpStatusError {
        status: response.status,
        url: response.url,
        body: response.body,
    }
}

/// 🔍 `{"error": {"root_cause": [...]}}` is the engine's way of saying "no".
/// Details come from the first root cause, or from the error object itself if the list is empty.
fn engine_error_from(body: &Value, response: &RawResponse) -> Option<EngineError> {
    let error = body.get("error")?.as_object()?;
    let root_causes = error.get("root_cause")?.as_array()?;
    let cause = root_causes
        .first()
        .and_then(Value::as_object)
        .unwrap_or(error);

    Some(EngineError {
        reason: cause.get("reason").map(text_of).unwrap_or_default(),
        error_type: cause.get("type").map(text_of).unwrap_or_default(),
        index: cause.get("index").filter(|v| !v.is_null()).map(text_of),
        status: response.status,
        request_body: response.request_body.clone(),
    })
}

/// 🔤 Strings stay strings; anything else (numbers, objects, regret) gets its JSON spelling.
fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
