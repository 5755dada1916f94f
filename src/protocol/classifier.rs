//! Error classifier: wire statuses to the closed [`ErrorKind`] taxonomy.
//!
//! Two independent lookup tables — the legacy numeric status codes and the
//! newer error-class strings — merge into one `ErrorKind` space. Unknown
//! statuses classify as [`ErrorKind::UnknownServerError`] carrying the raw
//! value; the classifier never fails on malformed-but-parseable input.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;
use tracing::debug;

use crate::error::{CommandError, Error, ErrorKind, Result, ServerFrame};

use super::codec::{Response, Status};

// ============================================================================
// Status Tables
// ============================================================================

/// Maps a legacy numeric status code to an [`ErrorKind`].
///
/// `0` is success and never reaches this table.
#[must_use]
pub fn from_code(code: i64) -> Option<ErrorKind> {
    Some(match code {
        6 => ErrorKind::InvalidSessionId,
        7 => ErrorKind::NoSuchElement,
        8 => ErrorKind::NoSuchFrame,
        9 => ErrorKind::UnsupportedOperation,
        10 => ErrorKind::StaleElementReference,
        11 => ErrorKind::ElementNotVisible,
        12 | 15 => ErrorKind::ElementNotInteractable,
        13 => ErrorKind::UnknownServerError,
        17 => ErrorKind::ScriptError,
        19 | 32 => ErrorKind::InvalidSelector,
        21 | 28 => ErrorKind::Timeout,
        23 => ErrorKind::NoSuchWindow,
        24 => ErrorKind::InvalidCookieDomain,
        25 => ErrorKind::UnableToSetCookie,
        26 => ErrorKind::UnexpectedAlertOpen,
        27 => ErrorKind::NoSuchAlert,
        _ => return None,
    })
}

/// Maps an error-class string to an [`ErrorKind`].
#[must_use]
pub fn from_class(class: &str) -> Option<ErrorKind> {
    Some(match class {
        "no such element" => ErrorKind::NoSuchElement,
        "no such window" => ErrorKind::NoSuchWindow,
        "no such frame" => ErrorKind::NoSuchFrame,
        "no such alert" => ErrorKind::NoSuchAlert,
        "stale element reference" => ErrorKind::StaleElementReference,
        "element not visible" => ErrorKind::ElementNotVisible,
        "element not interactable" | "invalid element state" => {
            ErrorKind::ElementNotInteractable
        }
        "unknown command" | "unsupported operation" => ErrorKind::UnsupportedOperation,
        "invalid selector" => ErrorKind::InvalidSelector,
        "invalid cookie domain" => ErrorKind::InvalidCookieDomain,
        "unable to set cookie" => ErrorKind::UnableToSetCookie,
        "unexpected alert open" => ErrorKind::UnexpectedAlertOpen,
        "timeout" | "script timeout" => ErrorKind::Timeout,
        "javascript error" => ErrorKind::ScriptError,
        "invalid session id" => ErrorKind::InvalidSessionId,
        "unknown error" => ErrorKind::UnknownServerError,
        _ => return None,
    })
}

// ============================================================================
// Classify
// ============================================================================

/// Classifies a decoded response into its success value or a
/// [`CommandError`].
///
/// # Errors
///
/// Returns [`Error::Command`] for every non-success status. Unknown codes
/// and classes yield [`ErrorKind::UnknownServerError`] with the raw value
/// attached, never a decode failure.
pub fn classify(response: Response) -> Result<Value> {
    let (kind, detail) = match response.status {
        Status::Success => return Ok(response.value),
        Status::Code(code) => (from_code(code), format!("status code {code}")),
        Status::Class(ref class) => (from_class(class), format!("error class {class:?}")),
        Status::Transport(ref message) => {
            return Err(Error::transport(message.clone()));
        }
    };

    let message = error_message(&response.value, &detail);
    let stack = stack_frames(&response.value);

    let kind = kind.unwrap_or_else(|| {
        debug!(detail = %detail, "Unrecognized wire status");
        ErrorKind::UnknownServerError
    });

    let mut error = CommandError::new(kind, message).with_stack(stack);
    if kind == ErrorKind::UnknownServerError {
        error = error.with_raw(response.value);
    }
    Err(Error::Command(error))
}

/// Extracts the server's message, falling back to the status detail.
fn error_message(value: &Value, detail: &str) -> String {
    value
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map_or_else(|| format!("server reported {detail}"), str::to_string)
}

/// Extracts server stack frames, tolerating any shape.
fn stack_frames(value: &Value) -> Vec<ServerFrame> {
    value
        .get("stackTrace")
        .and_then(Value::as_array)
        .map(|frames| {
            frames
                .iter()
                .filter_map(|f| serde_json::from_value(f.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::command::SessionId;
    use serde_json::json;

    fn error_response(status: Status, value: Value) -> Response {
        Response {
            status,
            session_id: Some(SessionId::new("S1")),
            value,
        }
    }

    #[test]
    fn test_success_passes_value_through() {
        let value = classify(Response::success(None, json!({"ELEMENT": "element/0"})))
            .expect("success");
        assert_eq!(value, json!({"ELEMENT": "element/0"}));
    }

    #[test]
    fn test_numeric_table() {
        for (code, kind) in [
            (6, ErrorKind::InvalidSessionId),
            (7, ErrorKind::NoSuchElement),
            (10, ErrorKind::StaleElementReference),
            (11, ErrorKind::ElementNotVisible),
            (17, ErrorKind::ScriptError),
            (21, ErrorKind::Timeout),
            (23, ErrorKind::NoSuchWindow),
        ] {
            let err = classify(error_response(
                Status::Code(code),
                json!({"message": "boom"}),
            ))
            .unwrap_err();
            assert_eq!(err.kind(), Some(kind), "code {code}");
        }
    }

    #[test]
    fn test_class_table() {
        for (class, kind) in [
            ("no such element", ErrorKind::NoSuchElement),
            ("stale element reference", ErrorKind::StaleElementReference),
            ("element not interactable", ErrorKind::ElementNotInteractable),
            ("invalid selector", ErrorKind::InvalidSelector),
            ("script timeout", ErrorKind::Timeout),
            ("invalid session id", ErrorKind::InvalidSessionId),
        ] {
            let err = classify(error_response(
                Status::Class(class.to_string()),
                json!({"message": "boom"}),
            ))
            .unwrap_err();
            assert_eq!(err.kind(), Some(kind), "class {class}");
        }
    }

    #[test]
    fn test_unknown_code_is_safe() {
        let err = classify(error_response(
            Status::Code(9999),
            json!({"message": "novel failure", "extra": [1, 2, 3]}),
        ))
        .unwrap_err();

        assert_eq!(err.kind(), Some(ErrorKind::UnknownServerError));
        let Error::Command(command_error) = err else {
            panic!("expected command error");
        };
        assert_eq!(command_error.message, "novel failure");
        // Raw payload preserved for debugging.
        assert_eq!(command_error.raw, Some(json!({
            "message": "novel failure",
            "extra": [1, 2, 3],
        })));
    }

    #[test]
    fn test_missing_message_gets_fallback() {
        let err = classify(error_response(Status::Code(7), json!({}))).unwrap_err();
        let Error::Command(command_error) = err else {
            panic!("expected command error");
        };
        assert_eq!(command_error.message, "server reported status code 7");
    }

    #[test]
    fn test_server_stack_preserved() {
        let err = classify(error_response(
            Status::Code(13),
            json!({
                "message": "boom",
                "stackTrace": [
                    {
                        "className": "Driver",
                        "methodName": "perform",
                        "fileName": "Driver.java",
                        "lineNumber": 42
                    },
                    "not even an object"
                ]
            }),
        ))
        .unwrap_err();

        let Error::Command(command_error) = err else {
            panic!("expected command error");
        };
        assert_eq!(command_error.stack.len(), 1);
        assert_eq!(
            command_error.stack[0].method_name.as_deref(),
            Some("perform")
        );
        assert_eq!(command_error.stack[0].line_number, Some(42));
    }

    #[test]
    fn test_transport_status_classifies_as_transport_failure() {
        let err = classify(error_response(
            Status::Transport("HTTP 502 with no parseable body".to_string()),
            Value::Null,
        ))
        .unwrap_err();
        assert!(err.is_transport());
    }
}
