//! Command codec: command values to transport requests and back.
//!
//! Encoding resolves the command's descriptor, substitutes URL-template
//! placeholders (consuming the matching parameters so they are not also
//! serialized into the body), and emits a [`TransportRequest`]. Decoding
//! turns a raw [`TransportResponse`] into a typed [`Response`] without
//! interpreting the value — classification is the classifier's job.
//!
//! Three decode outcomes are kept distinct:
//!
//! 1. A well-formed wire payload, success or error — typed [`Response`].
//! 2. A transport-level failure (non-2xx with no parseable body) — a
//!    synthesized [`Status::Transport`] response.
//! 3. A structural failure (garbage where JSON was mandatory) — fatal
//!    [`Error::Protocol`], surfaced immediately.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Map, Value, from_str};
use tracing::trace;

use crate::error::{Error, Result};

use super::command::{Command, SessionId};
use super::registry::{CommandId, Verb};

// ============================================================================
// TransportRequest
// ============================================================================

/// A serialized command ready for an executor to transmit.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    /// The command this request was encoded from. Executors use this for
    /// relay naming and retry policy; it is not part of the HTTP wire shape.
    pub command: CommandId,
    /// HTTP-like verb.
    pub verb: Verb,
    /// Resolved URL path (placeholders substituted).
    pub url: String,
    /// JSON body for POST commands. `None` for GET/DELETE.
    pub body: Option<Value>,
}

impl TransportRequest {
    /// Returns `true` if this request may be retried once on transport
    /// failure.
    #[inline]
    #[must_use]
    pub fn is_idempotent(&self) -> bool {
        self.verb.is_idempotent()
    }
}

// ============================================================================
// TransportResponse
// ============================================================================

/// A raw response as the executor received it.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code, or a synthesized equivalent for non-HTTP
    /// transports (200 for delivered relay responses).
    pub http_status: u16,
    /// Raw response body, if any.
    pub body: Option<String>,
}

impl TransportResponse {
    /// Creates a response from status and body text.
    #[inline]
    #[must_use]
    pub fn new(http_status: u16, body: impl Into<String>) -> Self {
        Self {
            http_status,
            body: Some(body.into()),
        }
    }

    /// Creates a bodyless response.
    #[inline]
    #[must_use]
    pub fn empty(http_status: u16) -> Self {
        Self {
            http_status,
            body: None,
        }
    }

    #[inline]
    fn is_http_success(&self) -> bool {
        (200..300).contains(&self.http_status)
    }
}

// ============================================================================
// Status
// ============================================================================

/// Decoded response status.
///
/// The wire uses two schemas: a legacy integer `status` field and a newer
/// error-class string. Both are carried as-is; the classifier merges them
/// into one [`crate::ErrorKind`] space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// The command succeeded.
    Success,
    /// Legacy numeric status code (non-zero).
    Code(i64),
    /// Error-class string from newer protocol variants.
    Class(String),
    /// Synthesized: the transport delivered no usable payload.
    Transport(String),
}

impl Status {
    /// Returns `true` for [`Status::Success`].
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

// ============================================================================
// Response
// ============================================================================

/// Typed wire response: status, session id, value.
///
/// When the status is not success, the value is the structured error object
/// (at least a `message` field). A `null` value under success is valid for
/// void commands.
#[derive(Debug, Clone)]
pub struct Response {
    /// Decoded status.
    pub status: Status,
    /// Session id echoed by the server, if any.
    pub session_id: Option<SessionId>,
    /// Response value, untouched by the codec.
    pub value: Value,
}

impl Response {
    /// Creates a success response.
    #[inline]
    #[must_use]
    pub fn success(session_id: Option<SessionId>, value: Value) -> Self {
        Self {
            status: Status::Success,
            session_id,
            value,
        }
    }
}

// ============================================================================
// Encode
// ============================================================================

/// Encodes a command into a transport request.
///
/// Walks the descriptor's URL template left-to-right; `{sessionId}` is
/// filled from the command's session id, any other `{placeholder}` consumes
/// the identically-named parameter. Remaining parameters become the JSON
/// body for POST; GET/DELETE carry no body.
///
/// # Errors
///
/// Returns [`Error::Protocol`] when a placeholder cannot be resolved —
/// that is a programming error, not a server condition.
pub fn encode(command: Command) -> Result<TransportRequest> {
    let descriptor = command.id.descriptor();
    let mut params = command.parameters;
    let mut url = String::with_capacity(descriptor.template.len());

    // Empty segments from leading/trailing slashes are skipped.
    for segment in descriptor.template.split('/') {
        if segment.is_empty() {
            continue;
        }

        url.push('/');
        if let Some(name) = placeholder_name(segment) {
            url.push_str(&resolve_placeholder(
                command.id,
                name,
                command.session_id.as_ref(),
                &mut params,
            )?);
        } else {
            url.push_str(segment);
        }
    }

    let body = match descriptor.verb {
        Verb::Post => Some(Value::Object(params)),
        Verb::Get | Verb::Delete => None,
    };

    trace!(command = %command.id, verb = %descriptor.verb, url = %url, "Encoded command");

    Ok(TransportRequest {
        command: command.id,
        verb: descriptor.verb,
        url,
        body,
    })
}

/// Returns the placeholder name if the segment is `{name}`.
fn placeholder_name(segment: &str) -> Option<&str> {
    segment.strip_prefix('{')?.strip_suffix('}')
}

/// Resolves one placeholder, consuming the matching parameter.
fn resolve_placeholder(
    id: CommandId,
    name: &str,
    session_id: Option<&SessionId>,
    params: &mut Map<String, Value>,
) -> Result<String> {
    if name == "sessionId" {
        return session_id
            .map(|s| s.as_str().to_string())
            .ok_or_else(|| Error::protocol(format!("{id} requires a session id")));
    }

    let value = params
        .remove(name)
        .ok_or_else(|| Error::protocol(format!("{id} is missing url parameter {{{name}}}")))?;

    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(Error::protocol(format!(
            "{id}: url parameter {{{name}}} must be a string or number, got {other}"
        ))),
    }
}

// ============================================================================
// Decode
// ============================================================================

/// Decodes a transport response into a typed [`Response`].
///
/// # Errors
///
/// Returns [`Error::Protocol`] only for structural failures: a 2xx response
/// whose body is not the mandatory JSON object. Transport-level failures
/// are not errors here; they decode to [`Status::Transport`] so the
/// classifier can produce a classified outcome.
pub fn decode(response: &TransportResponse) -> Result<Response> {
    let parsed = response
        .body
        .as_deref()
        .filter(|b| !b.trim().is_empty())
        .map(from_str::<Value>);

    let payload = match parsed {
        Some(Ok(value)) => value,
        Some(Err(parse_err)) if response.is_http_success() => {
            // JSON was mandatory here; this is a protocol-version mismatch.
            return Err(Error::protocol(format!(
                "response body is not valid JSON: {parse_err}"
            )));
        }
        Some(Err(_)) | None => {
            if response.is_http_success() && response.body.is_none() {
                // Void response from a server that omits the envelope.
                return Ok(Response::success(None, Value::Null));
            }
            return Ok(Response {
                status: Status::Transport(format!(
                    "transport returned HTTP {} with no parseable body",
                    response.http_status
                )),
                session_id: None,
                value: Value::Null,
            });
        }
    };

    let Some(object) = payload.as_object() else {
        return Err(Error::protocol(format!(
            "response payload is not a JSON object: {payload}"
        )));
    };

    let session_id = object
        .get("sessionId")
        .and_then(Value::as_str)
        .map(SessionId::new);
    let value = object.get("value").cloned().unwrap_or(Value::Null);

    let status = decode_status(object, &value, response);

    Ok(Response {
        status,
        session_id,
        value,
    })
}

/// Derives the [`Status`] from a parsed payload.
///
/// Legacy payloads carry an integer `status`; newer variants carry an error
/// class string, either as a string `status` or as `value.error`.
fn decode_status(
    object: &Map<String, Value>,
    value: &Value,
    response: &TransportResponse,
) -> Status {
    match object.get("status") {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(0) => Status::Success,
            Some(code) => Status::Code(code),
            // Non-integral status; keep the raw payload via the classifier.
            None => Status::Code(i64::MAX),
        },
        Some(Value::String(class)) => Status::Class(class.clone()),
        _ => {
            if let Some(class) = value.get("error").and_then(Value::as_str) {
                Status::Class(class.to_string())
            } else if response.is_http_success() {
                Status::Success
            } else {
                Status::Transport(format!(
                    "transport returned HTTP {} without a wire status",
                    response.http_status
                ))
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_placeholder_substitution_consumes_params() {
        let cmd = Command::new(CommandId::GetElementAttribute)
            .with_session(SessionId::new("abc"))
            .with_param("id", "element/3")
            .with_param("name", "value");

        let request = encode(cmd).expect("encode");
        assert_eq!(request.url, "/session/abc/element/element/3/attribute/value");
        assert_eq!(request.verb, Verb::Get);
        // GET carries no body; all params were consumed by the template.
        assert_eq!(request.body, None);
    }

    #[test]
    fn test_post_body_is_leftover_params() {
        let cmd = Command::new(CommandId::FindElement)
            .with_session(SessionId::new("S1"))
            .with_param("using", "id")
            .with_param("value", "main");

        let request = encode(cmd).expect("encode");
        assert_eq!(request.url, "/session/S1/element");
        assert_eq!(
            request.body,
            Some(json!({"using": "id", "value": "main"}))
        );
    }

    #[test]
    fn test_sessionless_command() {
        let request = encode(Command::new(CommandId::Status)).expect("encode");
        assert_eq!(request.url, "/status");
        assert_eq!(request.body, None);
    }

    #[test]
    fn test_missing_session_id_is_fatal() {
        let err = encode(Command::new(CommandId::GetCurrentUrl)).unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[test]
    fn test_missing_url_parameter_is_fatal() {
        let cmd = Command::new(CommandId::ClickElement).with_session(SessionId::new("S1"));
        let err = encode(cmd).unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[test]
    fn test_decode_legacy_success() {
        let raw = TransportResponse::new(
            200,
            r#"{"status": 0, "sessionId": "S1", "value": {"ELEMENT": "element/0"}}"#,
        );
        let response = decode(&raw).expect("decode");
        assert!(response.status.is_success());
        assert_eq!(
            response.session_id.as_ref().map(SessionId::as_str),
            Some("S1")
        );
        assert_eq!(response.value, json!({"ELEMENT": "element/0"}));
    }

    #[test]
    fn test_decode_null_value_is_success() {
        let raw = TransportResponse::new(200, r#"{"status": 0, "sessionId": null, "value": null}"#);
        let response = decode(&raw).expect("decode");
        assert!(response.status.is_success());
        assert_eq!(response.value, Value::Null);
    }

    #[test]
    fn test_decode_legacy_error_code() {
        let raw = TransportResponse::new(
            500,
            r#"{"status": 7, "sessionId": "S1", "value": {"message": "no match"}}"#,
        );
        let response = decode(&raw).expect("decode");
        assert_eq!(response.status, Status::Code(7));
        assert_eq!(response.value["message"], "no match");
    }

    #[test]
    fn test_decode_class_schema() {
        let raw = TransportResponse::new(
            404,
            r#"{"value": {"error": "no such element", "message": "no match"}}"#,
        );
        let response = decode(&raw).expect("decode");
        assert_eq!(
            response.status,
            Status::Class("no such element".to_string())
        );
    }

    #[test]
    fn test_decode_garbage_on_success_is_fatal() {
        let raw = TransportResponse::new(200, "<html>definitely not json</html>");
        let err = decode(&raw).unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[test]
    fn test_decode_garbage_on_failure_is_transport_status() {
        let raw = TransportResponse::new(502, "Bad Gateway");
        let response = decode(&raw).expect("decode");
        assert!(matches!(response.status, Status::Transport(_)));
    }

    mod placeholder_props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Whatever ids the server hands out, substitution fills every
            // placeholder and never leaks one into the body.
            #[test]
            fn substitution_is_total(
                session in "[A-Za-z0-9-]{1,16}",
                element in "[A-Za-z0-9/_.-]{1,24}",
                attr in "[A-Za-z-]{1,16}",
            ) {
                let cmd = Command::new(CommandId::GetElementAttribute)
                    .with_session(SessionId::new(session.clone()))
                    .with_param("id", element.clone())
                    .with_param("name", attr.clone());

                let request = encode(cmd).expect("encode");
                let prefix = format!("/session/{session}/element/{element}");
                let suffix = format!("/attribute/{attr}");
                let fully_substituted = !request.url.contains('{');
                let well_placed =
                    request.url.starts_with(&prefix) && request.url.ends_with(&suffix);
                prop_assert!(fully_substituted);
                prop_assert!(well_placed);
                prop_assert_eq!(request.body, None);
            }
        }
    }

    #[test]
    fn test_roundtrip_all_commands() {
        // Every command encodes, and a server echo of its session id and
        // a success value decodes back to the same session id.
        for &id in CommandId::ALL {
            let mut cmd = Command::new(id);
            if !id.is_sessionless() {
                cmd = cmd.with_session(SessionId::new("S1"));
            }
            // Satisfy url placeholders.
            for ph in ["id", "name", "propertyName", "other"] {
                if id.descriptor().template.contains(&format!("{{{ph}}}")) {
                    cmd = cmd.with_param(ph, format!("{ph}-v"));
                }
            }

            let request = encode(cmd).expect("encode");
            assert!(!request.url.contains('{'), "{id}: {}", request.url);

            let echoed = TransportResponse::new(
                200,
                r#"{"status": 0, "sessionId": "S1", "value": null}"#,
            );
            let response = decode(&echoed).expect("decode");
            assert_eq!(
                response.session_id.as_ref().map(SessionId::as_str),
                Some("S1")
            );
        }
    }
}
