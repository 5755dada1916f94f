//! Error types for the remote WebDriver engine.
//!
//! Failures fall into two families:
//!
//! - **Classified command failures** ([`CommandError`]): the server answered
//!   with a structured error payload, or the engine produced an equivalent
//!   local outcome (stale handle, ended session, transport failure). These
//!   are recoverable — the session stays usable.
//! - **Structural failures** ([`Error::Protocol`], [`Error::Json`]): the
//!   response was not decodable at all, which indicates a protocol-version
//!   mismatch. These are fatal and never swallowed.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use remote_webdriver::{Result, ErrorKind};
//!
//! async fn example(session: &Session) -> Result<()> {
//!     match session.find_element(By::css("#submit")).await {
//!         Ok(el) => session.click_element(&el).await,
//!         Err(e) if e.kind() == Some(ErrorKind::NoSuchElement) => Ok(()),
//!         Err(e) => Err(e),
//!     }
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::io::Error as IoError;
use std::result::Result as StdResult;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// ErrorKind
// ============================================================================

/// Closed taxonomy of classified command failures.
///
/// Every wire-protocol status code and every error-class string maps into
/// this enumeration; unknown inputs map to [`ErrorKind::UnknownServerError`]
/// rather than failing to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No element matched the locator.
    NoSuchElement,
    /// The referenced window handle does not exist.
    NoSuchWindow,
    /// The referenced frame does not exist.
    NoSuchFrame,
    /// No alert is currently open.
    NoSuchAlert,
    /// The element handle refers to an element no longer attached to the DOM
    /// (or produced by a page/session that has since gone away).
    StaleElementReference,
    /// The element is present but not visible.
    ElementNotVisible,
    /// The element is disabled or otherwise not interactable.
    ElementNotInteractable,
    /// The command is valid but not supported by this endpoint.
    UnsupportedOperation,
    /// The locator expression is malformed.
    InvalidSelector,
    /// The cookie domain does not match the current page.
    InvalidCookieDomain,
    /// The cookie could not be set.
    UnableToSetCookie,
    /// A modal dialog blocked the command.
    UnexpectedAlertOpen,
    /// The command (or the wait for its response) timed out.
    Timeout,
    /// An unhandled exception was thrown by injected script.
    ScriptError,
    /// The server reported a status the engine does not recognize.
    UnknownServerError,
    /// Connection-level failure: refused, reset, or no correlated response.
    TransportFailure,
    /// The session id is unknown to the server, or the session has ended.
    InvalidSessionId,
    /// The command was cancelled before a response arrived.
    Cancelled,
}

impl ErrorKind {
    /// Returns the W3C error-class string for this kind.
    #[must_use]
    pub fn as_class(self) -> &'static str {
        match self {
            Self::NoSuchElement => "no such element",
            Self::NoSuchWindow => "no such window",
            Self::NoSuchFrame => "no such frame",
            Self::NoSuchAlert => "no such alert",
            Self::StaleElementReference => "stale element reference",
            Self::ElementNotVisible => "element not visible",
            Self::ElementNotInteractable => "element not interactable",
            Self::UnsupportedOperation => "unsupported operation",
            Self::InvalidSelector => "invalid selector",
            Self::InvalidCookieDomain => "invalid cookie domain",
            Self::UnableToSetCookie => "unable to set cookie",
            Self::UnexpectedAlertOpen => "unexpected alert open",
            Self::Timeout => "timeout",
            Self::ScriptError => "javascript error",
            Self::UnknownServerError => "unknown error",
            Self::TransportFailure => "transport failure",
            Self::InvalidSessionId => "invalid session id",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_class())
    }
}

// ============================================================================
// ServerFrame
// ============================================================================

/// One frame of a server-side stack trace.
///
/// Servers attach these to error payloads. The engine preserves them
/// verbatim for debugging; it never interprets them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServerFrame {
    /// Class name on the server side.
    #[serde(rename = "className", default)]
    pub class_name: Option<String>,
    /// Method name on the server side.
    #[serde(rename = "methodName", default)]
    pub method_name: Option<String>,
    /// Source file on the server side.
    #[serde(rename = "fileName", default)]
    pub file_name: Option<String>,
    /// Line number on the server side.
    #[serde(rename = "lineNumber", default)]
    pub line_number: Option<i64>,
}

// ============================================================================
// CommandError
// ============================================================================

/// A classified command failure.
///
/// Carries the [`ErrorKind`], a human-readable message, any server stack
/// frames, and — for unrecognized statuses — the raw response value.
#[derive(Debug, Clone)]
pub struct CommandError {
    /// Classified error kind.
    pub kind: ErrorKind,
    /// Human-readable message from the server (or the engine).
    pub message: String,
    /// Server-side stack trace, preserved verbatim.
    pub stack: Vec<ServerFrame>,
    /// Raw response value for unrecognized statuses.
    pub raw: Option<Value>,
}

impl CommandError {
    /// Creates a classified error with just a kind and message.
    #[inline]
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            stack: Vec::new(),
            raw: None,
        }
    }

    /// Attaches the raw response value.
    #[inline]
    #[must_use]
    pub fn with_raw(mut self, raw: Value) -> Self {
        self.raw = Some(raw);
        self
    }

    /// Attaches server stack frames.
    #[inline]
    #[must_use]
    pub fn with_stack(mut self, stack: Vec<ServerFrame>) -> Self {
        self.stack = stack;
        self
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for CommandError {}

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Classified command failure (see [`CommandError`]).
    ///
    /// The session remains usable after this error.
    #[error("{0}")]
    Command(#[from] CommandError),

    /// Structural protocol violation.
    ///
    /// The response could not be interpreted at all. Fatal: indicates a
    /// protocol-version mismatch between client and server.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// Configuration error.
    ///
    /// Returned when executor or session configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    ///
    /// On the decode path this is a structural failure and fatal.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a classified command error.
    #[inline]
    pub fn command(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Command(CommandError::new(kind, message))
    }

    /// Creates a transport-failure error.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::command(ErrorKind::TransportFailure, message)
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::command(
            ErrorKind::Timeout,
            format!("{} timed out after {timeout_ms}ms", operation.into()),
        )
    }

    /// Creates a cancelled error.
    #[inline]
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::command(
            ErrorKind::Cancelled,
            format!("{} was cancelled", operation.into()),
        )
    }

    /// Creates an invalid-session-id error.
    #[inline]
    pub fn invalid_session_id(message: impl Into<String>) -> Self {
        Self::command(ErrorKind::InvalidSessionId, message)
    }

    /// Creates a stale-element error.
    #[inline]
    pub fn stale_element(handle: impl Into<String>) -> Self {
        Self::command(
            ErrorKind::StaleElementReference,
            format!("element handle {} is stale", handle.into()),
        )
    }

    /// Creates a no-such-element error.
    #[inline]
    pub fn no_such_element(message: impl Into<String>) -> Self {
        Self::command(ErrorKind::NoSuchElement, message)
    }

    /// Creates a script error.
    #[inline]
    pub fn script_error(message: impl Into<String>) -> Self {
        Self::command(ErrorKind::ScriptError, message)
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns the classified [`ErrorKind`], if this is a command failure.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Command(e) => Some(e.kind),
            _ => None,
        }
    }

    /// Returns `true` if this is a transport-level failure.
    #[inline]
    #[must_use]
    pub fn is_transport(&self) -> bool {
        self.kind() == Some(ErrorKind::TransportFailure)
    }

    /// Returns `true` if this is a timeout.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.kind() == Some(ErrorKind::Timeout)
    }

    /// Returns `true` if the session this error came from has ended.
    #[inline]
    #[must_use]
    pub fn is_session_ended(&self) -> bool {
        self.kind() == Some(ErrorKind::InvalidSessionId)
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Classified command failures leave the session usable; structural
    /// failures do not.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Command(e) if e.kind != ErrorKind::InvalidSessionId)
    }
}

// ============================================================================
// Tests
// ============================================================================
