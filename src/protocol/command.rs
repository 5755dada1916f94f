//! Command invocation values.
//!
//! A [`Command`] pairs a [`CommandId`] with the session id and the parameter
//! map for one invocation. Commands are built per call, consumed by the
//! codec, and discarded.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::registry::CommandId;

// ============================================================================
// SessionId
// ============================================================================

/// Opaque session identifier assigned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps a server-assigned session token.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the token as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ============================================================================
// Command
// ============================================================================

/// One command invocation: identifier, optional session id, parameters.
///
/// Parameters that match a URL-template placeholder are consumed during
/// encoding; whatever remains becomes the request body.
#[derive(Debug, Clone)]
pub struct Command {
    /// Which command to run.
    pub id: CommandId,
    /// Session this command targets. `None` before session creation.
    pub session_id: Option<SessionId>,
    /// Parameter map, string key to JSON value.
    pub parameters: Map<String, Value>,
}

impl Command {
    /// Creates a command with no session id and no parameters.
    #[inline]
    #[must_use]
    pub fn new(id: CommandId) -> Self {
        Self {
            id,
            session_id: None,
            parameters: Map::new(),
        }
    }

    /// Sets the session id.
    #[inline]
    #[must_use]
    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Adds one parameter.
    #[inline]
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Replaces the whole parameter map.
    #[inline]
    #[must_use]
    pub fn with_params(mut self, parameters: Map<String, Value>) -> Self {
        self.parameters = parameters;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
