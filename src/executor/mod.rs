//! Executor abstraction: deliver a serialized command, return the raw
//! response.
//!
//! Two concrete strategies ship with the engine:
//!
//! | Executor | Transport | Pattern |
//! |----------|-----------|---------|
//! | [`HttpExecutor`] | HTTP | one request per command against a driver server |
//! | [`ChannelExecutor`] | WebSocket | long-lived duplex channel per tab, correlated responses |
//!
//! Both report connection-level problems as classified transport failures;
//! retry policy lives with the session, not here.

// ============================================================================
// Submodules
// ============================================================================

/// Per-tab duplex channel executor and channel registry.
pub mod channel;

/// One-request-per-command HTTP executor.
pub mod http;

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::error::Result;
use crate::protocol::{TransportRequest, TransportResponse};

// ============================================================================
// Executor Trait
// ============================================================================

/// Transmits an encoded command and returns the raw response.
///
/// Implementations must be safe to share across sessions; serialization of
/// commands *within* one session is the session's responsibility (the wire
/// protocol has no pipelining), while independent sessions may call
/// concurrently.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Delivers the request and waits for the raw response.
    ///
    /// # Errors
    ///
    /// Connection-level failures (refused, reset, no correlated response)
    /// surface as [`crate::ErrorKind::TransportFailure`].
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse>;
}

// ============================================================================
// Re-exports
// ============================================================================

pub use channel::{Channel, ChannelExecutor, ChannelId, ChannelRegistry};
pub use http::{HttpExecutor, HttpExecutorBuilder};
