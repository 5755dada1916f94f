//! Remote WebDriver - command protocol engine for browser automation.
//!
//! This library speaks the WebDriver remote command protocol: a closed set
//! of commands encoded onto a transport, decoded back into typed responses,
//! and classified into a single error space, behind a stateful session.
//!
//! # Architecture
//!
//! The engine follows a client-server model:
//!
//! - **Local End (Rust)**: builds commands, tracks session and element state
//! - **Remote End (driver server or relay)**: executes commands in a browser
//!
//! Key design principles:
//!
//! - Each [`Session`] owns: session id + capabilities + element handle
//!   namespace, with exactly one in-flight command at a time
//! - The command table is a closed enum, exhaustively matched at compile time
//! - Transports are pluggable behind the [`Executor`] trait (HTTP per-request,
//!   or a persistent WebSocket relay channel)
//! - Legacy numeric and error-class string status schemes classify into one
//!   [`ErrorKind`] space
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use remote_webdriver::{By, CapabilitySet, HttpExecutor, Result, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let executor = Arc::new(HttpExecutor::new("http://localhost:4444/wd/hub")?);
//!
//!     let session = Session::builder()
//!         .executor(executor)
//!         .capabilities(CapabilitySet::firefox())
//!         .connect()
//!         .await?;
//!
//!     session.navigate("https://example.com").await?;
//!     let heading = session.find_element(By::css("h1")).await?;
//!     println!("Heading: {}", session.element_text(&heading).await?);
//!
//!     session.quit().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`capabilities`] | Browser capability negotiation |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`executor`] | Pluggable transports: HTTP and relay channel |
//! | [`protocol`] | Command registry, codec, classifier, script transform |
//! | [`session`] | Session state machine and typed operations |

// ============================================================================
// Modules
// ============================================================================

/// Browser capability negotiation.
///
/// A [`CapabilitySet`] describes the requested browser; the server's reply
/// is merged over it at session creation.
pub mod capabilities;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`];
/// server-reported failures carry a classified [`ErrorKind`].
pub mod error;

/// Pluggable transports.
///
/// [`Executor`] is the seam between the protocol engine and the wire:
/// [`HttpExecutor`] for driver servers, [`ChannelExecutor`] for a
/// persistent relay channel.
pub mod executor;

/// Wire-protocol core.
///
/// Internal pipeline: command registry, encode/decode codec, status
/// classifier, element-reference script transform.
pub mod protocol;

/// Session state machine and typed operations.
///
/// The main entry point: [`Session::builder()`] negotiates a session, the
/// operation methods drive it, [`Session::quit()`] ends it.
pub mod session;

// ============================================================================
// Re-exports
// ============================================================================

// Capability types
pub use capabilities::CapabilitySet;

// Error types
pub use error::{CommandError, Error, ErrorKind, Result};

// Executor types
pub use executor::{
    Channel, ChannelExecutor, ChannelId, ChannelRegistry, Executor, HttpExecutor,
    HttpExecutorBuilder,
};

// Protocol types
pub use protocol::{CommandId, ScriptValue, SessionId, Verb};

// Session types
pub use session::{Session, SessionBuilder, server_status};
pub use session::cookies::Cookie;
pub use session::elements::{Location, Size};
pub use session::handles::ElementHandle;
pub use session::locator::By;
pub use session::windows::{FrameTarget, MouseButton, TimeoutKind};
