//! Wire-protocol core: commands, codec, classifier, script transform.
//!
//! The pipeline every session operation flows through:
//!
//! ```text
//! Command ──encode──► TransportRequest ──Executor──► TransportResponse
//!                                                         │
//! value ◄──classify── Response ◄────────decode────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `registry` | Closed command set and wire descriptors |
//! | `command` | Per-invocation command values |
//! | `codec` | Encode/decode between commands and raw transport messages |
//! | `classifier` | Status-to-[`crate::ErrorKind`] tables |
//! | `script` | Element-reference wrap/unwrap for script execution |

// ============================================================================
// Submodules
// ============================================================================

/// Per-invocation command values.
pub mod command;

/// Command codec and transport message types.
pub mod codec;

/// Error classifier tables.
pub mod classifier;

/// Closed command set and wire descriptors.
pub mod registry;

/// Element-reference wrap/unwrap transform.
pub mod script;

// ============================================================================
// Re-exports
// ============================================================================

pub use classifier::classify;
pub use codec::{Response, Status, TransportRequest, TransportResponse, decode, encode};
pub use command::{Command, SessionId};
pub use registry::{CommandDescriptor, CommandId, Verb};
pub use script::{LEGACY_ELEMENT_KEY, ScriptValue, W3C_ELEMENT_KEY, unwrap, wrap, wrap_args};
