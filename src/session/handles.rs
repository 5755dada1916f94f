//! Element handle namespace.
//!
//! Handles are opaque strings minted by the server (`element/<n>` or a
//! UUID depending on transport) and are only meaningful within the session
//! that produced them. Individual handles are never removed; the whole
//! namespace is invalidated at once when the page that produced them goes
//! away, by bumping a generation counter. A handle stamped with an older
//! generation is stale.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::protocol::SessionId;

// ============================================================================
// ElementHandle
// ============================================================================

/// An opaque reference to a DOM element.
///
/// Valid only within the issuing session and only until the page that
/// produced it is navigated away from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    id: String,
    session_id: SessionId,
    generation: u64,
}

impl ElementHandle {
    pub(crate) fn new(id: impl Into<String>, session_id: SessionId, generation: u64) -> Self {
        Self {
            id: id.into(),
            session_id,
            generation,
        }
    }

    /// Returns the raw handle string.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the session this handle belongs to.
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

// ============================================================================
// HandleNamespace
// ============================================================================

/// Append-only table of element handles issued to one session.
#[derive(Debug, Default)]
pub(crate) struct HandleNamespace {
    /// Bumped on navigation; handles from older generations are stale.
    generation: AtomicU64,
    /// Handle string to the generation it was issued under.
    issued: Mutex<FxHashMap<String, u64>>,
}

impl HandleNamespace {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Current generation.
    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Records a handle under the current generation and returns that
    /// generation.
    pub(crate) fn register(&self, id: &str) -> u64 {
        let generation = self.generation();
        self.issued.lock().insert(id.to_string(), generation);
        generation
    }

    /// Invalidates every outstanding handle (page navigation).
    pub(crate) fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Returns `true` if the handle was issued by this namespace under the
    /// current generation.
    pub(crate) fn is_current(&self, handle: &ElementHandle) -> bool {
        handle.generation() == self.generation()
            && self.issued.lock().contains_key(handle.id())
    }

    /// Number of handles ever issued.
    #[cfg(test)]
    pub(crate) fn issued_count(&self) -> usize {
        self.issued.lock().len()
    }
}

// ============================================================================
// Tests
// ============================================================================
