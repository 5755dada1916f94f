//! Navigation and page-level reads.
//!
//! Any operation that loads or reloads a document invalidates every
//! element handle issued so far; handle staleness is detected locally,
//! before the doomed command ever reaches the wire.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Map, Value, json};

use crate::error::{Error, Result};
use crate::protocol::CommandId;

use super::Session;

// ============================================================================
// Navigation operations
// ============================================================================

impl Session {
    /// Loads the given URL and waits for the page load strategy to settle.
    ///
    /// Invalidates all element handles issued for the previous page.
    pub async fn navigate(&self, url: impl Into<String>) -> Result<()> {
        let mut params = Map::new();
        params.insert("url".to_string(), json!(url.into()));
        self.execute_raw(CommandId::Get, params).await?;
        self.invalidate_handles();
        Ok(())
    }

    /// Returns the URL of the current page.
    pub async fn current_url(&self) -> Result<String> {
        expect_string(
            self.execute_raw(CommandId::GetCurrentUrl, Map::new()).await?,
            "current URL",
        )
    }

    /// Returns the title of the current page.
    pub async fn title(&self) -> Result<String> {
        expect_string(
            self.execute_raw(CommandId::GetTitle, Map::new()).await?,
            "title",
        )
    }

    /// Returns the serialized source of the current page.
    pub async fn page_source(&self) -> Result<String> {
        expect_string(
            self.execute_raw(CommandId::GetPageSource, Map::new()).await?,
            "page source",
        )
    }

    /// Navigates back one step in the browser history.
    pub async fn back(&self) -> Result<()> {
        self.execute_raw(CommandId::GoBack, Map::new()).await?;
        self.invalidate_handles();
        Ok(())
    }

    /// Navigates forward one step in the browser history.
    pub async fn forward(&self) -> Result<()> {
        self.execute_raw(CommandId::GoForward, Map::new()).await?;
        self.invalidate_handles();
        Ok(())
    }

    /// Reloads the current page.
    pub async fn refresh(&self) -> Result<()> {
        self.execute_raw(CommandId::Refresh, Map::new()).await?;
        self.invalidate_handles();
        Ok(())
    }

    /// Captures a screenshot of the current page as base64-encoded PNG.
    pub async fn screenshot(&self) -> Result<String> {
        expect_string(
            self.execute_raw(CommandId::Screenshot, Map::new()).await?,
            "screenshot",
        )
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Unwraps a string response value, failing structurally otherwise.
pub(crate) fn expect_string(value: Value, what: &str) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(Error::protocol(format!(
            "expected {what} to be a string, got {other}"
        ))),
    }
}

// ============================================================================
// Tests
// ============================================================================
