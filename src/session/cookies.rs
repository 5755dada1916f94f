//! Cookie management.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, json};

use crate::error::{Error, Result};
use crate::protocol::CommandId;

use super::Session;

// ============================================================================
// Cookie
// ============================================================================

/// A browser cookie as carried on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default, rename = "httpOnly")]
    pub http_only: bool,
    /// Expiry as seconds since the Unix epoch. Absent means session cookie.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
}

impl Cookie {
    /// Creates a session cookie with only a name and value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            domain: None,
            secure: false,
            http_only: false,
            expiry: None,
        }
    }

    /// Sets the cookie path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the cookie domain.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Marks the cookie secure-only.
    #[must_use]
    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    /// Marks the cookie HTTP-only.
    #[must_use]
    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }

    /// Sets the expiry in seconds since the Unix epoch.
    #[must_use]
    pub fn with_expiry(mut self, expiry: u64) -> Self {
        self.expiry = Some(expiry);
        self
    }
}

// ============================================================================
// Cookie operations
// ============================================================================

impl Session {
    /// Returns every cookie visible to the current page.
    pub async fn cookies(&self) -> Result<Vec<Cookie>> {
        let value = self.execute_raw(CommandId::GetAllCookies, Map::new()).await?;
        serde_json::from_value(value.clone())
            .map_err(|e| Error::protocol(format!("malformed cookie list {value}: {e}")))
    }

    /// Returns the named cookie, or `None` when absent.
    pub async fn cookie(&self, name: &str) -> Result<Option<Cookie>> {
        Ok(self.cookies().await?.into_iter().find(|c| c.name == name))
    }

    /// Adds a cookie to the current page's domain.
    ///
    /// # Errors
    ///
    /// Fails with `invalid cookie domain` or `unable to set cookie` when
    /// the server rejects it.
    pub async fn add_cookie(&self, cookie: &Cookie) -> Result<()> {
        let mut params = Map::new();
        params.insert("cookie".to_string(), json!(cookie));
        self.execute_raw(CommandId::AddCookie, params).await?;
        Ok(())
    }

    /// Deletes the named cookie. Deleting a cookie that does not exist is
    /// not an error.
    pub async fn delete_cookie(&self, name: &str) -> Result<()> {
        let mut params = Map::new();
        params.insert("name".to_string(), json!(name));
        self.execute_raw(CommandId::DeleteCookie, params).await?;
        Ok(())
    }

    /// Deletes every cookie visible to the current page.
    pub async fn delete_all_cookies(&self) -> Result<()> {
        self.execute_raw(CommandId::DeleteAllCookies, Map::new())
            .await?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
