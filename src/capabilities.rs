//! Session capability negotiation.
//!
//! A [`CapabilitySet`] is an immutable, named bag of configuration values
//! exchanged with the server at session creation. `browserName` is the only
//! mandatory key; everything else is optional with documented defaults.
//! Unrecognized keys pass through opaquely in both directions.
//!
//! # Example
//!
//! ```
//! use remote_webdriver::CapabilitySet;
//!
//! let caps = CapabilitySet::chrome()
//!     .with("takesScreenshot", true)
//!     .with("proxy", serde_json::json!({"proxyType": "direct"}));
//!
//! assert_eq!(caps.browser_name(), Some("chrome"));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Well-Known Keys
// ============================================================================

/// The only mandatory capability key.
pub const BROWSER_NAME: &str = "browserName";

/// Browser version key.
pub const VERSION: &str = "version";

/// Platform key. Defaults to `"ANY"`.
pub const PLATFORM: &str = "platform";

/// JavaScript execution flag. Defaults to `false` unless a browser factory
/// turns it on.
pub const JAVASCRIPT_ENABLED: &str = "javascriptEnabled";

/// Screenshot support flag.
pub const TAKES_SCREENSHOT: &str = "takesScreenshot";

/// Alert handling flag.
pub const HANDLES_ALERTS: &str = "handlesAlerts";

/// CSS selector support flag.
pub const CSS_SELECTORS_ENABLED: &str = "cssSelectorsEnabled";

/// Proxy configuration key.
pub const PROXY: &str = "proxy";

/// Device rotation flag.
pub const ROTATABLE: &str = "rotatable";

// ============================================================================
// CapabilitySet
// ============================================================================

/// Immutable, ordered bag of session capabilities.
///
/// Constructed from a per-browser factory or from a raw dictionary returned
/// by the server. All mutation is by-value, so a negotiated set stored on a
/// session can never change underneath it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySet {
    entries: BTreeMap<String, Value>,
}

impl CapabilitySet {
    /// Creates an empty capability set.
    ///
    /// Note that a set without `browserName` cannot be negotiated; prefer
    /// the factories or [`CapabilitySet::named`].
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a capability set for the given browser with engine defaults
    /// (`platform = ANY`, `javascriptEnabled = false`).
    #[must_use]
    pub fn named(browser_name: impl Into<String>) -> Self {
        Self::new()
            .with(BROWSER_NAME, browser_name.into())
            .with(PLATFORM, "ANY")
            .with(JAVASCRIPT_ENABLED, false)
    }

    /// Capability set for Firefox.
    #[must_use]
    pub fn firefox() -> Self {
        Self::named("firefox")
            .with(JAVASCRIPT_ENABLED, true)
            .with(CSS_SELECTORS_ENABLED, true)
            .with(TAKES_SCREENSHOT, true)
            .with(HANDLES_ALERTS, true)
    }

    /// Capability set for Chrome.
    #[must_use]
    pub fn chrome() -> Self {
        Self::named("chrome")
            .with(JAVASCRIPT_ENABLED, true)
            .with(CSS_SELECTORS_ENABLED, true)
            .with(TAKES_SCREENSHOT, true)
            .with(HANDLES_ALERTS, true)
    }

    /// Capability set for HtmlUnit (scriptless by default).
    #[must_use]
    pub fn htmlunit() -> Self {
        Self::named("htmlunit")
    }

    /// Builds a capability set from a raw dictionary, e.g. the capabilities
    /// the server returned at session creation.
    ///
    /// Non-object values produce an empty set.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let entries = value
            .as_object()
            .map(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        Self { entries }
    }

    /// Returns a new set with `key` set to `value`.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Looks up a capability value.
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Returns the browser name, if set.
    #[inline]
    #[must_use]
    pub fn browser_name(&self) -> Option<&str> {
        self.get(BROWSER_NAME).and_then(Value::as_str)
    }

    /// Returns `true` if JavaScript execution is enabled.
    #[inline]
    #[must_use]
    pub fn is_javascript_enabled(&self) -> bool {
        self.get(JAVASCRIPT_ENABLED)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Returns `true` if this set can be negotiated (has a browser name).
    #[inline]
    #[must_use]
    pub fn is_negotiable(&self) -> bool {
        self.browser_name().is_some()
    }

    /// Merges server-returned capabilities over this requested set.
    ///
    /// Server values win for keys present in both; requested-only keys are
    /// kept so callers can still see what they asked for. The result is the
    /// negotiated set stored on the session.
    #[must_use]
    pub fn merge(&self, returned: &CapabilitySet) -> Self {
        let mut entries = self.entries.clone();
        for (k, v) in &returned.entries {
            entries.insert(k.clone(), v.clone());
        }
        Self { entries }
    }

    /// Serializes this set as a JSON object.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(&self.entries).unwrap_or_else(|_| Value::Object(Default::default()))
    }

    /// Iterates over `(name, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of capabilities in the set.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the set is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
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
    fn test_named_defaults() {
        let caps = CapabilitySet::named("opera");
        assert_eq!(caps.browser_name(), Some("opera"));
        assert_eq!(caps.get(PLATFORM), Some(&json!("ANY")));
        assert!(!caps.is_javascript_enabled());
        assert!(caps.is_negotiable());
    }

    #[test]
    fn test_factory_enables_javascript() {
        assert!(CapabilitySet::firefox().is_javascript_enabled());
        assert!(CapabilitySet::chrome().is_javascript_enabled());
        assert!(!CapabilitySet::htmlunit().is_javascript_enabled());
    }

    #[test]
    fn test_unrecognized_keys_pass_through() {
        let caps = CapabilitySet::chrome().with("vendor:weird", json!({"x": 1}));
        assert_eq!(caps.get("vendor:weird"), Some(&json!({"x": 1})));

        let round = CapabilitySet::from_value(&caps.to_value());
        assert_eq!(round, caps);
    }

    #[test]
    fn test_merge_server_wins() {
        let requested = CapabilitySet::named("firefox").with(VERSION, "119");
        let returned = CapabilitySet::from_value(&json!({
            "browserName": "firefox",
            "version": "121.0.1",
            "rotatable": false,
        }));

        let merged = requested.merge(&returned);
        assert_eq!(merged.get(VERSION), Some(&json!("121.0.1")));
        assert_eq!(merged.get(ROTATABLE), Some(&json!(false)));
        // Requested-only keys survive.
        assert_eq!(merged.get(PLATFORM), Some(&json!("ANY")));
    }

    #[test]
    fn test_from_non_object_is_empty() {
        let caps = CapabilitySet::from_value(&json!(42));
        assert!(caps.is_empty());
        assert!(!caps.is_negotiable());
    }
}
