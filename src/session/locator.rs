//! Element locator strategies.
//!
//! A [`By`] names the lookup strategy and carries its expression; on the
//! wire it becomes the `{"using": ..., "value": ...}` pair of the find
//! commands.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// By
// ============================================================================

/// Locator strategy plus expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum By {
    /// By `id` attribute.
    Id(String),
    /// By `name` attribute.
    Name(String),
    /// By CSS selector.
    Css(String),
    /// By XPath expression.
    XPath(String),
    /// By exact link text.
    LinkText(String),
    /// By partial link text.
    PartialLinkText(String),
    /// By tag name.
    TagName(String),
    /// By class name.
    ClassName(String),
}

impl By {
    /// Locator by `id` attribute.
    #[inline]
    #[must_use]
    pub fn id(value: impl Into<String>) -> Self {
        Self::Id(value.into())
    }

    /// Locator by `name` attribute.
    #[inline]
    #[must_use]
    pub fn name(value: impl Into<String>) -> Self {
        Self::Name(value.into())
    }

    /// Locator by CSS selector.
    #[inline]
    #[must_use]
    pub fn css(value: impl Into<String>) -> Self {
        Self::Css(value.into())
    }

    /// Locator by XPath expression.
    #[inline]
    #[must_use]
    pub fn xpath(value: impl Into<String>) -> Self {
        Self::XPath(value.into())
    }

    /// Locator by exact link text.
    #[inline]
    #[must_use]
    pub fn link_text(value: impl Into<String>) -> Self {
        Self::LinkText(value.into())
    }

    /// Locator by partial link text.
    #[inline]
    #[must_use]
    pub fn partial_link_text(value: impl Into<String>) -> Self {
        Self::PartialLinkText(value.into())
    }

    /// Locator by tag name.
    #[inline]
    #[must_use]
    pub fn tag_name(value: impl Into<String>) -> Self {
        Self::TagName(value.into())
    }

    /// Locator by class name.
    #[inline]
    #[must_use]
    pub fn class_name(value: impl Into<String>) -> Self {
        Self::ClassName(value.into())
    }

    /// Wire strategy name.
    #[must_use]
    pub fn strategy(&self) -> &'static str {
        match self {
            Self::Id(_) => "id",
            Self::Name(_) => "name",
            Self::Css(_) => "css selector",
            Self::XPath(_) => "xpath",
            Self::LinkText(_) => "link text",
            Self::PartialLinkText(_) => "partial link text",
            Self::TagName(_) => "tag name",
            Self::ClassName(_) => "class name",
        }
    }

    /// Locator expression.
    #[must_use]
    pub fn expression(&self) -> &str {
        match self {
            Self::Id(v)
            | Self::Name(v)
            | Self::Css(v)
            | Self::XPath(v)
            | Self::LinkText(v)
            | Self::PartialLinkText(v)
            | Self::TagName(v)
            | Self::ClassName(v) => v,
        }
    }
}

impl fmt::Display for By {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy(), self.expression())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_names() {
        assert_eq!(By::css("#main").strategy(), "css selector");
        assert_eq!(By::id("main").strategy(), "id");
        assert_eq!(By::xpath("//a").strategy(), "xpath");
        assert_eq!(By::partial_link_text("more").strategy(), "partial link text");
    }

    #[test]
    fn test_expression() {
        let by = By::link_text("Sign in");
        assert_eq!(by.expression(), "Sign in");
        assert_eq!(by.to_string(), "link text=Sign in");
    }
}
