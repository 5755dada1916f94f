//! Command registry: the closed command set and its wire descriptors.
//!
//! Every command the engine can issue is a [`CommandId`] variant, and each
//! variant resolves to exactly one [`CommandDescriptor`] through an
//! exhaustive `match`. There is no runtime lookup table to populate and no
//! string switch to fall through: adding a command without a descriptor is
//! a compile error.
//!
//! URL templates contain slash-delimited `{placeholder}` segments. The
//! placeholder names are a closed set too: `{sessionId}` is filled from the
//! session, everything else (`{id}`, `{name}`, `{propertyName}`, `{other}`)
//! is consumed from the command's parameter map by the codec.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// Verb
// ============================================================================

/// HTTP-like verb for a wire command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Read-only command. Safe to retry once on transport failure.
    Get,
    /// Mutating command. Never auto-retried.
    Post,
    /// Deleting command. Never auto-retried.
    Delete,
}

impl Verb {
    /// Returns the verb as a wire string.
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }

    /// Returns `true` if commands with this verb are idempotent reads.
    #[inline]
    #[must_use]
    pub fn is_idempotent(self) -> bool {
        matches!(self, Self::Get)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// CommandDescriptor
// ============================================================================

/// Wire descriptor for a command: verb plus URL template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandDescriptor {
    /// HTTP-like verb.
    pub verb: Verb,
    /// URL template with `{placeholder}` segments.
    pub template: &'static str,
}

impl CommandDescriptor {
    const fn new(verb: Verb, template: &'static str) -> Self {
        Self { verb, template }
    }
}

// ============================================================================
// CommandId
// ============================================================================

/// The closed set of commands the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandId {
    // Session lifecycle
    /// Create a new session from desired capabilities.
    NewSession,
    /// End the session and release server-side resources.
    Quit,
    /// Probe server health. Needs no session.
    Status,

    // Navigation
    /// Navigate to a URL.
    Get,
    /// Read the current URL.
    GetCurrentUrl,
    /// History back.
    GoBack,
    /// History forward.
    GoForward,
    /// Reload the page.
    Refresh,
    /// Read the page title.
    GetTitle,
    /// Read the page source.
    GetPageSource,

    // Script
    /// Execute synchronous script.
    ExecuteScript,
    /// Execute asynchronous script.
    ExecuteAsyncScript,

    // Screenshot
    /// Capture a screenshot of the page.
    Screenshot,

    // Element lookup
    /// Find the first matching element.
    FindElement,
    /// Find all matching elements.
    FindElements,
    /// Find the first matching descendant of an element.
    FindChildElement,
    /// Find all matching descendants of an element.
    FindChildElements,

    // Element interaction
    /// Click an element.
    ClickElement,
    /// Clear a text input.
    ClearElement,
    /// Send keystrokes to an element.
    SendKeysToElement,
    /// Submit a form element.
    SubmitElement,

    // Element state
    /// Read an element's visible text.
    GetElementText,
    /// Read an element's tag name.
    GetElementTagName,
    /// Read an attribute value.
    GetElementAttribute,
    /// Read a DOM property value.
    GetElementProperty,
    /// Read a computed CSS value.
    GetElementCssValue,
    /// Whether a checkbox/option is selected.
    IsElementSelected,
    /// Whether the element is enabled.
    IsElementEnabled,
    /// Whether the element is displayed.
    IsElementDisplayed,
    /// Element location in page coordinates.
    GetElementLocation,
    /// Element size.
    GetElementSize,
    /// Whether two handles refer to the same element.
    ElementEquals,

    // Cookies
    /// Read all cookies for the current page.
    GetAllCookies,
    /// Add a cookie.
    AddCookie,
    /// Delete a cookie by name.
    DeleteCookie,
    /// Delete all cookies.
    DeleteAllCookies,

    // Frames and windows
    /// Switch the frame context.
    SwitchToFrame,
    /// Switch to the parent frame.
    SwitchToParentFrame,
    /// Switch to a window by handle.
    SwitchToWindow,
    /// Close the current window.
    CloseWindow,
    /// Read the current window handle.
    GetWindowHandle,
    /// Read all window handles.
    GetWindowHandles,

    // Alerts
    /// Read the open alert's text.
    GetAlertText,
    /// Type into a prompt dialog.
    SetAlertValue,
    /// Accept the open alert.
    AcceptAlert,
    /// Dismiss the open alert.
    DismissAlert,

    // Timeouts
    /// Set a named timeout.
    SetTimeouts,
    /// Set the implicit element-wait timeout.
    SetImplicitWait,
    /// Set the async-script timeout.
    SetScriptTimeout,

    // Advanced input
    /// Move the pointer.
    MoveTo,
    /// Click at the pointer position.
    Click,
    /// Press a pointer button.
    ButtonDown,
    /// Release a pointer button.
    ButtonUp,
    /// Double-click at the pointer position.
    DoubleClick,
    /// Send raw keystrokes to the focused element.
    SendKeys,
}

impl CommandId {
    /// Every command, in declaration order. Used by round-trip tests and by
    /// tooling that needs to walk the full registry.
    pub const ALL: &'static [CommandId] = &[
        Self::NewSession,
        Self::Quit,
        Self::Status,
        Self::Get,
        Self::GetCurrentUrl,
        Self::GoBack,
        Self::GoForward,
        Self::Refresh,
        Self::GetTitle,
        Self::GetPageSource,
        Self::ExecuteScript,
        Self::ExecuteAsyncScript,
        Self::Screenshot,
        Self::FindElement,
        Self::FindElements,
        Self::FindChildElement,
        Self::FindChildElements,
        Self::ClickElement,
        Self::ClearElement,
        Self::SendKeysToElement,
        Self::SubmitElement,
        Self::GetElementText,
        Self::GetElementTagName,
        Self::GetElementAttribute,
        Self::GetElementProperty,
        Self::GetElementCssValue,
        Self::IsElementSelected,
        Self::IsElementEnabled,
        Self::IsElementDisplayed,
        Self::GetElementLocation,
        Self::GetElementSize,
        Self::ElementEquals,
        Self::GetAllCookies,
        Self::AddCookie,
        Self::DeleteCookie,
        Self::DeleteAllCookies,
        Self::SwitchToFrame,
        Self::SwitchToParentFrame,
        Self::SwitchToWindow,
        Self::CloseWindow,
        Self::GetWindowHandle,
        Self::GetWindowHandles,
        Self::GetAlertText,
        Self::SetAlertValue,
        Self::AcceptAlert,
        Self::DismissAlert,
        Self::SetTimeouts,
        Self::SetImplicitWait,
        Self::SetScriptTimeout,
        Self::MoveTo,
        Self::Click,
        Self::ButtonDown,
        Self::ButtonUp,
        Self::DoubleClick,
        Self::SendKeys,
    ];

    /// Resolves this command's wire descriptor.
    #[must_use]
    pub fn descriptor(self) -> CommandDescriptor {
        use Verb::{Delete, Get, Post};
        match self {
            Self::NewSession => CommandDescriptor::new(Post, "/session"),
            Self::Quit => CommandDescriptor::new(Delete, "/session/{sessionId}"),
            Self::Status => CommandDescriptor::new(Get, "/status"),

            Self::Get => CommandDescriptor::new(Post, "/session/{sessionId}/url"),
            Self::GetCurrentUrl => CommandDescriptor::new(Get, "/session/{sessionId}/url"),
            Self::GoBack => CommandDescriptor::new(Post, "/session/{sessionId}/back"),
            Self::GoForward => CommandDescriptor::new(Post, "/session/{sessionId}/forward"),
            Self::Refresh => CommandDescriptor::new(Post, "/session/{sessionId}/refresh"),
            Self::GetTitle => CommandDescriptor::new(Get, "/session/{sessionId}/title"),
            Self::GetPageSource => CommandDescriptor::new(Get, "/session/{sessionId}/source"),

            Self::ExecuteScript => CommandDescriptor::new(Post, "/session/{sessionId}/execute"),
            Self::ExecuteAsyncScript => {
                CommandDescriptor::new(Post, "/session/{sessionId}/execute_async")
            }

            Self::Screenshot => CommandDescriptor::new(Get, "/session/{sessionId}/screenshot"),

            Self::FindElement => CommandDescriptor::new(Post, "/session/{sessionId}/element"),
            Self::FindElements => CommandDescriptor::new(Post, "/session/{sessionId}/elements"),
            Self::FindChildElement => {
                CommandDescriptor::new(Post, "/session/{sessionId}/element/{id}/element")
            }
            Self::FindChildElements => {
                CommandDescriptor::new(Post, "/session/{sessionId}/element/{id}/elements")
            }

            Self::ClickElement => {
                CommandDescriptor::new(Post, "/session/{sessionId}/element/{id}/click")
            }
            Self::ClearElement => {
                CommandDescriptor::new(Post, "/session/{sessionId}/element/{id}/clear")
            }
            Self::SendKeysToElement => {
                CommandDescriptor::new(Post, "/session/{sessionId}/element/{id}/value")
            }
            Self::SubmitElement => {
                CommandDescriptor::new(Post, "/session/{sessionId}/element/{id}/submit")
            }

            Self::GetElementText => {
                CommandDescriptor::new(Get, "/session/{sessionId}/element/{id}/text")
            }
            Self::GetElementTagName => {
                CommandDescriptor::new(Get, "/session/{sessionId}/element/{id}/name")
            }
            Self::GetElementAttribute => {
                CommandDescriptor::new(Get, "/session/{sessionId}/element/{id}/attribute/{name}")
            }
            Self::GetElementProperty => CommandDescriptor::new(
                Get,
                "/session/{sessionId}/element/{id}/property/{propertyName}",
            ),
            Self::GetElementCssValue => {
                CommandDescriptor::new(Get, "/session/{sessionId}/element/{id}/css/{propertyName}")
            }
            Self::IsElementSelected => {
                CommandDescriptor::new(Get, "/session/{sessionId}/element/{id}/selected")
            }
            Self::IsElementEnabled => {
                CommandDescriptor::new(Get, "/session/{sessionId}/element/{id}/enabled")
            }
            Self::IsElementDisplayed => {
                CommandDescriptor::new(Get, "/session/{sessionId}/element/{id}/displayed")
            }
            Self::GetElementLocation => {
                CommandDescriptor::new(Get, "/session/{sessionId}/element/{id}/location")
            }
            Self::GetElementSize => {
                CommandDescriptor::new(Get, "/session/{sessionId}/element/{id}/size")
            }
            Self::ElementEquals => {
                CommandDescriptor::new(Get, "/session/{sessionId}/element/{id}/equals/{other}")
            }

            Self::GetAllCookies => CommandDescriptor::new(Get, "/session/{sessionId}/cookie"),
            Self::AddCookie => CommandDescriptor::new(Post, "/session/{sessionId}/cookie"),
            Self::DeleteCookie => {
                CommandDescriptor::new(Delete, "/session/{sessionId}/cookie/{name}")
            }
            Self::DeleteAllCookies => {
                CommandDescriptor::new(Delete, "/session/{sessionId}/cookie")
            }

            Self::SwitchToFrame => CommandDescriptor::new(Post, "/session/{sessionId}/frame"),
            Self::SwitchToParentFrame => {
                CommandDescriptor::new(Post, "/session/{sessionId}/frame/parent")
            }
            Self::SwitchToWindow => CommandDescriptor::new(Post, "/session/{sessionId}/window"),
            Self::CloseWindow => CommandDescriptor::new(Delete, "/session/{sessionId}/window"),
            Self::GetWindowHandle => {
                CommandDescriptor::new(Get, "/session/{sessionId}/window_handle")
            }
            Self::GetWindowHandles => {
                CommandDescriptor::new(Get, "/session/{sessionId}/window_handles")
            }

            Self::GetAlertText => CommandDescriptor::new(Get, "/session/{sessionId}/alert_text"),
            Self::SetAlertValue => CommandDescriptor::new(Post, "/session/{sessionId}/alert_text"),
            Self::AcceptAlert => CommandDescriptor::new(Post, "/session/{sessionId}/accept_alert"),
            Self::DismissAlert => {
                CommandDescriptor::new(Post, "/session/{sessionId}/dismiss_alert")
            }

            Self::SetTimeouts => CommandDescriptor::new(Post, "/session/{sessionId}/timeouts"),
            Self::SetImplicitWait => {
                CommandDescriptor::new(Post, "/session/{sessionId}/timeouts/implicit_wait")
            }
            Self::SetScriptTimeout => {
                CommandDescriptor::new(Post, "/session/{sessionId}/timeouts/async_script")
            }

            Self::MoveTo => CommandDescriptor::new(Post, "/session/{sessionId}/moveto"),
            Self::Click => CommandDescriptor::new(Post, "/session/{sessionId}/click"),
            Self::ButtonDown => CommandDescriptor::new(Post, "/session/{sessionId}/buttondown"),
            Self::ButtonUp => CommandDescriptor::new(Post, "/session/{sessionId}/buttonup"),
            Self::DoubleClick => CommandDescriptor::new(Post, "/session/{sessionId}/doubleclick"),
            Self::SendKeys => CommandDescriptor::new(Post, "/session/{sessionId}/keys"),
        }
    }

    /// Wire name used by the message-relay protocol (`{"request": <name>}`).
    #[must_use]
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::NewSession => "newSession",
            Self::Quit => "quit",
            Self::Status => "status",
            Self::Get => "get",
            Self::GetCurrentUrl => "getCurrentUrl",
            Self::GoBack => "goBack",
            Self::GoForward => "goForward",
            Self::Refresh => "refresh",
            Self::GetTitle => "getTitle",
            Self::GetPageSource => "getPageSource",
            Self::ExecuteScript => "executeScript",
            Self::ExecuteAsyncScript => "executeAsyncScript",
            Self::Screenshot => "screenshot",
            Self::FindElement => "findElement",
            Self::FindElements => "findElements",
            Self::FindChildElement => "findChildElement",
            Self::FindChildElements => "findChildElements",
            Self::ClickElement => "clickElement",
            Self::ClearElement => "clearElement",
            Self::SendKeysToElement => "sendKeysToElement",
            Self::SubmitElement => "submitElement",
            Self::GetElementText => "getElementText",
            Self::GetElementTagName => "getElementTagName",
            Self::GetElementAttribute => "getElementAttribute",
            Self::GetElementProperty => "getElementProperty",
            Self::GetElementCssValue => "getElementValueOfCssProperty",
            Self::IsElementSelected => "isElementSelected",
            Self::IsElementEnabled => "isElementEnabled",
            Self::IsElementDisplayed => "isElementDisplayed",
            Self::GetElementLocation => "getElementLocation",
            Self::GetElementSize => "getElementSize",
            Self::ElementEquals => "elementEquals",
            Self::GetAllCookies => "getCookies",
            Self::AddCookie => "addCookie",
            Self::DeleteCookie => "deleteCookie",
            Self::DeleteAllCookies => "deleteAllCookies",
            Self::SwitchToFrame => "switchToFrame",
            Self::SwitchToParentFrame => "switchToParentFrame",
            Self::SwitchToWindow => "switchToWindow",
            Self::CloseWindow => "close",
            Self::GetWindowHandle => "getCurrentWindowHandle",
            Self::GetWindowHandles => "getWindowHandles",
            Self::GetAlertText => "getAlertText",
            Self::SetAlertValue => "setAlertValue",
            Self::AcceptAlert => "acceptAlert",
            Self::DismissAlert => "dismissAlert",
            Self::SetTimeouts => "setTimeouts",
            Self::SetImplicitWait => "implicitlyWait",
            Self::SetScriptTimeout => "setScriptTimeout",
            Self::MoveTo => "mouseMoveTo",
            Self::Click => "mouseClick",
            Self::ButtonDown => "mouseButtonDown",
            Self::ButtonUp => "mouseButtonUp",
            Self::DoubleClick => "mouseDoubleClick",
            Self::SendKeys => "sendKeysToActiveElement",
        }
    }

    /// Returns `true` if the command needs no session id ([`CommandId::NewSession`],
    /// [`CommandId::Status`]).
    #[inline]
    #[must_use]
    pub fn is_sessionless(self) -> bool {
        matches!(self, Self::NewSession | Self::Status)
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_covers_every_descriptor() {
        // Descriptor resolution is exhaustive by construction; this pins the
        // ALL table against it.
        for &id in CommandId::ALL {
            let desc = id.descriptor();
            assert!(desc.template.starts_with('/'), "{id}: {}", desc.template);
        }
        assert_eq!(CommandId::ALL.len(), 55);
    }

    #[test]
    fn test_session_scoped_templates_carry_session_placeholder() {
        for &id in CommandId::ALL {
            let desc = id.descriptor();
            if id.is_sessionless() {
                assert!(!desc.template.contains("{sessionId}"), "{id}");
            } else {
                assert!(desc.template.contains("{sessionId}"), "{id}");
            }
        }
    }

    #[test]
    fn test_representative_routes() {
        let d = CommandId::NewSession.descriptor();
        assert_eq!((d.verb, d.template), (Verb::Post, "/session"));

        let d = CommandId::Quit.descriptor();
        assert_eq!((d.verb, d.template), (Verb::Delete, "/session/{sessionId}"));

        let d = CommandId::GetElementAttribute.descriptor();
        assert_eq!(d.verb, Verb::Get);
        assert_eq!(
            d.template,
            "/session/{sessionId}/element/{id}/attribute/{name}"
        );
    }

    #[test]
    fn test_wire_names_unique() {
        let mut seen = std::collections::HashSet::new();
        for &id in CommandId::ALL {
            assert!(seen.insert(id.wire_name()), "duplicate: {}", id.wire_name());
        }
    }

    #[test]
    fn test_verb_idempotence() {
        assert!(Verb::Get.is_idempotent());
        assert!(!Verb::Post.is_idempotent());
        assert!(!Verb::Delete.is_idempotent());
    }
}
