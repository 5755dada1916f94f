//! Browsing-context control: frames, windows, alerts, timeouts, and the
//! raw input commands.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Map, Value, json};

use crate::error::{Error, Result};
use crate::protocol::CommandId;

use super::Session;
use super::handles::ElementHandle;
use super::navigation::expect_string;

// ============================================================================
// Frame targets
// ============================================================================

/// What to switch frame focus to.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameTarget {
    /// The top-level document.
    Top,
    /// The nth frame in document order.
    Index(u16),
    /// The frame element with the given `name` or `id`.
    Name(String),
    /// A frame element located beforehand.
    Element(ElementHandle),
}

impl FrameTarget {
    fn to_wire(&self) -> Value {
        match self {
            Self::Top => Value::Null,
            Self::Index(n) => json!(n),
            Self::Name(name) => json!(name),
            Self::Element(handle) => json!({"ELEMENT": handle.id()}),
        }
    }
}

// ============================================================================
// Mouse buttons
// ============================================================================

/// Mouse button for the raw input commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseButton {
    #[default]
    Left,
    Middle,
    Right,
}

impl MouseButton {
    fn code(self) -> u8 {
        match self {
            Self::Left => 0,
            Self::Middle => 1,
            Self::Right => 2,
        }
    }
}

// ============================================================================
// Timeouts
// ============================================================================

/// Which server-side timeout to configure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutKind {
    /// Implicit element-lookup wait.
    Implicit,
    /// Async script completion.
    Script,
    /// Page load completion.
    PageLoad,
}

impl TimeoutKind {
    fn wire_name(self) -> &'static str {
        match self {
            Self::Implicit => "implicit",
            Self::Script => "script",
            Self::PageLoad => "page load",
        }
    }
}

// ============================================================================
// Frame operations
// ============================================================================

impl Session {
    /// Switches command focus to the given frame.
    ///
    /// # Errors
    ///
    /// Fails with `no such frame` when the target does not exist.
    pub async fn switch_to_frame(&self, target: FrameTarget) -> Result<()> {
        if let FrameTarget::Element(handle) = &target {
            self.check_handle(handle)?;
        }
        let mut params = Map::new();
        params.insert("id".to_string(), target.to_wire());
        self.execute_raw(CommandId::SwitchToFrame, params).await?;
        Ok(())
    }

    /// Switches command focus to the parent of the current frame.
    pub async fn switch_to_parent_frame(&self) -> Result<()> {
        self.execute_raw(CommandId::SwitchToParentFrame, Map::new())
            .await?;
        Ok(())
    }
}

// ============================================================================
// Window operations
// ============================================================================

impl Session {
    /// Switches command focus to the window with the given handle or name.
    ///
    /// # Errors
    ///
    /// Fails with `no such window` when it does not exist.
    pub async fn switch_to_window(&self, name_or_handle: &str) -> Result<()> {
        let mut params = Map::new();
        params.insert("name".to_string(), json!(name_or_handle));
        self.execute_raw(CommandId::SwitchToWindow, params).await?;
        Ok(())
    }

    /// Closes the current window. Closing the last window does not end the
    /// session; only `quit` does.
    pub async fn close_window(&self) -> Result<()> {
        self.execute_raw(CommandId::CloseWindow, Map::new()).await?;
        Ok(())
    }

    /// Returns the handle of the current window.
    pub async fn window_handle(&self) -> Result<String> {
        expect_string(
            self.execute_raw(CommandId::GetWindowHandle, Map::new())
                .await?,
            "window handle",
        )
    }

    /// Returns the handles of all open windows.
    pub async fn window_handles(&self) -> Result<Vec<String>> {
        let value = self
            .execute_raw(CommandId::GetWindowHandles, Map::new())
            .await?;
        serde_json::from_value(value.clone())
            .map_err(|e| Error::protocol(format!("malformed window handle list {value}: {e}")))
    }
}

// ============================================================================
// Alert operations
// ============================================================================

impl Session {
    /// Returns the text of the currently displayed alert.
    ///
    /// # Errors
    ///
    /// Fails with `no such alert` when no alert is open.
    pub async fn alert_text(&self) -> Result<String> {
        expect_string(
            self.execute_raw(CommandId::GetAlertText, Map::new()).await?,
            "alert text",
        )
    }

    /// Types into the prompt currently displayed.
    pub async fn set_alert_value(&self, text: &str) -> Result<()> {
        let mut params = Map::new();
        params.insert("text".to_string(), json!(text));
        self.execute_raw(CommandId::SetAlertValue, params).await?;
        Ok(())
    }

    /// Accepts the currently displayed alert.
    pub async fn accept_alert(&self) -> Result<()> {
        self.execute_raw(CommandId::AcceptAlert, Map::new()).await?;
        Ok(())
    }

    /// Dismisses the currently displayed alert.
    pub async fn dismiss_alert(&self) -> Result<()> {
        self.execute_raw(CommandId::DismissAlert, Map::new()).await?;
        Ok(())
    }
}

// ============================================================================
// Timeout operations
// ============================================================================

impl Session {
    /// Configures one of the server-side timeouts, in milliseconds.
    pub async fn set_timeout(&self, kind: TimeoutKind, ms: u64) -> Result<()> {
        let mut params = Map::new();
        params.insert("type".to_string(), json!(kind.wire_name()));
        params.insert("ms".to_string(), json!(ms));
        self.execute_raw(CommandId::SetTimeouts, params).await?;
        Ok(())
    }

    /// Sets the implicit element-lookup wait, in milliseconds.
    pub async fn set_implicit_wait(&self, ms: u64) -> Result<()> {
        let mut params = Map::new();
        params.insert("ms".to_string(), json!(ms));
        self.execute_raw(CommandId::SetImplicitWait, params).await?;
        Ok(())
    }

    /// Sets the async script completion timeout, in milliseconds.
    pub async fn set_script_timeout(&self, ms: u64) -> Result<()> {
        let mut params = Map::new();
        params.insert("ms".to_string(), json!(ms));
        self.execute_raw(CommandId::SetScriptTimeout, params).await?;
        Ok(())
    }
}

// ============================================================================
// Raw input operations
// ============================================================================

impl Session {
    /// Moves the virtual pointer, either to an offset within an element or
    /// relative to its current position.
    pub async fn move_to(
        &self,
        element: Option<&ElementHandle>,
        offset: Option<(i32, i32)>,
    ) -> Result<()> {
        let mut params = Map::new();
        if let Some(element) = element {
            self.check_handle(element)?;
            params.insert("element".to_string(), json!(element.id()));
        }
        if let Some((x, y)) = offset {
            params.insert("xoffset".to_string(), json!(x));
            params.insert("yoffset".to_string(), json!(y));
        }
        self.execute_raw(CommandId::MoveTo, params).await?;
        Ok(())
    }

    /// Clicks the given button at the current pointer position.
    pub async fn click(&self, button: MouseButton) -> Result<()> {
        let mut params = Map::new();
        params.insert("button".to_string(), json!(button.code()));
        self.execute_raw(CommandId::Click, params).await?;
        Ok(())
    }

    /// Presses and holds the given button.
    pub async fn button_down(&self, button: MouseButton) -> Result<()> {
        let mut params = Map::new();
        params.insert("button".to_string(), json!(button.code()));
        self.execute_raw(CommandId::ButtonDown, params).await?;
        Ok(())
    }

    /// Releases a previously held button.
    pub async fn button_up(&self, button: MouseButton) -> Result<()> {
        let mut params = Map::new();
        params.insert("button".to_string(), json!(button.code()));
        self.execute_raw(CommandId::ButtonUp, params).await?;
        Ok(())
    }

    /// Double-clicks at the current pointer position.
    pub async fn double_click(&self) -> Result<()> {
        self.execute_raw(CommandId::DoubleClick, Map::new()).await?;
        Ok(())
    }

    /// Types into whichever element currently has focus.
    pub async fn send_keys_to_active_element(&self, text: &str) -> Result<()> {
        let mut params = Map::new();
        params.insert("value".to_string(), json!([text]));
        self.execute_raw(CommandId::SendKeys, params).await?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::CapabilitySet;
    use crate::error::ErrorKind;
    use crate::executor::Executor;
    use crate::protocol::{TransportRequest, TransportResponse};
    use crate::session::locator::By;

    use std::collections::VecDeque;
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct Scripted {
        replies: Mutex<VecDeque<TransportResponse>>,
        requests: Mutex<Vec<(CommandId, String, Option<Value>)>>,
    }

    impl Scripted {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(VecDeque::new()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn push(&self, status: i64, value: Value) {
            let body = json!({"status": status, "sessionId": "S1", "value": value});
            self.replies
                .lock()
                .push_back(TransportResponse::new(200, body.to_string()));
        }

        fn last(&self) -> (CommandId, String, Option<Value>) {
            self.requests.lock().last().expect("recorded").clone()
        }
    }

    #[async_trait]
    impl Executor for Scripted {
        async fn send(&self, request: &TransportRequest) -> Result<TransportResponse> {
            self.requests.lock().push((
                request.command,
                request.url.clone(),
                request.body.clone(),
            ));
            Ok(self.replies.lock().pop_front().expect("scripted reply"))
        }
    }

    async fn session(mock: &Arc<Scripted>) -> Session {
        mock.push(0, json!({"browserName": "firefox"}));
        Session::builder()
            .executor(Arc::clone(mock) as Arc<dyn Executor>)
            .capabilities(CapabilitySet::firefox())
            .connect()
            .await
            .expect("connect")
    }

    #[tokio::test]
    async fn test_frame_target_wire_shapes() {
        let mock = Scripted::new();
        let s = session(&mock).await;

        mock.push(0, json!(null));
        s.switch_to_frame(FrameTarget::Top).await.expect("top");
        assert_eq!(mock.last().2, Some(json!({"id": null})));

        mock.push(0, json!(null));
        s.switch_to_frame(FrameTarget::Index(2)).await.expect("index");
        assert_eq!(mock.last().2, Some(json!({"id": 2})));

        mock.push(0, json!({"ELEMENT": "element/4"}));
        let frame = s.find_element(By::tag_name("iframe")).await.expect("find");
        mock.push(0, json!(null));
        s.switch_to_frame(FrameTarget::Element(frame))
            .await
            .expect("element");
        assert_eq!(
            mock.last().2,
            Some(json!({"id": {"ELEMENT": "element/4"}}))
        );
    }

    #[tokio::test]
    async fn test_missing_frame_is_classified() {
        let mock = Scripted::new();
        let s = session(&mock).await;

        mock.push(8, json!({"message": "no frame named nav"}));
        let err = s
            .switch_to_frame(FrameTarget::Name("nav".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NoSuchFrame));
    }

    #[tokio::test]
    async fn test_window_handles() {
        let mock = Scripted::new();
        let s = session(&mock).await;

        mock.push(0, json!(["W1", "W2"]));
        assert_eq!(s.window_handles().await.expect("handles"), vec!["W1", "W2"]);

        mock.push(23, json!({"message": "no window W9"}));
        let err = s.switch_to_window("W9").await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NoSuchWindow));
    }

    #[tokio::test]
    async fn test_close_window_keeps_session_active() {
        let mock = Scripted::new();
        let s = session(&mock).await;

        mock.push(0, json!(null));
        s.close_window().await.expect("close");
        assert!(s.is_active());
    }

    #[tokio::test]
    async fn test_timeout_wire_shape() {
        let mock = Scripted::new();
        let s = session(&mock).await;

        mock.push(0, json!(null));
        s.set_timeout(TimeoutKind::PageLoad, 5000).await.expect("set");
        let (id, _, body) = mock.last();
        assert_eq!(id, CommandId::SetTimeouts);
        assert_eq!(body, Some(json!({"type": "page load", "ms": 5000})));
    }

    #[tokio::test]
    async fn test_alert_absent_is_classified() {
        let mock = Scripted::new();
        let s = session(&mock).await;

        mock.push(27, json!({"message": "no alert open"}));
        let err = s.accept_alert().await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NoSuchAlert));
    }

    #[tokio::test]
    async fn test_move_to_consumes_element_into_body() {
        let mock = Scripted::new();
        let s = session(&mock).await;

        mock.push(0, json!({"ELEMENT": "element/7"}));
        let target = s.find_element(By::id("menu")).await.expect("find");

        mock.push(0, json!(null));
        s.move_to(Some(&target), Some((4, 8))).await.expect("move");
        let (id, _, body) = mock.last();
        assert_eq!(id, CommandId::MoveTo);
        assert_eq!(
            body,
            Some(json!({"element": "element/7", "xoffset": 4, "yoffset": 8}))
        );
    }
}
