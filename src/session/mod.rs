//! Session: the stateful heart of the engine.
//!
//! A [`Session`] owns the server-assigned session id, the negotiated
//! capabilities, and the element-handle namespace, and routes every
//! operation through the codec and a pluggable [`Executor`].
//!
//! # State machine
//!
//! ```text
//! Created ──NewSession ok──► Active ──Quit / session lost──► Ended
//!    │                         │  ▲                            │
//!    └─NewSession err──► (no   └──┘ per-command errors         └─► any command
//!       session object)             keep the session Active         fails locally
//! ```
//!
//! `Created` has no representation here: [`SessionBuilder::connect`] only
//! returns a [`Session`] once `NewSession` has succeeded. `Ended` is
//! terminal; commands against an ended session fail with
//! `invalid session id` without touching the transport.
//!
//! # Concurrency
//!
//! The wire protocol has no pipelining, so the session enforces exactly
//! one in-flight command through an internal async lock rather than
//! relying on caller discipline. Independent sessions share nothing but
//! the read-only command registry and (optionally) an executor.
//!
//! # Modules
//!
//! | File | Operations |
//! |------|------------|
//! | `navigation` | navigate, url, title, history, source, screenshot |
//! | `elements` | find/interact/inspect elements |
//! | `script` | script execution with element-reference transform |
//! | `cookies` | cookie management |
//! | `windows` | frames, windows, alerts, timeouts, raw input |

// ============================================================================
// Submodules
// ============================================================================

/// Cookie operations and the cookie model.
pub mod cookies;

/// Element lookup and interaction.
pub mod elements;

/// Element handle namespace.
pub mod handles;

/// Locator strategies.
pub mod locator;

/// Navigation operations.
pub mod navigation;

/// Script execution.
pub mod script;

/// Frames, windows, alerts, timeouts, raw input.
pub mod windows;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::capabilities::CapabilitySet;
use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::protocol::{
    Command, CommandId, SessionId, TransportRequest, classify, decode, encode,
};

use handles::{ElementHandle, HandleNamespace};

// ============================================================================
// Constants
// ============================================================================

/// Default per-command timeout.
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Session
// ============================================================================

pub(crate) struct SessionInner {
    id: SessionId,
    capabilities: CapabilitySet,
    executor: Arc<dyn Executor>,
    handles: HandleNamespace,
    /// Terminal-state flag. Once set it is never cleared.
    ended: AtomicBool,
    /// Per-session exclusion: exactly one in-flight command.
    in_flight: tokio::sync::Mutex<()>,
    command_timeout: Duration,
}

/// A live browser-automation session.
///
/// Cheap to clone; clones share the same underlying session.
#[derive(Clone)]
pub struct Session {
    pub(crate) inner: Arc<SessionInner>,
}

impl Session {
    /// Starts building a session.
    #[inline]
    #[must_use]
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Returns the server-assigned session id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.inner.id
    }

    /// Returns the negotiated capabilities (requested merged with what the
    /// server returned).
    #[inline]
    #[must_use]
    pub fn capabilities(&self) -> &CapabilitySet {
        &self.inner.capabilities
    }

    /// Returns `true` until the session has ended.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.inner.ended.load(Ordering::Acquire)
    }

    /// Runs a raw command with explicit parameters and returns the
    /// classified response value.
    ///
    /// Every typed operation goes through this; it is public as an escape
    /// hatch for endpoints with vendor extensions.
    ///
    /// # Errors
    ///
    /// - `invalid session id` locally if the session has ended.
    /// - Any classified command failure from the server.
    /// - Fatal [`Error::Protocol`] on structural decode failures.
    pub async fn execute_raw(
        &self,
        id: CommandId,
        params: Map<String, Value>,
    ) -> Result<Value> {
        self.ensure_active()?;
        let _guard = self.inner.in_flight.lock().await;
        // Quit may have won the lock race.
        self.ensure_active()?;

        let request = encode(
            Command::new(id)
                .with_session(self.inner.id.clone())
                .with_params(params),
        )?;

        let result = self.dispatch(&request).await;
        if let Err(e) = &result
            && e.is_session_ended()
        {
            // Server no longer knows this session; implicit terminal
            // transition so callers stop retrying against it.
            self.inner.ended.store(true, Ordering::Release);
            debug!(session = %self.inner.id, "Server reported session lost");
        }
        result
    }

    /// Ends the session, releasing the server-side browser.
    ///
    /// Best-effort by contract: a transport or classified failure during
    /// teardown is logged at `warn` and swallowed so caller cleanup code
    /// is never blocked on a dying endpoint. Structural protocol failures
    /// still propagate. The session is `Ended` afterwards either way.
    pub async fn quit(&self) -> Result<()> {
        if !self.is_active() {
            return Ok(());
        }
        let _guard = self.inner.in_flight.lock().await;
        if !self.is_active() {
            return Ok(());
        }

        let request = encode(Command::new(CommandId::Quit).with_session(self.inner.id.clone()))?;
        let result = self.dispatch(&request).await;
        self.inner.ended.store(true, Ordering::Release);

        match result {
            Ok(_) => {
                debug!(session = %self.inner.id, "Session ended");
                Ok(())
            }
            Err(Error::Command(e)) => {
                warn!(session = %self.inner.id, error = %e, "Best-effort quit failed");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    // ------------------------------------------------------------------
    // Pipeline internals
    // ------------------------------------------------------------------

    fn ensure_active(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(Error::invalid_session_id(format!(
                "session {} has ended",
                self.inner.id
            )))
        }
    }

    /// Transmit, decode, classify — with a single retry for transport
    /// failures on idempotent (GET) commands.
    async fn dispatch(&self, request: &TransportRequest) -> Result<Value> {
        match self.round_trip(request).await {
            Err(e) if e.is_transport() && request.is_idempotent() => {
                debug!(command = %request.command, "Transport failure on idempotent command, retrying once");
                self.round_trip(request).await
            }
            other => other,
        }
    }

    async fn round_trip(&self, request: &TransportRequest) -> Result<Value> {
        let send = self.inner.executor.send(request);
        let raw = match timeout(self.inner.command_timeout, send).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::timeout(
                    request.command.wire_name(),
                    self.inner.command_timeout.as_millis() as u64,
                ));
            }
        };
        classify(decode(&raw)?)
    }

    // ------------------------------------------------------------------
    // Handle helpers shared by the operation modules
    // ------------------------------------------------------------------

    /// Mints a handle for a server-issued element id.
    pub(crate) fn register_handle(&self, element_id: &str) -> ElementHandle {
        let generation = self.inner.handles.register(element_id);
        ElementHandle::new(element_id, self.inner.id.clone(), generation)
    }

    /// Rejects handles from other sessions or from before the last
    /// navigation, without contacting the transport.
    pub(crate) fn check_handle(&self, handle: &ElementHandle) -> Result<()> {
        if handle.session_id() != &self.inner.id || !self.inner.handles.is_current(handle) {
            return Err(Error::stale_element(handle.id()));
        }
        Ok(())
    }

    /// Invalidates every outstanding handle (called after navigation).
    pub(crate) fn invalidate_handles(&self) {
        self.inner.handles.invalidate_all();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.inner.id)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SessionBuilder
// ============================================================================

/// Builder for [`Session`]: executor, capabilities, timeouts.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use remote_webdriver::{CapabilitySet, HttpExecutor, Session};
///
/// # async fn demo() -> remote_webdriver::Result<()> {
/// let executor = Arc::new(HttpExecutor::new("http://localhost:4444")?);
/// let session = Session::builder()
///     .executor(executor)
///     .capabilities(CapabilitySet::firefox())
///     .connect()
///     .await?;
/// session.navigate("https://example.com").await?;
/// session.quit().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct SessionBuilder {
    executor: Option<Arc<dyn Executor>>,
    capabilities: Option<CapabilitySet>,
    command_timeout: Option<Duration>,
}

impl SessionBuilder {
    /// Creates an empty builder.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the executor that transmits commands.
    #[must_use]
    pub fn executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Sets the desired capabilities.
    #[must_use]
    pub fn capabilities(mut self, capabilities: CapabilitySet) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    /// Sets the per-command timeout. Defaults to 30s.
    #[must_use]
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    /// Negotiates a new session with the server.
    ///
    /// On failure no [`Session`] exists — there is nothing to clean up.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] when executor or capabilities are missing, or
    ///   the capabilities lack `browserName`.
    /// - Classified or structural failures from the `NewSession` exchange.
    pub async fn connect(self) -> Result<Session> {
        let executor = self
            .executor
            .ok_or_else(|| Error::config("executor is required"))?;
        let requested = self
            .capabilities
            .ok_or_else(|| Error::config("capabilities are required"))?;
        if !requested.is_negotiable() {
            return Err(Error::config("capabilities must include browserName"));
        }
        let command_timeout = self.command_timeout.unwrap_or(DEFAULT_COMMAND_TIMEOUT);

        let mut params = Map::new();
        params.insert("desiredCapabilities".to_string(), requested.to_value());
        let request = encode(Command::new(CommandId::NewSession).with_params(params))?;

        let raw = timeout(command_timeout, executor.send(&request))
            .await
            .map_err(|_| {
                Error::timeout(
                    CommandId::NewSession.wire_name(),
                    command_timeout.as_millis() as u64,
                )
            })??;

        let response = decode(&raw)?;
        let session_id = response.session_id.clone();
        // Classify first so a failed NewSession surfaces its real error
        // even when the server omits a session id.
        let returned = CapabilitySet::from_value(&classify(response)?);
        let session_id = session_id
            .ok_or_else(|| Error::protocol("NewSession response carried no session id"))?;
        let capabilities = requested.merge(&returned);

        debug!(session = %session_id, browser = ?capabilities.browser_name(), "Session created");

        Ok(Session {
            inner: Arc::new(SessionInner {
                id: session_id,
                capabilities,
                executor,
                handles: HandleNamespace::new(),
                ended: AtomicBool::new(false),
                in_flight: tokio::sync::Mutex::new(()),
                command_timeout,
            }),
        })
    }
}

// ============================================================================
// Server Status
// ============================================================================

/// Probes endpoint health without a session (`GET /status`).
///
/// # Errors
///
/// Transport or classified failures from the status exchange.
pub async fn server_status(executor: &dyn Executor) -> Result<Value> {
    let request = encode(Command::new(CommandId::Status))?;
    classify(decode(&executor.send(&request).await?)?)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::protocol::{TransportResponse, Verb};
    use crate::session::locator::By;

    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    // --------------------------------------------------------------------
    // Mock executor
    // --------------------------------------------------------------------

    /// Scripted executor: pops one canned reply per send and records every
    /// request it saw.
    struct MockExecutor {
        replies: Mutex<VecDeque<Result<TransportResponse>>>,
        log: Mutex<Vec<(CommandId, Verb, String)>>,
    }

    impl MockExecutor {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(VecDeque::new()),
                log: Mutex::new(Vec::new()),
            })
        }

        fn push_wire(&self, body: serde_json::Value) {
            self.replies
                .lock()
                .push_back(Ok(TransportResponse::new(200, body.to_string())));
        }

        fn push_success(&self, value: serde_json::Value) {
            self.push_wire(json!({"status": 0, "sessionId": "S1", "value": value}));
        }

        fn push_error(&self, status: i64, message: &str) {
            self.push_wire(json!({
                "status": status,
                "sessionId": "S1",
                "value": {"message": message},
            }));
        }

        fn push_transport_failure(&self) {
            self.replies
                .lock()
                .push_back(Err(Error::transport("connection reset")));
        }

        fn sends(&self) -> usize {
            self.log.lock().len()
        }

        fn command_log(&self) -> Vec<CommandId> {
            self.log.lock().iter().map(|(id, _, _)| *id).collect()
        }
    }

    #[async_trait]
    impl Executor for MockExecutor {
        async fn send(&self, request: &TransportRequest) -> Result<TransportResponse> {
            self.log
                .lock()
                .push((request.command, request.verb, request.url.clone()));
            self.replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| panic!("unexpected send: {}", request.command))
        }
    }

    async fn connected(mock: &Arc<MockExecutor>) -> Session {
        mock.push_success(json!({"browserName": "chrome", "version": "121"}));
        Session::builder()
            .executor(Arc::clone(mock) as Arc<dyn Executor>)
            .capabilities(CapabilitySet::chrome())
            .connect()
            .await
            .expect("connect")
    }

    // --------------------------------------------------------------------
    // Session creation
    // --------------------------------------------------------------------

    #[tokio::test]
    async fn test_connect_negotiates_capabilities() {
        let mock = MockExecutor::new();
        let session = connected(&mock).await;

        assert_eq!(session.id().as_str(), "S1");
        assert!(session.is_active());
        // Server-returned version merged over the request.
        assert_eq!(session.capabilities().get("version"), Some(&json!("121")));
        assert_eq!(session.capabilities().browser_name(), Some("chrome"));
    }

    #[tokio::test]
    async fn test_connect_requires_browser_name() {
        let mock = MockExecutor::new();
        let err = Session::builder()
            .executor(mock as Arc<dyn Executor>)
            .capabilities(CapabilitySet::new())
            .connect()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[tokio::test]
    async fn test_connect_failure_returns_no_session() {
        let mock = MockExecutor::new();
        mock.push_error(13, "could not start browser");

        let result = Session::builder()
            .executor(Arc::clone(&mock) as Arc<dyn Executor>)
            .capabilities(CapabilitySet::firefox())
            .connect()
            .await;
        assert!(result.is_err());
    }

    // --------------------------------------------------------------------
    // Terminal state
    // --------------------------------------------------------------------

    #[tokio::test]
    async fn test_quit_is_terminal_and_local() {
        let mock = MockExecutor::new();
        let session = connected(&mock).await;

        mock.push_success(json!(null));
        session.quit().await.expect("quit");
        assert!(!session.is_active());
        let sends_after_quit = mock.sends();

        // Subsequent commands fail locally, without contacting transport.
        let err = session.current_url().await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidSessionId));
        assert_eq!(mock.sends(), sends_after_quit);

        // Quit on an ended session is a no-op.
        session.quit().await.expect("idempotent quit");
        assert_eq!(mock.sends(), sends_after_quit);
    }

    #[tokio::test]
    async fn test_quit_is_best_effort_on_transport_failure() {
        let mock = MockExecutor::new();
        let session = connected(&mock).await;

        mock.push_transport_failure();
        // Swallowed by contract; the session still ends.
        tokio_test::assert_ok!(session.quit().await);
        assert!(!session.is_active());
    }

    #[tokio::test]
    async fn test_server_reported_session_loss_is_terminal() {
        let mock = MockExecutor::new();
        let session = connected(&mock).await;

        mock.push_error(6, "session gone");
        let err = session.current_url().await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidSessionId));
        assert!(!session.is_active());

        // No further transport contact.
        let sends = mock.sends();
        let err = session.title().await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidSessionId));
        assert_eq!(mock.sends(), sends);
    }

    // --------------------------------------------------------------------
    // Retry policy
    // --------------------------------------------------------------------

    #[tokio::test]
    async fn test_idempotent_get_retries_once() {
        let mock = MockExecutor::new();
        let session = connected(&mock).await;
        let sends_before = mock.sends();

        mock.push_transport_failure();
        mock.push_success(json!("https://example.com/"));

        let url = session.current_url().await.expect("retried read");
        assert_eq!(url, "https://example.com/");
        assert_eq!(mock.sends(), sends_before + 2);
    }

    #[tokio::test]
    async fn test_mutating_command_is_never_retried() {
        let mock = MockExecutor::new();
        let session = connected(&mock).await;
        let sends_before = mock.sends();

        mock.push_transport_failure();
        let err = tokio_test::assert_err!(session.navigate("https://example.com").await);
        assert!(err.is_transport());
        assert_eq!(mock.sends(), sends_before + 1);
    }

    #[tokio::test]
    async fn test_transport_retry_gives_up_after_second_failure() {
        let mock = MockExecutor::new();
        let session = connected(&mock).await;

        mock.push_transport_failure();
        mock.push_transport_failure();
        let err = session.current_url().await.unwrap_err();
        assert!(err.is_transport());
        assert!(session.is_active());
    }

    // --------------------------------------------------------------------
    // Single in-flight invariant
    // --------------------------------------------------------------------

    /// Executor that detects overlapping sends.
    struct SerialProbe {
        entered: AtomicUsize,
        overlapped: AtomicBool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Executor for SerialProbe {
        async fn send(&self, request: &TransportRequest) -> Result<TransportResponse> {
            if self.entered.fetch_add(1, Ordering::SeqCst) > 0 {
                self.overlapped.store(true, Ordering::SeqCst);
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.entered.fetch_sub(1, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);

            let body = if request.command == CommandId::NewSession {
                json!({"status": 0, "sessionId": "S1", "value": {}})
            } else {
                json!({"status": 0, "sessionId": "S1", "value": null})
            };
            Ok(TransportResponse::new(200, body.to_string()))
        }
    }

    #[tokio::test]
    async fn test_commands_on_one_session_never_overlap() {
        let probe = Arc::new(SerialProbe {
            entered: AtomicUsize::new(0),
            overlapped: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        });

        let session = Session::builder()
            .executor(Arc::clone(&probe) as Arc<dyn Executor>)
            .capabilities(CapabilitySet::chrome())
            .connect()
            .await
            .expect("connect");

        let a = session.clone();
        let b = session.clone();
        let (ra, rb) = tokio::join!(
            a.navigate("https://one.example"),
            b.navigate("https://two.example"),
        );
        ra.expect("first");
        rb.expect("second");

        assert!(!probe.overlapped.load(Ordering::SeqCst));
        assert_eq!(probe.calls.load(Ordering::SeqCst), 3); // NewSession + 2
    }

    // --------------------------------------------------------------------
    // Timeout releases the lock
    // --------------------------------------------------------------------

    /// Executor that never answers its first call.
    struct StallOnce {
        stalled: AtomicBool,
    }

    #[async_trait]
    impl Executor for StallOnce {
        async fn send(&self, request: &TransportRequest) -> Result<TransportResponse> {
            if request.command != CommandId::NewSession
                && !self.stalled.swap(true, Ordering::SeqCst)
            {
                std::future::pending::<()>().await;
            }
            Ok(TransportResponse::new(
                200,
                json!({"status": 0, "sessionId": "S1", "value": null}).to_string(),
            ))
        }
    }

    #[tokio::test]
    async fn test_timeout_produces_classified_error_and_frees_session() {
        let executor = Arc::new(StallOnce {
            stalled: AtomicBool::new(false),
        });
        let session = Session::builder()
            .executor(Arc::clone(&executor) as Arc<dyn Executor>)
            .capabilities(CapabilitySet::chrome())
            .command_timeout(Duration::from_millis(20))
            .connect()
            .await
            .expect("connect");

        let err = session.navigate("https://example.com").await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Timeout));

        // The exclusion lock was released; the next command proceeds.
        session.refresh().await.expect("session not deadlocked");
        assert!(session.is_active());
    }

    // --------------------------------------------------------------------
    // End-to-end scenario
    // --------------------------------------------------------------------

    #[tokio::test]
    async fn test_end_to_end_command_flow() {
        let mock = MockExecutor::new();
        let session = connected(&mock).await;

        mock.push_success(json!(null));
        session.navigate("https://example.com").await.expect("get");

        mock.push_success(json!({"ELEMENT": "element/0"}));
        let element = session
            .find_element(By::id("main"))
            .await
            .expect("find");
        assert_eq!(element.id(), "element/0");

        mock.push_success(json!(null));
        session.click_element(&element).await.expect("click");

        mock.push_success(json!(null));
        session.quit().await.expect("quit");

        let err = session.current_url().await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidSessionId));

        assert_eq!(
            mock.command_log(),
            vec![
                CommandId::NewSession,
                CommandId::Get,
                CommandId::FindElement,
                CommandId::ClickElement,
                CommandId::Quit,
            ]
        );
    }

    // --------------------------------------------------------------------
    // Server status
    // --------------------------------------------------------------------

    #[tokio::test]
    async fn test_server_status_needs_no_session() {
        let mock = MockExecutor::new();
        mock.push_wire(json!({"status": 0, "sessionId": null, "value": {"ready": true}}));

        let status = server_status(mock.as_ref()).await.expect("status");
        assert_eq!(status["ready"], true);
        assert_eq!(mock.command_log(), vec![CommandId::Status]);
    }
}
