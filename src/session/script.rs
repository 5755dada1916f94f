//! Script execution in the page.
//!
//! Arguments go through the element-reference wrap transform so an
//! [`ElementHandle`] can be passed straight into page JavaScript; results
//! come back through the unwrap transform, and any element reference found
//! in the result is registered in the handle namespace before it reaches
//! the caller.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Map, json};

use crate::error::Result;
use crate::protocol::{CommandId, ScriptValue, unwrap, wrap_args};

use super::Session;
use super::handles::ElementHandle;

// ============================================================================
// Script arguments
// ============================================================================

impl ElementHandle {
    /// Converts the handle into a script argument.
    #[must_use]
    pub fn to_script_arg(&self) -> ScriptValue {
        ScriptValue::element(self.id())
    }
}

// ============================================================================
// Script operations
// ============================================================================

impl Session {
    /// Executes a synchronous script in the page and returns its value.
    ///
    /// The script body runs as a function with `args` bound to
    /// `arguments`; element references in `args` become live DOM nodes in
    /// the page, and DOM nodes in the return value come back as
    /// [`ScriptValue::Element`] handles registered in this session.
    pub async fn execute_script(
        &self,
        script: impl Into<String>,
        args: &[ScriptValue],
    ) -> Result<ScriptValue> {
        self.run_script(CommandId::ExecuteScript, script.into(), args)
            .await
    }

    /// Executes an asynchronous script; the page signals completion by
    /// invoking the callback passed as the final argument.
    pub async fn execute_async_script(
        &self,
        script: impl Into<String>,
        args: &[ScriptValue],
    ) -> Result<ScriptValue> {
        self.run_script(CommandId::ExecuteAsyncScript, script.into(), args)
            .await
    }

    async fn run_script(
        &self,
        id: CommandId,
        script: String,
        args: &[ScriptValue],
    ) -> Result<ScriptValue> {
        let mut params = Map::new();
        params.insert("script".to_string(), json!(script));
        params.insert("args".to_string(), wrap_args(args));

        let value = self.execute_raw(id, params).await?;
        let result = unwrap(&value)?;
        self.register_result_handles(&result);
        Ok(result)
    }

    /// Registers every element reference in a script result so the
    /// resulting handles pass local staleness checks.
    fn register_result_handles(&self, value: &ScriptValue) {
        match value {
            ScriptValue::Element(id) => {
                let _ = self.register_handle(id);
            }
            ScriptValue::Array(items) => {
                for item in items {
                    self.register_result_handles(item);
                }
            }
            ScriptValue::Object(fields) => {
                for (_, item) in fields {
                    self.register_result_handles(item);
                }
            }
            _ => {}
        }
    }

    /// Resolves a script-returned element reference into a handle valid
    /// for this session's element operations.
    #[must_use]
    pub fn handle_for_script_element(&self, value: &ScriptValue) -> Option<ElementHandle> {
        value.as_element().map(|id| self.register_handle(id))
    }
}

// ============================================================================
// Tests
// ============================================================================
