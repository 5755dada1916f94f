//! Element lookup and interaction.
//!
//! Lookup is asymmetric on zero matches by protocol contract:
//! [`Session::find_element`] fails with `no such element`, while
//! [`Session::find_elements`] succeeds with an empty list. First-match
//! lookup returns the first element in document order.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Map, Value, json};

use crate::error::{Error, Result};
use crate::protocol::{CommandId, LEGACY_ELEMENT_KEY, W3C_ELEMENT_KEY};

use super::Session;
use super::handles::ElementHandle;
use super::locator::By;
use super::navigation::expect_string;

// ============================================================================
// Geometry
// ============================================================================

/// Element position in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub x: f64,
    pub y: f64,
}

/// Element dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

// ============================================================================
// Lookup
// ============================================================================

impl Session {
    /// Finds the first element in document order matching the locator.
    ///
    /// # Errors
    ///
    /// Fails with `no such element` when nothing matches.
    pub async fn find_element(&self, by: By) -> Result<ElementHandle> {
        let value = self
            .execute_raw(CommandId::FindElement, locator_params(&by))
            .await?;
        self.handle_from_value(&value)
    }

    /// Finds every element matching the locator, in document order.
    ///
    /// Zero matches is a successful empty list, not an error.
    pub async fn find_elements(&self, by: By) -> Result<Vec<ElementHandle>> {
        let value = self
            .execute_raw(CommandId::FindElements, locator_params(&by))
            .await?;
        self.handles_from_value(value)
    }

    /// Finds the first matching element in the subtree rooted at `parent`.
    pub async fn find_child_element(
        &self,
        parent: &ElementHandle,
        by: By,
    ) -> Result<ElementHandle> {
        self.check_handle(parent)?;
        let mut params = locator_params(&by);
        params.insert("id".to_string(), json!(parent.id()));
        let value = self.execute_raw(CommandId::FindChildElement, params).await?;
        self.handle_from_value(&value)
    }

    /// Finds every matching element in the subtree rooted at `parent`.
    pub async fn find_child_elements(
        &self,
        parent: &ElementHandle,
        by: By,
    ) -> Result<Vec<ElementHandle>> {
        self.check_handle(parent)?;
        let mut params = locator_params(&by);
        params.insert("id".to_string(), json!(parent.id()));
        let value = self
            .execute_raw(CommandId::FindChildElements, params)
            .await?;
        self.handles_from_value(value)
    }

    fn handle_from_value(&self, value: &Value) -> Result<ElementHandle> {
        Ok(self.register_handle(&element_id_from_value(value)?))
    }

    fn handles_from_value(&self, value: Value) -> Result<Vec<ElementHandle>> {
        let Value::Array(items) = value else {
            return Err(Error::protocol(format!(
                "expected element list, got {value}"
            )));
        };
        items.iter().map(|v| self.handle_from_value(v)).collect()
    }
}

// ============================================================================
// Interaction
// ============================================================================

impl Session {
    /// Clicks the element.
    pub async fn click_element(&self, element: &ElementHandle) -> Result<()> {
        self.element_command(CommandId::ClickElement, element, Map::new())
            .await?;
        Ok(())
    }

    /// Clears a text input or textarea.
    pub async fn clear_element(&self, element: &ElementHandle) -> Result<()> {
        self.element_command(CommandId::ClearElement, element, Map::new())
            .await?;
        Ok(())
    }

    /// Types the given text into the element.
    pub async fn send_keys(&self, element: &ElementHandle, text: &str) -> Result<()> {
        let mut params = Map::new();
        // The wire format takes keystrokes as a list of strings.
        params.insert("value".to_string(), json!([text]));
        self.element_command(CommandId::SendKeysToElement, element, params)
            .await?;
        Ok(())
    }

    /// Submits the form the element belongs to.
    pub async fn submit(&self, element: &ElementHandle) -> Result<()> {
        self.element_command(CommandId::SubmitElement, element, Map::new())
            .await?;
        Ok(())
    }
}

// ============================================================================
// Inspection
// ============================================================================

impl Session {
    /// Returns the element's visible text.
    pub async fn element_text(&self, element: &ElementHandle) -> Result<String> {
        let value = self
            .element_command(CommandId::GetElementText, element, Map::new())
            .await?;
        expect_string(value, "element text")
    }

    /// Returns the element's tag name, lowercased by the server.
    pub async fn element_tag_name(&self, element: &ElementHandle) -> Result<String> {
        let value = self
            .element_command(CommandId::GetElementTagName, element, Map::new())
            .await?;
        expect_string(value, "tag name")
    }

    /// Returns the value of an attribute, or `None` when it is absent.
    pub async fn element_attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>> {
        self.check_handle(element)?;
        let mut params = Map::new();
        params.insert("id".to_string(), json!(element.id()));
        params.insert("name".to_string(), json!(name));
        let value = self
            .execute_raw(CommandId::GetElementAttribute, params)
            .await?;
        optional_string(value, "attribute")
    }

    /// Returns the value of a DOM property, or `None` when it is absent.
    pub async fn element_property(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<Value>> {
        self.check_handle(element)?;
        let mut params = Map::new();
        params.insert("id".to_string(), json!(element.id()));
        params.insert("propertyName".to_string(), json!(name));
        let value = self
            .execute_raw(CommandId::GetElementProperty, params)
            .await?;
        Ok(match value {
            Value::Null => None,
            other => Some(other),
        })
    }

    /// Returns the computed value of a CSS property.
    pub async fn element_css_value(
        &self,
        element: &ElementHandle,
        property: &str,
    ) -> Result<String> {
        self.check_handle(element)?;
        let mut params = Map::new();
        params.insert("id".to_string(), json!(element.id()));
        params.insert("propertyName".to_string(), json!(property));
        let value = self
            .execute_raw(CommandId::GetElementCssValue, params)
            .await?;
        expect_string(value, "CSS value")
    }

    /// Returns whether an option or checkbox element is selected.
    pub async fn is_selected(&self, element: &ElementHandle) -> Result<bool> {
        let value = self
            .element_command(CommandId::IsElementSelected, element, Map::new())
            .await?;
        expect_bool(value, "selected state")
    }

    /// Returns whether the element is enabled.
    pub async fn is_enabled(&self, element: &ElementHandle) -> Result<bool> {
        let value = self
            .element_command(CommandId::IsElementEnabled, element, Map::new())
            .await?;
        expect_bool(value, "enabled state")
    }

    /// Returns whether the element is rendered visible.
    pub async fn is_displayed(&self, element: &ElementHandle) -> Result<bool> {
        let value = self
            .element_command(CommandId::IsElementDisplayed, element, Map::new())
            .await?;
        expect_bool(value, "displayed state")
    }

    /// Returns the element's position in page coordinates.
    pub async fn element_location(&self, element: &ElementHandle) -> Result<Location> {
        let value = self
            .element_command(CommandId::GetElementLocation, element, Map::new())
            .await?;
        Ok(Location {
            x: expect_number(&value, "x")?,
            y: expect_number(&value, "y")?,
        })
    }

    /// Returns the element's dimensions in CSS pixels.
    pub async fn element_size(&self, element: &ElementHandle) -> Result<Size> {
        let value = self
            .element_command(CommandId::GetElementSize, element, Map::new())
            .await?;
        Ok(Size {
            width: expect_number(&value, "width")?,
            height: expect_number(&value, "height")?,
        })
    }

    /// Returns whether two handles refer to the same DOM element.
    pub async fn elements_equal(
        &self,
        element: &ElementHandle,
        other: &ElementHandle,
    ) -> Result<bool> {
        self.check_handle(element)?;
        self.check_handle(other)?;
        let mut params = Map::new();
        params.insert("id".to_string(), json!(element.id()));
        params.insert("other".to_string(), json!(other.id()));
        let value = self.execute_raw(CommandId::ElementEquals, params).await?;
        expect_bool(value, "element equality")
    }

    /// Validates the handle locally, then runs a command with `{id}` bound
    /// to it.
    async fn element_command(
        &self,
        id: CommandId,
        element: &ElementHandle,
        mut params: Map<String, Value>,
    ) -> Result<Value> {
        self.check_handle(element)?;
        params.insert("id".to_string(), json!(element.id()));
        self.execute_raw(id, params).await
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn locator_params(by: &By) -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("using".to_string(), json!(by.strategy()));
    params.insert("value".to_string(), json!(by.expression()));
    params
}

/// Pulls the raw element id out of a wire element reference, accepting
/// either sentinel key.
pub(crate) fn element_id_from_value(value: &Value) -> Result<String> {
    let id = value
        .get(LEGACY_ELEMENT_KEY)
        .or_else(|| value.get(W3C_ELEMENT_KEY));
    match id {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(Error::protocol(format!(
            "expected an element reference, got {value}"
        ))),
    }
}

fn optional_string(value: Value, what: &str) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        other => Err(Error::protocol(format!(
            "expected {what} to be a string or null, got {other}"
        ))),
    }
}

fn expect_bool(value: Value, what: &str) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| Error::protocol(format!("expected {what} to be a boolean, got {value}")))
}

fn expect_number(value: &Value, field: &str) -> Result<f64> {
    value
        .get(field)
        .and_then(Value::as_f64)
        .ok_or_else(|| Error::protocol(format!("expected numeric {field:?} in {value}")))
}

// ============================================================================
// Tests
// ============================================================================
