//! Live entity state — cosmetic display data.
//!
//! The state collaborator is consulted only for subtitle/label text.
//! Classification decisions never read live state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Point-in-time state of one entity as reported by the state collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveState {
    /// The raw state value (`"on"`, `"42.5"`, …).
    pub value: String,
    /// Free-form attributes attached by the integration.
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
}

impl LiveState {
    /// Construct a state with the given value and no attributes.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            attributes: HashMap::new(),
        }
    }

    /// Attach an attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// The human-readable name attribute, when the integration sets one.
    #[must_use]
    pub fn friendly_name(&self) -> Option<&str> {
        self.attributes.get("friendly_name").and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_expose_friendly_name_attribute() {
        let state = LiveState::new("on")
            .with_attribute("friendly_name", serde_json::json!("Diffuser Power"));
        assert_eq!(state.friendly_name(), Some("Diffuser Power"));
    }

    #[test]
    fn should_return_none_when_friendly_name_missing() {
        let state = LiveState::new("off");
        assert_eq!(state.friendly_name(), None);
    }

    #[test]
    fn should_ignore_non_string_friendly_name() {
        let state = LiveState::new("on").with_attribute("friendly_name", serde_json::json!(7));
        assert_eq!(state.friendly_name(), None);
    }

    #[test]
    fn should_roundtrip_through_serde_json() {
        let state = LiveState::new("42.5").with_attribute("unit", serde_json::json!("ml"));
        let json = serde_json::to_string(&state).unwrap();
        let parsed: LiveState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }
}
