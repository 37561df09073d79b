//! Entity identifiers and registry records.
//!
//! An entity is a single observable/controllable point exposed by an
//! integration (a switch, a sensor, a numeric control). The registry
//! supplies records wholesale on each refresh; the core never mutates them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::device::DeviceRef;
use crate::error::ValidationError;

/// The fixed set of entity kinds the classifier recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Switch,
    Number,
    Select,
    Sensor,
    Text,
    Button,
    Time,
}

impl EntityKind {
    /// All recognized kinds, in a stable order.
    pub const ALL: [Self; 7] = [
        Self::Switch,
        Self::Number,
        Self::Select,
        Self::Sensor,
        Self::Text,
        Self::Button,
        Self::Time,
    ];

    /// Parse a kind prefix, returning `None` for unrecognized kinds.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "switch" => Some(Self::Switch),
            "number" => Some(Self::Number),
            "select" => Some(Self::Select),
            "sensor" => Some(Self::Sensor),
            "text" => Some(Self::Text),
            "button" => Some(Self::Button),
            "time" => Some(Self::Time),
            _ => None,
        }
    }

    /// The lowercase prefix as it appears in entity identifiers.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Switch => "switch",
            Self::Number => "number",
            Self::Select => "select",
            Self::Sensor => "sensor",
            Self::Text => "text",
            Self::Button => "button",
            Self::Time => "time",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of one entity, conventionally `<kind>.<rest>`.
///
/// The text is owned by the external registry and treated as opaque beyond
/// the kind prefix. Ordering is plain lexicographic ordering of the text,
/// which is what every deterministic tie-break in the crate relies on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    /// Validate and wrap an identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyEntityId`] for an empty string and
    /// [`ValidationError::MissingKind`] when there is no `<kind>.` prefix
    /// or nothing after it.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ValidationError::EmptyEntityId);
        }
        match value.split_once('.') {
            Some((kind, rest)) if !kind.is_empty() && !rest.is_empty() => Ok(Self(value)),
            _ => Err(ValidationError::MissingKind(value)),
        }
    }

    /// The raw identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The raw kind prefix (the text before the first dot).
    #[must_use]
    pub fn kind_str(&self) -> &str {
        // Constructor guarantees the dot is present.
        self.0.split('.').next().unwrap_or_default()
    }

    /// The recognized kind, if the prefix is one of [`EntityKind::ALL`].
    #[must_use]
    pub fn kind(&self) -> Option<EntityKind> {
        EntityKind::parse(self.kind_str())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntityId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for EntityId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// One entity-registry row, as supplied by the registry collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub entity_id: EntityId,
    #[serde(default)]
    pub unique_id: Option<String>,
    #[serde(default)]
    pub device_ref: Option<DeviceRef>,
    #[serde(default)]
    pub original_name: Option<String>,
    pub integration: String,
}

impl EntityRecord {
    /// Create a builder for constructing an [`EntityRecord`].
    #[must_use]
    pub fn builder() -> EntityRecordBuilder {
        EntityRecordBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyIntegration`] when the integration
    /// name is empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.integration.is_empty() {
            return Err(ValidationError::EmptyIntegration);
        }
        Ok(())
    }
}

/// Step-by-step builder for [`EntityRecord`].
#[derive(Debug, Default)]
pub struct EntityRecordBuilder {
    entity_id: Option<String>,
    unique_id: Option<String>,
    device_ref: Option<DeviceRef>,
    original_name: Option<String>,
    integration: Option<String>,
}

impl EntityRecordBuilder {
    /// Set the entity identifier from raw text.
    ///
    /// Invalid text is surfaced when [`build`](Self::build) runs.
    #[must_use]
    pub fn entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    #[must_use]
    pub fn unique_id(mut self, unique_id: impl Into<String>) -> Self {
        self.unique_id = Some(unique_id.into());
        self
    }

    #[must_use]
    pub fn device_ref(mut self, device_ref: DeviceRef) -> Self {
        self.device_ref = Some(device_ref);
        self
    }

    #[must_use]
    pub fn original_name(mut self, original_name: impl Into<String>) -> Self {
        self.original_name = Some(original_name.into());
        self
    }

    #[must_use]
    pub fn integration(mut self, integration: impl Into<String>) -> Self {
        self.integration = Some(integration.into());
        self
    }

    /// Consume the builder, validate, and return an [`EntityRecord`].
    ///
    /// # Errors
    ///
    /// Returns the [`EntityId`] validation error when the identifier text
    /// is missing or malformed, or [`ValidationError::EmptyIntegration`]
    /// when the integration name is missing or empty.
    pub fn build(self) -> Result<EntityRecord, ValidationError> {
        let record = EntityRecord {
            entity_id: EntityId::new(self.entity_id.unwrap_or_default())?,
            unique_id: self.unique_id,
            device_ref: self.device_ref,
            original_name: self.original_name,
            integration: self.integration.unwrap_or_default(),
        };
        record.validate()?;
        Ok(record)
    }
}
