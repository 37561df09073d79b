//! Devices — physical units owning one or more entities.
//!
//! The device registry is host-owned; the core only reads references and
//! display names from it, and derives its own grouping keys.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque reference into the host's device registry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceRef(String);

impl DeviceRef {
    /// Wrap a registry reference.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw reference text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One device-registry row: a reference plus its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub device_ref: DeviceRef,
    pub display_name: String,
}

impl DeviceEntry {
    /// Construct a registry row.
    #[must_use]
    pub fn new(device_ref: DeviceRef, display_name: impl Into<String>) -> Self {
        Self {
            device_ref,
            display_name: display_name.into(),
        }
    }
}

/// Grouping key identifying one physical device.
///
/// Exactly one key exists per physical device. Entities that carry no
/// device information at all share [`DeviceKey::Unknown`]. The derived
/// ordering keeps registry-backed devices first and `Unknown` last, which
/// fixes the device-picker order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKey {
    /// Explicit device-registry reference.
    Registry(DeviceRef),
    /// Digit run recovered from the identifier text.
    NumericPrefix(String),
    /// Reserved bucket for entities with no device information.
    Unknown,
}

impl DeviceKey {
    /// Whether this is the reserved unknown bucket.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry(device_ref) => device_ref.fmt(f),
            Self::NumericPrefix(digits) => f.write_str(digits),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}
