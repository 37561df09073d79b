//! Device grouping — partitioning registry entities into per-device buckets.
//!
//! The grouping key is the explicit device reference when the registry
//! provides one, else a numeric prefix recovered from the identifier text
//! (`<kind>.<six-plus digits>_…`), else the reserved unknown bucket. A
//! fallback scan over the full state world exists for deployments whose
//! registry carries no usable integration metadata.
//!
//! Zero resulting buckets is a normal outcome, never an error.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::Regex;

use crate::device::{DeviceKey, DeviceRef};
use crate::entity::{EntityId, EntityKind, EntityRecord};

/// Captures the digit run in `<kind>.<six-plus digits>_…`.
static NUMERIC_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^.]+\.(\d{6,})_").expect("hard-coded pattern compiles")
});

/// Recognizes state-world identifiers that look device-scoped: a known
/// kind prefix followed by a six-plus-digit run.
static FALLBACK_ID: LazyLock<Regex> = LazyLock::new(|| {
    let kinds = EntityKind::ALL.map(EntityKind::as_str).join("|");
    Regex::new(&format!(r"^(?:{kinds})\.\d{{6,}}_")).expect("hard-coded pattern compiles")
});

/// MAC-style token: colon/dash separated octets, or a bare 12-hex-digit
/// run, delimited by non-alphanumeric text (`_` counts as a delimiter, the
/// usual unique-id convention).
static HARDWARE_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:^|[^0-9a-z])((?:[0-9a-f]{2}[:-]){5}[0-9a-f]{2}|[0-9a-f]{12})(?:[^0-9a-z]|$)",
    )
    .expect("hard-coded pattern compiles")
});

/// The digit run identifying the owning device, when the identifier text
/// follows the numeric-prefix convention.
#[must_use]
pub fn numeric_prefix(id: &EntityId) -> Option<&str> {
    NUMERIC_PREFIX
        .captures(id.as_str())
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// The grouping key for one registry record.
#[must_use]
pub fn device_key(record: &EntityRecord) -> DeviceKey {
    if let Some(device_ref) = &record.device_ref {
        return DeviceKey::Registry(device_ref.clone());
    }
    numeric_prefix(&record.entity_id)
        .map_or(DeviceKey::Unknown, |digits| {
            DeviceKey::NumericPrefix(digits.to_string())
        })
}

/// Partition registry records into per-device buckets.
///
/// Records whose integration is not in `allowed_integrations` are dropped.
/// Each bucket is sorted lexicographically by identifier so downstream
/// classification sees a stable order.
#[must_use]
pub fn group(
    entities: &[EntityRecord],
    allowed_integrations: &BTreeSet<String>,
) -> BTreeMap<DeviceKey, Vec<EntityId>> {
    let mut buckets: BTreeMap<DeviceKey, Vec<EntityId>> = BTreeMap::new();
    for record in entities
        .iter()
        .filter(|record| allowed_integrations.contains(&record.integration))
    {
        buckets
            .entry(device_key(record))
            .or_default()
            .push(record.entity_id.clone());
    }
    for ids in buckets.values_mut() {
        ids.sort();
    }
    buckets
}

/// Fallback grouping over the full state world.
///
/// Some deployments never populate integration metadata; when the registry
/// pass produces nothing, every known identifier matching a recognized kind
/// prefix plus a six-plus-digit run is grouped by the numeric-prefix rule.
#[must_use]
pub fn group_fallback(known_ids: &[EntityId]) -> BTreeMap<DeviceKey, Vec<EntityId>> {
    let mut buckets: BTreeMap<DeviceKey, Vec<EntityId>> = BTreeMap::new();
    for id in known_ids
        .iter()
        .filter(|id| FALLBACK_ID.is_match(id.as_str()))
    {
        let key = numeric_prefix(id).map_or(DeviceKey::Unknown, |digits| {
            DeviceKey::NumericPrefix(digits.to_string())
        });
        buckets.entry(key).or_default().push(id.clone());
    }
    for ids in buckets.values_mut() {
        ids.sort();
    }
    buckets
}

/// Human-readable label for one device bucket.
///
/// Preference order: the device-registry display name, else a short suffix
/// of a hardware address found in any member's identifier/unique-id/name
/// text, else the raw key text (`"Unknown device"` for the unknown bucket).
#[must_use]
pub fn derive_label(
    key: &DeviceKey,
    display_names: &HashMap<DeviceRef, String>,
    members: &[EntityRecord],
) -> String {
    if let DeviceKey::Registry(device_ref) = key {
        if let Some(name) = display_names.get(device_ref) {
            if !name.is_empty() {
                return name.clone();
            }
        }
    }

    let address_suffix = members
        .iter()
        .flat_map(|record| {
            [
                Some(record.entity_id.as_str()),
                record.unique_id.as_deref(),
                record.original_name.as_deref(),
            ]
        })
        .flatten()
        .find_map(hardware_address_suffix);
    if let Some(suffix) = address_suffix {
        return format!("Device {suffix}");
    }

    match key {
        DeviceKey::Registry(device_ref) => device_ref.to_string(),
        DeviceKey::NumericPrefix(digits) => digits.clone(),
        DeviceKey::Unknown => "Unknown device".to_string(),
    }
}

/// The last four hex digits of a hardware address embedded in `text`.
fn hardware_address_suffix(text: &str) -> Option<String> {
    let token = HARDWARE_ADDRESS.captures(text)?.get(1)?.as_str();
    let hex: String = token
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    // A bare all-decimal run is a device id, not an address.
    if !token.contains(':') && !token.contains('-') && hex.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let start = hex.len().saturating_sub(4);
    Some(hex[start..].to_ascii_uppercase())
}
