//! Snapshot environment — serves the ports from a registry-export file.
//!
//! A snapshot is a JSON document with three optional top-level fields:
//!
//! ```json
//! {
//!   "entities": [{"entity_id": "switch.229070733364532_power",
//!                 "unique_id": "229070733364532_power",
//!                 "device_ref": "abc123",
//!                 "original_name": "Power",
//!                 "integration": "felshare_cloud"}],
//!   "devices": [{"device_ref": "abc123", "display_name": "Hall Diffuser"}],
//!   "states": {"switch.229070733364532_power": {"value": "on", "attributes": {}}}
//! }
//! ```
//!
//! Action invocations are logged and otherwise dropped — a file cannot be
//! toggled.

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;

use autocard_app::ports::{ActionInvoker, RegistryReader, StateReader};
use autocard_domain::device::DeviceEntry;
use autocard_domain::entity::{EntityId, EntityRecord};
use autocard_domain::error::AutocardError;
use autocard_domain::state::LiveState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SnapshotFile {
    entities: Vec<EntityRecord>,
    devices: Vec<DeviceEntry>,
    states: HashMap<EntityId, LiveState>,
}

/// Read-only host environment backed by one snapshot file.
#[derive(Debug, Clone)]
pub struct SnapshotEnvironment {
    data: Arc<SnapshotFile>,
}

impl SnapshotEnvironment {
    /// Load a snapshot from disk.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading snapshot {}", path.display()))?;
        let data: SnapshotFile = serde_json::from_str(&content)
            .with_context(|| format!("parsing snapshot {}", path.display()))?;
        Ok(Self {
            data: Arc::new(data),
        })
    }
}

impl RegistryReader for SnapshotEnvironment {
    fn list_entities(
        &self,
    ) -> impl Future<Output = Result<Vec<EntityRecord>, AutocardError>> + Send {
        let entities = self.data.entities.clone();
        async move { Ok(entities) }
    }

    fn list_devices(&self) -> impl Future<Output = Result<Vec<DeviceEntry>, AutocardError>> + Send {
        let devices = self.data.devices.clone();
        async move { Ok(devices) }
    }
}

impl StateReader for SnapshotEnvironment {
    fn known_ids(&self) -> impl Future<Output = Result<Vec<EntityId>, AutocardError>> + Send {
        let mut ids: Vec<EntityId> = self
            .data
            .entities
            .iter()
            .map(|record| record.entity_id.clone())
            .chain(self.data.states.keys().cloned())
            .collect();
        ids.sort();
        ids.dedup();
        async move { Ok(ids) }
    }

    fn state_of(
        &self,
        id: &EntityId,
    ) -> impl Future<Output = Result<Option<LiveState>, AutocardError>> + Send {
        let state = self.data.states.get(id).cloned();
        async move { Ok(state) }
    }
}

impl ActionInvoker for SnapshotEnvironment {
    fn toggle(&self, id: &EntityId) -> impl Future<Output = Result<(), AutocardError>> + Send {
        tracing::info!(%id, "toggle requested against a snapshot, dropping it");
        async { Ok(()) }
    }
}
