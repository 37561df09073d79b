//! # autocard-adapter-virtual
//!
//! Virtual/demo environment that backs the card service with in-memory
//! data, for testing and demonstration purposes.
//!
//! ## Provided demo device
//!
//! [`VirtualEnvironment::diffuser_demo`] simulates one cloud diffuser
//! (numeric id `229070733364532`) exposing the full entity spread: power,
//! fan, and schedule switches, a refresh button, cloud/liquid sensors,
//! numeric controls, a mode select, and a text field. Toggling a switch
//! flips its live state between `on` and `off`.
//!
//! ## Dependency rule
//!
//! Depends on `autocard-app` (port traits) and `autocard-domain` only.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use autocard_app::ports::{ActionInvoker, RegistryReader, StateReader};
use autocard_domain::device::{DeviceEntry, DeviceRef};
use autocard_domain::entity::{EntityId, EntityRecord};
use autocard_domain::error::AutocardError;
use autocard_domain::state::LiveState;

/// In-memory host environment implementing all three ports.
///
/// Cloning is cheap and every clone shares the same live state, so one
/// environment can serve as registry, state world, and action sink at the
/// same time.
#[derive(Debug, Clone, Default)]
pub struct VirtualEnvironment {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    entities: Vec<EntityRecord>,
    devices: Vec<DeviceEntry>,
    extra_known: Vec<EntityId>,
    states: Mutex<HashMap<EntityId, LiveState>>,
}

impl VirtualEnvironment {
    /// Create a builder for a custom environment.
    #[must_use]
    pub fn builder() -> VirtualEnvironmentBuilder {
        VirtualEnvironmentBuilder::default()
    }

    /// The canned demo diffuser.
    #[must_use]
    pub fn diffuser_demo() -> Self {
        const DEVICE: &str = "229070733364532";
        let device_ref = DeviceRef::new("virtual-diffuser");

        let mut builder = Self::builder().device(DeviceEntry::new(
            device_ref.clone(),
            "Demo Diffuser",
        ));
        let entities: [(&str, &str, &str); 12] = [
            ("switch", "power", "on"),
            ("switch", "fan", "off"),
            ("switch", "work_schedule", "off"),
            ("switch", "hvac_sync", "off"),
            ("button", "refresh_status", "unknown"),
            ("sensor", "mqtt_status", "connected"),
            ("sensor", "liquid_level", "62"),
            ("number", "consumption", "3"),
            ("number", "work_run", "120"),
            ("number", "work_stop", "60"),
            ("select", "mode", "auto"),
            ("text", "device_name", "Demo Diffuser"),
        ];
        for (kind, suffix, value) in entities {
            let Ok(entity_id) = format!("{kind}.{DEVICE}_{suffix}").parse::<EntityId>() else {
                continue;
            };
            let record = EntityRecord {
                entity_id,
                unique_id: Some(format!("{DEVICE}_{suffix}")),
                device_ref: Some(device_ref.clone()),
                original_name: Some(title_case(suffix)),
                integration: "felshare_cloud".to_string(),
            };
            let state = LiveState::new(value)
                .with_attribute("friendly_name", serde_json::Value::String(title_case(suffix)));
            let id = record.entity_id.clone();
            builder = builder.record(record).state(id, state);
        }
        builder.build()
    }

    fn states(&self) -> std::sync::MutexGuard<'_, HashMap<EntityId, LiveState>> {
        self.inner
            .states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Step-by-step builder for [`VirtualEnvironment`].
#[derive(Debug, Default)]
pub struct VirtualEnvironmentBuilder {
    entities: Vec<EntityRecord>,
    devices: Vec<DeviceEntry>,
    extra_known: Vec<EntityId>,
    states: HashMap<EntityId, LiveState>,
}

impl VirtualEnvironmentBuilder {
    /// Add an entity-registry row.
    #[must_use]
    pub fn record(mut self, record: EntityRecord) -> Self {
        self.entities.push(record);
        self
    }

    /// Add a device-registry row.
    #[must_use]
    pub fn device(mut self, entry: DeviceEntry) -> Self {
        self.devices.push(entry);
        self
    }

    /// Add a state-world identifier with no registry row (reachable only
    /// through the fallback scan).
    #[must_use]
    pub fn known_id(mut self, id: EntityId) -> Self {
        self.extra_known.push(id);
        self
    }

    /// Set the live state of one entity.
    #[must_use]
    pub fn state(mut self, id: EntityId, state: LiveState) -> Self {
        self.states.insert(id, state);
        self
    }

    /// Consume the builder and return the environment.
    #[must_use]
    pub fn build(self) -> VirtualEnvironment {
        VirtualEnvironment {
            inner: Arc::new(Inner {
                entities: self.entities,
                devices: self.devices,
                extra_known: self.extra_known,
                states: Mutex::new(self.states),
            }),
        }
    }
}

impl RegistryReader for VirtualEnvironment {
    fn list_entities(
        &self,
    ) -> impl Future<Output = Result<Vec<EntityRecord>, AutocardError>> + Send {
        let entities = self.inner.entities.clone();
        async move { Ok(entities) }
    }

    fn list_devices(&self) -> impl Future<Output = Result<Vec<DeviceEntry>, AutocardError>> + Send {
        let devices = self.inner.devices.clone();
        async move { Ok(devices) }
    }
}

impl StateReader for VirtualEnvironment {
    fn known_ids(&self) -> impl Future<Output = Result<Vec<EntityId>, AutocardError>> + Send {
        let mut ids: Vec<EntityId> = self
            .inner
            .entities
            .iter()
            .map(|record| record.entity_id.clone())
            .chain(self.inner.extra_known.iter().cloned())
            .collect();
        ids.sort();
        async move { Ok(ids) }
    }

    fn state_of(
        &self,
        id: &EntityId,
    ) -> impl Future<Output = Result<Option<LiveState>, AutocardError>> + Send {
        let state = self.states().get(id).cloned();
        async move { Ok(state) }
    }
}

impl ActionInvoker for VirtualEnvironment {
    fn toggle(&self, id: &EntityId) -> impl Future<Output = Result<(), AutocardError>> + Send {
        {
            let mut states = self.states();
            if let Some(state) = states.get_mut(id) {
                state.value = match state.value.as_str() {
                    "on" => "off".to_string(),
                    _ => "on".to_string(),
                };
            }
        }
        async { Ok(()) }
    }
}

/// `work_schedule` → `Work Schedule`.
fn title_case(suffix: &str) -> String {
    suffix
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().collect::<String>() + chars.as_str()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}
