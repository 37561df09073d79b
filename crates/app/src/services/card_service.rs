//! Card service — refreshes registry snapshots and assembles card views.
//!
//! All mutable state lives in this service instance and is handed to the
//! pure classification functions explicitly. Work is a short sequence of
//! awaited port calls; once data is in hand, a classification pass runs
//! synchronously without interleaving.

use std::collections::{BTreeMap, HashMap};

use tokio::sync::{Mutex, watch};

use autocard_domain::device::{DeviceKey, DeviceRef};
use autocard_domain::entity::{EntityId, EntityRecord};
use autocard_domain::error::AutocardError;
use autocard_domain::grouping;
use autocard_domain::layout::LayoutNode;
use autocard_domain::role::RoleBindings;
use autocard_domain::time::{self, Timestamp};

use crate::catalog::Catalog;
use crate::ports::{ActionInvoker, RegistryReader, StateReader};

/// Subtitle shown when grouping finds nothing to display.
const NO_DEVICE_SUBTITLE: &str = "No device found";

/// Result of one registry refresh.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Per-device entity buckets, each sorted lexicographically.
    pub groups: BTreeMap<DeviceKey, Vec<EntityId>>,
    /// Registry rows by identifier (empty for fallback-scanned ids).
    pub records: HashMap<EntityId, EntityRecord>,
    /// Device-registry display names.
    pub display_names: HashMap<DeviceRef, String>,
    /// When the refresh completed.
    pub fetched_at: Timestamp,
}

/// One entry of the device picker.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DevicePick {
    pub key: DeviceKey,
    pub label: String,
}

/// Everything a host adapter needs to render the card.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CardView {
    pub title: String,
    pub subtitle: String,
    pub devices: Vec<DevicePick>,
    pub selected: Option<DeviceKey>,
    pub nodes: Vec<LayoutNode>,
}

#[derive(Debug, Default)]
struct Inner {
    snapshot: Option<Snapshot>,
    generation: u64,
    selection: Option<DeviceKey>,
    selection_seq: u64,
    view: Option<CardView>,
}

/// Application service assembling card views from host registry data.
pub struct CardService<R, S, A> {
    registry: R,
    states: S,
    actions: A,
    catalog: Catalog,
    inner: Mutex<Inner>,
    // Serializes fetches so concurrent refreshes coalesce into one.
    fetch_gate: Mutex<()>,
    updates: watch::Sender<Option<CardView>>,
}

impl<R, S, A> CardService<R, S, A>
where
    R: RegistryReader,
    S: StateReader,
    A: ActionInvoker,
{
    /// Create a service over the given host environment and catalog.
    pub fn new(registry: R, states: S, actions: A, catalog: Catalog) -> Self {
        let (updates, _) = watch::channel(None);
        Self {
            registry,
            states,
            actions,
            catalog,
            inner: Mutex::new(Inner::default()),
            fetch_gate: Mutex::new(()),
            updates,
        }
    }

    /// Fetch fresh registry data, regroup, and rebuild the current view.
    ///
    /// Concurrent calls coalesce: a refresh already in flight is reused,
    /// and the caller that lost the race returns without fetching again.
    /// On failure nothing is applied; the previous snapshot and view stay
    /// intact.
    ///
    /// # Errors
    ///
    /// Returns [`AutocardError::Registry`] when a collaborator read fails.
    #[tracing::instrument(skip(self))]
    pub async fn refresh(&self) -> Result<(), AutocardError> {
        let start_generation = self.inner.lock().await.generation;
        let _gate = self.fetch_gate.lock().await;
        {
            let inner = self.inner.lock().await;
            if inner.generation > start_generation {
                tracing::debug!("refresh coalesced with an in-flight fetch");
                return Ok(());
            }
        }

        let entities = self.registry.list_entities().await?;
        let devices = self.registry.list_devices().await?;

        let mut groups = grouping::group(&entities, &self.catalog.integrations);
        if groups.is_empty() {
            let known = self.states.known_ids().await?;
            groups = grouping::group_fallback(&known);
            tracing::debug!(
                buckets = groups.len(),
                "registry grouping was empty, used the state-world fallback"
            );
        }

        let records: HashMap<EntityId, EntityRecord> = entities
            .into_iter()
            .map(|record| (record.entity_id.clone(), record))
            .collect();
        let display_names: HashMap<DeviceRef, String> = devices
            .into_iter()
            .map(|entry| (entry.device_ref, entry.display_name))
            .collect();
        let snapshot = Snapshot {
            groups,
            records,
            display_names,
            fetched_at: time::now(),
        };
        let picks = device_picks(&snapshot);
        tracing::info!(devices = picks.len(), "registry snapshot refreshed");

        let (selection, seq) = {
            let mut inner = self.inner.lock().await;
            inner.snapshot = Some(snapshot);
            inner.generation += 1;
            let still_present = inner
                .selection
                .as_ref()
                .is_some_and(|key| picks.iter().any(|pick| &pick.key == key));
            if !still_present {
                inner.selection = picks.first().map(|pick| pick.key.clone());
                inner.selection_seq += 1;
            }
            (inner.selection.clone(), inner.selection_seq)
        };

        self.rebuild_view(selection, seq).await
    }

    /// Switch the card to another device and rebuild the view.
    ///
    /// # Errors
    ///
    /// Returns [`AutocardError::Registry`] when the cosmetic state lookup
    /// fails.
    #[tracing::instrument(skip(self))]
    pub async fn select_device(&self, key: DeviceKey) -> Result<(), AutocardError> {
        let (selection, seq) = {
            let mut inner = self.inner.lock().await;
            inner.selection = Some(key);
            inner.selection_seq += 1;
            (inner.selection.clone(), inner.selection_seq)
        };
        self.rebuild_view(selection, seq).await
    }

    /// The most recently assembled view, if any refresh has completed.
    pub async fn view(&self) -> Option<CardView> {
        self.inner.lock().await.view.clone()
    }

    /// Current device-picker entries.
    pub async fn devices(&self) -> Vec<DevicePick> {
        let inner = self.inner.lock().await;
        inner.snapshot.as_ref().map(device_picks).unwrap_or_default()
    }

    /// Receive every published view, starting with the current one.
    ///
    /// A thin host adapter subscribes here and re-renders on change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<CardView>> {
        self.updates.subscribe()
    }

    /// Fire a toggle at one entity. The effect is never awaited.
    ///
    /// # Errors
    ///
    /// Returns [`AutocardError::Registry`] when the invocation transport
    /// fails.
    #[tracing::instrument(skip(self))]
    pub async fn trigger(&self, id: &EntityId) -> Result<(), AutocardError> {
        self.actions.toggle(id).await
    }

    /// Rebuild the view for `selection`, discarding the result if a newer
    /// selection or snapshot lands while the cosmetic lookup is in flight.
    async fn rebuild_view(
        &self,
        selection: Option<DeviceKey>,
        seq: u64,
    ) -> Result<(), AutocardError> {
        let (generation, picks, bucket, members) = {
            let inner = self.inner.lock().await;
            let Some(snapshot) = &inner.snapshot else {
                return Ok(());
            };
            let picks = device_picks(snapshot);
            let bucket: Vec<EntityId> = selection
                .as_ref()
                .and_then(|key| snapshot.groups.get(key))
                .cloned()
                .unwrap_or_default();
            let members: Vec<EntityRecord> = bucket
                .iter()
                .map(|id| {
                    snapshot
                        .records
                        .get(id)
                        .cloned()
                        .unwrap_or_else(|| fallback_record(id))
                })
                .collect();
            (inner.generation, picks, bucket, members)
        };

        let bindings = self.catalog.roles.resolve(&members);
        let nodes = self.catalog.layout.build(&bindings, &bucket);
        let subtitle = self.subtitle(&selection, &picks, &bindings).await?;

        let view = CardView {
            title: self.catalog.title.clone(),
            subtitle,
            devices: picks,
            selected: selection,
            nodes,
        };

        {
            let mut inner = self.inner.lock().await;
            if inner.selection_seq != seq || inner.generation != generation {
                tracing::debug!("discarded a view rebuilt for a superseded selection");
                return Ok(());
            }
            inner.view = Some(view.clone());
        }
        // Send fails only without subscribers, which is fine.
        let _ = self.updates.send(Some(view));
        Ok(())
    }

    /// Subtitle text: the primary quick action's friendly name when the
    /// state world has one, else the device label, else a no-device note.
    async fn subtitle(
        &self,
        selection: &Option<DeviceKey>,
        picks: &[DevicePick],
        bindings: &RoleBindings,
    ) -> Result<String, AutocardError> {
        let Some(selected) = selection else {
            return Ok(NO_DEVICE_SUBTITLE.to_string());
        };

        let primary = self
            .catalog
            .layout
            .grid()
            .and_then(|grid| grid.roles().iter().find_map(|role| bindings.get(role)));
        if let Some(primary) = primary {
            if let Some(state) = self.states.state_of(primary).await? {
                if let Some(name) = state.friendly_name() {
                    return Ok(name.to_string());
                }
            }
        }

        Ok(picks
            .iter()
            .find(|pick| &pick.key == selected)
            .map_or_else(|| selected.to_string(), |pick| pick.label.clone()))
    }
}

/// Picker entries for one snapshot: every named bucket in key order, or
/// the unknown bucket alone when nothing else exists.
fn device_picks(snapshot: &Snapshot) -> Vec<DevicePick> {
    let mut keys: Vec<&DeviceKey> = snapshot
        .groups
        .keys()
        .filter(|key| !key.is_unknown())
        .collect();
    if keys.is_empty() && snapshot.groups.contains_key(&DeviceKey::Unknown) {
        keys.push(&DeviceKey::Unknown);
    }

    keys.into_iter()
        .map(|key| {
            let members: Vec<EntityRecord> = snapshot
                .groups
                .get(key)
                .into_iter()
                .flatten()
                .filter_map(|id| snapshot.records.get(id).cloned())
                .collect();
            DevicePick {
                key: key.clone(),
                label: grouping::derive_label(key, &snapshot.display_names, &members),
            }
        })
        .collect()
}

/// Minimal record for identifiers that only exist in the state world.
fn fallback_record(id: &EntityId) -> EntityRecord {
    EntityRecord {
        entity_id: id.clone(),
        unique_id: None,
        device_ref: None,
        original_name: None,
        integration: "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use autocard_domain::device::DeviceEntry;
    use autocard_domain::error::RegistryError;
    use autocard_domain::state::LiveState;

    #[derive(Default)]
    struct FakeEnv {
        entities: Vec<EntityRecord>,
        devices: Vec<DeviceEntry>,
        known: Vec<EntityId>,
        states: HashMap<EntityId, LiveState>,
        fetch_delay: Option<Duration>,
        slow_state_marker: Option<&'static str>,
        list_calls: AtomicUsize,
        failing: AtomicBool,
        toggled: std::sync::Mutex<Vec<EntityId>>,
    }

    impl RegistryReader for Arc<FakeEnv> {
        fn list_entities(
            &self,
        ) -> impl Future<Output = Result<Vec<EntityRecord>, AutocardError>> + Send {
            let env = self.clone();
            async move {
                if let Some(delay) = env.fetch_delay {
                    tokio::time::sleep(delay).await;
                }
                env.list_calls.fetch_add(1, Ordering::SeqCst);
                if env.failing.load(Ordering::SeqCst) {
                    return Err(RegistryError::new("registry unavailable").into());
                }
                Ok(env.entities.clone())
            }
        }

        fn list_devices(
            &self,
        ) -> impl Future<Output = Result<Vec<DeviceEntry>, AutocardError>> + Send {
            let env = self.clone();
            async move { Ok(env.devices.clone()) }
        }
    }

    impl StateReader for Arc<FakeEnv> {
        fn known_ids(&self) -> impl Future<Output = Result<Vec<EntityId>, AutocardError>> + Send {
            let env = self.clone();
            async move { Ok(env.known.clone()) }
        }

        fn state_of(
            &self,
            id: &EntityId,
        ) -> impl Future<Output = Result<Option<LiveState>, AutocardError>> + Send {
            let env = self.clone();
            let id = id.clone();
            async move {
                if let Some(marker) = env.slow_state_marker {
                    if id.as_str().contains(marker) {
                        tokio::time::sleep(Duration::from_millis(20)).await;
                    }
                }
                Ok(env.states.get(&id).cloned())
            }
        }
    }

    impl ActionInvoker for Arc<FakeEnv> {
        fn toggle(&self, id: &EntityId) -> impl Future<Output = Result<(), AutocardError>> + Send {
            let env = self.clone();
            let id = id.clone();
            async move {
                env.toggled.lock().unwrap().push(id);
                Ok(())
            }
        }
    }

    fn record(entity_id: &str, device_ref: Option<&str>) -> EntityRecord {
        let mut builder = EntityRecord::builder()
            .entity_id(entity_id)
            .integration("felshare_cloud");
        if let Some(device_ref) = device_ref {
            builder = builder.device_ref(DeviceRef::new(device_ref));
        }
        builder.build().unwrap()
    }

    fn service(env: &Arc<FakeEnv>) -> CardService<Arc<FakeEnv>, Arc<FakeEnv>, Arc<FakeEnv>> {
        CardService::new(
            env.clone(),
            env.clone(),
            env.clone(),
            Catalog::diffuser().unwrap(),
        )
    }

    fn two_device_env() -> Arc<FakeEnv> {
        Arc::new(FakeEnv {
            entities: vec![
                record("switch.11111111_power", Some("dev-a")),
                record("switch.11111111_fan", Some("dev-a")),
                record("switch.22222222_power", Some("dev-b")),
            ],
            devices: vec![
                DeviceEntry::new(DeviceRef::new("dev-a"), "Living Room"),
                DeviceEntry::new(DeviceRef::new("dev-b"), "Bedroom"),
            ],
            ..FakeEnv::default()
        })
    }

    #[tokio::test]
    async fn should_group_and_select_first_device_on_refresh() {
        let env = two_device_env();
        let svc = service(&env);

        svc.refresh().await.unwrap();

        let view = svc.view().await.unwrap();
        assert_eq!(view.devices.len(), 2);
        assert_eq!(view.devices[0].label, "Living Room");
        assert_eq!(view.devices[1].label, "Bedroom");
        assert_eq!(
            view.selected,
            Some(DeviceKey::Registry(DeviceRef::new("dev-a")))
        );
        assert_eq!(view.subtitle, "Living Room");
        assert_eq!(view.nodes.len(), 1, "only the quick-action grid binds");
    }

    #[tokio::test]
    async fn should_use_fallback_scan_when_registry_yields_nothing() {
        let env = Arc::new(FakeEnv {
            known: vec![
                "switch.229070733364532_power".parse().unwrap(),
                "number.229070733364532_consumption".parse().unwrap(),
                "light.unrelated_lamp".parse().unwrap(),
            ],
            ..FakeEnv::default()
        });
        let svc = service(&env);

        svc.refresh().await.unwrap();

        let view = svc.view().await.unwrap();
        assert_eq!(view.devices.len(), 1);
        assert_eq!(
            view.selected,
            Some(DeviceKey::NumericPrefix("229070733364532".to_string()))
        );
        assert_eq!(view.devices[0].label, "229070733364532");
        assert!(!view.nodes.is_empty());
    }

    #[tokio::test]
    async fn should_coalesce_concurrent_refreshes() {
        let env = Arc::new(FakeEnv {
            entities: vec![record("switch.11111111_power", Some("dev-a"))],
            devices: vec![DeviceEntry::new(DeviceRef::new("dev-a"), "Living Room")],
            fetch_delay: Some(Duration::from_millis(10)),
            ..FakeEnv::default()
        });
        let svc = service(&env);

        let (first, second) = tokio::join!(svc.refresh(), svc.refresh());
        first.unwrap();
        second.unwrap();

        assert_eq!(env.list_calls.load(Ordering::SeqCst), 1);
        assert!(svc.view().await.is_some());
    }

    #[tokio::test]
    async fn should_leave_state_untouched_when_refresh_fails() {
        let env = two_device_env();
        let svc = service(&env);
        svc.refresh().await.unwrap();
        let before = svc.view().await.unwrap();

        env.failing.store(true, Ordering::SeqCst);
        let result = svc.refresh().await;

        assert!(matches!(result, Err(AutocardError::Registry(_))));
        assert_eq!(svc.view().await.unwrap(), before);
    }

    #[tokio::test]
    async fn should_discard_stale_rebuild_when_selection_moves_on() {
        let env = Arc::new(FakeEnv {
            entities: vec![
                record("switch.11111111_power", Some("dev-a")),
                record("switch.22222222_power", Some("dev-b")),
            ],
            devices: vec![
                DeviceEntry::new(DeviceRef::new("dev-a"), "Living Room"),
                DeviceEntry::new(DeviceRef::new("dev-b"), "Bedroom"),
            ],
            slow_state_marker: Some("11111111"),
            ..FakeEnv::default()
        });
        let svc = service(&env);
        svc.refresh().await.unwrap();

        let slow = svc.select_device(DeviceKey::Registry(DeviceRef::new("dev-a")));
        let fast = svc.select_device(DeviceKey::Registry(DeviceRef::new("dev-b")));
        let (slow, fast) = tokio::join!(slow, fast);
        slow.unwrap();
        fast.unwrap();

        let view = svc.view().await.unwrap();
        assert_eq!(
            view.selected,
            Some(DeviceKey::Registry(DeviceRef::new("dev-b"))),
            "the slower rebuild for dev-a must not overwrite dev-b's view"
        );
        assert_eq!(view.subtitle, "Bedroom");
    }

    #[tokio::test]
    async fn should_prefer_friendly_name_for_subtitle() {
        let power: EntityId = "switch.11111111_power".parse().unwrap();
        let mut states = HashMap::new();
        states.insert(
            power.clone(),
            LiveState::new("on").with_attribute("friendly_name", serde_json::json!("Aroma One")),
        );
        let env = Arc::new(FakeEnv {
            entities: vec![record("switch.11111111_power", Some("dev-a"))],
            devices: vec![DeviceEntry::new(DeviceRef::new("dev-a"), "Living Room")],
            states,
            ..FakeEnv::default()
        });
        let svc = service(&env);

        svc.refresh().await.unwrap();

        assert_eq!(svc.view().await.unwrap().subtitle, "Aroma One");
    }

    #[tokio::test]
    async fn should_report_no_device_for_empty_registry() {
        let env = Arc::new(FakeEnv::default());
        let svc = service(&env);

        svc.refresh().await.unwrap();

        let view = svc.view().await.unwrap();
        assert!(view.devices.is_empty());
        assert_eq!(view.selected, None);
        assert_eq!(view.subtitle, NO_DEVICE_SUBTITLE);
        assert!(view.nodes.is_empty());
    }

    #[tokio::test]
    async fn should_publish_views_to_subscribers() {
        let env = two_device_env();
        let svc = service(&env);
        let mut updates = svc.subscribe();

        svc.refresh().await.unwrap();

        updates.changed().await.unwrap();
        let published = updates.borrow().clone().unwrap();
        assert_eq!(published.devices.len(), 2);
    }

    #[tokio::test]
    async fn should_forward_toggle_to_the_action_invoker() {
        let env = two_device_env();
        let svc = service(&env);
        let power: EntityId = "switch.11111111_power".parse().unwrap();

        svc.trigger(&power).await.unwrap();

        assert_eq!(env.toggled.lock().unwrap().as_slice(), &[power]);
    }

    #[tokio::test]
    async fn should_keep_selection_across_refreshes() {
        let env = two_device_env();
        let svc = service(&env);
        svc.refresh().await.unwrap();

        svc.select_device(DeviceKey::Registry(DeviceRef::new("dev-b")))
            .await
            .unwrap();
        svc.refresh().await.unwrap();

        let view = svc.view().await.unwrap();
        assert_eq!(
            view.selected,
            Some(DeviceKey::Registry(DeviceRef::new("dev-b")))
        );
    }
}
