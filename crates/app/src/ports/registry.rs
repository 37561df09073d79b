//! Registry port — read access to the host's entity and device registries.

use std::future::Future;

use autocard_domain::device::DeviceEntry;
use autocard_domain::entity::EntityRecord;
use autocard_domain::error::AutocardError;

/// Read interface over the host registries.
///
/// Both listings are eventually-consistent snapshots with no ordering
/// guarantee; the core sorts what it needs sorted.
pub trait RegistryReader: Send + Sync {
    /// All entity-registry rows.
    fn list_entities(
        &self,
    ) -> impl Future<Output = Result<Vec<EntityRecord>, AutocardError>> + Send;

    /// All device-registry rows.
    fn list_devices(&self) -> impl Future<Output = Result<Vec<DeviceEntry>, AutocardError>> + Send;
}
