//! Live-state port — cosmetic state lookups.
//!
//! Live state never influences classification; it supplies subtitle text
//! and, through [`StateReader::known_ids`], the raw identifier list the
//! grouping fallback scans when the registry has no usable metadata.

use std::future::Future;

use autocard_domain::entity::EntityId;
use autocard_domain::error::AutocardError;
use autocard_domain::state::LiveState;

/// Read interface over the host's live state world.
pub trait StateReader: Send + Sync {
    /// Every entity identifier currently known to the state world.
    fn known_ids(&self) -> impl Future<Output = Result<Vec<EntityId>, AutocardError>> + Send;

    /// The live state of one entity, `None` when the id is unknown.
    fn state_of(
        &self,
        id: &EntityId,
    ) -> impl Future<Output = Result<Option<LiveState>, AutocardError>> + Send;
}
