//! Action port — fire-and-forget entity actions.

use std::future::Future;

use autocard_domain::entity::EntityId;
use autocard_domain::error::AutocardError;

/// Invocation interface for entity actions.
///
/// Calls are fire-and-forget: the core neither awaits the resulting state
/// change nor verifies the effect. Every quick action maps to a toggle.
pub trait ActionInvoker: Send + Sync {
    /// Toggle (or activate) one entity.
    fn toggle(&self, id: &EntityId) -> impl Future<Output = Result<(), AutocardError>> + Send;
}
