//! # autocard-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** the host environment implements (driven ports):
//!   - `RegistryReader` — entity/device registry snapshots
//!   - `StateReader` — live-state lookups and the full state-world id list
//!   - `ActionInvoker` — fire-and-forget entity actions
//! - Provide the **card service**: coalesced registry refreshes, device
//!   selection with stale-result discard, classification passes over the
//!   cached snapshot, and change notification for a thin render adapter
//! - Bundle the built-in classification **catalog** (role, priority, and
//!   layout tables, validated once at startup)
//!
//! ## Dependency rule
//! Depends on `autocard-domain` only (plus `tokio::sync` for coordination).
//! Never imports adapter crates. Adapters depend on *this* crate, not the
//! reverse.

pub mod catalog;
pub mod ports;
pub mod services;
