//! Application services — one per use-case family.

pub mod card_service;

pub use card_service::{CardService, CardView, DevicePick, Snapshot};
