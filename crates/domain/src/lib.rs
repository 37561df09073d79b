//! # autocard-domain
//!
//! Pure domain model for the autocard layout engine.
//!
//! ## Responsibilities
//! - Foundational types: entity identifiers, registry records, error conventions
//! - Define **Rules** (suffix/pattern matchers over registry records)
//! - Define **RoleTables** (ordered role → rule bindings, first match wins)
//! - Define **PriorityTables** (scored-pattern ranking with a total order)
//! - Define **LayoutSpecs** (declarative grid/section layouts) and the
//!   [`LayoutNode`](layout::LayoutNode) trees they produce
//! - Group registry entities into per-device buckets, with a numeric-prefix
//!   heuristic for registries that carry no device references
//!
//! ## Dependency rule
//! This crate has **no internal dependencies** and performs no IO.
//! It must never import anything from `app` or adapter crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod time;

pub mod device;
pub mod entity;
pub mod grouping;
pub mod layout;
pub mod priority;
pub mod role;
pub mod rule;
pub mod state;
