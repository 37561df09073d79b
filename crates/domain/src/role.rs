//! Role resolution — binding semantic roles to entities.
//!
//! A role table is an ordered list of `(role name, rule)` pairs. For each
//! role, the first entity (in the caller-supplied order) whose rule matches
//! is bound; every other candidate for that role is ignored. Callers are
//! expected to supply a stable order, typically lexicographic by
//! identifier.
//!
//! Binding is **not** exclusive across roles: an entity bound to an earlier
//! role stays eligible for later roles. Collapsing this would silently
//! change assembled layouts for devices whose entities satisfy several
//! rules, so the behavior is kept and covered by tests.

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, EntityRecord};
use crate::error::ValidationError;
use crate::rule::Rule;

/// One named role and the rule that selects its entity.
#[derive(Debug, Clone)]
pub struct RoleDef {
    pub name: String,
    pub rule: Rule,
}

/// Ordered table of role definitions.
///
/// Validated once at construction: role names are non-empty and unique.
#[derive(Debug, Clone)]
pub struct RoleTable {
    roles: Vec<RoleDef>,
}

impl RoleTable {
    /// Create a builder for constructing a [`RoleTable`].
    #[must_use]
    pub fn builder() -> RoleTableBuilder {
        RoleTableBuilder::default()
    }

    /// The role definitions, in declaration order.
    #[must_use]
    pub fn roles(&self) -> &[RoleDef] {
        &self.roles
    }

    /// Bind each role to at most one entity.
    ///
    /// Roles with no qualifying entity are bound to `None`, which callers
    /// must treat as "omit this control", never as an error. Identical
    /// input always yields identical bindings.
    #[must_use]
    pub fn resolve(&self, entities: &[EntityRecord]) -> RoleBindings {
        let bindings = self
            .roles
            .iter()
            .map(|def| {
                let chosen = entities
                    .iter()
                    .find(|record| def.rule.matches(record))
                    .map(|record| record.entity_id.clone());
                (def.name.clone(), chosen)
            })
            .collect();
        RoleBindings { bindings }
    }
}

/// Step-by-step builder for [`RoleTable`].
#[derive(Debug, Default)]
pub struct RoleTableBuilder {
    roles: Vec<RoleDef>,
}

impl RoleTableBuilder {
    /// Append a role; declaration order is evaluation order.
    #[must_use]
    pub fn role(mut self, name: impl Into<String>, rule: Rule) -> Self {
        self.roles.push(RoleDef {
            name: name.into(),
            rule,
        });
        self
    }

    /// Consume the builder, validate, and return a [`RoleTable`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyRoleName`] or
    /// [`ValidationError::DuplicateRole`] when the table is malformed.
    pub fn build(self) -> Result<RoleTable, ValidationError> {
        {
            let mut seen = std::collections::BTreeSet::new();
            for def in &self.roles {
                if def.name.is_empty() {
                    return Err(ValidationError::EmptyRoleName);
                }
                if !seen.insert(def.name.as_str()) {
                    return Err(ValidationError::DuplicateRole(def.name.clone()));
                }
            }
        }
        Ok(RoleTable { roles: self.roles })
    }
}

/// The result of one resolution pass: role name → chosen entity, in table
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleBindings {
    bindings: Vec<(String, Option<EntityId>)>,
}

impl RoleBindings {
    /// The entity bound to `role`, if the role exists and resolved.
    #[must_use]
    pub fn get(&self, role: &str) -> Option<&EntityId> {
        self.bindings
            .iter()
            .find(|(name, _)| name == role)
            .and_then(|(_, id)| id.as_ref())
    }

    /// Whether `role` resolved to an entity.
    #[must_use]
    pub fn is_bound(&self, role: &str) -> bool {
        self.get(role).is_some()
    }

    /// Iterate over `(role name, binding)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&EntityId>)> {
        self.bindings
            .iter()
            .map(|(name, id)| (name.as_str(), id.as_ref()))
    }

    /// Number of roles that resolved to an entity.
    #[must_use]
    pub fn bound_count(&self) -> usize {
        self.bindings.iter().filter(|(_, id)| id.is_some()).count()
    }
}
