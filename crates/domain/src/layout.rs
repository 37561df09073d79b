//! Layout assembly — turning role bindings into a declarative node tree.
//!
//! A [`LayoutSpec`] fixes the top-level node order: an optional leading
//! quick-action grid followed by titled sections. Sections draw their
//! entries either from named roles or by sweeping one entity kind, may be
//! reordered by a [`PriorityTable`], and may be capped. Entries whose role
//! did not resolve are dropped; a node that ends up empty is omitted
//! entirely. Output is byte-identical for identical inputs.

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, EntityKind};
use crate::error::ValidationError;
use crate::priority::PriorityTable;
use crate::role::RoleBindings;

/// The leading quick-action grid: a fixed column count plus the roles it
/// draws from, in display order.
#[derive(Debug, Clone)]
pub struct GridSpec {
    columns: usize,
    roles: Vec<String>,
}

impl GridSpec {
    /// Construct and validate a grid spec.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ZeroColumns`] for a zero column count and
    /// [`ValidationError::EmptySection`] when no roles are named.
    pub fn new(columns: usize, roles: Vec<String>) -> Result<Self, ValidationError> {
        if columns == 0 {
            return Err(ValidationError::ZeroColumns);
        }
        if roles.is_empty() {
            return Err(ValidationError::EmptySection("quick actions".to_string()));
        }
        Ok(Self { columns, roles })
    }

    #[must_use]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.roles
    }
}

/// Where a section's entries come from.
#[derive(Debug, Clone)]
pub enum SectionSource {
    /// Named roles, in declaration order.
    Roles(Vec<String>),
    /// Every device entity of one kind.
    Kind(EntityKind),
}

/// One titled display section.
#[derive(Debug, Clone)]
pub struct SectionSpec {
    title: String,
    source: SectionSource,
    priority: Option<PriorityTable>,
    limit: Option<usize>,
}

impl SectionSpec {
    /// Section backed by named roles.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptySection`] when `roles` is empty.
    pub fn roles(title: impl Into<String>, roles: Vec<String>) -> Result<Self, ValidationError> {
        let title = title.into();
        if roles.is_empty() {
            return Err(ValidationError::EmptySection(title));
        }
        Ok(Self {
            title,
            source: SectionSource::Roles(roles),
            priority: None,
            limit: None,
        })
    }

    /// Section sweeping every device entity of `kind`.
    #[must_use]
    pub fn kind(title: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            title: title.into(),
            source: SectionSource::Kind(kind),
            priority: None,
            limit: None,
        }
    }

    /// Reorder this section's entries with a priority table.
    #[must_use]
    pub fn with_priority(mut self, priority: PriorityTable) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Cap the number of entries.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }
}

/// The full layout: optional quick-action grid plus ordered sections.
#[derive(Debug, Clone)]
pub struct LayoutSpec {
    grid: Option<GridSpec>,
    sections: Vec<SectionSpec>,
}

impl LayoutSpec {
    /// Assemble a layout spec from pre-validated parts.
    #[must_use]
    pub fn new(grid: Option<GridSpec>, sections: Vec<SectionSpec>) -> Self {
        Self { grid, sections }
    }

    /// The quick-action grid, when the layout has one.
    #[must_use]
    pub fn grid(&self) -> Option<&GridSpec> {
        self.grid.as_ref()
    }

    /// The sections, in display order.
    #[must_use]
    pub fn sections(&self) -> &[SectionSpec] {
        &self.sections
    }

    /// Build the layout tree for one device.
    ///
    /// `device_entities` is the device's full entity bucket (used by
    /// kind-backed sections), expected in the caller's stable order.
    /// No emitted node has zero entries; top-level order is fixed by this
    /// spec, never by the data.
    #[must_use]
    pub fn build(
        &self,
        bindings: &RoleBindings,
        device_entities: &[EntityId],
    ) -> Vec<LayoutNode> {
        let mut nodes = Vec::new();

        if let Some(grid) = &self.grid {
            let entities: Vec<EntityId> = grid
                .roles
                .iter()
                .filter_map(|role| bindings.get(role).cloned())
                .collect();
            if !entities.is_empty() {
                nodes.push(LayoutNode::Grid {
                    columns: grid.columns,
                    entities,
                });
            }
        }

        for spec in &self.sections {
            let mut entities: Vec<EntityId> = match &spec.source {
                SectionSource::Roles(roles) => roles
                    .iter()
                    .filter_map(|role| bindings.get(role).cloned())
                    .collect(),
                SectionSource::Kind(kind) => device_entities
                    .iter()
                    .filter(|id| id.kind() == Some(*kind))
                    .cloned()
                    .collect(),
            };
            if let Some(priority) = &spec.priority {
                entities = priority.rank(&entities);
            }
            if let Some(limit) = spec.limit {
                entities.truncate(limit);
            }
            if entities.is_empty() {
                continue;
            }
            nodes.push(LayoutNode::Section {
                title: spec.title.clone(),
                entities,
            });
        }

        nodes
    }
}

/// One node of the assembled layout tree.
///
/// Built fresh on every pass and never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayoutNode {
    /// Compact row of atomic controls.
    Grid {
        columns: usize,
        entities: Vec<EntityId>,
    },
    /// Titled, ordered list of entities.
    Section {
        title: String,
        entities: Vec<EntityId>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityRecord;
    use crate::role::RoleTable;
    use crate::rule::Rule;

    fn record(entity_id: &str) -> EntityRecord {
        EntityRecord::builder()
            .entity_id(entity_id)
            .integration("felshare_cloud")
            .build()
            .unwrap()
    }

    fn ids(texts: &[&str]) -> Vec<EntityId> {
        texts.iter().map(|t| t.parse().unwrap()).collect()
    }

    fn quick_grid() -> GridSpec {
        GridSpec::new(5, vec!["power".into(), "fan".into()]).unwrap()
    }

    fn bindings_for(entity_ids: &[&str]) -> RoleBindings {
        let records: Vec<EntityRecord> = entity_ids.iter().map(|id| record(id)).collect();
        RoleTable::builder()
            .role("power", Rule::id_suffix("power"))
            .role("fan", Rule::id_suffix("fan"))
            .role("liquid", Rule::id_suffix("liquid"))
            .build()
            .unwrap()
            .resolve(&records)
    }

    #[test]
    fn should_emit_grid_then_sections_in_spec_order() {
        let spec = LayoutSpec::new(
            Some(quick_grid()),
            vec![
                SectionSpec::roles("Status", vec!["liquid".into()]).unwrap(),
                SectionSpec::kind("Controls", EntityKind::Number),
            ],
        );
        let bindings = bindings_for(&[
            "switch.1_power",
            "switch.1_fan",
            "sensor.1_liquid",
        ]);
        let entities = ids(&["number.1_delay", "sensor.1_liquid", "switch.1_fan", "switch.1_power"]);

        let nodes = spec.build(&bindings, &entities);

        assert_eq!(
            nodes,
            vec![
                LayoutNode::Grid {
                    columns: 5,
                    entities: ids(&["switch.1_power", "switch.1_fan"]),
                },
                LayoutNode::Section {
                    title: "Status".to_string(),
                    entities: ids(&["sensor.1_liquid"]),
                },
                LayoutNode::Section {
                    title: "Controls".to_string(),
                    entities: ids(&["number.1_delay"]),
                },
            ]
        );
    }

    #[test]
    fn should_omit_grid_when_no_quick_action_binds() {
        let spec = LayoutSpec::new(Some(quick_grid()), Vec::new());
        let bindings = bindings_for(&["sensor.1_liquid"]);

        let nodes = spec.build(&bindings, &ids(&["sensor.1_liquid"]));
        assert!(nodes.is_empty());
    }

    #[test]
    fn should_omit_section_when_all_roles_unbound() {
        let spec = LayoutSpec::new(
            None,
            vec![SectionSpec::roles("Status", vec!["liquid".into()]).unwrap()],
        );
        let bindings = bindings_for(&["switch.1_power"]);

        let nodes = spec.build(&bindings, &ids(&["switch.1_power"]));
        assert!(nodes.is_empty());
    }

    #[test]
    fn should_drop_unbound_roles_but_keep_bound_ones() {
        let spec = LayoutSpec::new(
            None,
            vec![SectionSpec::roles("Status", vec!["liquid".into(), "power".into()]).unwrap()],
        );
        let bindings = bindings_for(&["switch.1_power"]);

        let nodes = spec.build(&bindings, &ids(&["switch.1_power"]));
        assert_eq!(
            nodes,
            vec![LayoutNode::Section {
                title: "Status".to_string(),
                entities: ids(&["switch.1_power"]),
            }]
        );
    }

    #[test]
    fn should_bound_role_appear_only_in_its_own_section() {
        let spec = LayoutSpec::new(
            Some(quick_grid()),
            vec![SectionSpec::roles("Status", vec!["liquid".into()]).unwrap()],
        );
        let bindings = bindings_for(&["switch.1_power", "sensor.1_liquid"]);
        let nodes = spec.build(&bindings, &ids(&["sensor.1_liquid", "switch.1_power"]));

        let liquid: EntityId = "sensor.1_liquid".parse().unwrap();
        let fan_unbound = bindings.get("fan");
        assert_eq!(fan_unbound, None);

        // The bound liquid role shows up exactly once, inside "Status".
        let occurrences: usize = nodes
            .iter()
            .map(|node| match node {
                LayoutNode::Grid { entities, .. } | LayoutNode::Section { entities, .. } => {
                    entities.iter().filter(|id| **id == liquid).count()
                }
            })
            .sum();
        assert_eq!(occurrences, 1);
        assert!(matches!(&nodes[1], LayoutNode::Section { title, .. } if title == "Status"));
    }

    #[test]
    fn should_sweep_kind_sections_with_priority_and_limit() {
        let priority = PriorityTable::builder()
            .rule("consumption", 90)
            .rule("delay", 60)
            .build()
            .unwrap();
        let spec = LayoutSpec::new(
            None,
            vec![
                SectionSpec::kind("Controls", EntityKind::Number)
                    .with_priority(priority)
                    .with_limit(2),
            ],
        );

        let entities = ids(&[
            "number.1_delay",
            "number.1_consumption",
            "number.1_volume",
            "select.1_mode",
        ]);
        let nodes = spec.build(&RoleBindings::default(), &entities);

        assert_eq!(
            nodes,
            vec![LayoutNode::Section {
                title: "Controls".to_string(),
                entities: ids(&["number.1_consumption", "number.1_delay"]),
            }]
        );
    }

    #[test]
    fn should_return_empty_tree_for_empty_bindings_and_entities() {
        let spec = LayoutSpec::new(
            Some(quick_grid()),
            vec![SectionSpec::kind("Controls", EntityKind::Number)],
        );
        let nodes = spec.build(&RoleBindings::default(), &[]);
        assert!(nodes.is_empty());
    }

    #[test]
    fn should_build_byte_identical_output_for_identical_input() {
        let spec = LayoutSpec::new(
            Some(quick_grid()),
            vec![SectionSpec::kind("Controls", EntityKind::Number)],
        );
        let bindings = bindings_for(&["switch.1_power", "switch.1_fan"]);
        let entities = ids(&["number.1_delay", "switch.1_fan", "switch.1_power"]);

        let first = serde_json::to_string(&spec.build(&bindings, &entities)).unwrap();
        let second = serde_json::to_string(&spec.build(&bindings, &entities)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn should_reject_zero_column_grid() {
        let result = GridSpec::new(0, vec!["power".into()]);
        assert!(matches!(result, Err(ValidationError::ZeroColumns)));
    }

    #[test]
    fn should_reject_grid_and_section_without_roles() {
        assert!(matches!(
            GridSpec::new(5, Vec::new()),
            Err(ValidationError::EmptySection(_))
        ));
        assert!(matches!(
            SectionSpec::roles("Status", Vec::new()),
            Err(ValidationError::EmptySection(title)) if title == "Status"
        ));
    }

    #[test]
    fn should_serialize_nodes_with_type_tags() {
        let node = LayoutNode::Grid {
            columns: 5,
            entities: ids(&["switch.1_power"]),
        };
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "grid");
        assert_eq!(json["columns"], 5);
    }
}
