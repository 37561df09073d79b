//! Classification catalog — the static tables driving one card product.
//!
//! A catalog bundles the allowed integration names, the card title, the
//! role table, and the layout spec. Everything is validated when the
//! catalog is constructed; classification passes never re-parse patterns.

use std::collections::BTreeSet;

use autocard_domain::entity::EntityKind;
use autocard_domain::error::ValidationError;
use autocard_domain::layout::{GridSpec, LayoutSpec, SectionSpec};
use autocard_domain::priority::PriorityTable;
use autocard_domain::role::RoleTable;
use autocard_domain::rule::Rule;

/// Quick-action roles, in grid display order.
pub const ROLE_POWER: &str = "power";
pub const ROLE_FAN: &str = "fan";
pub const ROLE_SCHEDULE: &str = "schedule";
pub const ROLE_HVAC_SYNC: &str = "hvac_sync";
pub const ROLE_REFRESH: &str = "refresh";

/// Status roles.
pub const ROLE_CLOUD_STATUS: &str = "cloud_status";
pub const ROLE_LIQUID_LEVEL: &str = "liquid_level";
pub const ROLE_LAST_SEEN: &str = "last_seen";

/// Static configuration for one card product.
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Card header title.
    pub title: String,
    /// Integration names whose entities belong on this card.
    pub integrations: BTreeSet<String>,
    /// Role table, evaluated in declaration order.
    pub roles: RoleTable,
    /// Layout the assembled tree follows.
    pub layout: LayoutSpec,
}

impl Catalog {
    /// The built-in diffuser catalog.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] only if a built-in table is
    /// malformed, which the tests rule out.
    pub fn diffuser() -> Result<Self, ValidationError> {
        let roles = RoleTable::builder()
            .role(ROLE_POWER, Rule::pattern(r"^switch\..*(?:_power|_on|_diffuser)$")?)
            .role(ROLE_FAN, Rule::pattern(r"^switch\..*_fan$")?)
            .role(
                ROLE_SCHEDULE,
                Rule::pattern(r"^switch\..*(?:work_schedule|_schedule)$")?,
            )
            .role(ROLE_HVAC_SYNC, Rule::pattern(r"^switch\..*hvac_sync$")?)
            .role(
                ROLE_REFRESH,
                Rule::pattern(r"^button\..*(?:refresh|update|sync|status)")?,
            )
            .role(ROLE_CLOUD_STATUS, Rule::pattern(r"^sensor\..*(?:mqtt|cloud)")?)
            .role(
                ROLE_LIQUID_LEVEL,
                Rule::pattern(r"^sensor\..*(?:liquid|level)")?,
            )
            .role(
                ROLE_LAST_SEEN,
                Rule::pattern(r"^sensor\..*(?:last_seen|seen|online)")?,
            )
            .build()?;

        let sensor_priority = PriorityTable::builder()
            .rule("(?:mqtt|cloud)", 90)
            .rule("(?:liquid|level)", 80)
            .rule("(?:last_seen|online)", 70)
            .build()?;

        let number_priority = PriorityTable::builder()
            .rule("consumption", 90)
            .rule("(?:work_run|run)", 80)
            .rule("(?:work_stop|stop)", 79)
            .rule("(?:remain|remaining|oil)", 70)
            .rule("capacity", 69)
            .rule("delay", 60)
            .build()?;

        let grid = GridSpec::new(
            5,
            vec![
                ROLE_POWER.to_string(),
                ROLE_FAN.to_string(),
                ROLE_SCHEDULE.to_string(),
                ROLE_HVAC_SYNC.to_string(),
                ROLE_REFRESH.to_string(),
            ],
        )?;

        let sections = vec![
            SectionSpec::roles(
                "Status",
                vec![
                    ROLE_CLOUD_STATUS.to_string(),
                    ROLE_LIQUID_LEVEL.to_string(),
                    ROLE_LAST_SEEN.to_string(),
                ],
            )?
            .with_priority(sensor_priority),
            SectionSpec::kind("Controls", EntityKind::Number)
                .with_priority(number_priority)
                .with_limit(8),
            SectionSpec::kind("Selections", EntityKind::Select).with_limit(8),
            SectionSpec::kind("Text", EntityKind::Text).with_limit(8),
        ];

        Ok(Self {
            title: "Felshare Diffuser".to_string(),
            integrations: ["felshare_cloud", "felshare", "felshare_ble", "felshare_cloud_mqtt"]
                .into_iter()
                .map(String::from)
                .collect(),
            roles,
            layout: LayoutSpec::new(Some(grid), sections),
        })
    }

    /// Override the card title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Override the allowed integration names.
    #[must_use]
    pub fn with_integrations(mut self, integrations: impl IntoIterator<Item = String>) -> Self {
        self.integrations = integrations.into_iter().collect();
        self
    }
}
