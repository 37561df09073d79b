//! Matching rules — the predicates role tables are built from.
//!
//! A rule decides whether one registry record fulfills a semantic role.
//! Matching is case-insensitive and has no failure mode: a non-match is a
//! normal `false`, never an error. Pattern text is compiled once when the
//! rule is constructed, not re-parsed per call.

use regex::{Regex, RegexBuilder};

use crate::entity::EntityRecord;
use crate::error::ValidationError;

/// A predicate over one [`EntityRecord`].
#[derive(Debug, Clone)]
pub enum Rule {
    /// Case-insensitive suffix of the entity identifier.
    IdSuffix(String),
    /// Case-insensitive suffix of the registry unique id, accepting either
    /// `_` or `-` as the separator immediately before the suffix. Different
    /// integration variants disagree on the separator convention.
    UniqueIdSuffix(String),
    /// Case-insensitive pattern tested against the entity identifier.
    Pattern(Regex),
}

impl Rule {
    /// Suffix rule over the entity identifier.
    #[must_use]
    pub fn id_suffix(suffix: impl Into<String>) -> Self {
        Self::IdSuffix(suffix.into())
    }

    /// Suffix rule over the registry unique id.
    #[must_use]
    pub fn unique_id_suffix(suffix: impl Into<String>) -> Self {
        Self::UniqueIdSuffix(suffix.into())
    }

    /// Compile a pattern rule.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidPattern`] when the pattern does
    /// not compile.
    pub fn pattern(source: &str) -> Result<Self, ValidationError> {
        let regex = RegexBuilder::new(source)
            .case_insensitive(true)
            .build()
            .map_err(|err| ValidationError::InvalidPattern {
                pattern: source.to_string(),
                message: err.to_string(),
            })?;
        Ok(Self::Pattern(regex))
    }

    /// Whether `record` fulfills this rule.
    #[must_use]
    pub fn matches(&self, record: &EntityRecord) -> bool {
        match self {
            Self::IdSuffix(suffix) => {
                ends_with_ignore_ascii_case(record.entity_id.as_str(), suffix)
            }
            Self::UniqueIdSuffix(suffix) => record
                .unique_id
                .as_deref()
                .is_some_and(|unique_id| unique_id_matches(unique_id, suffix)),
            Self::Pattern(regex) => regex.is_match(record.entity_id.as_str()),
        }
    }
}

fn ends_with_ignore_ascii_case(haystack: &str, suffix: &str) -> bool {
    let haystack = haystack.as_bytes();
    let suffix = suffix.as_bytes();
    haystack.len() >= suffix.len()
        && haystack[haystack.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

fn unique_id_matches(unique_id: &str, suffix: &str) -> bool {
    if !ends_with_ignore_ascii_case(unique_id, suffix) {
        return false;
    }
    if unique_id.len() == suffix.len() {
        // The whole unique id is the suffix.
        return true;
    }
    let separator = unique_id.as_bytes()[unique_id.len() - suffix.len() - 1];
    matches!(separator, b'_' | b'-')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(entity_id: &str, unique_id: Option<&str>) -> EntityRecord {
        let mut builder = EntityRecord::builder()
            .entity_id(entity_id)
            .integration("felshare_cloud");
        if let Some(unique_id) = unique_id {
            builder = builder.unique_id(unique_id);
        }
        builder.build().unwrap()
    }

    #[test]
    fn should_match_identifier_suffix_case_insensitively() {
        let rule = Rule::id_suffix("_POWER");
        assert!(rule.matches(&record("switch.12345678_power", None)));
    }

    #[test]
    fn should_not_match_when_suffix_differs() {
        let rule = Rule::id_suffix("_fan");
        assert!(!rule.matches(&record("switch.12345678_power", None)));
    }

    #[test]
    fn should_match_unique_id_suffix_with_underscore_separator() {
        let rule = Rule::unique_id_suffix("power");
        assert!(rule.matches(&record("switch.device", Some("12345678_power"))));
    }

    #[test]
    fn should_match_unique_id_suffix_with_dash_separator() {
        let rule = Rule::unique_id_suffix("power");
        assert!(rule.matches(&record("switch.device", Some("12345678-power"))));
    }

    #[test]
    fn should_match_unique_id_equal_to_suffix() {
        let rule = Rule::unique_id_suffix("power");
        assert!(rule.matches(&record("switch.device", Some("POWER"))));
    }

    #[test]
    fn should_not_match_unique_id_without_separator() {
        let rule = Rule::unique_id_suffix("power");
        assert!(!rule.matches(&record("switch.device", Some("horsepower"))));
    }

    #[test]
    fn should_not_match_when_unique_id_is_absent() {
        let rule = Rule::unique_id_suffix("power");
        assert!(!rule.matches(&record("switch.12345678_power", None)));
    }

    #[test]
    fn should_match_pattern_against_identifier() {
        let rule = Rule::pattern(r"^switch\..*(?:_power|_on|_diffuser)$").unwrap();
        assert!(rule.matches(&record("switch.12345678_diffuser", None)));
        assert!(!rule.matches(&record("sensor.12345678_power_draw", None)));
    }

    #[test]
    fn should_match_pattern_case_insensitively() {
        let rule = Rule::pattern("consumption").unwrap();
        assert!(rule.matches(&record("number.12345678_CONSUMPTION", None)));
    }

    #[test]
    fn should_reject_malformed_pattern_at_construction() {
        let result = Rule::pattern("(unclosed");
        assert!(matches!(
            result,
            Err(ValidationError::InvalidPattern { .. })
        ));
    }
}
