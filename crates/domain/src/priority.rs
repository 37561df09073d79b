//! Priority ranking — ordering candidates within one display section.
//!
//! A priority table assigns each identifier the maximum score among the
//! patterns it matches (0 when none match) and ranks a candidate set by
//! descending score with ascending lexicographic identifier text as the
//! tie-break. The result is a total order: identical input always yields
//! identical output, and ranking never changes which entities are included.

use std::cmp::Reverse;

use regex::{Regex, RegexBuilder};

use crate::entity::EntityId;
use crate::error::ValidationError;

#[derive(Debug, Clone)]
struct PriorityRule {
    pattern: Regex,
    score: u32,
}

/// Scored-pattern table; patterns are compiled once at construction.
#[derive(Debug, Clone, Default)]
pub struct PriorityTable {
    rules: Vec<PriorityRule>,
}

impl PriorityTable {
    /// Create a builder for constructing a [`PriorityTable`].
    #[must_use]
    pub fn builder() -> PriorityTableBuilder {
        PriorityTableBuilder::default()
    }

    /// The identifier's score: the maximum among matching patterns, 0 if
    /// none match.
    #[must_use]
    pub fn score(&self, id: &EntityId) -> u32 {
        self.rules
            .iter()
            .filter(|rule| rule.pattern.is_match(id.as_str()))
            .map(|rule| rule.score)
            .max()
            .unwrap_or(0)
    }

    /// Rank candidates by descending score, ties broken by ascending
    /// lexicographic identifier text.
    ///
    /// With an empty table every score is 0 and the result is plain
    /// lexicographic order.
    #[must_use]
    pub fn rank(&self, ids: &[EntityId]) -> Vec<EntityId> {
        let mut ranked = ids.to_vec();
        ranked.sort_by_cached_key(|id| (Reverse(self.score(id)), id.clone()));
        ranked
    }
}

/// Step-by-step builder for [`PriorityTable`].
#[derive(Debug, Default)]
pub struct PriorityTableBuilder {
    rules: Vec<(String, u32)>,
}

impl PriorityTableBuilder {
    /// Append a `(pattern, score)` rule.
    #[must_use]
    pub fn rule(mut self, pattern: impl Into<String>, score: u32) -> Self {
        self.rules.push((pattern.into(), score));
        self
    }

    /// Consume the builder, compile every pattern, and return a
    /// [`PriorityTable`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidPattern`] for the first pattern
    /// that does not compile.
    pub fn build(self) -> Result<PriorityTable, ValidationError> {
        let rules = self
            .rules
            .into_iter()
            .map(|(source, score)| {
                let pattern = RegexBuilder::new(&source)
                    .case_insensitive(true)
                    .build()
                    .map_err(|err| ValidationError::InvalidPattern {
                        pattern: source.clone(),
                        message: err.to_string(),
                    })?;
                Ok(PriorityRule { pattern, score })
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;
        Ok(PriorityTable { rules })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(texts: &[&str]) -> Vec<EntityId> {
        texts.iter().map(|t| t.parse().unwrap()).collect()
    }

    fn number_table() -> PriorityTable {
        PriorityTable::builder()
            .rule("consumption", 90)
            .rule("(?:work_run|run)", 80)
            .rule("(?:remain|remaining|oil)", 70)
            .rule("delay", 60)
            .build()
            .unwrap()
    }

    #[test]
    fn should_rank_by_descending_score() {
        let ranked = number_table().rank(&ids(&[
            "number.1_delay",
            "number.1_consumption",
            "number.1_work_run",
        ]));

        let texts: Vec<&str> = ranked.iter().map(EntityId::as_str).collect();
        assert_eq!(
            texts,
            vec!["number.1_consumption", "number.1_work_run", "number.1_delay"]
        );
    }

    #[test]
    fn should_break_ties_lexicographically() {
        let ranked = number_table().rank(&ids(&[
            "number.2_unscored_b",
            "number.1_unscored_a",
            "number.3_unscored_c",
        ]));

        let texts: Vec<&str> = ranked.iter().map(EntityId::as_str).collect();
        assert_eq!(
            texts,
            vec![
                "number.1_unscored_a",
                "number.2_unscored_b",
                "number.3_unscored_c"
            ]
        );
    }

    #[test]
    fn should_use_maximum_score_among_matching_patterns() {
        // Matches both `consumption` (90) and `run` (80).
        let table = number_table();
        let id: EntityId = "number.1_run_consumption".parse().unwrap();
        assert_eq!(table.score(&id), 90);
    }

    #[test]
    fn should_score_zero_when_nothing_matches() {
        let id: EntityId = "number.1_volume".parse().unwrap();
        assert_eq!(number_table().score(&id), 0);
    }

    #[test]
    fn should_be_idempotent_under_resort() {
        let table = number_table();
        let once = table.rank(&ids(&[
            "number.1_delay",
            "number.1_oil_remaining",
            "number.1_consumption",
            "number.1_volume",
        ]));
        let twice = table.rank(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn should_never_change_membership() {
        let input = ids(&["number.1_delay", "number.1_consumption"]);
        let ranked = number_table().rank(&input);

        let mut sorted_input = input.clone();
        sorted_input.sort();
        let mut sorted_ranked = ranked.clone();
        sorted_ranked.sort();
        assert_eq!(sorted_input, sorted_ranked);
    }

    #[test]
    fn should_fall_back_to_lexicographic_order_with_empty_table() {
        let table = PriorityTable::default();
        let ranked = table.rank(&ids(&["switch.b_fan", "switch.a_power"]));
        let texts: Vec<&str> = ranked.iter().map(EntityId::as_str).collect();
        assert_eq!(texts, vec!["switch.a_power", "switch.b_fan"]);
    }

    #[test]
    fn should_reject_malformed_pattern_at_build() {
        let result = PriorityTable::builder().rule("(oops", 10).build();
        assert!(matches!(
            result,
            Err(ValidationError::InvalidPattern { .. })
        ));
    }
}
