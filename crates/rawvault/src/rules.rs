//! Row validation rules.
//!
//! A rule partitions a batch into accepted and rejected rows, annotating
//! rejects with its name and a fixed reason. Rules run in registration
//! order and each one only ever narrows the batch the next rule sees; a
//! row rejected once never comes back. Rules must be total (malformed
//! input is data, not an error) and side-effect free: reference data is
//! loaded once per run and handed in.

use chrono::Utc;
use rawvault_db::{RejectedRecord, Row};
use std::collections::HashSet;

/// Partition produced by one rule, or by a whole rule set.
#[derive(Debug, Default)]
pub struct RuleOutcome {
    pub accepted: Vec<Row>,
    pub rejected: Vec<RejectedRecord>,
}

/// A single validation rule.
pub trait ValidationRule: Send + Sync {
    /// Stable name recorded on every reject this rule produces.
    fn name(&self) -> &'static str;

    /// Split the batch. Must accept or reject every input row.
    fn apply(&self, rows: Vec<Row>, record_source: &str) -> RuleOutcome;
}

/// Ordered set of rules applied as a pipeline.
#[derive(Default)]
pub struct RuleSet {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule; evaluation order is registration order.
    pub fn register(mut self, rule: impl ValidationRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Fold the batch through every rule, accumulating rejects.
    pub fn apply_all(&self, rows: Vec<Row>, record_source: &str) -> RuleOutcome {
        let mut accepted = rows;
        let mut rejected = Vec::new();

        for rule in &self.rules {
            let outcome = rule.apply(accepted, record_source);
            accepted = outcome.accepted;
            rejected.extend(outcome.rejected);
        }

        RuleOutcome { accepted, rejected }
    }
}

/// Rejects rows whose well identifier is not in the reference hub.
///
/// Rows without the column, or with a null/blank identifier, pass through:
/// the key is optional unless present and non-blank.
pub struct WellMustExist {
    valid_wells: HashSet<String>,
}

impl WellMustExist {
    pub const RULE_NAME: &'static str = "well_must_exist";
    pub const KEY_COLUMN: &'static str = "well_id";
    const REASON: &'static str = "well_id not found in well hub";

    pub fn new(valid_wells: HashSet<String>) -> Self {
        Self { valid_wells }
    }
}

impl ValidationRule for WellMustExist {
    fn name(&self) -> &'static str {
        Self::RULE_NAME
    }

    fn apply(&self, rows: Vec<Row>, record_source: &str) -> RuleOutcome {
        let mut outcome = RuleOutcome::default();

        for row in rows {
            let key = match row.get(Self::KEY_COLUMN) {
                None => String::new(),
                Some(value) => value.lookup_key(),
            };

            if key.is_empty() || self.valid_wells.contains(&key) {
                outcome.accepted.push(row);
            } else {
                outcome.rejected.push(RejectedRecord {
                    rejected_at: Utc::now(),
                    rule_name: Self::RULE_NAME.to_string(),
                    reason: Self::REASON.to_string(),
                    record_source: record_source.to_string(),
                    payload: row.to_json_object(),
                });
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rawvault_db::Value;

    fn wells(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn reading(well: Option<&str>, sequence: i64) -> Row {
        let mut row = Row::new();
        match well {
            Some(id) => row.push("well_id", Value::Str(id.to_string())),
            None => row.push("well_id", Value::Null),
        }
        row.push("sequence", Value::Int(sequence));
        row
    }

    #[test]
    fn unmatched_key_is_rejected_with_rule_name() {
        let rule = WellMustExist::new(wells(&["W1", "W2"]));
        let outcome = rule.apply(vec![reading(Some("W9"), 1)], "a.parquet");

        assert!(outcome.accepted.is_empty());
        assert_eq!(outcome.rejected.len(), 1);
        let reject = &outcome.rejected[0];
        assert_eq!(reject.rule_name, "well_must_exist");
        assert_eq!(reject.record_source, "a.parquet");
        assert_eq!(reject.payload["well_id"], "W9");
        assert_eq!(reject.payload["sequence"], 1);
    }

    #[test]
    fn blank_and_null_keys_pass_through() {
        let rule = WellMustExist::new(wells(&["W1"]));
        let outcome = rule.apply(
            vec![
                reading(Some(""), 1),
                reading(Some("  "), 2),
                reading(None, 3),
            ],
            "a.parquet",
        );

        assert_eq!(outcome.accepted.len(), 3);
        assert!(outcome.rejected.is_empty());
    }

    #[test]
    fn absent_column_passes_through() {
        let rule = WellMustExist::new(wells(&["W1"]));
        let mut row = Row::new();
        row.push("reading", Value::Float(1.0));

        let outcome = rule.apply(vec![row], "a.parquet");
        assert_eq!(outcome.accepted.len(), 1);
    }

    #[test]
    fn surrounding_whitespace_is_trimmed_before_lookup() {
        let rule = WellMustExist::new(wells(&["W1"]));
        let outcome = rule.apply(vec![reading(Some(" W1 "), 1)], "a.parquet");
        assert_eq!(outcome.accepted.len(), 1);
    }

    /// Test-only rule rejecting rows missing a given column.
    struct RequireColumn(&'static str);

    impl ValidationRule for RequireColumn {
        fn name(&self) -> &'static str {
            "require_column"
        }

        fn apply(&self, rows: Vec<Row>, record_source: &str) -> RuleOutcome {
            let mut outcome = RuleOutcome::default();
            for row in rows {
                if row.contains(self.0) {
                    outcome.accepted.push(row);
                } else {
                    outcome.rejected.push(RejectedRecord {
                        rejected_at: Utc::now(),
                        rule_name: "require_column".to_string(),
                        reason: format!("missing column {}", self.0),
                        record_source: record_source.to_string(),
                        payload: row.to_json_object(),
                    });
                }
            }
            outcome
        }
    }

    #[test]
    fn rules_narrow_monotonically_in_order() {
        let set = RuleSet::new()
            .register(WellMustExist::new(wells(&["W1"])))
            .register(RequireColumn("sequence"));

        let mut no_sequence = Row::new();
        no_sequence.push("well_id", Value::Str("W1".into()));

        let outcome = set.apply_all(
            vec![reading(Some("W1"), 1), reading(Some("W9"), 2), no_sequence],
            "a.parquet",
        );

        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.rejected.len(), 2);
        // First reject came from the first rule, second from the second.
        assert_eq!(outcome.rejected[0].rule_name, "well_must_exist");
        assert_eq!(outcome.rejected[1].rule_name, "require_column");
    }
}
