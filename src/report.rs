use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::ledger::UsageRecord;

/// Grouping axis for ledger summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GroupBy {
    User,
    Model,
}

/// Aggregated usage for one group key.
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct Summary {
    pub(crate) calls: u64,
    pub(crate) input_tokens: u64,
    pub(crate) output_tokens: u64,
    pub(crate) total_cost: Decimal,
}

/// Aggregate ledger records by user or model, keys in sorted order.
pub(crate) fn summarize(records: &[UsageRecord], group: GroupBy) -> Vec<(String, Summary)> {
    let mut map: BTreeMap<String, Summary> = BTreeMap::new();
    for record in records {
        let key = match group {
            GroupBy::User => record.user.clone(),
            GroupBy::Model => record.model.clone(),
        };
        let entry = map.entry(key).or_default();
        entry.calls += 1;
        entry.input_tokens += record.input_tokens;
        entry.output_tokens += record.output_tokens;
        entry.total_cost += record.total_cost;
    }
    map.into_iter().collect()
}

pub(crate) fn grand_total(rows: &[(String, Summary)]) -> Summary {
    let mut total = Summary::default();
    for (_, summary) in rows {
        total.calls += summary.calls;
        total.input_tokens += summary.input_tokens;
        total.output_tokens += summary.output_tokens;
        total.total_cost += summary.total_cost;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn record(user: &str, model: &str, input: u64, output: u64, cost: &str) -> UsageRecord {
        UsageRecord {
            user: user.to_string(),
            model: model.to_string(),
            timestamp: "2026-03-01T10:00:00+00:00".to_string(),
            input_tokens: input,
            output_tokens: output,
            total_cost: Decimal::from_str(cost).unwrap(),
        }
    }

    #[test]
    fn groups_by_user_with_decimal_sums() {
        let records = vec![
            record("alice", "gpt-4o", 100, 50, "0.01000000"),
            record("bob", "gpt-4o", 10, 5, "0.00100000"),
            record("alice", "claude-3-haiku", 200, 100, "0.02000000"),
        ];
        let rows = summarize(&records, GroupBy::User);
        assert_eq!(rows.len(), 2);

        let (key, alice) = &rows[0];
        assert_eq!(key, "alice");
        assert_eq!(alice.calls, 2);
        assert_eq!(alice.input_tokens, 300);
        assert_eq!(alice.output_tokens, 150);
        assert_eq!(alice.total_cost.to_string(), "0.03000000");
    }

    #[test]
    fn groups_by_model() {
        let records = vec![
            record("alice", "gpt-4o", 100, 50, "0.01000000"),
            record("bob", "gpt-4o", 10, 5, "0.00100000"),
        ];
        let rows = summarize(&records, GroupBy::Model);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, "gpt-4o");
        assert_eq!(rows[0].1.calls, 2);
    }

    #[test]
    fn grand_total_sums_all_rows() {
        let records = vec![
            record("alice", "gpt-4o", 100, 50, "0.01000000"),
            record("bob", "claude-3-haiku", 10, 5, "0.00100000"),
        ];
        let rows = summarize(&records, GroupBy::User);
        let total = grand_total(&rows);
        assert_eq!(total.calls, 2);
        assert_eq!(total.input_tokens, 110);
        assert_eq!(total.total_cost.to_string(), "0.01100000");
    }

    #[test]
    fn empty_ledger_summarizes_to_nothing() {
        assert!(summarize(&[], GroupBy::User).is_empty());
    }
}
