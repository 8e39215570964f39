use rust_decimal::Decimal;

use crate::ledger::UsageRecord;
use crate::report::{GroupBy, Summary, grand_total};
use crate::tracker::Resolution;

pub(crate) fn output_resolution_json(resolution: &Resolution) {
    let body = serde_json::json!({
        "query": resolution.query,
        "match": resolution.canonical,
        "input_cost_per_token": resolution
            .pricing
            .input_cost_per_token
            .map(|d| d.to_string()),
        "output_cost_per_token": resolution
            .pricing
            .output_cost_per_token
            .map(|d| d.to_string()),
    });
    print_json(&body);
}

pub(crate) fn output_price_json(cost: Decimal, record: &UsageRecord, recorded: bool) {
    let body = serde_json::json!({
        "model": record.model,
        "user": record.user,
        "input_tokens": record.input_tokens,
        "output_tokens": record.output_tokens,
        "total_cost": cost.to_string(),
        "recorded": recorded,
    });
    print_json(&body);
}

pub(crate) fn output_report_json(rows: &[(String, Summary)], group: GroupBy, year: i32) {
    let group_label = match group {
        GroupBy::User => "user",
        GroupBy::Model => "model",
    };
    let entries: Vec<serde_json::Value> = rows
        .iter()
        .map(|(key, summary)| {
            serde_json::json!({
                group_label: key,
                "calls": summary.calls,
                "input_tokens": summary.input_tokens,
                "output_tokens": summary.output_tokens,
                "total_cost": summary.total_cost.to_string(),
            })
        })
        .collect();
    let total = grand_total(rows);
    let body = serde_json::json!({
        "year": year,
        "group_by": group_label,
        "rows": entries,
        "total_cost": total.total_cost.to_string(),
    });
    print_json(&body);
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("Warning: failed to serialize output: {e}"),
    }
}
