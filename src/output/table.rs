use comfy_table::{ContentArrangement, Table, modifiers::UTF8_SOLID_INNER_BORDERS, presets::UTF8_FULL};

use crate::report::{GroupBy, Summary, grand_total};

use super::format::{format_cost, format_number, header_cell, right_cell};

/// Print the ledger summary table for `report`.
pub(crate) fn print_report_table(rows: &[(String, Summary)], group: GroupBy, use_color: bool) {
    let group_label = match group {
        GroupBy::User => "User",
        GroupBy::Model => "Model",
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        header_cell(group_label, use_color),
        header_cell("Calls", use_color),
        header_cell("Input", use_color),
        header_cell("Output", use_color),
        header_cell("Cost", use_color),
    ]);

    for (key, summary) in rows {
        table.add_row(vec![
            comfy_table::Cell::new(key),
            right_cell(format_number(summary.calls)),
            right_cell(format_number(summary.input_tokens)),
            right_cell(format_number(summary.output_tokens)),
            right_cell(format_cost(summary.total_cost)),
        ]);
    }

    let total = grand_total(rows);
    table.add_row(vec![
        header_cell("Total", use_color),
        right_cell(format_number(total.calls)),
        right_cell(format_number(total.input_tokens)),
        right_cell(format_number(total.output_tokens)),
        right_cell(format_cost(total.total_cost)),
    ]);

    println!("{table}");
}
