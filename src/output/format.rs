use comfy_table::{Attribute, Cell, CellAlignment, Color};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::consts::COST_SCALE;

/// Format a token count with thousands separators.
pub(super) fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut result = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Format a cost for display: sub-quantum values collapse to "$0.00",
/// everything else shows six decimals.
pub(crate) fn format_cost(cost: Decimal) -> String {
    let quantum = Decimal::new(1, COST_SCALE);
    if cost < quantum {
        return "$0.00".to_string();
    }
    let mut shown = cost.round_dp_with_strategy(6, RoundingStrategy::MidpointAwayFromZero);
    shown.rescale(6);
    format!("${shown}")
}

pub(super) fn header_cell(text: &str, use_color: bool) -> Cell {
    let cell = Cell::new(text).add_attribute(Attribute::Bold);
    if use_color {
        cell.fg(Color::Cyan)
    } else {
        cell
    }
}

pub(super) fn right_cell(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}
