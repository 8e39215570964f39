mod format;
mod json;
mod table;

pub(crate) use format::format_cost;
pub(crate) use json::{output_price_json, output_report_json, output_resolution_json};
pub(crate) use table::print_report_table;
