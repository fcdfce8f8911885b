pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use colored::Colorize;
use serde_json::Value;

use crate::OutputFormat;

/// Dispatch output to the appropriate formatter.
///
/// JSON and table render the envelope's `warnings` themselves. CSV and
/// minimal carry only the result, so clamped inputs go to stderr instead.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
    if matches!(format, OutputFormat::Csv | OutputFormat::Minimal) {
        for w in envelope_warnings(value) {
            eprintln!("{}: {}", "warning".yellow().bold(), w);
        }
    }
}

/// Warnings from a computation envelope; empty for bare results.
fn envelope_warnings(value: &Value) -> Vec<&str> {
    value
        .get("warnings")
        .and_then(Value::as_array)
        .map(|ws| ws.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}
