//! Output formatting for the CLI.

use clap::ValueEnum;
use serde::Serialize;
use serde_json::{json, Value};

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print any serializable value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: failed to encode output: {}", e),
    }
}

/// Print a success message.
pub fn print_success(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", message),
        OutputFormat::Json => print_json(&json!({ "status": "success", "message": message })),
    }
}

/// Print an error message.
pub fn print_error(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => eprintln!("Error: {}", message),
        OutputFormat::Json => {
            eprintln!("{}", json!({ "status": "error", "message": message }));
        }
    }
}

/// Print a table row.
pub fn print_row(label: &str, value: &str) {
    println!("  {:<16} {}", format!("{}:", label), value);
}

/// Print a divider line.
pub fn print_divider() {
    println!("{}", "-".repeat(60));
}

/// Print a heading.
pub fn print_heading(text: &str) {
    println!("\n{}", text);
    print_divider();
}

/// Render a JSON field for a table cell.
pub fn cell(record: &Value, key: &str) -> String {
    match record.get(key) {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(true)) => "yes".to_string(),
        Some(Value::Bool(false)) => "no".to_string(),
        Some(other) => other.to_string(),
    }
}

/// Print records as a fixed-width table. `columns` pairs a header with the
/// JSON key it shows.
pub fn print_table(records: &[Value], columns: &[(&str, &str, usize)], empty: &str) {
    if records.is_empty() {
        println!("{}", empty);
        return;
    }

    let header: Vec<String> = columns
        .iter()
        .map(|(title, _, width)| format!("{:<width$}", title, width = *width))
        .collect();
    println!("{}", header.join(" ").trim_end());
    println!("{}", "-".repeat(columns.iter().map(|(_, _, w)| w + 1).sum()));

    for record in records {
        let row: Vec<String> = columns
            .iter()
            .map(|(_, key, width)| format!("{:<width$}", truncate(&cell(record, key), *width), width = *width))
            .collect();
        println!("{}", row.join(" ").trim_end());
    }
}

/// Print every top-level field of a record as a row.
pub fn print_record(record: &Value) {
    match record.as_object() {
        Some(map) => {
            for key in map.keys() {
                print_row(key, &cell(record, key));
            }
        }
        None => println!("{}", record),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}
