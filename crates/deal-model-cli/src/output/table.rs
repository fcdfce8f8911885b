use colored::Colorize;
use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Render the envelope as tables: scalar fields first, then one titled table
/// per nested section or row array.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => {
                print_section(None, result);
                print_envelope_notes(map);
            }
            None => print_section(None, value),
        },
        Value::Array(arr) => print_rows(arr),
        _ => println!("{}", value),
    }
}

fn print_section(title: Option<&str>, value: &Value) {
    match value {
        Value::Object(map) => {
            let scalars: Vec<(&String, &Value)> =
                map.iter().filter(|(_, v)| is_scalar(v)).collect();
            if !scalars.is_empty() {
                if let Some(t) = title {
                    println!("\n{}", t.bold());
                }
                let mut builder = Builder::default();
                builder.push_record(["Field", "Value"]);
                for (key, val) in scalars {
                    builder.push_record([key.as_str(), &format_value(val)]);
                }
                println!("{}", Table::from(builder));
            }
            for (key, val) in map.iter().filter(|(_, v)| !is_scalar(v)) {
                let nested = match title {
                    Some(t) => format!("{}.{}", t, key),
                    None => key.clone(),
                };
                print_section(Some(&nested), val);
            }
        }
        Value::Array(arr) => {
            if arr.is_empty() {
                return;
            }
            if let Some(t) = title {
                println!("\n{}", t.bold());
            }
            print_rows(arr);
        }
        other => println!("{}", format_value(other)),
    }
}

fn print_rows(arr: &[Value]) {
    match arr.first() {
        Some(Value::Object(first)) => {
            let headers: Vec<String> = first.keys().cloned().collect();
            let mut builder = Builder::default();
            builder.push_record(headers.clone());
            for item in arr {
                if let Value::Object(map) = item {
                    let row: Vec<String> = headers
                        .iter()
                        .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                        .collect();
                    builder.push_record(row);
                }
            }
            println!("{}", Table::from(builder));
        }
        // Matrix rows (sensitivity grids) and labelled pairs
        Some(Value::Array(_)) => {
            let mut builder = Builder::default();
            for item in arr {
                if let Value::Array(cells) = item {
                    builder.push_record(cells.iter().map(format_value).collect::<Vec<_>>());
                }
            }
            println!("{}", Table::from(builder));
        }
        _ => {
            for item in arr {
                println!("{}", format_value(item));
            }
        }
    }
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\n{}", "Warnings:".yellow().bold());
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }
    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn is_scalar(value: &Value) -> bool {
    match value {
        Value::Object(_) => false,
        Value::Array(arr) => arr.iter().all(|v| !v.is_object() && !v.is_array()),
        _ => true,
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "—".to_string(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
