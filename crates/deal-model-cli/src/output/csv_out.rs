use serde_json::Value;
use std::io;

/// Write the result as CSV on stdout.
///
/// A result that is itself a list of rows becomes a header + rows table.
/// Anything else is flattened into `field,value` pairs with dotted paths
/// (`coverage.dscr`, `returns.years[2].net_cash_flow`).
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Array(rows) if rows.first().is_some_and(Value::is_object) => {
            write_rows(&mut wtr, rows);
        }
        _ => {
            let mut pairs = Vec::new();
            flatten("", result, &mut pairs);
            let _ = wtr.write_record(["field", "value"]);
            for (field, val) in pairs {
                let _ = wtr.write_record([field.as_str(), val.as_str()]);
            }
        }
    }

    let _ = wtr.flush();
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        return;
    };
    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);
    for item in rows {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(&path, val, out);
            }
        }
        Value::Array(arr) => {
            for (i, val) in arr.iter().enumerate() {
                flatten(&format!("{}[{}]", prefix, i), val, out);
            }
        }
        other => out.push((prefix.to_string(), format_csv_value(other))),
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_uses_dotted_paths() {
        let mut out = Vec::new();
        flatten(
            "",
            &json!({"coverage": {"dscr": "1.3"}, "years": [{"year": 1}], "npv": null}),
            &mut out,
        );
        assert!(out.contains(&("coverage.dscr".into(), "1.3".into())));
        assert!(out.contains(&("years[0].year".into(), "1".into())));
        assert!(out.contains(&("npv".into(), String::new())));
    }
}
