use serde_json::Value;

/// Headline figure per command, most specific first. Dotted paths reach into
/// nested sections of the full acquisition result.
const PRIORITY_PATHS: &[&str] = &[
    "coverage.dscr",
    "dscr",
    "actual_dscr",
    "max_loan_amount",
    "payback_period_years",
    "returns.payback_period_years",
    "base_case_value",
    "probability_weighted_cash_flow",
    "monthly_payment",
    "term_loan_monthly_payment",
    "purchase_price",
    "structure.purchase_price",
    "net_operating_income",
];

/// Print just the key answer from the output.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);
    println!("{}", headline(result));
}

fn headline(result: &Value) -> String {
    if let Value::Object(map) = result {
        for path in PRIORITY_PATHS {
            if let Some(val) = lookup(result, path) {
                if !val.is_null() {
                    return format_minimal(val);
                }
            }
        }
        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, format_minimal(val));
        }
    }
    format_minimal(result)
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |v, key| v.get(key))
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "—".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
