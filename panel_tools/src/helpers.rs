use serde_json::Value;

/// Collapses the many spellings panels use for "yes" into a real boolean. A real `true`, the number `1`, and
/// the strings `1`, `true`, `yes` and `available` (any casing) all count as true; everything else, including
/// null and absent fields, is false.
pub fn coerce_bool(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() == Some(1.0),
        Value::String(s) => {
            matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "available")
        },
        _ => false,
    }
}

/// Reads an integer out of whatever the panel sent: a number, a numeric string, or garbage (which reads as 0).
pub fn coerce_i64(v: &Value) -> i64 {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(0),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().or_else(|_| s.parse::<f64>().map(|f| f as i64)).unwrap_or(0)
        },
        _ => 0,
    }
}

/// Reads a float the same way. Dirty strings like `"$1.20 "` are stripped down to digits and dots before a
/// second parse attempt.
pub fn coerce_f64(v: &Value) -> f64 {
    match v {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or_else(|_| {
            let cleaned = s.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect::<String>();
            cleaned.parse::<f64>().unwrap_or(0.0)
        }),
        _ => 0.0,
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn bools_arrive_in_every_shape() {
        assert!(coerce_bool(&json!(true)));
        assert!(coerce_bool(&json!(1)));
        assert!(coerce_bool(&json!("1")));
        assert!(coerce_bool(&json!("True")));
        assert!(coerce_bool(&json!("yes")));
        assert!(coerce_bool(&json!("Available")));
        assert!(!coerce_bool(&json!(false)));
        assert!(!coerce_bool(&json!(0)));
        assert!(!coerce_bool(&json!("no")));
        assert!(!coerce_bool(&json!("")));
        assert!(!coerce_bool(&json!(null)));
        assert!(!coerce_bool(&json!(2)));
    }

    #[test]
    fn integers_survive_strings_floats_and_nulls() {
        assert_eq!(coerce_i64(&json!(42)), 42);
        assert_eq!(coerce_i64(&json!(42.9)), 42);
        assert_eq!(coerce_i64(&json!("250")), 250);
        assert_eq!(coerce_i64(&json!(" 17 ")), 17);
        assert_eq!(coerce_i64(&json!("3.5")), 3);
        assert_eq!(coerce_i64(&json!("n/a")), 0);
        assert_eq!(coerce_i64(&json!(null)), 0);
    }

    #[test]
    fn floats_tolerate_currency_noise() {
        assert_eq!(coerce_f64(&json!(1.25)), 1.25);
        assert_eq!(coerce_f64(&json!("0.90")), 0.90);
        assert_eq!(coerce_f64(&json!("$1.20 ")), 1.20);
        assert_eq!(coerce_f64(&json!("free")), 0.0);
        assert_eq!(coerce_f64(&json!(null)), 0.0);
    }
}
