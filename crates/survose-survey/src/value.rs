use serde::Serializer;
use serde_json::Value;

/// Largest magnitude printed as an integer.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Read a finite number from a JSON number or a numeric string.
pub(crate) fn parse_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Scalars as text; `null`, arrays and objects have no text form.
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn as_whole(value: f64) -> Option<i64> {
    (value.fract() == 0.0 && value.abs() <= MAX_EXACT_INTEGER).then_some(value as i64)
}

/// `10.0` renders as `10`, `2.5` stays `2.5`.
pub(crate) fn format_number(value: f64) -> String {
    match as_whole(value) {
        Some(whole) => whole.to_string(),
        None => value.to_string(),
    }
}

/// Serialize whole-valued floats as JSON integers.
pub(crate) fn serialize_number<S: Serializer>(
    value: &Option<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => match as_whole(*v) {
            Some(whole) => serializer.serialize_i64(whole),
            None => serializer.serialize_f64(*v),
        },
        None => serializer.serialize_none(),
    }
}
