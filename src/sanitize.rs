use serde::Serialize;
use serde_json::Value;

use crate::errors::Result;

/// JSON value of `value` in which every NaN or infinite float, at any
/// depth, has become `null`.
pub fn sanitize<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    // serde_json has no representation for non-finite floats and
    // serializes them as null.
    Ok(serde_json::to_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct Reading {
        value: f64,
        history: Vec<Option<f64>>,
        nested: BTreeMap<&'static str, (f64, f32)>,
    }

    fn contains_non_finite(value: &Value) -> bool {
        match value {
            Value::Number(number) => number.as_f64().is_some_and(|float| !float.is_finite()),
            Value::Array(items) => items.iter().any(contains_non_finite),
            Value::Object(map) => map.values().any(contains_non_finite),
            _ => false,
        }
    }

    #[rstest]
    fn non_finite_floats_become_null_at_any_depth() {
        let reading = Reading {
            value: f64::NAN,
            history: vec![Some(1.5), Some(f64::INFINITY), None],
            nested: BTreeMap::from([("deep", (f64::NEG_INFINITY, 2.0f32))]),
        };
        let sanitized = sanitize(&reading).unwrap();
        assert!(!contains_non_finite(&sanitized));
        assert_eq!(
            sanitized,
            json!({
                "value": null,
                "history": [1.5, null, null],
                "nested": { "deep": [null, 2.0] },
            })
        );
    }

    #[rstest]
    fn finite_values_are_untouched() {
        let values = vec![0., -1.25, 1e300];
        assert_eq!(sanitize(&values).unwrap(), json!([0., -1.25, 1e300]));
        assert_eq!(sanitize("text").unwrap(), json!("text"));
    }
}
