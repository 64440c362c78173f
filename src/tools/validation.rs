//! Validate tool call arguments against the tool's JSON Schema.
//!
//! Covers the subset of JSON Schema our tool definitions use: object shape,
//! required properties, primitive property types, and numeric bounds.

use serde_json::Value;

/// Validate tool arguments against a JSON Schema.
///
/// Returns a description of the first violation found.
pub fn validate_arguments(args: &Value, schema: &Value) -> Result<(), String> {
    if schema.get("type").and_then(Value::as_str) == Some("object") && !args.is_object() {
        return Err(format!(
            "expected object arguments, got {}",
            json_type_name(args)
        ));
    }
    let Some(obj) = args.as_object() else {
        return Ok(());
    };

    let required = schema
        .get("required")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    if let Some(missing) = required
        .iter()
        .filter_map(Value::as_str)
        .find(|name| !obj.contains_key(*name))
    {
        return Err(format!("missing required field '{missing}'"));
    }

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };
    for (key, value) in obj {
        let Some(prop_schema) = properties.get(key) else {
            continue;
        };
        if let Some(expected) = prop_schema.get("type").and_then(Value::as_str) {
            if !value_matches_type(value, expected) {
                return Err(format!(
                    "field '{key}' expected type '{expected}', got {}",
                    json_type_name(value)
                ));
            }
        }
        if let Some(number) = value.as_f64() {
            if let Some(min) = prop_schema.get("minimum").and_then(Value::as_f64) {
                if number < min {
                    return Err(format!("field '{key}' must be >= {min}"));
                }
            }
            if let Some(max) = prop_schema.get("maximum").and_then(Value::as_f64) {
                if number > max {
                    return Err(format!("field '{key}' must be <= {max}"));
                }
            }
        }
    }

    Ok(())
}

fn value_matches_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn search_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string" },
                "max_results": { "type": "integer", "minimum": 1, "maximum": 10 },
            },
            "required": ["query"],
        })
    }

    #[test]
    fn accepts_well_formed_search_arguments() {
        let args = json!({ "query": "artisan bakery market size", "max_results": 4 });
        assert!(validate_arguments(&args, &search_schema()).is_ok());
    }

    #[test]
    fn rejects_string_arguments() {
        let err = validate_arguments(&json!("bakeries"), &search_schema()).unwrap_err();
        assert!(err.contains("expected object"));
    }

    #[test]
    fn rejects_missing_query() {
        let err = validate_arguments(&json!({ "max_results": 2 }), &search_schema()).unwrap_err();
        assert_eq!(err, "missing required field 'query'");
    }

    #[test]
    fn rejects_wrong_type_and_out_of_range_values() {
        let err = validate_arguments(&json!({ "query": 7 }), &search_schema()).unwrap_err();
        assert!(err.contains("expected type 'string'"));

        let err = validate_arguments(&json!({ "query": "q", "max_results": 50 }), &search_schema())
            .unwrap_err();
        assert!(err.contains("<= 10"));
    }

    #[test]
    fn ignores_unknown_properties() {
        let args = json!({ "query": "q", "topic": "news" });
        assert!(validate_arguments(&args, &search_schema()).is_ok());
    }
}
