//! Web-service parameter encoding.
//!
//! Moodle's REST server reads nested parameters the way PHP parses form data:
//! `data[0][name]=grade__idx_0&data[0][value]=4`. [`flatten`] turns a JSON
//! object into those pairs.

use serde_json::Value;

/// Flatten a JSON object into PHP-style form pairs
///
/// Booleans become `1`/`0` and `null` values are left out. A non-object root
/// yields no pairs.
pub fn flatten(params: &Value) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    if let Value::Object(map) = params {
        for (key, value) in map {
            flatten_into(key.clone(), value, &mut pairs);
        }
    }
    pairs
}

fn flatten_into(prefix: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(flag) => pairs.push((prefix, if *flag { "1" } else { "0" }.to_string())),
        Value::Number(number) => pairs.push((prefix, number.to_string())),
        Value::String(text) => pairs.push((prefix, text.clone())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_into(format!("{}[{}]", prefix, index), item, pairs);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                flatten_into(format!("{}[{}]", prefix, key), item, pairs);
            }
        }
    }
}

/// Turn a form-data object into the `[{name, value}]` list the assessment web service expects
pub fn object_to_name_value_list(data: &serde_json::Map<String, Value>) -> Value {
    Value::Array(
        data.iter()
            .map(|(name, value)| {
                let value = match value {
                    Value::String(text) => text.clone(),
                    Value::Bool(flag) => if *flag { "1" } else { "0" }.to_string(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                serde_json::json!({ "name": name, "value": value })
            })
            .collect(),
    )
}
