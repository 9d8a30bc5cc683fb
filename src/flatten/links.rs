use serde_json::{Map, Value};

/// Attach a relationship's `links` to its resolved value.
///
/// - object: merged into its `links` object, relationship links win
/// - `null`: replaced by `{"links": ...}`
/// - array or scalar: wrapped as `{"data": value, "links": ...}`
pub(crate) fn attach_links(value: Value, links: &Map<String, Value>) -> Value {
    match value {
        Value::Object(mut node) => {
            match node.get_mut("links") {
                Some(Value::Object(existing)) => {
                    existing.extend(links.clone());
                }
                _ => {
                    node.insert("links".to_string(), Value::Object(links.clone()));
                }
            }
            Value::Object(node)
        }
        Value::Null => {
            let mut carrier = Map::new();
            carrier.insert("links".to_string(), Value::Object(links.clone()));
            Value::Object(carrier)
        }
        other => {
            let mut carrier = Map::new();
            carrier.insert("data".to_string(), other);
            carrier.insert("links".to_string(), Value::Object(links.clone()));
            Value::Object(carrier)
        }
    }
}
