//! Operations on a JSON tree shaped the way the managed database stores it.
//!
//! Like the managed database, the tree never holds `null` or empty
//! containers: writing one deletes the node and prunes emptied parents.

use serde_json::{Map, Value};

pub fn is_vacant(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Drop nulls and empty containers, recursively.
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let cleaned: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, normalize(v)))
                .filter(|(_, v)| !v.is_null())
                .collect();
            if cleaned.is_empty() {
                Value::Null
            } else {
                Value::Object(cleaned)
            }
        }
        Value::Array(items) => {
            let cleaned: Vec<Value> = items
                .into_iter()
                .map(normalize)
                .filter(|v| !v.is_null())
                .collect();
            if cleaned.is_empty() {
                Value::Null
            } else {
                Value::Array(cleaned)
            }
        }
        other => other,
    }
}

pub fn lookup<'a>(root: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    let mut node = root;
    for seg in segments {
        node = match node {
            Value::Object(map) => map.get(*seg)?,
            Value::Array(items) => items.get(seg.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    (!is_vacant(node)).then_some(node)
}

/// Put an already normalized `value` at `segments`, creating parents as
/// needed. A `null` value deletes.
pub fn write(node: &mut Value, segments: &[&str], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *node = value;
        return;
    };

    if let Value::Array(items) = node {
        let indexed: Map<String, Value> = std::mem::take(items)
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect();
        *node = Value::Object(indexed);
    }
    if !node.is_object() {
        if value.is_null() {
            return;
        }
        *node = Value::Object(Map::new());
    }

    if let Value::Object(map) = node {
        let child = map.entry((*head).to_string()).or_insert(Value::Null);
        write(child, rest, value);
        if is_vacant(child) {
            map.remove(*head);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_write_creates_parents() {
        let mut root = Value::Null;
        write(&mut root, &["users", "u1", "settings"], json!({ "biometric": true }));
        assert_eq!(root, json!({ "users": { "u1": { "settings": { "biometric": true } } } }));
    }

    #[test]
    fn test_delete_prunes_empty_parents() {
        let mut root = json!({ "news": { "k1": { "title": "t" } }, "other": 1 });
        write(&mut root, &["news", "k1"], Value::Null);
        assert_eq!(root, json!({ "other": 1 }));
    }

    #[test]
    fn test_normalize_drops_empty_containers() {
        let value = normalize(json!({ "likedBy": {}, "comments": [], "title": "t", "gone": null }));
        assert_eq!(value, json!({ "title": "t" }));
        assert_eq!(normalize(json!({})), Value::Null);
    }

    #[test]
    fn test_lookup_array_index() {
        let root = json!({ "c": [ { "text": "a" }, { "text": "b" } ] });
        assert_eq!(lookup(&root, &["c", "1", "text"]), Some(&json!("b")));
        assert_eq!(lookup(&root, &["c", "9"]), None);
    }
}
