//! Dot-path addressing into a JSON document.
//!
//! `"runtime.startupTimeout"` addresses `{"runtime": {"startupTimeout": ..}}`.
//! Numeric segments index arrays. Writes create missing objects and replace
//! scalars found on the way, but never turn an array into an object.

use serde_json::{Map, Value};

use crate::config::error::ConfigError;

/// Split a dot-path into its segments, rejecting empty segments.
pub fn segments(path: &str) -> Result<Vec<&str>, ConfigError> {
    let parts: Vec<&str> = path.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(ConfigError::InvalidPath(path.to_string()));
    }
    Ok(parts)
}

/// Look up the value at `segments`.
pub fn lookup<'a>(root: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    segments.iter().try_fold(root, |node, segment| match node {
        Value::Object(map) => map.get(*segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Write `value` at `segments`, creating intermediate objects.
///
/// Inside an array a segment must be an existing index, or the array's
/// length for the final segment, which appends.
pub fn insert(root: &mut Value, segments: &[&str], value: Value) -> Result<(), ConfigError> {
    let Some((last, parents)) = segments.split_last() else {
        *root = value;
        return Ok(());
    };

    let mut node = root;
    for segment in parents {
        node = match node {
            Value::Array(items) => {
                let index = array_index(segment, items.len(), segments)?;
                &mut items[index]
            }
            other => as_object(other)
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new())),
        };
    }

    match node {
        Value::Array(items) => {
            let index = array_index(last, items.len() + 1, segments)?;
            if index == items.len() {
                items.push(value);
            } else {
                items[index] = value;
            }
        }
        other => {
            as_object(other).insert(last.to_string(), value);
        }
    }
    Ok(())
}

/// Remove the value at `segments`. Returns whether anything was removed.
///
/// Removing from an array shifts the later elements down.
pub fn remove(root: &mut Value, segments: &[&str]) -> bool {
    let Some((last, parents)) = segments.split_last() else {
        return false;
    };

    let mut node = root;
    for segment in parents {
        match child_mut(node, segment) {
            Some(child) => node = child,
            None => return false,
        }
    }

    match node {
        Value::Object(map) => map.remove(*last).is_some(),
        Value::Array(items) => match last.parse::<usize>() {
            Ok(index) if index < items.len() => {
                items.remove(index);
                true
            }
            _ => false,
        },
        _ => false,
    }
}

/// Recursively merge `overlay` into `base`. Objects merge key by key,
/// anything else in `overlay` replaces what `base` holds.
pub fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn child_mut<'a>(node: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match node {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get_mut(i)),
        _ => None,
    }
}

/// Index `segment` into an array, which must be below `bound`.
fn array_index(segment: &str, bound: usize, segments: &[&str]) -> Result<usize, ConfigError> {
    segment
        .parse::<usize>()
        .ok()
        .filter(|index| *index < bound)
        .ok_or_else(|| ConfigError::InvalidPath(segments.join(".")))
}

fn as_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_segments_reject_empty() {
        assert_eq!(segments("a.b").unwrap(), vec!["a", "b"]);
        assert!(segments("").is_err());
        assert!(segments("a..b").is_err());
        assert!(segments(".a").is_err());
    }

    #[test]
    fn test_lookup_objects_and_arrays() {
        let doc = json!({"a": {"b": [10, {"c": true}]}});
        assert_eq!(lookup(&doc, &["a", "b", "0"]), Some(&json!(10)));
        assert_eq!(lookup(&doc, &["a", "b", "1", "c"]), Some(&json!(true)));
        assert_eq!(lookup(&doc, &["a", "x"]), None);
        assert_eq!(lookup(&doc, &["a", "b", "9"]), None);
    }

    #[test]
    fn test_insert_creates_and_replaces_parents() {
        let mut doc = json!({"a": 1});
        insert(&mut doc, &["b", "c"], json!("x")).unwrap();
        assert_eq!(doc, json!({"a": 1, "b": {"c": "x"}}));

        // Scalar parent is replaced by an object
        insert(&mut doc, &["a", "d"], json!(2)).unwrap();
        assert_eq!(doc["a"], json!({"d": 2}));
    }

    #[test]
    fn test_insert_indexes_arrays() {
        let mut doc = json!({"hosts": ["a", "b"], "pools": [{"size": 1}]});

        insert(&mut doc, &["hosts", "1"], json!("c")).unwrap();
        insert(&mut doc, &["hosts", "2"], json!("d")).unwrap();
        insert(&mut doc, &["pools", "0", "size"], json!(4)).unwrap();
        assert_eq!(doc, json!({"hosts": ["a", "c", "d"], "pools": [{"size": 4}]}));

        let before = doc.clone();
        assert!(matches!(
            insert(&mut doc, &["hosts", "9"], json!("x")),
            Err(ConfigError::InvalidPath(path)) if path == "hosts.9"
        ));
        assert!(insert(&mut doc, &["hosts", "name"], json!("x")).is_err());
        assert!(insert(&mut doc, &["pools", "3", "size"], json!(1)).is_err());
        assert_eq!(doc, before);
    }

    #[test]
    fn test_remove() {
        let mut doc = json!({"a": {"b": 1, "c": 2}});
        assert!(remove(&mut doc, &["a", "b"]));
        assert!(!remove(&mut doc, &["a", "b"]));
        assert!(!remove(&mut doc, &["x", "y"]));
        assert_eq!(doc, json!({"a": {"c": 2}}));
    }

    #[test]
    fn test_remove_from_arrays() {
        let mut doc = json!({"hosts": ["a", "b", "c"], "pools": [{"size": 1, "max": 2}]});

        assert!(remove(&mut doc, &["hosts", "1"]));
        assert!(remove(&mut doc, &["pools", "0", "max"]));
        assert!(!remove(&mut doc, &["hosts", "5"]));
        assert!(!remove(&mut doc, &["hosts", "x"]));
        assert_eq!(doc, json!({"hosts": ["a", "c"], "pools": [{"size": 1}]}));
    }

    #[test]
    fn test_merge_is_deep() {
        let mut base = json!({"runtime": {"startupTimeout": 2000, "shutdownTimeout": 2000}});
        merge(&mut base, json!({"runtime": {"startupTimeout": 50}, "extra": [1]}));
        assert_eq!(
            base,
            json!({"runtime": {"startupTimeout": 50, "shutdownTimeout": 2000}, "extra": [1]})
        );
    }
}
