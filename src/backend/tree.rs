//! Path-addressed edits on a JSON tree.
//!
//! Paths are slash-separated (`"empanadas/2/precio"`). Missing parents are
//! created as objects, integer segments index into arrays, and writing
//! `null` deletes the target, the way the realtime database treats them.

use serde_json::{Map, Value};

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Replace the value at `path` (`null` removes it).
pub fn set_at(root: &mut Value, path: &str, value: Value) {
    let segments = segments(path);
    let Some((last, parents)) = segments.split_last() else {
        *root = value;
        return;
    };

    let mut node = root;
    for segment in parents {
        node = child_mut(node, segment);
    }

    if value.is_null() {
        remove_child(node, last);
    } else {
        *child_mut(node, last) = value;
    }
}

/// Apply every child of `children` below `path` (patch semantics: siblings
/// not named in `children` are kept).
pub fn merge_at(root: &mut Value, path: &str, children: Map<String, Value>) {
    let base = path.trim_end_matches('/');
    for (key, value) in children {
        set_at(root, &format!("{}/{}", base, key), value);
    }
}

fn child_mut<'a>(node: &'a mut Value, key: &str) -> &'a mut Value {
    let index = key.parse::<usize>().ok();
    let indexes_array = node.is_array() && index.is_some();

    if !indexes_array && !node.is_object() {
        let previous = std::mem::take(node);
        *node = Value::Object(into_object(previous));
    }

    match (node, index) {
        (Value::Array(items), Some(index)) => {
            if index >= items.len() {
                items.resize(index + 1, Value::Null);
            }
            &mut items[index]
        }
        // Object by construction above
        (node, _) => &mut node[key],
    }
}

fn remove_child(node: &mut Value, key: &str) {
    match node {
        Value::Object(map) => {
            map.shift_remove(key);
        }
        Value::Array(items) => {
            if let Ok(index) = key.parse::<usize>() {
                if index < items.len() {
                    items[index] = Value::Null;
                }
                while items.last().is_some_and(Value::is_null) {
                    items.pop();
                }
            }
        }
        _ => {}
    }
}

/// Arrays become index-keyed objects; scalars are discarded.
fn into_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Map::new(),
    }
}
