//! Value-level merge of partial definition files.
//!
//! Files sharing a stem modulo a `.partN` suffix merge into one document
//! before typed parsing. Per key: maps merge recursively, scalars overwrite
//! (last file wins), lists concatenate unless an element carries an
//! `operator` field (`+` append, `-` remove, `U` update). The `-` and `U`
//! operators locate their target by the element's stable key: the first
//! present of `name`, `local_column`, `type`, `condition`.

use serde_yaml::{Mapping, Value};

/// Fields that can identify a list element, in lookup order.
const KEY_FIELDS: &[&str] = &["name", "local_column", "type", "condition"];

const OPERATOR_FIELD: &str = "operator";

/// Merge `overlay` into `base`, consuming both.
///
/// Merging into `Value::Null` normalizes the overlay in place (list
/// operators are applied against an empty list), so folding every
/// contributing file over an initial `Null` strips authored `operator`
/// fields uniformly.
pub fn merge_documents(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            Value::Mapping(merge_mappings(base, overlay))
        }
        (Value::Null, Value::Mapping(overlay)) => {
            Value::Mapping(merge_mappings(Mapping::new(), overlay))
        }
        (Value::Sequence(base), Value::Sequence(overlay)) => {
            Value::Sequence(merge_sequences(base, overlay))
        }
        (Value::Null, Value::Sequence(overlay)) => {
            Value::Sequence(merge_sequences(Vec::new(), overlay))
        }
        // Scalars and mismatched shapes: the later file wins
        (_, overlay) => overlay,
    }
}

fn merge_mappings(mut base: Mapping, overlay: Mapping) -> Mapping {
    for (key, overlay_value) in overlay {
        match base.remove(&key) {
            Some(base_value) => {
                base.insert(key, merge_documents(base_value, overlay_value));
            }
            None => {
                base.insert(key, merge_documents(Value::Null, overlay_value));
            }
        }
    }
    base
}

fn merge_sequences(mut base: Vec<Value>, overlay: Vec<Value>) -> Vec<Value> {
    for element in overlay {
        let (operator, element) = split_operator(element);
        match operator.as_str() {
            "-" => {
                if let Some(pos) = find_by_key(&base, &element) {
                    base.remove(pos);
                }
            }
            "U" | "u" => {
                if let Some(pos) = find_by_key(&base, &element) {
                    let existing = base.remove(pos);
                    base.insert(pos, merge_documents(existing, element));
                } else {
                    base.push(element);
                }
            }
            // "+" and anything unrecognized: plain append
            _ => base.push(element),
        }
    }
    base
}

/// Extract and strip the `operator` field from a list element.
/// Non-mapping elements always append.
fn split_operator(element: Value) -> (String, Value) {
    match element {
        Value::Mapping(mut map) => {
            let operator = map
                .remove(Value::from(OPERATOR_FIELD))
                .and_then(|v| v.as_str().map(String::from))
                .unwrap_or_else(|| "+".to_string());
            (operator, Value::Mapping(map))
        }
        other => ("+".to_string(), other),
    }
}

/// Find the index of the base element matching `element` on its stable key.
fn find_by_key(base: &[Value], element: &Value) -> Option<usize> {
    let (key_field, key_value) = stable_key(element)?;
    base.iter().position(|candidate| {
        candidate
            .as_mapping()
            .and_then(|m| m.get(Value::from(key_field)))
            .is_some_and(|v| v == key_value)
    })
}

/// The identifying (field, value) pair of a list element, if it has one.
fn stable_key(element: &Value) -> Option<(&'static str, &Value)> {
    let map = element.as_mapping()?;
    KEY_FIELDS
        .iter()
        .find_map(|&field| map.get(Value::from(field)).map(|v| (field, v)))
}

#[cfg(test)]
#[path = "merge_test.rs"]
mod tests;
