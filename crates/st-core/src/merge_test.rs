use super::*;

fn yaml(s: &str) -> Value {
    serde_yaml::from_str(s).unwrap()
}

#[test]
fn test_scalar_overwrite_last_wins() {
    let base = yaml("model: {name: a, owner: alice}");
    let overlay = yaml("model: {owner: bob}");
    let merged = merge_documents(base, overlay);
    assert_eq!(merged, yaml("model: {name: a, owner: bob}"));
}

#[test]
fn test_maps_merge_recursively() {
    let base = yaml("source: {base_table: raw.orders, depends_on_tables: [raw.orders]}");
    let overlay = yaml("aggregations: {group_by: [Region]}");
    let merged = merge_documents(base, overlay);
    let map = merged.as_mapping().unwrap();
    assert!(map.contains_key(Value::from("source")));
    assert!(map.contains_key(Value::from("aggregations")));
}

#[test]
fn test_lists_concatenate_by_default() {
    let base = yaml("grain: [OrderId]");
    let overlay = yaml("grain: [Region]");
    let merged = merge_documents(base, overlay);
    assert_eq!(merged, yaml("grain: [OrderId, Region]"));
}

#[test]
fn test_append_operator_stripped() {
    let base = yaml("columns: [{name: a}]");
    let overlay = yaml("columns: [{name: b, operator: '+'}]");
    let merged = merge_documents(base, overlay);
    assert_eq!(merged, yaml("columns: [{name: a}, {name: b}]"));
}

#[test]
fn test_remove_operator_by_name() {
    let base = yaml("columns: [{name: a, data_type: INT}, {name: b, data_type: INT}]");
    let overlay = yaml("columns: [{name: a, operator: '-'}]");
    let merged = merge_documents(base, overlay);
    assert_eq!(merged, yaml("columns: [{name: b, data_type: INT}]"));
}

#[test]
fn test_update_operator_merges_fields_in_place() {
    let base = yaml("columns: [{name: a, data_type: INT, description: old}, {name: b}]");
    let overlay = yaml("columns: [{name: a, operator: U, description: new}]");
    let merged = merge_documents(base, overlay);
    assert_eq!(
        merged,
        yaml("columns: [{name: a, data_type: INT, description: new}, {name: b}]")
    );
}

#[test]
fn test_update_missing_target_appends() {
    let base = yaml("columns: [{name: a}]");
    let overlay = yaml("columns: [{name: c, operator: U, data_type: INT}]");
    let merged = merge_documents(base, overlay);
    assert_eq!(merged, yaml("columns: [{name: a}, {name: c, data_type: INT}]"));
}

#[test]
fn test_remove_by_local_column_key() {
    let base = yaml("foreign_keys: [{local_column: x, references_table: t}]");
    let overlay = yaml("foreign_keys: [{local_column: x, operator: '-'}]");
    let merged = merge_documents(base, overlay);
    assert_eq!(merged, yaml("foreign_keys: []"));
}

#[test]
fn test_lowercase_update_operator_accepted() {
    let base = yaml("columns: [{name: a, data_type: INT}]");
    let overlay = yaml("columns: [{name: a, operator: u, data_type: BIGINT}]");
    let merged = merge_documents(base, overlay);
    assert_eq!(merged, yaml("columns: [{name: a, data_type: BIGINT}]"));
}

#[test]
fn test_null_base_normalizes_operators() {
    // Folding the first file over Null strips authored operator fields too.
    let first = yaml("transformations: {columns: [{name: a, operator: '+'}]}");
    let merged = merge_documents(Value::Null, first);
    assert_eq!(merged, yaml("transformations: {columns: [{name: a}]}"));
}

#[test]
fn test_mismatched_shapes_overlay_wins() {
    let base = yaml("grain: [OrderId]");
    let overlay = yaml("grain: OrderId");
    let merged = merge_documents(base, overlay);
    assert_eq!(merged, yaml("grain: OrderId"));
}
