use super::*;
use crate::dialect::PostgresDialect;
use st_core::model::ModelFile;
use std::path::PathBuf;

fn model_with_audits() -> Model {
    let yaml = r#"
model: {name: fct_orders, layer: gold, kind: TABLE}
source:
  base_table: clean_orders
  depends_on_tables: [clean_orders]
transformations:
  columns:
    - {name: OrderId, reference_table: clean_orders, data_type: BIGINT}
    - {name: Amount, reference_table: clean_orders, data_type: DECIMAL}
    - {name: Status, reference_table: clean_orders, data_type: VARCHAR}
"#;
    let doc: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
    let audits_yaml: serde_yaml::Value = serde_yaml::from_str(
        r#"
audits:
  - {type: NOT_NULL, columns: [OrderId, Status]}
  - {type: POSITIVE_VALUES, columns: [Amount]}
  - {type: UNIQUE_COMBINATION, columns: [OrderId]}
  - {type: ACCEPTED_VALUES, columns: [Status], values: [OPEN, CLOSED]}
"#,
    )
    .unwrap();
    let audits = st_core::model::parse_audits(&audits_yaml).unwrap().audits;
    let file: ModelFile = serde_yaml::from_value(doc).unwrap();
    Model::from_file_shape(file, audits, PathBuf::from("t.yaml"))
}

#[test]
fn test_audit_keys_are_stable_and_one_based() {
    let model = model_with_audits();
    let statements = generate_audits(&model, &PostgresDialect);
    let keys: Vec<&str> = statements.iter().map(|s| s.key.as_str()).collect();
    assert_eq!(
        keys,
        vec!["fct_orders.1", "fct_orders.2", "fct_orders.3", "fct_orders.4"]
    );
}

#[test]
fn test_audits_target_layer_qualified_table() {
    let model = model_with_audits();
    let statements = generate_audits(&model, &PostgresDialect);
    for statement in &statements {
        assert!(
            statement.sql.contains("gold.fct_orders"),
            "missing table in: {}",
            statement.sql
        );
    }
}

#[test]
fn test_audit_types_dispatch_on_variant() {
    let model = model_with_audits();
    let statements = generate_audits(&model, &PostgresDialect);
    assert_eq!(statements[0].audit_type, "NOT_NULL");
    assert_eq!(statements[1].audit_type, "POSITIVE_VALUES");
    assert_eq!(statements[2].audit_type, "UNIQUE_COMBINATION");
    assert_eq!(statements[3].audit_type, "ACCEPTED_VALUES");

    assert!(statements[0].sql.contains("OrderId IS NULL OR Status IS NULL"));
    assert!(statements[1].sql.contains("Amount <= 0 OR Amount IS NULL"));
    assert!(statements[2].sql.contains("GROUP BY OrderId"));
    assert!(statements[3].sql.contains("Status NOT IN ('OPEN', 'CLOSED')"));
}

#[test]
fn test_no_audits_no_statements() {
    let yaml = r#"
model: {name: m, layer: silver, kind: TABLE}
source:
  base_table: raw.t
  depends_on_tables: [raw.t]
"#;
    let file: ModelFile = serde_yaml::from_str(yaml).unwrap();
    let model = Model::from_file_shape(file, Vec::new(), PathBuf::from("t.yaml"));
    assert!(generate_audits(&model, &PostgresDialect).is_empty());
}
