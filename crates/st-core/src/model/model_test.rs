use super::*;

fn parse_model(yaml: &str) -> Model {
    let file: ModelFile = serde_yaml::from_str(yaml).unwrap();
    Model::from_file_shape(file, Vec::new(), PathBuf::from("test.yaml"))
}

const MINIMAL: &str = r#"
model:
  name: clean_orders
  description: Cleansed orders
  layer: silver
  kind: TABLE
  owner: analytics
  domain: sales
  refresh_frequency: daily
source:
  base_table: raw_orders
  depends_on_tables: [raw_orders]
transformations:
  columns:
    - name: OrderId
      reference_table: raw_orders
      data_type: BIGINT
    - name: Amount
      reference_table: raw_orders
      expression: "CAST(Amount AS DECIMAL(18,2))"
      data_type: DECIMAL
"#;

#[test]
fn test_parse_minimal_model() {
    let model = parse_model(MINIMAL);
    assert_eq!(model.name, "clean_orders");
    assert_eq!(model.layer, Layer::Silver);
    assert_eq!(model.kind, ModelKind::Table);
    assert_eq!(model.base_table.as_deref(), Some("raw_orders"));
    assert_eq!(model.output_columns(), vec!["OrderId", "Amount"]);
}

#[test]
fn test_identity_column_detection() {
    let model = parse_model(MINIMAL);
    assert!(model.column("OrderId").unwrap().is_identity());
    assert!(!model.column("Amount").unwrap().is_identity());
}

#[test]
fn test_depends_on_dedup_first_occurrence_wins() {
    let yaml = r#"
model:
  name: m
  layer: gold
  kind: TABLE
source:
  depends_on_tables: [a, b, a, c, b]
"#;
    let model = parse_model(yaml);
    assert_eq!(model.depends_on, vec!["a", "b", "c"]);
}

#[test]
fn test_tags_dedup_preserving_order() {
    let yaml = r#"
model:
  name: m
  layer: gold
  kind: TABLE
  tags: [finance, core, finance]
"#;
    let model = parse_model(yaml);
    assert_eq!(model.tags, vec!["finance", "core"]);
}

#[test]
fn test_ctes_flat_and_nested_forms() {
    let flat: CtesSection = serde_yaml::from_str("[a, b]").unwrap();
    assert_eq!(flat.into_names(), vec!["a", "b"]);

    let nested: CtesSection = serde_yaml::from_str("ctes: [a, b]").unwrap();
    assert_eq!(nested.into_names(), vec!["a", "b"]);
}

#[test]
fn test_join_type_sql_keyword() {
    assert_eq!(JoinType::FullOuter.sql_keyword(), "FULL OUTER");
    assert_eq!(JoinType::Left.sql_keyword(), "LEFT");
}

#[test]
fn test_join_type_serde_tags() {
    let j: JoinType = serde_yaml::from_str("FULL_OUTER").unwrap();
    assert_eq!(j, JoinType::FullOuter);
    let r: RelationshipType = serde_yaml::from_str("many-to-one").unwrap();
    assert_eq!(r, RelationshipType::ManyToOne);
}

#[test]
fn test_empty_optimization_treated_as_absent() {
    let yaml = r#"
model:
  name: m
  layer: gold
  kind: TABLE
optimization:
  partitioned_by: []
"#;
    let model = parse_model(yaml);
    assert!(model.optimization.is_none());
}

#[test]
fn test_primary_source_prefers_base_table() {
    let model = parse_model(MINIMAL);
    assert_eq!(model.primary_source(), Some("raw_orders"));

    let yaml = r#"
model:
  name: m
  layer: gold
  kind: TABLE
source:
  depends_on_tables: [first_dep, second_dep]
"#;
    let model = parse_model(yaml);
    assert_eq!(model.primary_source(), Some("first_dep"));
}

#[test]
fn test_source_table_for_column_falls_back_to_primary() {
    let model = parse_model(MINIMAL);
    assert_eq!(model.source_table_for_column("OrderId"), Some("raw_orders"));
    assert_eq!(model.source_table_for_column("Unknown"), Some("raw_orders"));
}

#[test]
fn test_structural_equality() {
    let a = parse_model(MINIMAL);
    let b = parse_model(MINIMAL);
    assert_eq!(a, b);
}
