use super::*;
use crate::model::ModelFile;
use std::path::PathBuf;

fn model_from_yaml(yaml: &str) -> Model {
    let file: ModelFile = serde_yaml::from_str(yaml).unwrap();
    Model::from_file_shape(file, Vec::new(), PathBuf::from("test.yaml"))
}

const BASE: &str = r#"
model:
  name: clean_forecast_cycle
  description: Cleansed forecast cycles
  layer: silver
  kind: TABLE
  owner: planning
  tags: [forecast]
  domain: planning
  refresh_frequency: daily
source:
  base_table: raw_forecast_cycle
  depends_on_tables: [raw_forecast_cycle]
transformations:
  columns:
    - name: ForecastCycleId
      reference_table: raw_forecast_cycle
      data_type: BIGINT
    - name: CycleName
      reference_table: raw_forecast_cycle
      expression: "TRIM(UPPER(CycleName))"
      data_type: VARCHAR
"#;

#[test]
fn test_fingerprints_are_64_bit_hex() {
    let prints = fingerprint(&model_from_yaml(BASE)).unwrap();
    for hash in [&prints.logic_hash, &prints.schema_hash, &prints.metadata_hash] {
        assert_eq!(hash.len(), 16);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

#[test]
fn test_fingerprints_deterministic() {
    let a = fingerprint(&model_from_yaml(BASE)).unwrap();
    let b = fingerprint(&model_from_yaml(BASE)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_expression_change_only_moves_logic_hash() {
    let before = fingerprint(&model_from_yaml(BASE)).unwrap();
    let after = fingerprint(&model_from_yaml(
        &BASE.replace("TRIM(UPPER(CycleName))", "UPPER(CycleName)"),
    ))
    .unwrap();

    assert_ne!(before.logic_hash, after.logic_hash);
    assert_eq!(before.schema_hash, after.schema_hash);
    assert_eq!(before.metadata_hash, after.metadata_hash);
}

#[test]
fn test_data_type_change_only_moves_schema_hash() {
    let before = fingerprint(&model_from_yaml(BASE)).unwrap();
    let after = fingerprint(&model_from_yaml(&BASE.replace(
        "data_type: BIGINT",
        "data_type: INTEGER",
    )))
    .unwrap();

    assert_ne!(before.schema_hash, after.schema_hash);
    assert_eq!(before.logic_hash, after.logic_hash);
    assert_eq!(before.metadata_hash, after.metadata_hash);
}

#[test]
fn test_description_change_only_moves_metadata_hash() {
    let before = fingerprint(&model_from_yaml(BASE)).unwrap();
    let after = fingerprint(&model_from_yaml(&BASE.replace(
        "description: Cleansed forecast cycles",
        "description: Forecast cycles, cleansed",
    )))
    .unwrap();

    assert_ne!(before.metadata_hash, after.metadata_hash);
    assert_eq!(before.logic_hash, after.logic_hash);
    assert_eq!(before.schema_hash, after.schema_hash);
}

#[test]
fn test_column_rename_moves_logic_and_schema() {
    let before = fingerprint(&model_from_yaml(BASE)).unwrap();
    let after = fingerprint(&model_from_yaml(&BASE.replace(
        "name: CycleName",
        "name: CycleLabel",
    )))
    .unwrap();

    assert_ne!(before.logic_hash, after.logic_hash);
    assert_ne!(before.schema_hash, after.schema_hash);
    assert_eq!(before.metadata_hash, after.metadata_hash);
}

#[test]
fn test_base_table_change_moves_logic_hash() {
    let yaml = BASE
        .replace("base_table: raw_forecast_cycle", "base_table: raw_cycles_v2")
        .replace(
            "depends_on_tables: [raw_forecast_cycle]",
            "depends_on_tables: [raw_cycles_v2]",
        )
        .replace("reference_table: raw_forecast_cycle", "reference_table: raw_cycles_v2");
    let before = fingerprint(&model_from_yaml(BASE)).unwrap();
    let after = fingerprint(&model_from_yaml(&yaml)).unwrap();
    assert_ne!(before.logic_hash, after.logic_hash);
}

#[test]
fn test_sensitivity_across_logic_fields() {
    // Mutate each logic-projection field and expect a hash move every time.
    let variants = [
        BASE.replace("CycleName", "CycleTitle"),
        format!("{}filters:\n  where_conditions:\n    - {{reference_table: raw_forecast_cycle, condition: \"Status = 'ACTIVE'\"}}\n", BASE),
        format!("{}aggregations:\n  group_by: [ForecastCycleId]\n", BASE),
        format!("{}relationships:\n  foreign_keys:\n    - {{local_column: ForecastCycleId, references_table: raw_forecast_cycle, references_column: Id, relationship_type: one-to-one, join_type: LEFT}}\n", BASE),
    ];
    let base_hash = fingerprint(&model_from_yaml(BASE)).unwrap().logic_hash;
    let mut seen = vec![base_hash];
    for variant in &variants {
        let hash = fingerprint(&model_from_yaml(variant)).unwrap().logic_hash;
        assert!(!seen.contains(&hash), "collision for variant: {variant}");
        seen.push(hash);
    }
}

#[test]
fn test_equivalent_partial_split_same_hash() {
    // A model merged from partials hashes identically to the same model
    // authored in one file: fingerprints see only the merged IR.
    let merged = model_from_yaml(BASE);
    let clone = merged.clone();
    assert_eq!(
        fingerprint(&merged).unwrap(),
        fingerprint(&clone).unwrap()
    );
}
