use super::*;
use crate::model::ModelFile;
use tempfile::TempDir;

fn sample_models() -> BTreeMap<ModelName, Model> {
    let yaml = r#"
model:
  name: clean_orders
  description: Cleansed orders
  layer: silver
  kind: TABLE
  owner: analytics
source:
  base_table: raw.orders
  depends_on_tables: [raw.orders]
transformations:
  columns:
    - {name: OrderId, reference_table: raw.orders, data_type: BIGINT, description: Order key}
"#;
    let file: ModelFile = serde_yaml::from_str(yaml).unwrap();
    let model = Model::from_file_shape(file, Vec::new(), PathBuf::from("clean_orders.yaml"));
    let mut map = BTreeMap::new();
    map.insert(model.name.clone(), model);
    map
}

#[test]
fn test_capture_snapshot() {
    let snapshot = Snapshot::capture(&sample_models()).unwrap();
    let record = &snapshot.models["clean_orders"];
    assert_eq!(record.kind, ModelKind::Table);
    assert_eq!(record.dependencies, vec!["raw.orders"]);
    assert_eq!(record.columns.len(), 1);
    assert_eq!(record.columns[0].data_type, "BIGINT");
    assert!(record.columns[0].nullable);
    assert_eq!(record.logic_hash.len(), 16);
}

#[test]
fn test_save_and_load_roundtrip() {
    let dir = TempDir::new().unwrap();
    let store = StateStore::new(dir.path());
    let snapshot = Snapshot::capture(&sample_models()).unwrap();

    assert!(!store.exists("prod"));
    store.save("prod", &snapshot).unwrap();
    assert!(store.exists("prod"));

    let loaded = store.load("prod").unwrap().unwrap();
    assert_eq!(loaded.models, snapshot.models);
}

#[test]
fn test_load_absent_returns_none() {
    let dir = TempDir::new().unwrap();
    let store = StateStore::new(dir.path());
    assert!(store.load("prod").unwrap().is_none());
}

#[test]
fn test_malformed_snapshot_is_fatal() {
    let dir = TempDir::new().unwrap();
    let store = StateStore::new(dir.path());
    std::fs::write(store.state_path("prod"), "{not json").unwrap();

    let err = store.load("prod").unwrap_err();
    assert!(matches!(err, CoreError::SnapshotMalformed { .. }));
    // The malformed file is left intact
    assert_eq!(
        std::fs::read_to_string(store.state_path("prod")).unwrap(),
        "{not json"
    );
}

#[test]
fn test_column_type_field_renamed_in_json() {
    let dir = TempDir::new().unwrap();
    let store = StateStore::new(dir.path());
    store
        .save("prod", &Snapshot::capture(&sample_models()).unwrap())
        .unwrap();
    let raw = std::fs::read_to_string(store.state_path("prod")).unwrap();
    assert!(raw.contains("\"type\": \"BIGINT\""));
    assert!(!raw.contains("data_type"));
}

#[test]
fn test_lock_contention_fails_fast() {
    let dir = TempDir::new().unwrap();
    let store = StateStore::new(dir.path());

    let _held = store.lock("prod").unwrap();
    let err = store.lock("prod").unwrap_err();
    assert!(matches!(err, CoreError::StateLocked { .. }));
}

#[test]
fn test_lock_released_on_drop() {
    let dir = TempDir::new().unwrap();
    let store = StateStore::new(dir.path());

    {
        let _held = store.lock("prod").unwrap();
    }
    // Dropped: a second lock succeeds
    let _again = store.lock("prod").unwrap();
}

#[test]
fn test_no_temp_file_left_after_save() {
    let dir = TempDir::new().unwrap();
    let store = StateStore::new(dir.path());
    store
        .save("prod", &Snapshot::capture(&sample_models()).unwrap())
        .unwrap();

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_dependency_lists_view() {
    let snapshot = Snapshot::capture(&sample_models()).unwrap();
    let lists = snapshot.dependency_lists();
    assert_eq!(lists["clean_orders"], vec!["raw.orders"]);
}
