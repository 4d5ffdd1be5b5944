use super::*;
use crate::model::ModelFile;
use std::path::PathBuf;

fn corpus() -> BTreeMap<ModelName, Model> {
    let yamls = [
        r#"
model: {name: raw_orders, layer: bronze, kind: VIEW}
source:
  base_table: source_systems.orders
  depends_on_tables: [source_systems.orders]
transformations:
  columns:
    - {name: OrderId, reference_table: source_systems.orders}
"#,
        r#"
model: {name: clean_orders, layer: silver, kind: TABLE}
source:
  base_table: raw_orders
  depends_on_tables: [raw_orders]
transformations:
  columns:
    - {name: OrderId, reference_table: raw_orders}
"#,
        r#"
model: {name: fct_orders, layer: gold, kind: TABLE}
source:
  base_table: clean_orders
  depends_on_tables: [clean_orders]
transformations:
  columns:
    - {name: OrderId, reference_table: clean_orders}
"#,
    ];
    yamls
        .iter()
        .map(|y| {
            let file: ModelFile = serde_yaml::from_str(y).unwrap();
            let m = Model::from_file_shape(file, Vec::new(), PathBuf::from("t.yaml"));
            (m.name.clone(), m)
        })
        .collect()
}

#[test]
fn test_nodes_edges_export() {
    let models = corpus();
    let dag = DependencyGraph::build(&models).unwrap();
    let doc = export_nodes_edges(&models, &dag);

    assert_eq!(doc.nodes.len(), 3);
    // External tables are edge endpoints but not nodes
    assert!(doc.nodes.iter().all(|n| n.name != "source_systems.orders"));
    assert_eq!(doc.edges.len(), 3);
    assert!(doc
        .edges
        .iter()
        .any(|e| e.from == "clean_orders" && e.to == "fct_orders"));
}

#[test]
fn test_nodes_edges_serializes() {
    let models = corpus();
    let dag = DependencyGraph::build(&models).unwrap();
    let json = serde_json::to_value(export_nodes_edges(&models, &dag)).unwrap();
    assert!(json["nodes"].is_array());
    assert!(json["edges"].is_array());
}

#[test]
fn test_hierarchical_export_groups_by_layer() {
    let models = corpus();
    let layers = export_hierarchical(&models);

    assert_eq!(layers["bronze"].len(), 1);
    assert_eq!(layers["silver"].len(), 1);
    assert_eq!(layers["gold"].len(), 1);
    assert_eq!(layers["gold"][0].name, "fct_orders");
    assert_eq!(layers["gold"][0].dependencies, vec!["clean_orders"]);
    assert_eq!(layers["gold"][0].columns, vec!["OrderId"]);
}

#[test]
fn test_dot_export() {
    let models = corpus();
    let dot = export_dot(&models);

    assert!(dot.starts_with("digraph dependencies {"));
    assert!(dot.contains("\"clean_orders\" [fillcolor=lightgreen"));
    assert!(dot.contains("\"clean_orders\" -> \"fct_orders\";"));
    assert!(dot.ends_with("}"));
}

#[test]
fn test_graph_stats() {
    let models = corpus();
    let dag = DependencyGraph::build(&models).unwrap();
    let stats = graph_stats(&models, &dag);

    assert_eq!(stats.total_models, 3);
    assert_eq!(stats.total_dependencies, 2);
    assert_eq!(stats.source_models, vec!["raw_orders"]);
    assert_eq!(stats.leaf_models, vec!["fct_orders"]);
}
