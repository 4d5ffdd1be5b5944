use super::*;

fn build(deps: &[(&str, &[&str])]) -> CoreResult<DependencyGraph> {
    let map: BTreeMap<String, Vec<String>> = deps
        .iter()
        .map(|(name, ds)| {
            (
                name.to_string(),
                ds.iter().map(|d| d.to_string()).collect(),
            )
        })
        .collect();
    DependencyGraph::from_dependency_lists(&map)
}

#[test]
fn test_topological_order_dependencies_first() {
    let dag = build(&[
        ("fct_orders", &["stg_orders", "stg_customers"]),
        ("stg_orders", &[]),
        ("stg_customers", &[]),
    ])
    .unwrap();

    let order = dag.topological_order();
    let pos = |name: &str| order.iter().position(|m| m == name).unwrap();
    assert!(pos("fct_orders") > pos("stg_orders"));
    assert!(pos("fct_orders") > pos("stg_customers"));
}

#[test]
fn test_topological_tie_breaks_lexicographic() {
    let dag = build(&[("zeta", &[]), ("alpha", &[]), ("mid", &[])]).unwrap();
    let order: Vec<String> = dag
        .topological_order()
        .into_iter()
        .map(|m| m.to_string())
        .collect();
    assert_eq!(order, vec!["alpha", "mid", "zeta"]);
}

#[test]
fn test_expected_scenario_order() {
    // Seed -> CTE -> silver -> gold chain
    let dag = build(&[
        ("raw_forecast_cycle", &[]),
        ("active_forecast_cycles", &["raw_forecast_cycle"]),
        ("clean_forecast_cycle", &["raw_forecast_cycle"]),
        (
            "fct_ForecastCycle",
            &["clean_forecast_cycle", "active_forecast_cycles"],
        ),
    ])
    .unwrap();
    let order: Vec<String> = dag
        .topological_order()
        .into_iter()
        .map(|m| m.to_string())
        .collect();
    assert_eq!(
        order,
        vec![
            "raw_forecast_cycle",
            "active_forecast_cycles",
            "clean_forecast_cycle",
            "fct_ForecastCycle",
        ]
    );
}

#[test]
fn test_cycle_detection_lists_members_alphabetically() {
    let err = build(&[("b", &["a"]), ("a", &["b"])]).unwrap_err();
    match err {
        CoreError::CircularDependency { cycle } => assert_eq!(cycle, "a -> b"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_self_loop_is_a_cycle() {
    let err = build(&[("a", &["a"])]).unwrap_err();
    match err {
        CoreError::CircularDependency { cycle } => assert_eq!(cycle, "a"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_smallest_cycle_reported_first() {
    let err = build(&[
        ("x", &["y"]),
        ("y", &["x"]),
        ("a", &["b"]),
        ("b", &["a"]),
    ])
    .unwrap_err();
    match err {
        CoreError::CircularDependency { cycle } => assert_eq!(cycle, "a -> b"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_external_dependencies_not_nodes() {
    let dag = build(&[("bronze_orders", &["raw.orders"])]).unwrap();
    assert_eq!(dag.node_count(), 1);
    assert_eq!(dag.edge_count(), 0);
    assert!(!dag.contains("raw.orders"));
}

#[test]
fn test_dependents_and_descendants() {
    let dag = build(&[
        ("raw", &[]),
        ("stg", &["raw"]),
        ("fct", &["stg"]),
        ("rpt", &["fct"]),
    ])
    .unwrap();

    assert_eq!(dag.dependents("raw"), vec!["stg"]);
    assert_eq!(dag.descendants("raw"), vec!["fct", "rpt", "stg"]);
    assert_eq!(dag.ancestors("rpt"), vec!["fct", "raw", "stg"]);
    assert_eq!(dag.dependencies("fct"), vec!["stg"]);
}

#[test]
fn test_reverse_topological_order() {
    let dag = build(&[("raw", &[]), ("stg", &["raw"]), ("fct", &["stg"])]).unwrap();
    let order: Vec<String> = dag
        .reverse_topological_order()
        .into_iter()
        .map(|m| m.to_string())
        .collect();
    assert_eq!(order, vec!["fct", "stg", "raw"]);
}

#[test]
fn test_topo_positions() {
    let dag = build(&[("raw", &[]), ("stg", &["raw"])]).unwrap();
    let positions = dag.topo_positions();
    assert!(positions["raw"] < positions["stg"]);
}

#[test]
fn test_unknown_model_queries_empty() {
    let dag = build(&[("a", &[])]).unwrap();
    assert!(dag.dependents("missing").is_empty());
    assert!(dag.descendants("missing").is_empty());
}
