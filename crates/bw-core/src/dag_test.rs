use super::*;

#[test]
fn test_build_dag_orders_dependencies_first() {
    let mut deps = HashMap::new();
    deps.insert("DSsrc".to_string(), vec![]);
    deps.insert("DSetorders".to_string(), vec!["DSsrc".to_string()]);
    deps.insert(
        "ANAboard".to_string(),
        vec!["DSetorders".to_string()],
    );

    let dag = ResourceDag::build(&deps).unwrap();
    let order = dag.topological_order().unwrap();

    let src_pos = order.iter().position(|r| r == "DSsrc").unwrap();
    let set_pos = order.iter().position(|r| r == "DSetorders").unwrap();
    let ana_pos = order.iter().position(|r| r == "ANAboard").unwrap();

    assert!(set_pos > src_pos);
    assert!(ana_pos > set_pos);
}

#[test]
fn test_circular_dependency_is_rejected() {
    let mut deps = HashMap::new();
    deps.insert("a".to_string(), vec!["b".to_string()]);
    deps.insert("b".to_string(), vec!["c".to_string()]);
    deps.insert("c".to_string(), vec!["a".to_string()]);

    let result = ResourceDag::build(&deps);
    assert!(matches!(
        result.unwrap_err(),
        CoreError::CircularDependency { .. }
    ));
}

#[test]
fn test_contains() {
    let mut dag = ResourceDag::new();
    dag.add_resource("DSetx");
    assert!(dag.contains("DSetx"));
    assert!(!dag.contains("DSety"));
}
