use cdesynth_core::{Modification, Modifications, Record, Response};
use cdesynth_plan::{CallArgs, NO_DEPENDENCY, PlanError, Registry, RelationshipSpec, UdfError};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn noop(
    _view: &Record,
    _args: &CallArgs,
    _rng: &mut dyn RngCore,
) -> Result<Option<Modifications>, UdfError> {
    Ok(None)
}

fn empty_map(
    _view: &Record,
    _args: &CallArgs,
    _rng: &mut dyn RngCore,
) -> Result<Option<Modifications>, UdfError> {
    Ok(Some(Modifications::new()))
}

fn writes_c(
    _view: &Record,
    _args: &CallArgs,
    _rng: &mut dyn RngCore,
) -> Result<Option<Modifications>, UdfError> {
    let mut modifications = Modifications::new();
    modifications.insert("c".to_string(), Modification::named("Yes"));
    Ok(Some(modifications))
}

fn copies_a_into_b(
    view: &Record,
    _args: &CallArgs,
    _rng: &mut dyn RngCore,
) -> Result<Option<Modifications>, UdfError> {
    let a = view
        .get("a")
        .ok_or_else(|| UdfError::MissingVariable("a".to_string()))?;
    if view.contains("z") {
        return Err(UdfError::Other("saw a variable outside the view".to_string()));
    }
    let mut modifications = Modifications::new();
    modifications.insert("b".to_string(), Modification::named(a.name.clone()));
    Ok(Some(modifications))
}

fn failing(
    _view: &Record,
    _args: &CallArgs,
    _rng: &mut dyn RngCore,
) -> Result<Option<Modifications>, UdfError> {
    Err(UdfError::Other("boom".to_string()))
}

fn specs(names: &[&str]) -> Vec<RelationshipSpec> {
    names.iter().map(|name| RelationshipSpec::new(*name)).collect()
}

fn record() -> Record {
    [
        ("a".to_string(), Response::new("Yes", 1)),
        ("b".to_string(), Response::new("No", 0)),
        ("z".to_string(), Response::new("Other", 9)),
    ]
    .into_iter()
    .collect()
}

#[test]
fn upstream_relationship_runs_first_regardless_of_config_order() {
    let mut registry = Registry::new();
    registry.add_relationship("r2", ["b"], ["c"], noop);
    registry.add_relationship("r1", ["a"], ["b"], noop);

    let plan = registry.plan(&specs(&["r2", "r1"])).unwrap();
    assert_eq!(plan.names(), vec!["r1", "r2"]);
}

#[test]
fn cycle_is_rejected() {
    let mut registry = Registry::new();
    registry.add_relationship("x_to_y", ["x"], ["y"], noop);
    registry.add_relationship("y_to_x", ["y"], ["x"], noop);

    let err = registry.plan(&specs(&["x_to_y", "y_to_x"])).unwrap_err();
    match err {
        PlanError::CyclicDependency { variables } => {
            assert!(variables.contains(&"x".to_string()));
            assert!(variables.contains(&"y".to_string()));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn relationship_with_two_dependencies_is_scheduled_twice() {
    let mut registry = Registry::new();
    registry.add_relationship("pair", ["a", "b"], ["c"], noop);

    let plan = registry.plan(&specs(&["pair"])).unwrap();
    assert_eq!(plan.names(), vec!["pair", "pair"]);
}

#[test]
fn independent_relationships_run_first() {
    let mut registry = Registry::new();
    registry.add_relationship("dependent", ["a"], ["b"], noop);
    registry.add_relationship("free", Vec::<String>::new(), ["c"], noop);

    let plan = registry.plan(&specs(&["dependent", "free"])).unwrap();
    assert_eq!(plan.names(), vec!["free", "dependent"]);
    assert_eq!(plan.graph().nodes().next().map(String::as_str), Some(NO_DEPENDENCY));
}

#[test]
fn self_edges_do_not_form_cycles() {
    let mut registry = Registry::new();
    registry.add_relationship("adjust", ["a"], ["a"], noop);

    let plan = registry.plan(&specs(&["adjust"])).unwrap();
    assert_eq!(plan.names(), vec!["adjust"]);
    assert_eq!(plan.summary().edges, 0);
}

#[test]
fn dependency_only_relationship_is_planned() {
    let mut registry = Registry::new();
    registry.add_relationship("observe", ["a"], Vec::<String>::new(), noop);

    let plan = registry.plan(&specs(&["observe"])).unwrap();
    assert_eq!(plan.names(), vec!["observe"]);
}

#[test]
fn unknown_relationship_fails_planning() {
    let registry = Registry::new();
    let err = registry.plan(&specs(&["ghost"])).unwrap_err();
    assert!(matches!(err, PlanError::UnknownRelationship(name) if name == "ghost"));
}

#[test]
fn invocation_sees_only_dependencies() {
    let mut registry = Registry::new();
    registry.add_relationship("copy", ["a"], ["b"], copies_a_into_b);
    let bound = registry.get_relationship(&RelationshipSpec::new("copy")).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    let modifications = registry
        .invoke_relationship(&bound, &record(), &mut rng)
        .unwrap()
        .unwrap();
    assert_eq!(modifications.get("b"), Some(&Modification::named("Yes")));
}

#[test]
fn unauthorized_modification_is_rejected() {
    let mut registry = Registry::new();
    registry.add_relationship("sneaky", ["a"], ["b"], writes_c);
    let bound = registry.get_relationship(&RelationshipSpec::new("sneaky")).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    let err = registry
        .invoke_relationship(&bound, &record(), &mut rng)
        .unwrap_err();
    assert!(matches!(
        err,
        PlanError::UnauthorizedModification { relationship, variable }
            if relationship == "sneaky" && variable == "c"
    ));
}

#[test]
fn empty_results_are_none() {
    let mut registry = Registry::new();
    registry.add_relationship("nothing", ["a"], ["b"], noop);
    registry.add_relationship("empty", ["a"], ["b"], empty_map);
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let original = record();

    for name in ["nothing", "empty"] {
        let bound = registry.get_relationship(&RelationshipSpec::new(name)).unwrap();
        let result = registry
            .invoke_relationship(&bound, &original, &mut rng)
            .unwrap();
        assert!(result.is_none(), "{name} should report no modifications");
    }
    assert_eq!(original, record());
}

#[test]
fn callable_errors_carry_relationship_name() {
    let mut registry = Registry::new();
    registry.add_relationship("broken", ["a"], ["b"], failing);
    let bound = registry.get_relationship(&RelationshipSpec::new("broken")).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    let err = registry
        .invoke_relationship(&bound, &record(), &mut rng)
        .unwrap_err();
    assert!(matches!(err, PlanError::Udf { name, .. } if name == "broken"));
}
