use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexSet;
use rand::RngCore;

use cdesynth_core::{Modifications, Record, ResponseValue};

use crate::errors::{PlanError, UdfError};
use crate::invoke::invoke_relationship;
use crate::model::{CallArgs, RelationshipSpec};
use crate::planner::{ExecutionPlan, plan_relationships};

/// Graph node standing in for the inputs of relationships that read nothing.
pub const NO_DEPENDENCY: &str = "__no_dependency__";

/// A value-producing function referenced by name from templates.
pub trait Udf: Send + Sync {
    fn call(&self, args: &CallArgs, rng: &mut dyn RngCore) -> Result<ResponseValue, UdfError>;
}

impl<F> Udf for F
where
    F: Fn(&CallArgs, &mut dyn RngCore) -> Result<ResponseValue, UdfError> + Send + Sync,
{
    fn call(&self, args: &CallArgs, rng: &mut dyn RngCore) -> Result<ResponseValue, UdfError> {
        self(args, rng)
    }
}

/// Body of a relationship.
///
/// Receives only the declared dependencies of the record and returns the
/// requested modifications, or `None` when nothing changes.
pub trait RelationshipFn: Send + Sync {
    fn apply(
        &self,
        view: &Record,
        args: &CallArgs,
        rng: &mut dyn RngCore,
    ) -> Result<Option<Modifications>, UdfError>;
}

impl<F> RelationshipFn for F
where
    F: Fn(&Record, &CallArgs, &mut dyn RngCore) -> Result<Option<Modifications>, UdfError>
        + Send
        + Sync,
{
    fn apply(
        &self,
        view: &Record,
        args: &CallArgs,
        rng: &mut dyn RngCore,
    ) -> Result<Option<Modifications>, UdfError> {
        self(view, args, rng)
    }
}

/// A registered relationship and its contract.
pub struct Relationship {
    pub name: String,
    /// Variables the function may read. Never empty; see [`NO_DEPENDENCY`].
    pub dependencies: IndexSet<String>,
    /// Variables the function may write.
    pub modifies: IndexSet<String>,
    pub(crate) function: Arc<dyn RelationshipFn>,
}

impl fmt::Debug for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relationship")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("modifies", &self.modifies)
            .finish_non_exhaustive()
    }
}

impl Relationship {
    /// True when the relationship reads no template variable.
    pub fn is_independent(&self) -> bool {
        self.dependencies.len() == 1 && self.dependencies.contains(NO_DEPENDENCY)
    }
}

/// Builder used to register a relationship.
pub struct RelationshipDescriptor {
    name: String,
    dependencies: Vec<String>,
    modifies: Vec<String>,
    function: Arc<dyn RelationshipFn>,
}

impl RelationshipDescriptor {
    pub fn new(name: impl Into<String>, function: impl RelationshipFn + 'static) -> Self {
        Self {
            name: name.into(),
            dependencies: Vec::new(),
            modifies: Vec::new(),
            function: Arc::new(function),
        }
    }

    pub fn depends_on<I, S>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.extend(variables.into_iter().map(Into::into));
        self
    }

    pub fn modifies<I, S>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modifies.extend(variables.into_iter().map(Into::into));
        self
    }

    fn build(self) -> Relationship {
        let mut dependencies: IndexSet<String> = self.dependencies.into_iter().collect();
        if dependencies.is_empty() {
            dependencies.insert(NO_DEPENDENCY.to_string());
        }
        Relationship {
            name: self.name,
            dependencies,
            modifies: self.modifies.into_iter().collect(),
            function: self.function,
        }
    }
}

/// A registered relationship paired with the arguments of one configuration entry.
///
/// Binding never touches the registered relationship, so the same name can be
/// configured several times with different arguments.
#[derive(Debug, Clone)]
pub struct BoundRelationship {
    pub relationship: Arc<Relationship>,
    pub args: CallArgs,
}

impl BoundRelationship {
    pub fn name(&self) -> &str {
        &self.relationship.name
    }

    pub fn dependencies(&self) -> &IndexSet<String> {
        &self.relationship.dependencies
    }

    pub fn modifies(&self) -> &IndexSet<String> {
        &self.relationship.modifies
    }
}

/// Name-keyed store of UDFs and relationships.
#[derive(Default, Clone)]
pub struct Registry {
    udfs: HashMap<String, Arc<dyn Udf>>,
    relationships: HashMap<String, Arc<Relationship>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("udfs", &self.udf_names())
            .field("relationships", &self.relationship_names())
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a UDF. A later registration under the same name wins.
    pub fn register_udf(&mut self, name: impl Into<String>, udf: impl Udf + 'static) {
        let name = name.into();
        if self.udfs.insert(name.clone(), Arc::new(udf)).is_some() {
            tracing::debug!(udf = %name, "udf re-registered");
        }
    }

    /// Register a relationship built from a descriptor. A later registration
    /// under the same name wins.
    pub fn register_relationship(&mut self, descriptor: RelationshipDescriptor) {
        let relationship = descriptor.build();
        let name = relationship.name.clone();
        if self
            .relationships
            .insert(name.clone(), Arc::new(relationship))
            .is_some()
        {
            tracing::debug!(relationship = %name, "relationship re-registered");
        }
    }

    /// Shorthand for [`Registry::register_relationship`].
    pub fn add_relationship<D, M>(
        &mut self,
        name: &str,
        dependencies: D,
        modifies: M,
        function: impl RelationshipFn + 'static,
    ) where
        D: IntoIterator,
        D::Item: Into<String>,
        M: IntoIterator,
        M::Item: Into<String>,
    {
        self.register_relationship(
            RelationshipDescriptor::new(name, function)
                .depends_on(dependencies)
                .modifies(modifies),
        );
    }

    pub fn has_udf(&self, name: &str) -> bool {
        self.udfs.contains_key(name)
    }

    /// Invoke a UDF by name.
    pub fn invoke_udf(
        &self,
        name: &str,
        args: &CallArgs,
        rng: &mut dyn RngCore,
    ) -> Result<ResponseValue, PlanError> {
        let udf = self
            .udfs
            .get(name)
            .ok_or_else(|| PlanError::UnknownUdf(name.to_string()))?;
        udf.call(args, rng).map_err(|source| PlanError::Udf {
            name: name.to_string(),
            source,
        })
    }

    pub fn relationship(&self, name: &str) -> Option<&Arc<Relationship>> {
        self.relationships.get(name)
    }

    /// Bind a configured relationship entry to its registered definition.
    pub fn get_relationship(&self, spec: &RelationshipSpec) -> Result<BoundRelationship, PlanError> {
        let relationship = self
            .relationships
            .get(&spec.name)
            .ok_or_else(|| PlanError::UnknownRelationship(spec.name.clone()))?;
        Ok(BoundRelationship {
            relationship: Arc::clone(relationship),
            args: spec.call.clone(),
        })
    }

    /// Bind every configured entry, in order, and compute the execution plan.
    pub fn plan(&self, specs: &[RelationshipSpec]) -> Result<ExecutionPlan, PlanError> {
        let bound = specs
            .iter()
            .map(|spec| self.get_relationship(spec))
            .collect::<Result<Vec<_>, _>>()?;
        plan_relationships(bound)
    }

    /// Invoke a bound relationship against a record.
    pub fn invoke_relationship(
        &self,
        bound: &BoundRelationship,
        record: &Record,
        rng: &mut dyn RngCore,
    ) -> Result<Option<Modifications>, PlanError> {
        invoke_relationship(bound, record, rng)
    }

    pub fn udf_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.udfs.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn relationship_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.relationships.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use serde_json::json;

    fn constant(_args: &CallArgs, _rng: &mut dyn RngCore) -> Result<ResponseValue, UdfError> {
        Ok(ResponseValue::Int(1))
    }

    fn other_constant(
        _args: &CallArgs,
        _rng: &mut dyn RngCore,
    ) -> Result<ResponseValue, UdfError> {
        Ok(ResponseValue::Int(2))
    }

    fn echo_first(args: &CallArgs, _rng: &mut dyn RngCore) -> Result<ResponseValue, UdfError> {
        Ok(ResponseValue::Int(args.require_i64(0, "value")?))
    }

    fn noop(
        _view: &Record,
        _args: &CallArgs,
        _rng: &mut dyn RngCore,
    ) -> Result<Option<Modifications>, UdfError> {
        Ok(None)
    }

    #[test]
    fn unknown_names_are_reported() {
        let registry = Registry::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let err = registry
            .invoke_udf("missing", &CallArgs::default(), &mut rng)
            .unwrap_err();
        assert!(matches!(err, PlanError::UnknownUdf(name) if name == "missing"));

        let err = registry
            .get_relationship(&RelationshipSpec::new("missing"))
            .unwrap_err();
        assert!(matches!(err, PlanError::UnknownRelationship(name) if name == "missing"));
    }

    #[test]
    fn last_registration_wins() {
        let mut registry = Registry::new();
        registry.register_udf("value", constant);
        registry.register_udf("value", other_constant);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let value = registry
            .invoke_udf("value", &CallArgs::default(), &mut rng)
            .unwrap();
        assert_eq!(value, ResponseValue::Int(2));
        assert_eq!(registry.udf_names(), vec!["value"]);
    }

    #[test]
    fn udf_receives_arguments() {
        let mut registry = Registry::new();
        registry.register_udf("echo", echo_first);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let value = registry
            .invoke_udf("echo", &CallArgs::positional(vec![json!(42)]), &mut rng)
            .unwrap();
        assert_eq!(value, ResponseValue::Int(42));

        let err = registry
            .invoke_udf("echo", &CallArgs::default(), &mut rng)
            .unwrap_err();
        assert!(matches!(
            err,
            PlanError::Udf {
                source: UdfError::MissingArgument(_),
                ..
            }
        ));
    }

    #[test]
    fn empty_dependencies_use_marker() {
        let mut registry = Registry::new();
        registry.add_relationship("free", Vec::<String>::new(), ["b"], noop);

        let relationship = registry.relationship("free").unwrap();
        assert!(relationship.is_independent());
        assert_eq!(
            relationship.dependencies.iter().collect::<Vec<_>>(),
            vec![NO_DEPENDENCY]
        );
    }

    #[test]
    fn binding_attaches_arguments_without_mutating_registration() {
        let mut registry = Registry::new();
        registry.add_relationship("rel", ["a"], ["b"], noop);

        let first = registry
            .get_relationship(&RelationshipSpec::with_args(
                "rel",
                CallArgs::positional(vec![json!(1)]),
            ))
            .unwrap();
        let second = registry
            .get_relationship(&RelationshipSpec::new("rel"))
            .unwrap();

        assert_eq!(first.args.args, vec![json!(1)]);
        assert!(second.args.is_empty());
        assert!(Arc::ptr_eq(&first.relationship, &second.relationship));
    }
}
