//! Relationship registry, dependency planning and contract-checked invocation.

pub mod errors;
pub mod invoke;
pub mod model;
pub mod planner;
pub mod registry;

pub use errors::{PlanError, PlanResult, UdfError};
pub use invoke::invoke_relationship;
pub use model::{CallArgs, RelationshipConfig, RelationshipSpec, load_relationship_specs};
pub use planner::{ExecutionPlan, build_graph, plan_relationships};
pub use registry::{
    BoundRelationship, NO_DEPENDENCY, Registry, Relationship, RelationshipDescriptor,
    RelationshipFn, Udf,
};
