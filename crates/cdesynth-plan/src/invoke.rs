use rand::RngCore;

use cdesynth_core::{Modifications, Record};

use crate::errors::PlanError;
use crate::registry::BoundRelationship;

/// Run one relationship against a record and enforce its contract.
///
/// The function sees only the variables it declared as dependencies. An empty
/// result is reported as `None`. Any modification of a variable outside the
/// relationship's `modifies` set fails the whole invocation.
pub fn invoke_relationship(
    bound: &BoundRelationship,
    record: &Record,
    rng: &mut dyn RngCore,
) -> Result<Option<Modifications>, PlanError> {
    let view = record.restrict(bound.dependencies());

    let result = bound
        .relationship
        .function
        .apply(&view, &bound.args, rng)
        .map_err(|source| PlanError::Udf {
            name: bound.name().to_string(),
            source,
        })?;

    let Some(modifications) = result.filter(|modifications| !modifications.is_empty()) else {
        return Ok(None);
    };

    if let Some(variable) = modifications
        .keys()
        .find(|variable| !bound.modifies().contains(variable.as_str()))
    {
        return Err(PlanError::UnauthorizedModification {
            relationship: bound.name().to_string(),
            variable: variable.clone(),
        });
    }

    Ok(Some(modifications))
}
