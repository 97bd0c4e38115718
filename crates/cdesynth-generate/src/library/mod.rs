//! Built-in relationship library.
//!
//! Every relationship registers through [`register_builtin`]; templates opt in
//! by naming them in a relationship configuration file.

use rand::RngCore;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

use cdesynth_core::{Modification, Modifications, Record, Response};
use cdesynth_plan::{Registry, UdfError};

pub mod health;
pub mod skip_logic;
pub mod symptoms;

/// Response name used by skip-logic relationships.
pub const SKIP_LOGIC: &str = "Skip Logic";

/// Register every built-in relationship.
pub fn register_builtin(registry: &mut Registry) {
    skip_logic::register(registry);
    health::register(registry);
    symptoms::register(registry);
}

pub(crate) fn response<'a>(view: &'a Record, variable: &str) -> Result<&'a Response, UdfError> {
    view.get(variable)
        .ok_or_else(|| UdfError::MissingVariable(variable.to_string()))
}

/// Numeric value of a response, if it has one.
pub(crate) fn numeric(view: &Record, variable: &str) -> Result<Option<f64>, UdfError> {
    Ok(response(view, variable)?.value.as_f64())
}

pub(crate) fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

/// Position of `value` between `min` and `max`, clamped to `[0, 1]`.
///
/// `None` when `value` lies below `min`.
pub(crate) fn progress(value: f64, min: f64, max: f64) -> Option<f64> {
    if value < min {
        return None;
    }
    if max <= min {
        return Some(1.0);
    }
    Some(((value - min) / (max - min)).min(1.0))
}

/// Weighted pick over `weights`; `None` when every weight is zero.
pub(crate) fn weighted_pick(
    weights: &[f64],
    rng: &mut dyn RngCore,
) -> Result<Option<usize>, UdfError> {
    if weights.iter().all(|weight| *weight == 0.0) {
        return Ok(None);
    }
    let distribution = WeightedIndex::new(weights).map_err(|err| UdfError::InvalidArgument {
        name: "weights".to_string(),
        message: err.to_string(),
    })?;
    Ok(Some(distribution.sample(rng)))
}

pub(crate) fn set_named(modifications: &mut Modifications, variable: &str, name: &str) {
    modifications.insert(variable.to_string(), Modification::named(name));
}

pub(crate) fn non_empty(modifications: Modifications) -> Option<Modifications> {
    if modifications.is_empty() {
        None
    } else {
        Some(modifications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_clamps_and_rejects_below_min() {
        assert_eq!(progress(30.0, 40.0, 90.0), None);
        assert_eq!(progress(65.0, 40.0, 90.0), Some(0.5));
        assert_eq!(progress(95.0, 40.0, 90.0), Some(1.0));
        assert_eq!(progress(40.0, 40.0, 40.0), Some(1.0));
    }

    #[test]
    fn builtin_names_are_registered() {
        let mut registry = Registry::new();
        register_builtin(&mut registry);
        for name in [
            "no_consent",
            "self_reported_height_coded",
            "age_associated_diseases",
            "covid_symptom_clustering",
            "insomnia_vaping",
        ] {
            assert!(registry.relationship(name).is_some(), "{name} missing");
        }
    }
}
