use std::time::Instant;

use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use cdesynth_core::{
    Modification, Record, Response, ResponseCandidate, Template, normalize_frequencies,
    validate_template,
};
use cdesynth_plan::{RelationshipSpec, Registry};

use crate::errors::GenerationError;
use crate::generators::synthesize;
use crate::model::{GenerateOptions, GeneratedDataset, GenerationReport};

/// Entry point for generating records from a template and relationships.
#[derive(Debug, Clone)]
pub struct GenerationEngine<'r> {
    registry: &'r Registry,
    options: GenerateOptions,
}

impl<'r> GenerationEngine<'r> {
    pub fn new(registry: &'r Registry, options: GenerateOptions) -> Self {
        Self { registry, options }
    }

    /// Generate `row_count` records.
    ///
    /// Phase A draws a response for every variable of every record, weighted
    /// by frequency. Phase B applies the planned relationships, one step at a
    /// time over all records.
    pub fn run(
        &self,
        template: &Template,
        relationships: &[RelationshipSpec],
        row_count: u64,
    ) -> Result<GeneratedDataset, GenerationError> {
        let start = Instant::now();
        if row_count == 0 {
            return Err(GenerationError::Configuration(
                "row count must be greater than zero".to_string(),
            ));
        }

        let mut template = template.clone();
        validate_template(&template).map_err(configuration)?;
        normalize_frequencies(&mut template).map_err(configuration)?;

        let plan = self.registry.plan(relationships)?;

        let seed = self
            .options
            .seed
            .or(template.seed)
            .unwrap_or_else(|| rand::rng().random());
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let run_id = uuid::Uuid::new_v4().to_string();
        let mut report = GenerationReport::new(
            run_id.clone(),
            seed,
            row_count,
            template.variables.len(),
        );
        report.plan = plan.names();

        info!(
            run_id = %run_id,
            seed,
            rows = row_count,
            variables = template.variables.len(),
            relationships = plan.len(),
            "generation started"
        );

        let mut records = self.draw_records(&template, row_count, &mut rng, &mut report)?;

        for step in plan.steps() {
            let mut applied = 0_u64;
            for (index, record) in records.iter_mut().enumerate() {
                let result = self
                    .registry
                    .invoke_relationship(step, record, &mut rng)
                    .map_err(|source| GenerationError::Relationship {
                        relationship: step.name().to_string(),
                        record: index,
                        source,
                    })?;
                let Some(modifications) = result else {
                    continue;
                };

                applied += 1;
                report.record_relationship_usage(step.name());
                report.record_modifications(modifications.len());
                for (variable, modification) in modifications {
                    let response = self.resolve_modification(
                        &template,
                        &variable,
                        &modification,
                        &mut rng,
                        &mut report,
                    )?;
                    let Some(response) = response else {
                        return Err(GenerationError::UnresolvableModification {
                            relationship: step.name().to_string(),
                            variable,
                            modification: modification.to_string(),
                            record: index,
                        });
                    };
                    record.insert(variable, response);
                }
            }
            debug!(relationship = %step.name(), applied, "relationship applied");
        }

        let header = template.header();
        let rows = records.into_iter().map(Record::into_values).collect();
        report.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            run_id = %run_id,
            rows = row_count,
            modifications = report.modifications_applied,
            duration_ms = report.duration_ms,
            "generation completed"
        );

        Ok(GeneratedDataset {
            header,
            rows,
            report,
        })
    }

    fn draw_records(
        &self,
        template: &Template,
        row_count: u64,
        rng: &mut dyn RngCore,
        report: &mut GenerationReport,
    ) -> Result<Vec<Record>, GenerationError> {
        let mut records: Vec<Record> = (0..row_count)
            .map(|_| Record::with_capacity(template.variables.len()))
            .collect();

        for (variable, candidates) in &template.variables {
            let weights: Vec<f64> = candidates
                .iter()
                .map(|candidate| candidate.frequency.unwrap_or(0.0))
                .collect();
            let distribution = WeightedIndex::new(&weights).map_err(|err| {
                GenerationError::Configuration(format!(
                    "variable \"{variable}\" has no drawable responses: {err}"
                ))
            })?;

            for record in records.iter_mut() {
                let candidate = &candidates[distribution.sample(rng)];
                let response = self.materialize(candidate, rng, report)?;
                record.insert(variable.clone(), response);
            }
        }

        Ok(records)
    }

    /// Response for a candidate, synthesizing a fresh value when it has a generator.
    fn materialize(
        &self,
        candidate: &ResponseCandidate,
        rng: &mut dyn RngCore,
        report: &mut GenerationReport,
    ) -> Result<Response, GenerationError> {
        if let Some(generator) = candidate.generator() {
            if let Some((value, kind)) = synthesize(generator, self.registry, rng)? {
                report.record_generator_usage(kind);
                return Ok(Response::new(candidate.response_name.clone(), value));
            }
        }
        Ok(Response::new(
            candidate.response_name.clone(),
            candidate.response_value.clone(),
        ))
    }

    /// Canonical response for a requested modification, or `None` when the
    /// template has no matching candidate.
    fn resolve_modification(
        &self,
        template: &Template,
        variable: &str,
        modification: &Modification,
        rng: &mut dyn RngCore,
        report: &mut GenerationReport,
    ) -> Result<Option<Response>, GenerationError> {
        let Some(candidates) = template.responses(variable) else {
            return Ok(None);
        };

        let candidate = match (&modification.response_name, &modification.response_value) {
            (Some(name), Some(value)) => {
                return Ok(Some(Response::new(name.clone(), value.clone())));
            }
            (Some(name), None) => candidates
                .iter()
                .find(|candidate| candidate.response_name == *name),
            (None, Some(value)) => candidates
                .iter()
                .find(|candidate| candidate.response_value.matches(value)),
            (None, None) => None,
        };

        candidate
            .map(|candidate| self.materialize(candidate, rng, report))
            .transpose()
    }
}

/// Row count from the caller, falling back to the template.
pub fn resolve_row_count(
    requested: Option<u64>,
    template: &Template,
) -> Result<u64, GenerationError> {
    match requested.or(template.row_count) {
        Some(0) | None => Err(GenerationError::Configuration(
            "row count must be given on the command line or in the template and be greater than zero"
                .to_string(),
        )),
        Some(rows) => Ok(rows),
    }
}

fn configuration(err: cdesynth_core::Error) -> GenerationError {
    GenerationError::Configuration(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(row_count: Option<u64>) -> Template {
        Template::from_yaml_str(&format!(
            "row_count: {}\nvariables:\n  a:\n    - response_name: x\n      response_value: 1\n",
            row_count.map(|rows| rows.to_string()).unwrap_or_else(|| "null".to_string())
        ))
        .unwrap()
    }

    #[test]
    fn requested_row_count_overrides_template() {
        assert_eq!(resolve_row_count(Some(5), &template(Some(10))).unwrap(), 5);
        assert_eq!(resolve_row_count(None, &template(Some(10))).unwrap(), 10);
    }

    #[test]
    fn missing_or_zero_row_count_is_rejected() {
        assert!(matches!(
            resolve_row_count(None, &template(None)),
            Err(GenerationError::Configuration(_))
        ));
        assert!(matches!(
            resolve_row_count(Some(0), &template(Some(10))),
            Err(GenerationError::Configuration(_))
        ));
    }

    #[test]
    fn zero_rows_fail_before_drawing() {
        let registry = Registry::new();
        let engine = GenerationEngine::new(&registry, GenerateOptions::default());
        assert!(matches!(
            engine.run(&template(None), &[], 0),
            Err(GenerationError::Configuration(_))
        ));
    }
}
