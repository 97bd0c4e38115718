use jsonschema::JSONSchema;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::template::{GeneratorKind, Template};

/// Slack allowed on a variable's explicit frequency sum before it counts as
/// exceeding 1.0.
pub const FREQUENCY_TOLERANCE: f64 = 1e-9;

/// Fill in missing frequencies so every candidate carries a weight.
///
/// Candidates without an explicit `frequency` share `1 - sum(explicit)`
/// evenly. Fails when the explicit frequencies of a variable exceed 1.0 or
/// when a frequency is negative or not finite.
pub fn normalize_frequencies(template: &mut Template) -> Result<()> {
    for (variable, responses) in template.variables.iter_mut() {
        let mut total = 0.0_f64;
        let mut unset = 0_usize;

        for response in responses.iter() {
            match response.frequency {
                Some(frequency) => {
                    if !frequency.is_finite() || frequency < 0.0 {
                        return Err(Error::InvalidTemplate(format!(
                            "frequency of response '{}' for variable \"{variable}\" must be a \
                             number in [0, 1] (got {frequency})",
                            response.response_name
                        )));
                    }
                    total += frequency;
                }
                None => unset += 1,
            }
        }

        if total > 1.0 + FREQUENCY_TOLERANCE {
            return Err(Error::InvalidTemplate(format!(
                "sum of response frequencies for variable \"{variable}\" should not exceed 1.0 \
                 (total_freq={total})"
            )));
        }

        if unset > 0 {
            let share = (1.0 - total).max(0.0) / unset as f64;
            for response in responses.iter_mut() {
                if response.frequency.is_none() {
                    response.frequency = Some(share);
                }
            }
        }
    }

    Ok(())
}

/// Validate structural invariants that the JSON Schema cannot express.
///
/// This checks:
/// - every variable declares at least one response
/// - `range` has exactly two bounds with `min <= max`
/// - lorem sentence and word ranges are ordered
pub fn validate_template(template: &Template) -> Result<()> {
    if template.variables.is_empty() {
        return Err(Error::InvalidTemplate(
            "template declares no variables".to_string(),
        ));
    }

    for (variable, responses) in &template.variables {
        if responses.is_empty() {
            return Err(Error::InvalidTemplate(format!(
                "variable \"{variable}\" declares no responses"
            )));
        }

        for response in responses {
            let Some(kind) = response.generator().and_then(|generator| generator.kind()) else {
                continue;
            };
            let location = format!("{variable}/{}", response.response_name);
            match kind {
                GeneratorKind::Range(range) => match range {
                    [min, max] if min <= max => {}
                    [min, max] => {
                        return Err(Error::InvalidTemplate(format!(
                            "{location}: range min must be <= max (got [{min}, {max}])"
                        )));
                    }
                    _ => {
                        return Err(Error::InvalidTemplate(format!(
                            "{location}: range must be [min, max]"
                        )));
                    }
                },
                GeneratorKind::Lorem(lorem) => {
                    let [min_sentences, max_sentences] = lorem.num_sentences;
                    let [min_words, max_words] = lorem.sentence_length;
                    if min_sentences > max_sentences || min_words > max_words {
                        return Err(Error::InvalidTemplate(format!(
                            "{location}: lorem ranges must be [min, max] with min <= max"
                        )));
                    }
                }
                GeneratorKind::Udf(_) | GeneratorKind::ValidInputs(_) => {}
            }
        }
    }

    Ok(())
}

/// Validate a template document against the template JSON Schema.
///
/// Returns one error per violation, each carrying its JSON pointer.
pub fn validate_template_json(template_json: &Value, template_schema: &Value) -> Vec<Error> {
    let compiled = match JSONSchema::compile(template_schema) {
        Ok(compiled) => compiled,
        Err(err) => {
            return vec![Error::Schema {
                path: "/".to_string(),
                message: err.to_string(),
            }];
        }
    };

    let mut issues = Vec::new();
    if let Err(errors) = compiled.validate(template_json) {
        for error in errors {
            let path = error.instance_path.to_string();
            issues.push(Error::Schema {
                path: if path.is_empty() { "/".to_string() } else { path },
                message: error.to_string(),
            });
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{ResponseCandidate, ValueGenerator};
    use crate::value::ResponseValue;

    fn template_with(responses: Vec<ResponseCandidate>) -> Template {
        let mut variables = indexmap::IndexMap::new();
        variables.insert("nih_example".to_string(), responses);
        Template {
            row_count: Some(1),
            output_path: None,
            seed: None,
            relationships: None,
            variables,
        }
    }

    #[test]
    fn null_frequencies_split_remaining_mass() {
        let mut template = template_with(vec![
            ResponseCandidate::new("foo", 1, Some(0.4)),
            ResponseCandidate::new("bar", 2, Some(0.3)),
            ResponseCandidate::new("egg", 3, None),
            ResponseCandidate::new("spam", 4, None),
        ]);

        normalize_frequencies(&mut template).unwrap();

        let responses = template.responses("nih_example").unwrap();
        assert!((responses[2].frequency.unwrap() - 0.15).abs() < 1e-12);
        assert!((responses[3].frequency.unwrap() - 0.15).abs() < 1e-12);
        assert_eq!(responses[0].frequency, Some(0.4));
    }

    #[test]
    fn explicit_frequencies_over_one_are_rejected() {
        let mut template = template_with(vec![
            ResponseCandidate::new("foo", 1, Some(0.8)),
            ResponseCandidate::new("bar", 2, Some(0.3)),
        ]);

        let err = normalize_frequencies(&mut template).unwrap_err();
        assert!(matches!(err, Error::InvalidTemplate(_)));
        assert!(err.to_string().contains("nih_example"));
    }

    #[test]
    fn frequencies_summing_to_one_with_float_noise_are_accepted() {
        let mut template = template_with(vec![
            ResponseCandidate::new("a", 1, Some(0.1)),
            ResponseCandidate::new("b", 2, Some(0.2)),
            ResponseCandidate::new("c", 3, Some(0.7)),
        ]);
        assert!(normalize_frequencies(&mut template).is_ok());
    }

    #[test]
    fn inverted_range_is_rejected() {
        let template = template_with(vec![
            ResponseCandidate::new("integer", ResponseValue::Null, None).with_generator(ValueGenerator {
                range: Some(vec![10, 0]),
                ..ValueGenerator::default()
            }),
        ]);
        assert!(validate_template(&template).is_err());
    }
}
