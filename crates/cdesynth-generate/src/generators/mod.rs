use rand::{Rng, RngCore};

use cdesynth_core::{GeneratorKind, LoremSpec, ResponseValue, ValueGenerator};
use cdesynth_plan::{CallArgs, Registry};

use crate::errors::GenerationError;

/// Report key of a generator kind.
pub fn kind_id(kind: &GeneratorKind<'_>) -> &'static str {
    match kind {
        GeneratorKind::Udf(_) => "udf",
        GeneratorKind::Lorem(_) => "lorem",
        GeneratorKind::Range(_) => "range",
        GeneratorKind::ValidInputs(_) => "valid_inputs",
    }
}

/// Synthesize one value from a candidate's generator.
///
/// Returns `None` when the generator has nothing configured, in which case
/// the candidate's literal value applies.
pub fn synthesize(
    generator: &ValueGenerator,
    registry: &Registry,
    rng: &mut dyn RngCore,
) -> Result<Option<(ResponseValue, &'static str)>, GenerationError> {
    let Some(kind) = generator.kind() else {
        return Ok(None);
    };
    let id = kind_id(&kind);
    let value = match kind {
        GeneratorKind::Udf(call) => registry.invoke_udf(&call.name, &CallArgs::from(call), rng)?,
        GeneratorKind::Lorem(spec) => ResponseValue::Text(lorem_text(spec, rng)),
        GeneratorKind::Range(range) => ResponseValue::Int(int_in_range(range, rng)?),
        GeneratorKind::ValidInputs(inputs) => inputs[rng.random_range(0..inputs.len())].clone(),
    };
    Ok(Some((value, id)))
}

fn int_in_range(range: &[i64], rng: &mut dyn RngCore) -> Result<i64, GenerationError> {
    match range {
        [min, max] if min <= max => Ok(rng.random_range(*min..=*max)),
        _ => Err(GenerationError::Configuration(format!(
            "range must be [min, max] with min <= max (got {range:?})"
        ))),
    }
}

/// Lorem ipsum paragraph shaped by `spec`.
///
/// Each sentence is capitalized and ends with a period; sentences are joined
/// with a single space.
pub fn lorem_text(spec: &LoremSpec, rng: &mut dyn RngCore) -> String {
    let [min_sentences, max_sentences] = spec.num_sentences;
    let [min_words, max_words] = spec.sentence_length;
    let sentences = rng.random_range(min_sentences..=max_sentences.max(min_sentences));

    let mut paragraph = Vec::with_capacity(sentences as usize);
    for _ in 0..sentences {
        let words = rng.random_range(min_words..=max_words.max(min_words)).max(1);
        let mut sentence = String::new();
        for index in 0..words {
            let word = LOREM_WORDS[rng.random_range(0..LOREM_WORDS.len())];
            if index == 0 {
                let mut chars = word.chars();
                if let Some(first) = chars.next() {
                    sentence.extend(first.to_uppercase());
                    sentence.push_str(chars.as_str());
                }
            } else {
                sentence.push(' ');
                sentence.push_str(word);
            }
        }
        sentence.push('.');
        paragraph.push(sentence);
    }
    paragraph.join(" ")
}

const LOREM_WORDS: &[&str] = &[
    "lorem",
    "ipsum",
    "dolor",
    "sit",
    "amet",
    "consectetur",
    "adipiscing",
    "elit",
    "sed",
    "do",
    "eiusmod",
    "tempor",
    "incididunt",
    "ut",
    "labore",
    "et",
    "dolore",
    "magna",
    "aliqua",
    "quisquam",
    "numquam",
    "porro",
    "velit",
    "modi",
    "neque",
];
