use indexmap::IndexMap;
use rand::{Rng, RngCore};
use serde::Deserialize;

use cdesynth_core::{Modifications, Record};
use cdesynth_plan::{CallArgs, Registry, UdfError};

use super::{lerp, non_empty, numeric, progress, response, set_named, weighted_pick};

const AGE_DISEASES: [&str; 2] = ["nih_alz", "nih_osteoporosis"];
const HEALTH_STATUSES: [&str; 5] = ["Excellent", "Very Good", "Good", "Fair", "Poor"];
const SLEEP_APNEA_FREQ: f64 = 0.15;
const CHOLESTEROL_FREQ: f64 = 0.07;
const ANGINA_FREQ: f64 = 0.01;
const INSOMNIA_FREQ: f64 = 0.02;

pub fn register(registry: &mut Registry) {
    registry.add_relationship(
        "age_associated_diseases",
        ["nih_age"],
        AGE_DISEASES,
        age_associated_diseases,
    );
    registry.add_relationship(
        "neurodegenerative",
        ["nih_alz"],
        ["nih_neurodegenerative"],
        neurodegenerative,
    );
    registry.add_relationship(
        "age_health_status",
        ["nih_age"],
        ["nih_health_status"],
        age_health_status,
    );
    registry.add_relationship(
        "weight_sleep_apnea",
        ["nih_weight"],
        ["nih_sleep_apnea"],
        weight_sleep_apnea,
    );
    registry.add_relationship(
        "heart_attack_angina_cholesterol",
        ["nih_heart_attack"],
        ["nih_cholesterol", "nih_coronary_artery_disease_angina"],
        heart_attack_angina_cholesterol,
    );
    registry.add_relationship(
        "pregnancy_prerequisites",
        ["nih_sex", "nih_age"],
        ["nih_pregnancy"],
        pregnancy_prerequisites,
    );
    registry.add_relationship(
        "insomnia_vaping",
        ["nih_vape_freq"],
        ["nih_insomnia"],
        insomnia_vaping,
    );
}

/// Onset curve of an age-progressive disease.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DiseaseCurve {
    /// Below this age the chance is zero.
    pub min_viable_age: f64,
    /// From this age on the chance stays at `max_chance`.
    pub max_viable_age: f64,
    pub min_chance: f64,
    pub max_chance: f64,
}

impl DiseaseCurve {
    pub fn chance(&self, age: f64) -> f64 {
        progress(age, self.min_viable_age, self.max_viable_age)
            .map(|t| lerp(self.min_chance, self.max_chance, t))
            .unwrap_or(0.0)
    }
}

fn age_associated_diseases(
    view: &Record,
    args: &CallArgs,
    rng: &mut dyn RngCore,
) -> Result<Option<Modifications>, UdfError> {
    let config: IndexMap<String, DiseaseCurve> = args.parse(0, "config")?;
    let Some(age) = numeric(view, "nih_age")? else {
        return Ok(None);
    };

    let mut modifications = Modifications::new();
    for disease in AGE_DISEASES {
        let curve = config.get(disease).ok_or_else(|| UdfError::InvalidArgument {
            name: "config".to_string(),
            message: format!("missing onset curve for '{disease}'"),
        })?;
        if rng.random::<f64>() < curve.chance(age) {
            set_named(&mut modifications, disease, "Yes");
        }
    }
    Ok(non_empty(modifications))
}

fn neurodegenerative(
    view: &Record,
    _args: &CallArgs,
    _rng: &mut dyn RngCore,
) -> Result<Option<Modifications>, UdfError> {
    if response(view, "nih_alz")?.name != "Yes" {
        return Ok(None);
    }
    let mut modifications = Modifications::new();
    set_named(&mut modifications, "nih_neurodegenerative", "Yes");
    Ok(Some(modifications))
}

/// Self-reported health weights for an inclusive age bin.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthBin {
    pub start: f64,
    pub end: f64,
    pub data: HealthWeights,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct HealthWeights {
    #[serde(default)]
    pub excellent: f64,
    #[serde(default)]
    pub very_good: f64,
    #[serde(default)]
    pub good: f64,
    #[serde(default)]
    pub fair: f64,
    #[serde(default)]
    pub poor: f64,
}

impl HealthWeights {
    fn as_array(&self) -> [f64; 5] {
        [
            self.excellent,
            self.very_good,
            self.good,
            self.fair,
            self.poor,
        ]
    }
}

/// Overlapping bins add up their weights.
fn binned_weights(bins: &[HealthBin], age: f64) -> [f64; 5] {
    let mut weights = [0.0; 5];
    for bin in bins.iter().filter(|bin| age >= bin.start && age <= bin.end) {
        for (total, weight) in weights.iter_mut().zip(bin.data.as_array()) {
            *total += weight;
        }
    }
    weights
}

fn age_health_status(
    view: &Record,
    args: &CallArgs,
    rng: &mut dyn RngCore,
) -> Result<Option<Modifications>, UdfError> {
    let age_response = response(view, "nih_age")?;
    if age_response.name != "text" {
        return Ok(None);
    }
    let Some(age) = age_response.value.as_f64() else {
        return Ok(None);
    };

    let bins: Vec<HealthBin> = args.parse(0, "binning_config")?;
    let weights = binned_weights(&bins, age);
    let Some(index) = weighted_pick(&weights, rng)? else {
        tracing::debug!(age, "no health status bin covers age");
        return Ok(None);
    };

    let mut modifications = Modifications::new();
    set_named(&mut modifications, "nih_health_status", HEALTH_STATUSES[index]);
    Ok(Some(modifications))
}

fn weight_sleep_apnea(
    view: &Record,
    args: &CallArgs,
    rng: &mut dyn RngCore,
) -> Result<Option<Modifications>, UdfError> {
    let min_weight = args.require_f64(0, "min_viable_weight")?;
    let max_weight = args.require_f64(1, "max_viable_weight")?;
    let min_multiplier = args.require_f64(2, "min_multiplier")?;
    let max_multiplier = args.require_f64(3, "max_multiplier")?;
    let Some(weight) = numeric(view, "nih_weight")? else {
        return Ok(None);
    };

    let multiplier = match progress(weight, min_weight, max_weight) {
        Some(t) => lerp(min_multiplier, max_multiplier, t),
        None => min_multiplier,
    };

    if rng.random::<f64>() >= SLEEP_APNEA_FREQ * multiplier {
        return Ok(None);
    }
    let mut modifications = Modifications::new();
    set_named(&mut modifications, "nih_sleep_apnea", "Yes");
    Ok(Some(modifications))
}

fn heart_attack_angina_cholesterol(
    view: &Record,
    args: &CallArgs,
    rng: &mut dyn RngCore,
) -> Result<Option<Modifications>, UdfError> {
    let risk_multiplier = args.f64_or(0, "risk_multiplier", 1.5)?;
    if response(view, "nih_heart_attack")?.name != "Yes" {
        return Ok(None);
    }

    let mut modifications = Modifications::new();
    if rng.random::<f64>() < CHOLESTEROL_FREQ * risk_multiplier {
        set_named(&mut modifications, "nih_cholesterol", "Yes");
    }
    if rng.random::<f64>() < ANGINA_FREQ * risk_multiplier {
        set_named(&mut modifications, "nih_coronary_artery_disease_angina", "Yes");
    }
    Ok(non_empty(modifications))
}

fn pregnancy_prerequisites(
    view: &Record,
    args: &CallArgs,
    _rng: &mut dyn RngCore,
) -> Result<Option<Modifications>, UdfError> {
    let maximum_viable_age = args.f64_or(0, "maximum_viable_age", 60.0)?;
    let female = response(view, "nih_sex")?.name == "Female";
    let too_old = numeric(view, "nih_age")?.is_some_and(|age| age > maximum_viable_age);

    if female && !too_old {
        return Ok(None);
    }
    let mut modifications = Modifications::new();
    set_named(&mut modifications, "nih_pregnancy", "Not Pregnant");
    Ok(Some(modifications))
}

/// Insomnia multipliers per vaping frequency.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct VapingMultipliers {
    pub rarely: f64,
    pub some_days: f64,
    pub every_day: f64,
}

fn insomnia_vaping(
    view: &Record,
    args: &CallArgs,
    rng: &mut dyn RngCore,
) -> Result<Option<Modifications>, UdfError> {
    let config: VapingMultipliers = args.parse(0, "config")?;
    let multiplier = match response(view, "nih_vape_freq")?.name.as_str() {
        "Rarely" => config.rarely,
        "Some Days" => config.some_days,
        "Every Day" => config.every_day,
        _ => 1.0,
    };

    if rng.random::<f64>() >= INSOMNIA_FREQ * multiplier {
        return Ok(None);
    }
    let mut modifications = Modifications::new();
    set_named(&mut modifications, "nih_insomnia", "Yes");
    Ok(Some(modifications))
}
