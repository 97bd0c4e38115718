use indexmap::IndexMap;
use rand::{Rng, RngCore};
use serde::Deserialize;

use cdesynth_core::{Modifications, Record};
use cdesynth_plan::{CallArgs, Registry, UdfError};

use super::{non_empty, set_named, weighted_pick};

const SYMPTOMS: &[&str] = &[
    "nih_skin_rash",
    "nih_conjunctivitis",
    "nih_red_eyes",
    "nih_high_temp",
    "nih_no_sympt",
    "nih_blue_lips",
    "nih_balance",
    "nih_slurred_peech",
    "nih_neuro_shakes",
    "nih_numb_extremities",
    "nih_sweating",
    "nih_seizures",
    "nih_rash_toes",
    "nih_cough",
    "nih_fever_chills",
    "nih_diff_breath",
    "nih_headache",
    "nih_muscle_ache",
    "nih_olfactory",
    "nih_fatigue",
    "nih_nausea_vomiting_diarrhea",
    "nih_abdom_pain",
    "nih_throat_congestion_nose",
    "nih_other_symp",
    "nih_wheezing",
    "nih_confusion",
    "nih_appetite",
];

/// Response-name frequencies per symptom variable.
pub type SymptomWeights = IndexMap<String, IndexMap<String, f64>>;

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    /// Chance that a record has covid at all.
    pub covid_freq: f64,
    /// Defaults shared by every cluster.
    #[serde(default)]
    pub global_symptoms: SymptomWeights,
    pub cluster_symptoms: Vec<SymptomCluster>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SymptomCluster {
    pub frequency: f64,
    #[serde(default)]
    pub symptoms: SymptomWeights,
}

impl ClusterConfig {
    /// Symptoms of a cluster layered over the global defaults.
    fn symptoms_of(&self, cluster: &SymptomCluster) -> SymptomWeights {
        let mut merged = self.global_symptoms.clone();
        for (variable, responses) in &cluster.symptoms {
            merged.insert(variable.clone(), responses.clone());
        }
        merged
    }
}

pub fn register(registry: &mut Registry) {
    registry.add_relationship(
        "covid_symptom_clustering",
        Vec::<String>::new(),
        SYMPTOMS.iter().copied(),
        covid_symptom_clustering,
    );
}

/// Picks a symptom cluster for records with covid and draws each symptom's
/// response from it. Weight left over below 1.0 keeps the drawn response.
fn covid_symptom_clustering(
    _view: &Record,
    args: &CallArgs,
    rng: &mut dyn RngCore,
) -> Result<Option<Modifications>, UdfError> {
    let config: ClusterConfig = args.parse(0, "clusters_config")?;
    if rng.random::<f64>() >= config.covid_freq {
        return Ok(None);
    }

    let cluster_weights: Vec<f64> = config
        .cluster_symptoms
        .iter()
        .map(|cluster| cluster.frequency)
        .collect();
    let Some(index) = weighted_pick(&cluster_weights, rng)? else {
        return Ok(None);
    };
    let cluster = &config.cluster_symptoms[index];

    let mut modifications = Modifications::new();
    for (variable, responses) in config.symptoms_of(cluster) {
        let mut names: Vec<&str> = responses.keys().map(String::as_str).collect();
        let mut weights: Vec<f64> = responses.values().copied().collect();
        let used: f64 = weights.iter().sum();
        names.push("");
        weights.push((1.0 - used).max(0.0));

        if let Some(choice) = weighted_pick(&weights, rng)? {
            if choice < responses.len() {
                set_named(&mut modifications, &variable, names[choice]);
            }
        }
    }
    Ok(non_empty(modifications))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdesynth_core::Modification;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use serde_json::json;

    fn args(covid_freq: f64) -> CallArgs {
        CallArgs::positional(vec![json!({
            "covid_freq": covid_freq,
            "global_symptoms": {
                "nih_cough": {"Yes": 1.0},
                "nih_fatigue": {"Yes": 0.0}
            },
            "cluster_symptoms": [
                {"frequency": 1.0, "symptoms": {"nih_fatigue": {"Yes": 1.0}}}
            ]
        })])
    }

    #[test]
    fn no_covid_means_no_change() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let result = covid_symptom_clustering(&Record::new(), &args(0.0), &mut rng).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn cluster_overrides_global_symptoms() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let modifications = covid_symptom_clustering(&Record::new(), &args(1.0), &mut rng)
            .unwrap()
            .unwrap();
        assert_eq!(modifications.get("nih_cough"), Some(&Modification::named("Yes")));
        assert_eq!(
            modifications.get("nih_fatigue"),
            Some(&Modification::named("Yes"))
        );
    }

    #[test]
    fn registered_without_dependencies() {
        let mut registry = Registry::new();
        register(&mut registry);
        let relationship = registry.relationship("covid_symptom_clustering").unwrap();
        assert!(relationship.is_independent());
        assert_eq!(relationship.modifies.len(), SYMPTOMS.len());
    }
}
