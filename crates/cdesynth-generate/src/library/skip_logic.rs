use rand::RngCore;

use cdesynth_core::{Modifications, Record};
use cdesynth_plan::{CallArgs, Registry, RelationshipDescriptor, UdfError};

use super::{SKIP_LOGIC, non_empty, response, set_named};

#[derive(Debug, Clone, Copy)]
enum Trigger {
    Is(&'static str),
    IsNot(&'static str),
}

impl Trigger {
    fn fires(self, response_name: &str) -> bool {
        match self {
            Trigger::Is(expected) => response_name == expected,
            Trigger::IsNot(expected) => response_name != expected,
        }
    }
}

#[derive(Debug)]
struct Branch {
    trigger: Trigger,
    targets: &'static [&'static str],
    response: &'static str,
}

/// Follow-up questions whose answer is fixed by a gate question's answer.
///
/// Every branch whose trigger fires contributes its targets.
#[derive(Debug)]
pub struct GateRule {
    pub name: &'static str,
    pub variable: &'static str,
    also_reads: &'static [&'static str],
    branches: &'static [Branch],
}

impl GateRule {
    const fn new(name: &'static str, variable: &'static str, branches: &'static [Branch]) -> Self {
        Self {
            name,
            variable,
            also_reads: &[],
            branches,
        }
    }

    /// Declare extra dependencies the gate is planned after.
    const fn reading(self, variables: &'static [&'static str]) -> Self {
        Self {
            also_reads: variables,
            ..self
        }
    }

    pub fn dependencies(&self) -> Vec<&'static str> {
        let mut dependencies = self.also_reads.to_vec();
        if !dependencies.contains(&self.variable) {
            dependencies.push(self.variable);
        }
        dependencies
    }

    /// Every variable any branch can set.
    pub fn targets(&self) -> Vec<&'static str> {
        let mut targets = Vec::new();
        for branch in self.branches {
            for target in branch.targets {
                if !targets.contains(target) {
                    targets.push(*target);
                }
            }
        }
        targets
    }

    fn apply(&self, view: &Record) -> Result<Option<Modifications>, UdfError> {
        let gate = response(view, self.variable)?;
        let mut modifications = Modifications::new();
        for branch in self
            .branches
            .iter()
            .filter(|branch| branch.trigger.fires(&gate.name))
        {
            for target in branch.targets {
                set_named(&mut modifications, target, branch.response);
            }
        }
        Ok(non_empty(modifications))
    }
}

const fn skip(trigger: Trigger, targets: &'static [&'static str]) -> Branch {
    Branch {
        trigger,
        targets,
        response: SKIP_LOGIC,
    }
}

const fn set(trigger: Trigger, targets: &'static [&'static str], response: &'static str) -> Branch {
    Branch {
        trigger,
        targets,
        response,
    }
}

pub const RULES: &[GateRule] = &[
    GateRule::new(
        "no_disability",
        "nih_disability",
        &[skip(
            Trigger::Is("No"),
            &[
                "nih_deaf",
                "nih_blind",
                "nih_memory",
                "nih_walk_climb",
                "nih_dress_bathe",
                "nih_errand",
            ],
        )],
    ),
    GateRule::new(
        "no_smoking",
        "nih_smoking_yn",
        &[skip(
            Trigger::Is("No"),
            &[
                "nih_vaping_yn",
                "nih_nicotine_yn",
                "nih_vape_freq",
                "nih_cig_smoke_freq",
            ],
        )],
    ),
    GateRule::new(
        "no_alcohol",
        "nih_alcohol_yn",
        &[skip(
            Trigger::Is("No"),
            &[
                "nih_lifetime_use_alcohol",
                "nih_alcohol_yrs",
                "nih_alcohol_frequency",
            ],
        )],
    ),
    GateRule::new(
        "no_cancer",
        "nih_cancer",
        &[skip(
            Trigger::Is("No"),
            &["nih_cancer_active_treatment", "nih_cancer_past_yr"],
        )],
    ),
    GateRule::new(
        "no_chronic_kidney_disease",
        "nih_chronic_kidney_disease",
        &[skip(
            Trigger::Is("No"),
            &["nih_chronic_kidney_disease_treatment"],
        )],
    ),
    GateRule::new(
        "gestational_diabetes",
        "nih_pregnancy",
        &[skip(Trigger::IsNot("Pregnant"), &["nih_gestational_diabetes"])],
    ),
    GateRule::new(
        "diabetes_types",
        "nih_t1d",
        &[skip(Trigger::Is("Yes"), &["nih_t2dm"])],
    ),
    GateRule::new(
        "no_consent",
        "consent_given",
        &[skip(
            Trigger::Is("No"),
            &[
                "consent_mdy",
                "consent_ident",
                "consent_zip",
                "consent_recontact",
            ],
        )],
    ),
    GateRule::new(
        "positive_covid",
        "tested_for_covid",
        &[skip(
            Trigger::Is("0"),
            &[
                "tested_positive_for_covid",
                "positivemonth_covidtest_2",
                "positiveyear_covidtest_3",
                "recentmonth_covidtest_2",
                "recentyear_covidtest_3",
                "recentresult_covidtest",
                "cov_tst_mthd_2",
            ],
        )],
    ),
    GateRule::new(
        "self_reported_height_coded",
        "self_reported_height_coded",
        &[
            skip(Trigger::Is("2"), &["height_feet", "height_inches"]),
            skip(Trigger::Is("1"), &["height_meters", "height_centimeters"]),
        ],
    ),
    GateRule::new(
        "self_reported_weight_units",
        "self_reported_weight_units",
        &[
            skip(Trigger::Is("1"), &["self_reported_weight_lbs"]),
            skip(Trigger::Is("2"), &["self_reported_weight_kgs"]),
        ],
    ),
    GateRule::new(
        "vaccine_acceptance",
        "flu_vaccinehistind_2",
        &[skip(Trigger::IsNot("1"), &["flu_vaccine_season_3"])],
    ),
    GateRule::new(
        "race_ethn_race",
        "race_ethn_race",
        &[
            set(Trigger::Is("1"), &["race_ethn_asian_detail_2"], "3"),
            set(Trigger::Is("1"), &["race_ethn_hispanic"], "15"),
        ],
    ),
    GateRule::new(
        "race_ethn_race_islander",
        "race_ethn_race_islander",
        &[set(Trigger::Is("1"), &["race_ethn_islander_detail_2"], "4")],
    )
    .reading(&["race_ethn_race"]),
    GateRule::new(
        "bio_sex_birth_2",
        "bio_sex_birth_2",
        &[set(Trigger::Is("1"), &["pregnancy_status"], "0")],
    ),
    GateRule::new(
        "household_famgen_3",
        "household_famgen_3",
        &[set(Trigger::Is("90"), &["household_homeless"], "1")],
    ),
    GateRule::new(
        "household_homeless",
        "household_homeless",
        &[set(Trigger::Is("1"), &["household_congregate_3"], "1")],
    ),
    GateRule::new(
        "household_congregate_3",
        "household_congregate_3",
        &[set(Trigger::Is("90"), &["household_other"], "1")],
    ),
    GateRule::new(
        "current_employment_status",
        "current_employment_status",
        &[
            set(
                Trigger::Is("1"),
                &["employed_ew", "employed_healthcare_2"],
                "1",
            ),
            set(Trigger::Is("96"), &["cur_employ_stat_specify"], "9"),
        ],
    ),
    GateRule::new(
        "language_pref",
        "language_pref",
        &[set(Trigger::Is("90"), &["language_pref_other"], "9")],
    ),
];

pub fn register(registry: &mut Registry) {
    for rule in RULES {
        let descriptor = RelationshipDescriptor::new(
            rule.name,
            move |view: &Record, _args: &CallArgs, _rng: &mut dyn RngCore| rule.apply(view),
        )
        .depends_on(rule.dependencies())
        .modifies(rule.targets());
        registry.register_relationship(descriptor);
    }
}
