use std::fs;
use std::path::PathBuf;

use cdesynth_eval::{EvalError, FieldSelector, count_csv, frequencies, render_report};

fn temp_csv(contents: &str) -> (PathBuf, PathBuf) {
    let dir = std::env::temp_dir().join(format!("cdesynth_eval_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create temp dir");
    let path = dir.join("synthetic.csv");
    fs::write(&path, contents).expect("write csv");
    (dir, path)
}

fn selectors(raw: &[&str]) -> Vec<FieldSelector> {
    raw.iter()
        .map(|value| value.parse().expect("parse selector"))
        .collect()
}

#[test]
fn counts_values_from_csv() {
    let (dir, path) = temp_csv(
        "consent_given,consent_zip\n1,02134\n1,Skip Logic\n0,Skip Logic\n0,Skip Logic\n",
    );

    let counts = count_csv(&path).expect("count csv");
    assert_eq!(counts.rows, 4);
    assert_eq!(counts.count("consent_zip", "Skip Logic"), Some(3));
    assert_eq!(counts.count("consent_zip", "99999"), Some(0));
    assert_eq!(counts.count("missing", "1"), None);

    let report = frequencies(&counts, &selectors(&["consent_zip=Skip Logic", "consent_given"]))
        .expect("frequencies");
    let rendered = render_report(&report);
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(
        lines,
        vec![
            "consent_zip=Skip Logic appears at a 75% frequency (3 occurrences)",
            "consent_given=1 appears at a 50% frequency (2 occurrences)",
            "consent_given=0 appears at a 50% frequency (2 occurrences)",
        ]
    );

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn header_only_dataset_is_invalid() {
    let (dir, path) = temp_csv("consent_given\n");

    let counts = count_csv(&path).expect("count csv");
    let err = frequencies(&counts, &selectors(&["consent_given"])).unwrap_err();
    assert!(matches!(err, EvalError::InvalidDataset(_)));

    fs::remove_dir_all(&dir).ok();
}
