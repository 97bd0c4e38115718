use std::path::Path;

use indexmap::IndexMap;

use cdesynth_core::ResponseValue;

use crate::errors::EvalError;
use crate::model::{DatasetCounts, FieldSelector, FrequencyEntry, FrequencyReport};

/// Count cell values of a CSV dataset with a header row.
pub fn count_csv(path: &Path) -> Result<DatasetCounts, EvalError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if header.is_empty() {
        return Err(EvalError::InvalidDataset(format!(
            "{} has no header row",
            path.display()
        )));
    }

    let mut counts = DatasetCounts::with_header(&header);
    for record in reader.records() {
        let record = record?;
        counts.add_row(
            header
                .iter()
                .map(String::as_str)
                .zip(record.iter().map(str::to_string)),
        );
    }

    tracing::debug!(
        path = %path.display(),
        rows = counts.rows,
        columns = header.len(),
        "dataset counted"
    );
    Ok(counts)
}

/// Count cell values of in-memory rows, rendered the way the CSV writer
/// renders them.
pub fn count_rows(header: &[String], rows: &[IndexMap<String, ResponseValue>]) -> DatasetCounts {
    let mut counts = DatasetCounts::with_header(header);
    for row in rows {
        counts.add_row(header.iter().map(|variable| {
            let cell = row.get(variable).map(ResponseValue::to_csv).unwrap_or_default();
            (variable.as_str(), cell)
        }));
    }
    counts
}

/// Percentage of `count` over `rows`, rounded up to two decimals.
pub fn percent(count: u64, rows: u64) -> f64 {
    if rows == 0 {
        return 0.0;
    }
    (count as f64 / rows as f64 * 10_000.0).ceil() / 100.0
}

/// Observed frequencies for the selected fields.
///
/// A bare variable expands to every value seen for it, in first-seen order.
pub fn frequencies(
    counts: &DatasetCounts,
    selectors: &[FieldSelector],
) -> Result<FrequencyReport, EvalError> {
    if counts.rows == 0 {
        return Err(EvalError::InvalidDataset("dataset has no rows".to_string()));
    }

    let mut entries = Vec::new();
    for selector in selectors {
        let values = counts
            .columns
            .get(&selector.variable)
            .ok_or_else(|| EvalError::UnknownVariable(selector.variable.clone()))?;

        let mut push = |value: &str, count: u64| {
            entries.push(FrequencyEntry {
                variable: selector.variable.clone(),
                value: value.to_string(),
                count,
                percent: percent(count, counts.rows),
            });
        };

        match &selector.value {
            Some(value) => push(value, values.get(value).copied().unwrap_or(0)),
            None => {
                for (value, count) in values {
                    push(value, *count);
                }
            }
        }
    }

    Ok(FrequencyReport {
        rows: counts.rows,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts() -> DatasetCounts {
        let header = vec!["consent_given".to_string(), "nih_age".to_string()];
        let rows: Vec<IndexMap<String, ResponseValue>> = [(1, 30), (1, 40), (0, 30)]
            .into_iter()
            .map(|(consent, age)| {
                let mut row = IndexMap::new();
                row.insert("consent_given".to_string(), ResponseValue::Int(consent));
                row.insert("nih_age".to_string(), ResponseValue::Int(age));
                row
            })
            .collect();
        count_rows(&header, &rows)
    }

    #[test]
    fn percent_rounds_up() {
        assert_eq!(percent(1, 3), 33.34);
        assert_eq!(percent(2, 4), 50.0);
        assert_eq!(percent(0, 10), 0.0);
    }

    #[test]
    fn bare_variable_expands_to_observed_values() {
        let report = frequencies(&counts(), &["consent_given".parse().unwrap()]).unwrap();
        let pairs: Vec<(&str, u64)> = report
            .entries
            .iter()
            .map(|entry| (entry.value.as_str(), entry.count))
            .collect();
        assert_eq!(pairs, vec![("1", 2), ("0", 1)]);
        assert_eq!(report.entries[0].percent, 66.67);
    }

    #[test]
    fn unseen_value_counts_zero() {
        let report = frequencies(&counts(), &["nih_age=99".parse().unwrap()]).unwrap();
        assert_eq!(report.entries[0].count, 0);
        assert_eq!(report.entries[0].percent, 0.0);
    }

    #[test]
    fn unknown_variable_is_rejected() {
        let err = frequencies(&counts(), &["missing".parse().unwrap()]).unwrap_err();
        assert!(matches!(err, EvalError::UnknownVariable(name) if name == "missing"));
    }

    #[test]
    fn selector_requires_variable() {
        assert!("=1".parse::<FieldSelector>().is_err());
        let selector: FieldSelector = "consent_zip=Skip Logic".parse().unwrap();
        assert_eq!(selector.value.as_deref(), Some("Skip Logic"));
    }
}
