use crate::model::FrequencyReport;

/// Render one line per entry.
pub fn render_report(report: &FrequencyReport) -> String {
    let mut lines = Vec::with_capacity(report.entries.len());
    for entry in &report.entries {
        lines.push(format!(
            "{}={} appears at a {}% frequency ({} occurrences)",
            entry.variable, entry.value, entry.percent, entry.count
        ));
    }
    lines.join("\n")
}

/// Render a markdown table, as written next to generated datasets.
pub fn render_markdown(report: &FrequencyReport) -> String {
    let mut lines = Vec::new();
    lines.push("# Frequency Report".to_string());
    lines.push(String::new());
    lines.push(format!("- rows: {}", report.rows));
    lines.push(String::new());
    lines.push("| variable | value | count | percent |".to_string());
    lines.push("| --- | --- | --- | --- |".to_string());
    for entry in &report.entries {
        lines.push(format!(
            "| {} | {} | {} | {} |",
            entry.variable, entry.value, entry.count, entry.percent
        ));
    }
    lines.push(String::new());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FrequencyEntry;

    #[test]
    fn renders_one_line_per_entry() {
        let report = FrequencyReport {
            rows: 4,
            entries: vec![FrequencyEntry {
                variable: "consent_given".to_string(),
                value: "1".to_string(),
                count: 3,
                percent: 75.0,
            }],
        };
        assert_eq!(
            render_report(&report),
            "consent_given=1 appears at a 75% frequency (3 occurrences)"
        );
        assert!(render_markdown(&report).contains("| consent_given | 1 | 3 | 75 |"));
    }
}
