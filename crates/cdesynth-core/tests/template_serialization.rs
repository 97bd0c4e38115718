use cdesynth_core::{ResponseCandidate, ResponseValue, Template};

#[test]
fn serializes_candidates_deterministically() {
    let candidate = ResponseCandidate::new("Skip Logic", ResponseValue::Int(-1), Some(0.0));

    let json = serde_json::to_string_pretty(&candidate).expect("serialize candidate");
    let expected = r#"{
  "response_name": "Skip Logic",
  "response_value": -1,
  "frequency": 0.0
}"#;
    assert_eq!(json, expected);
}

#[test]
fn yaml_round_trip_keeps_variable_order() {
    let yaml = r#"
row_count: 3
variables:
  zeta:
    - response_name: "A"
      response_value: 1
      frequency: 1.0
  alpha:
    - response_name: "B"
      response_value: "b"
      frequency: 1.0
"#;
    let template = Template::from_yaml_str(yaml).expect("parse template");
    let rendered = serde_yaml::to_string(&template).expect("render template");
    let reparsed = Template::from_yaml_str(&rendered).expect("reparse template");

    assert_eq!(reparsed.header(), vec!["zeta", "alpha"]);
    assert_eq!(
        reparsed.responses("alpha").unwrap()[0].response_value,
        ResponseValue::Text("b".to_string())
    );
}
