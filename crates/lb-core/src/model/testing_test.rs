use super::*;

fn parse_columns(yaml: &str) -> Result<ColumnTests, String> {
    let mapping: serde_yaml::Mapping = serde_yaml::from_str(yaml).unwrap();
    ColumnTests::from_yaml(&mapping)
}

#[test]
fn test_parse_bare_and_parameterized() {
    let tests = parse_columns(
        r#"
order_id: [not_null, unique]
status:
  - accepted_values:
      values: [open, closed]
      quote: true
"#,
    )
    .unwrap();

    let pairs: Vec<_> = tests.pairs().map(|(c, s)| (c, s.name())).collect();
    assert_eq!(
        pairs,
        vec![
            ("order_id", "not_null"),
            ("order_id", "unique"),
            ("status", "accepted_values"),
        ]
    );

    let (_, spec) = tests.pairs().nth(2).unwrap();
    let params = spec.params().unwrap();
    assert_eq!(params["values"], serde_json::json!(["open", "closed"]));
    assert_eq!(params["quote"], serde_json::json!(true));
}

#[test]
fn test_column_order_is_declaration_order() {
    let tests = parse_columns("zeta: [not_null]\nalpha: [not_null]\n").unwrap();
    let columns: Vec<_> = tests.columns().collect();
    assert_eq!(columns, vec!["zeta", "alpha"]);
}

#[test]
fn test_parameterized_without_params() {
    let spec = TestSpec::from_yaml(&serde_yaml::from_str("positive:").unwrap()).unwrap();
    assert_eq!(spec, TestSpec::Parameterized("positive".into(), TestParams::new()));
}

#[test]
fn test_multi_key_mapping_rejected() {
    let err = parse_columns("id:\n  - {unique: {}, not_null: {}}\n").unwrap_err();
    assert!(err.contains("exactly one key"));
    assert!(err.contains("column 'id'"));
}

#[test]
fn test_scalar_tests_rejected() {
    assert!(parse_columns("id: not_null\n").is_err());
}

#[test]
fn test_null_column_has_no_tests() {
    let tests = parse_columns("id:\n").unwrap();
    assert!(tests.is_empty());
}

#[test]
fn test_push_groups_by_column() {
    let mut tests = ColumnTests::new();
    tests.push("id", TestSpec::bare("not_null"));
    tests.push("name", TestSpec::bare("not_null"));
    tests.push("id", TestSpec::bare("unique"));

    assert_eq!(tests.len(), 3);
    assert_eq!(tests.columns().collect::<Vec<_>>(), vec!["id", "name"]);
}

#[test]
fn test_reserved_parameter_rejected() {
    let err = parse_columns("id:\n  - accepted_values: {column: status, values: [1]}\n").unwrap_err();
    assert!(err.contains("parameter 'column'"), "{err}");
    assert!(err.contains("reserved"), "{err}");
}
