use super::*;
use crate::config::ProjectConfig;
use std::fs;
use tempfile::TempDir;

fn project_config() -> ProjectConfig {
    serde_yaml::from_str("name: shop\nadapter: duckdb\n").unwrap()
}

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_model_without_yaml_defaults_to_view() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "models/stg_orders.sql", "select 1 as id");

    let model = Model::from_file(dir.path().join("models/stg_orders.sql")).unwrap();
    assert_eq!(model.name, "stg_orders");
    assert_eq!(model.materialization, Materialization::View);
    assert!(model.unique_key.is_empty());
    assert!(!model.has_tests());
}

#[test]
fn test_model_with_yaml() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "models/orders.sql", "select 1 as order_id");
    write(
        dir.path(),
        "models/orders.yml",
        r#"
description: Orders fact
materialized: incremental
unique_key: order_id
start_field: created_at
columns:
  order_id: [not_null, unique]
"#,
    );

    let model = Model::from_file(dir.path().join("models/orders.sql")).unwrap();
    assert_eq!(model.materialization, Materialization::Incremental);
    assert_eq!(model.unique_key, vec!["order_id".to_string()]);
    assert_eq!(model.start_field.as_deref(), Some("created_at"));
    assert_eq!(model.description.as_deref(), Some("Orders fact"));
    assert_eq!(model.column_tests.len(), 2);
}

#[test]
fn test_unique_key_list_and_comma_forms() {
    let one: ModelSchema = serde_yaml::from_str("unique_key: \"a, b\"").unwrap();
    let many: ModelSchema = serde_yaml::from_str("unique_key: [a, b]").unwrap();

    assert_eq!(
        one.unique_key.unwrap().into_columns(),
        vec!["a".to_string(), "b".to_string()]
    );
    assert_eq!(
        many.unique_key.unwrap().into_columns(),
        vec!["a".to_string(), "b".to_string()]
    );
}

#[test]
fn test_incremental_without_unique_key_is_config_error() {
    let model = Model::new("orders", "select 1").materialized(Materialization::Incremental);
    let err = model.validate().unwrap_err();
    assert!(err.is_config_error());
    assert!(err.to_string().contains("unique_key"));
}

#[test]
fn test_empty_body_rejected() {
    let err = Model::new("orders", "  \n").validate().unwrap_err();
    assert!(matches!(err, CoreError::ModelParseError { .. }));
}

#[test]
fn test_unknown_yaml_key_rejected() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "models/orders.sql", "select 1");
    write(dir.path(), "models/orders.yml", "materialised: table\n");

    let err = Model::from_file(dir.path().join("models/orders.sql")).unwrap_err();
    assert!(matches!(err, CoreError::SchemaParse { .. }));
}

#[test]
fn test_load_models_declaration_order() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "models/b_model.sql", "select 1");
    write(dir.path(), "models/a_model.sql", "select 1");
    write(dir.path(), "models/staging/c_model.sql", "select 1");
    write(dir.path(), "models/notes.md", "not a model");

    let models = load_models(dir.path(), &project_config()).unwrap();
    let names: Vec<_> = models.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["a_model", "b_model", "c_model"]);
}

#[test]
fn test_load_models_duplicate_name() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "models/orders.sql", "select 1");
    write(dir.path(), "models/marts/orders.sql", "select 2");

    let err = load_models(dir.path(), &project_config()).unwrap_err();
    assert!(matches!(err, CoreError::DuplicateModel { .. }));
}

#[test]
fn test_load_models_missing_dir_is_empty() {
    let dir = TempDir::new().unwrap();
    let models = load_models(dir.path(), &project_config()).unwrap();
    assert!(models.is_empty());
}

#[test]
fn test_builder() {
    let model = Model::new("orders", "select 1 as id")
        .materialized(Materialization::Table)
        .with_unique_key(["id"])
        .with_test("id", TestSpec::bare("not_null"))
        .with_start_field("created_at");

    assert_eq!(model.materialization, Materialization::Table);
    assert_eq!(model.unique_key, vec!["id".to_string()]);
    assert!(model.has_tests());
    assert!(model.validate().is_ok());
}
