use super::*;
use tempfile::TempDir;

#[test]
fn test_parse_minimal_config() {
    let yaml = r#"
name: test_project
adapter: duckdb
"#;
    let config: ProjectConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.name, "test_project");
    assert_eq!(config.adapter_name(), "duckdb");
    assert_eq!(config.on_test_fail, OnTestFail::Error);

    let root = PathBuf::from("/tmp/test");
    assert_eq!(
        config.model_paths_absolute(&root),
        vec![root.join("models")]
    );
    assert_eq!(config.seed_paths_absolute(&root), vec![root.join("seeds")]);
    assert_eq!(
        config.template_paths_absolute(&root),
        vec![root.join("templates")]
    );
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
name: shop
adapter: duckdb
connection:
  path: ./warehouse.duckdb
  schema: analytics
  threads: 4
vars:
  start_date: "2024-01-01"
model_paths: [models, marts]
on_test_fail: error_with_rollback
"#;
    let config: ProjectConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(
        config.connection.get("path").as_deref(),
        Some("./warehouse.duckdb")
    );
    assert_eq!(config.connection.schema(), "analytics");
    assert_eq!(config.connection.get("threads").as_deref(), Some("4"));
    assert_eq!(config.model_paths.len(), 2);
    assert_eq!(config.on_test_fail, OnTestFail::ErrorWithRollback);
    assert!(config.get_var("start_date").is_some());
}

#[test]
fn test_connection_schema_default() {
    let params = ConnectionParams::from_pairs([("path", ":memory:")]);
    assert_eq!(params.schema(), DEFAULT_SCHEMA);
    assert!(params.contains("path"));
    assert!(!params.contains("schema"));
}

#[test]
fn test_unknown_key_rejected() {
    let yaml = "name: test\nadapter: duckdb\nmaterialisation: table\n";
    assert!(serde_yaml::from_str::<ProjectConfig>(yaml).is_err());
}

#[test]
fn test_load_missing_adapter_is_config_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("lightbuild.yml"), "name: test\n").unwrap();

    let err = ProjectConfig::load_from_dir(dir.path()).unwrap_err();
    assert!(err.is_config_error());
    assert!(err.to_string().contains("adapter"));
}

#[test]
fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = ProjectConfig::load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, CoreError::ConfigNotFound { .. }));
}

#[test]
fn test_load_yaml_extension() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("lightbuild.yaml"),
        "name: test\nadapter: duckdb\n",
    )
    .unwrap();

    let config = ProjectConfig::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.name, "test");
}

#[test]
fn test_load_malformed_yaml() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("lightbuild.yml"), "name: [unclosed\n").unwrap();

    let err = ProjectConfig::load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, CoreError::ConfigParseError { .. }));
}

#[test]
fn test_materialization_display() {
    assert_eq!(Materialization::Incremental.to_string(), "incremental");
    assert!(!Materialization::Ephemeral.is_physical());
    assert!(Materialization::View.is_physical());
}
