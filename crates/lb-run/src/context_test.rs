use super::*;
use lb_core::CoreError;
use tempfile::TempDir;

fn project(config: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("lightbuild.yml"), config).unwrap();
    std::fs::create_dir_all(dir.path().join("models")).unwrap();
    dir
}

const MEMORY_PROJECT: &str = "name: shop\nadapter: duckdb\nconnection:\n  path: \":memory:\"\n";

#[test]
fn test_load_missing_project_dir() {
    let err = Context::load(Path::new("/definitely/not/here")).unwrap_err();
    assert!(matches!(
        err,
        crate::RunError::Core(CoreError::ProjectNotFound { .. })
    ));
}

#[test]
fn test_load_missing_config() {
    let dir = TempDir::new().unwrap();
    let err = Context::load(dir.path()).unwrap_err();
    assert!(err.is_config_error());
}

#[test]
fn test_load_missing_adapter() {
    let dir = project("name: shop\n");
    let err = Context::load(dir.path()).unwrap_err();
    assert!(err.is_config_error());
    assert!(err.to_string().contains("adapter"));
}

#[test]
fn test_load_unknown_adapter() {
    let dir = project("name: shop\nadapter: snowflake\n");
    let err = Context::load(dir.path()).unwrap_err();
    assert!(err.is_config_error());
    assert!(err.to_string().contains("snowflake"));
    assert!(err.to_string().contains("duckdb"));
}

#[test]
fn test_load_missing_connection_setting() {
    let dir = project("name: shop\nadapter: duckdb\nconnection:\n  schema: analytics\n");
    let err = Context::load(dir.path()).unwrap_err();
    assert!(err.is_config_error());
    assert!(err.to_string().contains("path"));
}

#[test]
fn test_load_models_and_schema() {
    let dir = project(
        "name: shop\nadapter: DuckDB\nconnection:\n  path: \":memory:\"\n  schema: analytics\n",
    );
    std::fs::write(dir.path().join("models/b.sql"), "SELECT 2 AS id").unwrap();
    std::fs::write(dir.path().join("models/a.sql"), "SELECT 1 AS id").unwrap();

    let ctx = Context::load(dir.path()).unwrap();
    assert_eq!(ctx.adapter_name(), "duckdb");
    assert_eq!(ctx.schema(), "analytics");
    let names: Vec<_> = ctx.models().iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert!(ctx.model("b").is_some());
    assert_eq!(ctx.relation("a"), "\"analytics\".\"a\"");
    assert!(ctx.schemas_context().is_empty());
}

#[tokio::test]
async fn test_connect_and_introspect() {
    let dir = project(
        "name: shop\nadapter: duckdb\nconnection:\n  path: \":memory:\"\n  schema: analytics\n",
    );
    let ctx = Context::load(dir.path()).unwrap();
    let conn = ctx.connect().await.unwrap();

    conn.execute("CREATE TABLE orders (id INTEGER, note VARCHAR)", &[])
        .await
        .unwrap();
    conn.execute("CREATE VIEW recent AS SELECT id FROM orders", &[])
        .await
        .unwrap();

    let snapshot = ctx.introspect(&conn).await.unwrap();
    let orders = snapshot
        .schemas_context()
        .relation("analytics", "orders")
        .unwrap();
    assert_eq!(orders.kind, RelationKind::Table);
    let cols: Vec<_> = orders
        .columns
        .iter()
        .map(|c| (c.name.as_str(), c.data_type.as_str()))
        .collect();
    assert_eq!(cols, vec![("id", "INTEGER"), ("note", "VARCHAR")]);

    let recent = snapshot
        .schemas_context()
        .relation("analytics", "recent")
        .unwrap();
    assert_eq!(recent.kind, RelationKind::View);

    // The original context keeps its own snapshot
    assert!(ctx.schemas_context().is_empty());
}

#[tokio::test]
async fn test_connect_memory_project() {
    let dir = project(MEMORY_PROJECT);
    let ctx = Context::load(dir.path()).unwrap();
    let conn = ctx.connect().await.unwrap();
    let rows = conn.query("SELECT current_schema()", &[]).await.unwrap();
    assert_eq!(rows.scalar(), Some(&serde_json::json!("main")));
}
