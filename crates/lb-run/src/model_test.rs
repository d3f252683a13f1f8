use super::*;
use lb_core::TestSpec;
use lb_db::DuckDbBackend;
use serde_json::json;
use std::sync::Arc;

fn connection(renderer: &Arc<TemplateRenderer>) -> DatabaseConnection {
    DatabaseConnection::new(
        Box::new(DuckDbBackend::in_memory().unwrap()),
        Arc::clone(renderer),
    )
}

const RELATION: &str = "\"main\".\"orders\"";

#[test]
fn test_strategy_choice() {
    use Materialization::*;
    assert_eq!(Strategy::choose(Table, false, true), Strategy::Init);
    assert_eq!(Strategy::choose(Incremental, false, false), Strategy::Init);
    assert_eq!(Strategy::choose(Incremental, true, true), Strategy::Init);
    assert_eq!(
        Strategy::choose(Incremental, false, true),
        Strategy::Incremental
    );
    assert_eq!(Strategy::choose(View, true, true), Strategy::View);
    assert_eq!(Strategy::choose(Ephemeral, false, false), Strategy::Ephemeral);
}

#[test]
fn test_state_transitions() {
    use ModelState::*;
    assert!(Pending.can_become(Rendered));
    assert!(Materialized.can_become(Done));
    assert!(Tested.can_become(Failed));
    assert!(!Pending.can_become(Materialized));
    assert!(!Done.can_become(Failed));
    assert!(!Pending.can_become(Failed));
}

#[test]
fn test_render_inlines_ephemerals() {
    let renderer = TemplateRenderer::builtin("duckdb");
    let model = Model::new("orders", "SELECT * FROM stg");
    let snapshot = SchemaMap::new();
    let mut compiled = CompiledModel::new(&model, "main", RELATION.to_string(), &snapshot, false);

    let sql = compiled
        .render(&renderer, &[("stg".to_string(), "SELECT 1 AS id".to_string())])
        .unwrap()
        .to_string();
    assert!(sql.starts_with("WITH stg AS"));
    assert_eq!(compiled.state(), ModelState::Rendered);
}

#[test]
fn test_render_error_names_model() {
    let renderer = TemplateRenderer::builtin("duckdb");
    let model = Model::new("orders", "SELECT {{ error('nope') }}");
    let snapshot = SchemaMap::new();
    let mut compiled = CompiledModel::new(&model, "main", RELATION.to_string(), &snapshot, false);

    let err = compiled.render(&renderer, &[]).unwrap_err();
    assert!(matches!(err, RunError::Render { ref model, .. } if model == "orders"));
    assert_eq!(compiled.state(), ModelState::Pending);
}

#[tokio::test]
async fn test_materialize_out_of_order() {
    let renderer = Arc::new(TemplateRenderer::builtin("duckdb"));
    let conn = connection(&renderer);
    let model = Model::new("orders", "SELECT 1 AS id").materialized(Materialization::Table);
    let snapshot = SchemaMap::new();
    let mut compiled = CompiledModel::new(&model, "main", RELATION.to_string(), &snapshot, false);

    let err = compiled.materialize(&conn).await.unwrap_err();
    assert!(matches!(err, RunError::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_run_without_tests_is_done() {
    let renderer = Arc::new(TemplateRenderer::builtin("duckdb"));
    let mut conn = connection(&renderer);
    let model = Model::new("orders", "SELECT 1 AS id").materialized(Materialization::Table);
    let snapshot = SchemaMap::new();

    CompiledModel::new(&model, "main", RELATION.to_string(), &snapshot, false)
        .run(&mut conn, &renderer, &[], OnTestFail::Error)
        .await
        .unwrap();

    assert!(!conn.in_transaction());
    let rows = conn.query("SELECT id FROM main.orders", &[]).await.unwrap();
    assert_eq!(rows.scalar(), Some(&json!(1)));
}

#[tokio::test]
async fn test_failing_test_reports_column_and_keeps_data() {
    let renderer = Arc::new(TemplateRenderer::builtin("duckdb"));
    let mut conn = connection(&renderer);
    let model = Model::new("orders", "SELECT NULL::INTEGER AS id UNION ALL SELECT 1")
        .materialized(Materialization::Table)
        .with_test("id", TestSpec::bare("not_null"));
    let snapshot = SchemaMap::new();

    let err = CompiledModel::new(&model, "main", RELATION.to_string(), &snapshot, false)
        .run(&mut conn, &renderer, &[], OnTestFail::Error)
        .await
        .unwrap_err();

    let RunError::TestsFailed(report) = err else {
        panic!("expected TestsFailed, got {err}");
    };
    assert_eq!(
        report.failures,
        vec![("id".to_string(), vec!["not_null".to_string()])]
    );
    assert!(!conn.in_transaction());
    let rows = conn.query("SELECT COUNT(*) FROM main.orders", &[]).await.unwrap();
    assert_eq!(rows.scalar(), Some(&json!(2)));
}

#[tokio::test]
async fn test_failing_test_with_rollback_leaves_no_table() {
    let renderer = Arc::new(TemplateRenderer::builtin("duckdb"));
    let mut conn = connection(&renderer);
    let model = Model::new("orders", "SELECT NULL::INTEGER AS id")
        .materialized(Materialization::Table)
        .with_test("id", TestSpec::bare("not_null"));
    let snapshot = SchemaMap::new();

    let err = CompiledModel::new(&model, "main", RELATION.to_string(), &snapshot, false)
        .run(&mut conn, &renderer, &[], OnTestFail::ErrorWithRollback)
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::TestsFailed(_)));

    let rows = conn
        .query(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = 'orders'",
            &[],
        )
        .await
        .unwrap();
    assert_eq!(rows.scalar(), Some(&json!(0)));
}

#[tokio::test]
async fn test_statement_error_rolls_back() {
    let renderer = Arc::new(TemplateRenderer::builtin("duckdb"));
    let mut conn = connection(&renderer);
    let model = Model::new("orders", "SELECT * FROM missing_source")
        .materialized(Materialization::Table);
    let snapshot = SchemaMap::new();

    let err = CompiledModel::new(&model, "main", RELATION.to_string(), &snapshot, false)
        .run(&mut conn, &renderer, &[], OnTestFail::Error)
        .await
        .unwrap_err();
    assert!(err.sql().is_some_and(|sql| sql.contains("missing_source")));
    assert!(!conn.in_transaction());
}

#[tokio::test]
async fn test_ephemeral_executes_nothing() {
    let renderer = Arc::new(TemplateRenderer::builtin("duckdb"));
    let mut conn = connection(&renderer);
    let model = Model::new("orders", "SELECT * FROM missing_source")
        .materialized(Materialization::Ephemeral);
    let snapshot = SchemaMap::new();

    CompiledModel::new(&model, "main", RELATION.to_string(), &snapshot, false)
        .run(&mut conn, &renderer, &[], OnTestFail::Error)
        .await
        .unwrap();
    assert!(!conn.in_transaction());
}
