use super::*;
use std::fs;
use tempfile::TempDir;

fn write_template(root: &Path, rel: &str, source: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, source).unwrap();
}

#[test]
fn test_builtin_store() {
    let store = BuiltinStore;
    assert!(store.resolve("duckdb", "model/view").unwrap().is_some());
    assert!(store.resolve("duckdb", "nope").unwrap().is_none());
}

#[test]
fn test_directory_store_resolves_nested_name() {
    let dir = TempDir::new().unwrap();
    write_template(dir.path(), "duckdb/tests/is_even.sql", "SELECT 0");

    let store = DirectoryStore::new(dir.path());
    assert_eq!(
        store.resolve("duckdb", "tests/is_even").unwrap().as_deref(),
        Some("SELECT 0")
    );
    assert!(store.resolve("postgres", "tests/is_even").unwrap().is_none());
}

#[test]
fn test_directory_store_rejects_escaping_names() {
    let dir = TempDir::new().unwrap();
    let store = DirectoryStore::new(dir.path().join("templates"));
    write_template(dir.path(), "secret.sql", "SELECT 1");

    assert!(store.resolve("duckdb", "../../secret").unwrap().is_none());
    assert!(store.resolve("duckdb", "tests//x").unwrap().is_none());
}

#[test]
fn test_layered_store_project_overrides_builtin() {
    let dir = TempDir::new().unwrap();
    write_template(dir.path(), "duckdb/model/view.sql", "-- custom view");

    let store = LayeredStore::for_project([dir.path().to_path_buf()]);
    assert_eq!(
        store.resolve("duckdb", "model/view").unwrap().as_deref(),
        Some("-- custom view")
    );
    assert!(store
        .resolve("duckdb", "model/init")
        .unwrap()
        .unwrap()
        .contains("CREATE OR REPLACE TABLE"));
}

#[test]
fn test_layered_store_first_layer_wins() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    write_template(first.path(), "duckdb/x.sql", "first");
    write_template(second.path(), "duckdb/x.sql", "second");

    let store = LayeredStore::new()
        .with_layer(DirectoryStore::new(first.path()))
        .with_layer(DirectoryStore::new(second.path()));
    assert_eq!(store.resolve("duckdb", "x").unwrap().as_deref(), Some("first"));
}
