use super::*;

fn pair(name: &str, body: &str) -> (String, String) {
    (name.to_string(), body.to_string())
}

#[test]
fn test_inline_single_ephemeral() {
    let ctes = vec![pair("stg_orders", "SELECT id, amount FROM raw_orders")];
    let result = inline_ephemeral_ctes("SELECT * FROM stg_orders", &ctes);
    assert_eq!(
        result,
        "WITH stg_orders AS (\nSELECT id, amount FROM raw_orders\n)\nSELECT * FROM stg_orders"
    );
}

#[test]
fn test_inline_merges_existing_with_clause() {
    let ctes = vec![pair("stg_orders", "SELECT id FROM raw_orders")];
    let result = inline_ephemeral_ctes(
        "with my_cte AS (SELECT 1) SELECT * FROM my_cte, stg_orders",
        &ctes,
    );
    assert!(result.starts_with("WITH stg_orders AS"));
    assert!(result.contains(",\nmy_cte AS (SELECT 1)"));
    assert_eq!(result.matches("WITH").count(), 1);
}

#[test]
fn test_inline_no_ephemerals() {
    assert_eq!(
        inline_ephemeral_ctes("SELECT * FROM orders;", &[]),
        "SELECT * FROM orders"
    );
}

#[test]
fn test_inline_removes_trailing_semicolon() {
    let ctes = vec![pair("stg_orders", "SELECT id FROM raw_orders;")];
    let result = inline_ephemeral_ctes("SELECT * FROM stg_orders", &ctes);
    assert!(result.contains("FROM raw_orders\n)"));
    assert!(!result.contains("raw_orders;"));
}

#[test]
fn test_inline_skips_duplicates() {
    let ctes = vec![pair("a", "SELECT 1"), pair("a", "SELECT 2")];
    let result = inline_ephemeral_ctes("SELECT * FROM a", &ctes);
    assert_eq!(result.matches("a AS").count(), 1);
}

#[test]
fn test_identifier_starting_with_with_is_not_a_clause() {
    let ctes = vec![pair("e", "SELECT 1")];
    let result = inline_ephemeral_ctes("withdrawals", &ctes);
    assert!(result.ends_with("\nwithdrawals"));
}

#[test]
fn test_collect_nested_ephemeral_dependencies() {
    let mut model_deps: HashMap<String, Vec<String>> = HashMap::new();
    model_deps.insert(
        "fct_orders".to_string(),
        vec!["stg_orders".to_string(), "dim_customers".to_string()],
    );
    model_deps.insert("stg_orders".to_string(), vec!["stg_raw".to_string()]);
    model_deps.insert("stg_raw".to_string(), vec!["raw_orders".to_string()]);
    model_deps.insert("dim_customers".to_string(), vec![]);

    let is_ephemeral = |name: &str| name == "stg_orders" || name == "stg_raw";
    let get_body = |name: &str| match name {
        "stg_orders" => Some("SELECT id FROM stg_raw".to_string()),
        "stg_raw" => Some("SELECT id FROM raw_orders".to_string()),
        _ => None,
    };

    let ordered =
        collect_ephemeral_dependencies("fct_orders", &model_deps, is_ephemeral, get_body);
    let names: Vec<_> = ordered.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["stg_raw", "stg_orders"]);
}

#[test]
fn test_collect_stops_at_physical_models() {
    let mut model_deps: HashMap<String, Vec<String>> = HashMap::new();
    model_deps.insert("fct".to_string(), vec!["stg".to_string()]);
    model_deps.insert("stg".to_string(), vec!["eph".to_string()]);

    let ordered = collect_ephemeral_dependencies(
        "fct",
        &model_deps,
        |name| name == "eph",
        |_| Some("SELECT 1".to_string()),
    );
    assert!(ordered.is_empty());
}
