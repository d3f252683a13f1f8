//! Templates compiled into the binary, keyed by `(adapter, name)`

/// A builtin template
#[derive(Debug, Clone, Copy)]
pub struct BuiltinTemplate {
    /// Adapter identifier
    pub adapter: &'static str,
    /// Template name, e.g. `model/init`
    pub name: &'static str,
    /// Template source
    pub source: &'static str,
}

macro_rules! builtin {
    ($adapter:literal, $name:literal) => {
        BuiltinTemplate {
            adapter: $adapter,
            name: $name,
            source: include_str!(concat!("../templates/", $adapter, "/", $name, ".sql")),
        }
    };
}

static BUILTIN_TEMPLATES: &[BuiltinTemplate] = &[
    builtin!("duckdb", "meta/relations"),
    builtin!("duckdb", "meta/create_schema"),
    builtin!("duckdb", "meta/use_schema"),
    builtin!("duckdb", "model/init"),
    builtin!("duckdb", "model/incremental"),
    builtin!("duckdb", "model/add_column"),
    builtin!("duckdb", "model/view"),
    builtin!("duckdb", "model/drop"),
    builtin!("duckdb", "seed/load"),
    builtin!("duckdb", "tests/not_null"),
    builtin!("duckdb", "tests/unique"),
    builtin!("duckdb", "tests/accepted_values"),
    builtin!("duckdb", "tests/relationships"),
    builtin!("duckdb", "tests/positive"),
    builtin!("duckdb", "tests/non_negative"),
    builtin!("duckdb", "tests/min_value"),
    builtin!("duckdb", "tests/max_value"),
    builtin!("duckdb", "tests/recency"),
];

/// All builtin templates
pub fn builtin_templates() -> &'static [BuiltinTemplate] {
    BUILTIN_TEMPLATES
}

/// Look up a builtin template source
pub fn get_builtin(adapter: &str, name: &str) -> Option<&'static str> {
    BUILTIN_TEMPLATES
        .iter()
        .find(|t| t.adapter == adapter && t.name == name)
        .map(|t| t.source)
}

/// Names of the builtin column tests available for an adapter
pub fn builtin_test_names(adapter: &str) -> Vec<&'static str> {
    BUILTIN_TEMPLATES
        .iter()
        .filter(|t| t.adapter == adapter)
        .filter_map(|t| t.name.strip_prefix("tests/"))
        .collect()
}
