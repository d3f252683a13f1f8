//! Identifier and literal quoting shared by templates and the engine

/// Double-quote an identifier, doubling embedded quotes.
///
/// ```
/// use lb_core::sql_utils::quote_ident;
/// assert_eq!(quote_ident("orders"), r#""orders""#);
/// assert_eq!(quote_ident(r#"odd"name"#), r#""odd""name""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quoted relation name of a model in a schema.
///
/// This is the form bound to `this` in templates and used in every
/// statement the engine builds itself.
///
/// ```
/// use lb_core::sql_utils::quote_relation;
/// assert_eq!(quote_relation("analytics", "orders"), r#""analytics"."orders""#);
/// ```
pub fn quote_relation(schema: &str, name: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(name))
}

/// Quote each dot-separated part of a name
pub fn quote_qualified(name: &str) -> String {
    name.split('.')
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(".")
}

/// Single-quoted string literal
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
