//! Snapshot of warehouse relations and their columns.
//!
//! The snapshot is taken once at the start of a run and drives the choice
//! between initial and incremental materialization, as well as schema-drift
//! detection for incremental models.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Kind of an existing relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    /// Base or temporary table
    Table,
    /// View
    View,
}

impl RelationKind {
    /// Map an `information_schema.tables.table_type` value
    pub fn from_table_type(table_type: &str) -> Self {
        if table_type.eq_ignore_ascii_case("VIEW") {
            RelationKind::View
        } else {
            RelationKind::Table
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationKind::Table => write!(f, "table"),
            RelationKind::View => write!(f, "view"),
        }
    }
}

/// A column of an existing relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    /// Column name as stored by the warehouse
    pub name: String,
    /// Warehouse type name (e.g. `INTEGER`, `VARCHAR`)
    pub data_type: String,
}

/// An existing relation with its ordered columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationInfo {
    /// Schema the relation lives in
    pub schema: String,
    /// Relation name
    pub name: String,
    /// Table or view
    pub kind: RelationKind,
    /// Columns in ordinal order
    pub columns: Vec<ColumnInfo>,
}

impl RelationInfo {
    /// Find a column by name, case-insensitively
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// Read-only map of `schema.relation` to relation metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaMap {
    relations: BTreeMap<String, RelationInfo>,
}

fn relation_key(schema: &str, name: &str) -> String {
    format!("{}.{}", schema.to_lowercase(), name.to_lowercase())
}

impl SchemaMap {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a relation column.
    ///
    /// Rows for the same relation must arrive in ordinal order. A row
    /// without a column name registers the relation with no columns.
    pub fn add_column(
        &mut self,
        schema: &str,
        name: &str,
        kind: RelationKind,
        column: Option<ColumnInfo>,
    ) {
        let entry = self
            .relations
            .entry(relation_key(schema, name))
            .or_insert_with(|| RelationInfo {
                schema: schema.to_string(),
                name: name.to_string(),
                kind,
                columns: Vec::new(),
            });
        if let Some(column) = column {
            entry.columns.push(column);
        }
    }

    /// Look up a relation, case-insensitively
    pub fn relation(&self, schema: &str, name: &str) -> Option<&RelationInfo> {
        self.relations.get(&relation_key(schema, name))
    }

    /// Whether a relation exists
    pub fn contains(&self, schema: &str, name: &str) -> bool {
        self.relation(schema, name).is_some()
    }

    /// Iterate over all relations in key order
    pub fn relations(&self) -> impl Iterator<Item = &RelationInfo> {
        self.relations.values()
    }

    /// Number of relations in the snapshot
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    /// Whether the snapshot is empty
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}
