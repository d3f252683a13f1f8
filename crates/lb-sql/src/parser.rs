//! Parsing of rendered model bodies

use sqlparser::ast::Statement;
use sqlparser::dialect::DuckDbDialect;
use sqlparser::parser::Parser;

use crate::error::{SqlError, SqlResult};

/// Warehouse dialects model bodies can be written in, keyed by adapter name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    DuckDb,
}

impl SqlDialect {
    /// Dialect of a registered adapter, matched case-insensitively
    pub fn from_adapter(name: &str) -> SqlResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "duckdb" => Ok(SqlDialect::DuckDb),
            _ => Err(SqlError::UnknownDialect(name.to_string())),
        }
    }

    /// Adapter name of this dialect
    pub fn name(self) -> &'static str {
        match self {
            SqlDialect::DuckDb => "duckdb",
        }
    }

    fn parse(self, sql: &str) -> Result<Vec<Statement>, sqlparser::parser::ParserError> {
        match self {
            SqlDialect::DuckDb => Parser::parse_sql(&DuckDbDialect::default(), sql),
        }
    }
}

/// Parser for one warehouse dialect
#[derive(Debug, Clone, Copy)]
pub struct SqlParser {
    dialect: SqlDialect,
}

impl SqlParser {
    pub fn new(dialect: SqlDialect) -> Self {
        Self { dialect }
    }

    /// Parser for the dialect of the named adapter
    pub fn for_adapter(name: &str) -> SqlResult<Self> {
        SqlDialect::from_adapter(name).map(Self::new)
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    /// Parse SQL into AST statements
    pub fn parse(&self, sql: &str) -> SqlResult<Vec<Statement>> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Err(SqlError::EmptySql);
        }

        self.dialect.parse(sql).map_err(|e| {
            let message = e.to_string();
            let (line, column) = error_location(&message);
            SqlError::ParseError {
                message,
                line,
                column,
            }
        })
    }

    /// Parse a model body, which must be exactly one query
    pub fn parse_query(&self, sql: &str) -> SqlResult<Statement> {
        let mut statements = self.parse(sql)?;
        if statements.len() != 1 {
            return Err(SqlError::NotAQuery(format!(
                "{} statements",
                statements.len()
            )));
        }
        match statements.remove(0) {
            stmt @ Statement::Query(_) => Ok(stmt),
            other => Err(SqlError::NotAQuery(statement_keyword(&other))),
        }
    }
}

impl Default for SqlParser {
    fn default() -> Self {
        Self::new(SqlDialect::DuckDb)
    }
}

/// Leading keywords of a statement, for error messages
fn statement_keyword(stmt: &Statement) -> String {
    stmt.to_string()
        .split_whitespace()
        .take(2)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Pull "Line: N, Column: M" out of a sqlparser error message.
///
/// `ParserError` carries no structured location, only text.
fn error_location(msg: &str) -> (usize, usize) {
    let number_after = |label: &str| -> Option<usize> {
        let start = msg.find(label)? + label.len();
        let digits: String = msg[start..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    };

    match (number_after("Line: "), number_after("Column: ")) {
        (Some(line), Some(column)) => (line, column),
        _ => (0, 0),
    }
}

#[cfg(test)]
#[path = "parser_test.rs"]
mod tests;
