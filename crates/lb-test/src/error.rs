//! Test failures and errors

use lb_core::ModelName;
use lb_db::DbError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Failed tests of one model, grouped by column in declaration order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestFailureReport {
    /// Model whose tests failed
    pub model: ModelName,
    /// Column name and the names of its failed tests
    pub failures: Vec<(String, Vec<String>)>,
}

impl TestFailureReport {
    /// Create an empty report for a model
    pub fn new(model: ModelName) -> Self {
        Self {
            model,
            failures: Vec::new(),
        }
    }

    /// Record a failed test on a column
    pub fn record(&mut self, column: &str, test: &str) {
        match self.failures.iter_mut().find(|(c, _)| c == column) {
            Some((_, tests)) => tests.push(test.to_string()),
            None => self
                .failures
                .push((column.to_string(), vec![test.to_string()])),
        }
    }

    /// Failed test names for a column
    pub fn failed_tests(&self, column: &str) -> Option<&[String]> {
        self.failures
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, tests)| tests.as_slice())
    }

    /// Total number of failed tests
    pub fn len(&self) -> usize {
        self.failures.iter().map(|(_, tests)| tests.len()).sum()
    }

    /// Whether nothing failed
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for TestFailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} test(s) failed on model '{}':", self.len(), self.model)?;
        for (column, tests) in &self.failures {
            write!(f, " {} [{}]", column, tests.join(", "))?;
        }
        Ok(())
    }
}

/// Outcome of running a model's tests, when not all of them passed
#[derive(Error, Debug)]
pub enum TestError {
    /// One or more tests returned a failing result
    #[error("{0}")]
    Failed(TestFailureReport),

    /// A test query could not be rendered or executed
    #[error(transparent)]
    Query(#[from] DbError),
}
