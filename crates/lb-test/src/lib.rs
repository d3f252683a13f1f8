//! lb-test - Column tests for lightbuild
//!
//! This crate runs the data-quality tests configured on a model's columns
//! against its freshly materialized relation. Each test renders the
//! adapter's `tests/<name>` template to a scalar query; a non-zero result
//! is a failure. Every configured test runs, and all failures of a model
//! are collected into one [`TestFailureReport`].

pub mod error;
pub mod runner;

pub use error::{TestError, TestFailureReport};
pub use runner::TestRunner;
