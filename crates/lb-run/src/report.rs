//! Build run results

use chrono::{DateTime, Utc};
use lb_core::ModelName;
use serde::Serialize;
use uuid::Uuid;

/// Final outcome of one model
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModelOutcome {
    /// Materialized, and every test passed
    Done,
    /// Rendering, materialization or tests failed
    Failed { error: String },
    /// Not attempted because an upstream model failed
    Skipped { upstream: ModelName },
}

/// Outcome of one model, in execution order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelResult {
    pub model: ModelName,
    #[serde(flatten)]
    pub outcome: ModelOutcome,
}

/// Per-model outcomes of one build run
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    /// Unique id of the run
    pub run_id: Uuid,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Outcomes in execution order
    pub results: Vec<ModelResult>,
}

impl BuildReport {
    /// Start an empty report
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            results: Vec::new(),
        }
    }

    /// Record the outcome of a model
    pub fn push(&mut self, model: ModelName, outcome: ModelOutcome) {
        self.results.push(ModelResult { model, outcome });
    }

    /// Outcome of a model, if it was part of the run
    pub fn outcome(&self, model: &str) -> Option<&ModelOutcome> {
        self.results
            .iter()
            .find(|r| r.model == model)
            .map(|r| &r.outcome)
    }

    /// Number of models that completed
    pub fn done_count(&self) -> usize {
        self.count(|o| matches!(o, ModelOutcome::Done))
    }

    /// Number of models that failed
    pub fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, ModelOutcome::Failed { .. }))
    }

    /// Number of models skipped because of an upstream failure
    pub fn skipped_count(&self) -> usize {
        self.count(|o| matches!(o, ModelOutcome::Skipped { .. }))
    }

    fn count(&self, pred: impl Fn(&ModelOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }

    /// Whether every model completed
    pub fn is_success(&self) -> bool {
        self.results
            .iter()
            .all(|r| matches!(r.outcome, ModelOutcome::Done))
    }

    /// Failed and skipped models, in execution order
    pub fn problems(&self) -> impl Iterator<Item = &ModelResult> {
        self.results
            .iter()
            .filter(|r| !matches!(r.outcome, ModelOutcome::Done))
    }
}

impl Default for BuildReport {
    fn default() -> Self {
        Self::new()
    }
}
