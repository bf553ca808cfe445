use super::{Query, Select, Statement};
use crate::config::Threshold;

/// Counts the rows of a test query and evaluates its thresholds.
///
/// Produces a single row `(failures, should_warn, should_error)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    /// The failing rows, already limited.
    pub query: Select,
    pub warn_if: Threshold,
    pub error_if: Threshold,
}

impl From<TestResult> for Query {
    fn from(value: TestResult) -> Query {
        Query::TestResult(value)
    }
}

impl From<TestResult> for Statement {
    fn from(value: TestResult) -> Statement {
        Statement::Query(value.into())
    }
}
