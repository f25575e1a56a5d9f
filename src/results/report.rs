//! Serializable snapshot of a result tree for machine-readable output.

use serde::{Deserialize, Serialize};

use super::record::{TestRecord, TestState};
use super::TestResults;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordReport {
    pub suite: String,
    pub test: String,
    pub state: TestState,
    pub duration_secs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

impl From<&TestRecord> for RecordReport {
    fn from(record: &TestRecord) -> Self {
        Self {
            suite: record.suite().to_string(),
            test: record.test().to_string(),
            state: record.state(),
            duration_secs: record.duration().map(|d| d.as_secs_f64()),
            trace: record.trace().map(str::to_string),
        }
    }
}

/// Counts are rolled up: each node includes its descendants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsReport {
    pub name: String,
    pub tests: usize,
    pub passes: usize,
    pub failures: usize,
    pub errors: usize,
    pub ignored: usize,
    pub duration_secs: f64,
    pub records: Vec<RecordReport>,
    #[serde(default)]
    pub children: Vec<ResultsReport>,
}

impl From<&TestResults> for ResultsReport {
    fn from(node: &TestResults) -> Self {
        Self {
            name: node.name().to_string(),
            tests: node.count_tests(),
            passes: node.count_passes(),
            failures: node.count_failures(),
            errors: node.count_errors(),
            ignored: node.count_ignored(),
            duration_secs: node.duration().as_secs_f64(),
            records: node.records().iter().map(RecordReport::from).collect(),
            children: node.children().iter().map(ResultsReport::from).collect(),
        }
    }
}

impl ResultsReport {
    pub fn was_successful(&self) -> bool {
        self.failures == 0 && self.errors == 0
    }
}
