use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::errors::ResultsError;

/// Test name used for a failing before-all hook.
pub const BEFORE_CLASS: &str = "beforeClass";
/// Test name used for a failing after-all hook.
pub const AFTER_CLASS: &str = "afterClass";

/// Terminal state of a test. `Unstarted` until it finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestState {
    Unstarted,
    Passed,
    Failed,
    Error,
    Ignored,
}

impl TestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestState::Unstarted => "unstarted",
            TestState::Passed => "passed",
            TestState::Failed => "failed",
            TestState::Error => "error",
            TestState::Ignored => "ignored",
        }
    }
}

impl fmt::Display for TestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timing and outcome of one test.
#[derive(Debug, Clone)]
pub struct TestRecord {
    suite: String,
    test: String,
    started: Option<Instant>,
    ended: Option<Instant>,
    state: TestState,
    trace: Option<String>,
}

impl TestRecord {
    pub fn new(suite: impl Into<String>, test: impl Into<String>) -> Self {
        Self {
            suite: suite.into(),
            test: test.into(),
            started: None,
            ended: None,
            state: TestState::Unstarted,
            trace: None,
        }
    }

    /// A record with its start time stamped now.
    pub fn started(suite: impl Into<String>, test: impl Into<String>) -> Self {
        let mut record = Self::new(suite, test);
        record.started = Some(Instant::now());
        record
    }

    pub fn suite(&self) -> &str {
        &self.suite
    }

    pub fn test(&self) -> &str {
        &self.test
    }

    pub fn state(&self) -> TestState {
        self.state
    }

    pub fn trace(&self) -> Option<&str> {
        self.trace.as_deref()
    }

    pub fn start_time(&self) -> Option<Instant> {
        self.started
    }

    pub fn end_time(&self) -> Option<Instant> {
        self.ended
    }

    pub fn is_finished(&self) -> bool {
        self.ended.is_some()
    }

    /// Suite hooks are recorded without a start.
    pub fn is_lifecycle_phase(&self) -> bool {
        self.test == BEFORE_CLASS || self.test == AFTER_CLASS
    }

    pub fn matches(&self, suite: &str, test: &str) -> bool {
        self.suite == suite && self.test == test
    }

    /// Stamps the end time and the terminal state. The end time is set at
    /// most once, and only after a start unless this is a lifecycle phase.
    pub fn finish(&mut self, state: TestState, trace: Option<String>) -> Result<(), ResultsError> {
        if self.is_finished() {
            return Err(ResultsError::AlreadyFinished {
                suite: self.suite.clone(),
                test: self.test.clone(),
            });
        }
        if state == TestState::Unstarted {
            return Err(ResultsError::InvalidState {
                suite: self.suite.clone(),
                test: self.test.clone(),
                state: state.as_str(),
            });
        }
        if self.started.is_none() && !self.is_lifecycle_phase() {
            return Err(ResultsError::NotStarted {
                suite: self.suite.clone(),
                test: self.test.clone(),
            });
        }
        self.ended = Some(Instant::now());
        self.state = state;
        self.trace = trace;
        Ok(())
    }

    /// Elapsed time between start and end; zero for lifecycle phases.
    pub fn duration(&self) -> Option<Duration> {
        match (self.started, self.ended) {
            (Some(start), Some(end)) => Some(end.saturating_duration_since(start)),
            (None, Some(_)) => Some(Duration::ZERO),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_time_is_set_once() {
        let mut record = TestRecord::started("Math", "adds");
        record.finish(TestState::Passed, None).unwrap();
        assert!(record.duration().is_some());
        let err = record.finish(TestState::Failed, None).unwrap_err();
        assert!(matches!(err, ResultsError::AlreadyFinished { .. }));
        assert_eq!(record.state(), TestState::Passed);
    }

    #[test]
    fn unstarted_tests_cannot_finish() {
        let mut record = TestRecord::new("Math", "adds");
        let err = record.finish(TestState::Passed, None).unwrap_err();
        assert_eq!(
            err,
            ResultsError::NotStarted {
                suite: "Math".into(),
                test: "adds".into()
            }
        );
    }

    #[test]
    fn lifecycle_phases_finish_without_a_start() {
        let mut record = TestRecord::new("Math", AFTER_CLASS);
        record
            .finish(TestState::Error, Some("boom".into()))
            .unwrap();
        assert_eq!(record.duration(), Some(Duration::ZERO));
        assert_eq!(record.trace(), Some("boom"));
    }

    #[test]
    fn finishing_as_unstarted_is_rejected() {
        let mut record = TestRecord::started("Math", "adds");
        let err = record.finish(TestState::Unstarted, None).unwrap_err();
        assert!(matches!(err, ResultsError::InvalidState { state: "unstarted", .. }));
        assert!(!record.is_finished());
    }
}
