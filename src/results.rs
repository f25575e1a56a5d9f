//! # Result Tree
//!
//! A [`TestResults`] node counts the tests recorded on it and owns one child
//! node per nested suite. Counts are stored where they were recorded and
//! rolled up on demand, so every `count_*` method on a node includes all of
//! its descendants.
//!
//! ## Routing
//! While a child suite is active (started and not completed), test
//! registrations addressed to its parent are routed to the innermost active
//! node. Recording directly on the child returned by
//! [`TestResults::register_suite_started`] gives the same totals.
//!
//! ## Invariant
//! With no test in flight, `tests == passes + failures + errors + ignored`
//! holds at every node.

use std::time::{Duration, Instant};

use tracing::trace;

use crate::errors::ResultsError;

mod record;
mod report;

pub use record::{TestRecord, TestState, AFTER_CLASS, BEFORE_CLASS};
pub use report::{RecordReport, ResultsReport};

const HEAVY_RULE: &str =
    "======================================================================";
const LIGHT_RULE: &str =
    "----------------------------------------------------------------------";

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

#[derive(Debug, Clone)]
pub struct TestResults {
    name: String,
    tests: usize,
    passes: usize,
    failures: usize,
    errors: usize,
    ignored: usize,
    traces: Vec<String>,
    records: Vec<TestRecord>,
    in_flight: Vec<TestRecord>,
    started: Instant,
    finished: Option<Instant>,
    children: Vec<TestResults>,
    active: Option<usize>,
}

impl Default for TestResults {
    fn default() -> Self {
        Self::new()
    }
}

impl TestResults {
    /// A root node for a whole run.
    pub fn new() -> Self {
        Self::named("all tests")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tests: 0,
            passes: 0,
            failures: 0,
            errors: 0,
            ignored: 0,
            traces: Vec::new(),
            records: Vec::new(),
            in_flight: Vec::new(),
            started: Instant::now(),
            finished: None,
            children: Vec::new(),
            active: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &[TestResults] {
        &self.children
    }

    /// Finished records held by this node, excluding descendants.
    pub fn records(&self) -> &[TestRecord] {
        &self.records
    }

    /// Every finished record in the tree, depth first.
    pub fn all_records(&self) -> Vec<&TestRecord> {
        let mut out: Vec<&TestRecord> = self.records.iter().collect();
        for child in &self.children {
            out.extend(child.all_records());
        }
        out
    }

    /// Traces retained by this node, excluding descendants.
    pub fn traces(&self) -> &[String] {
        &self.traces
    }

    /// Every retained trace in suite order.
    pub fn all_traces(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.traces.iter().map(String::as_str).collect();
        for child in &self.children {
            out.extend(child.all_traces());
        }
        out
    }

    /// Number of active suites below this node.
    pub fn active_depth(&self) -> usize {
        match self.active {
            Some(i) => 1 + self.children[i].active_depth(),
            None => 0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    // ------------------------------------------------------------------------
    // Routing
    // ------------------------------------------------------------------------

    /// The innermost active node: where registrations land.
    pub fn scope(&self) -> &TestResults {
        match self.active {
            Some(i) => self.children[i].scope(),
            None => self,
        }
    }

    fn scope_mut(&mut self) -> &mut TestResults {
        match self.active {
            Some(i) => self.children[i].scope_mut(),
            None => self,
        }
    }

    /// The node whose active child is the innermost active suite.
    fn innermost_parent_mut(&mut self) -> Option<&mut TestResults> {
        let i = self.active?;
        if self.children[i].active.is_some() {
            self.children[i].innermost_parent_mut()
        } else {
            Some(self)
        }
    }

    // ------------------------------------------------------------------------
    // Suite lifecycle
    // ------------------------------------------------------------------------

    /// Opens a child suite under the innermost active node and makes it
    /// active. Tests may be recorded on the returned node directly.
    pub fn register_suite_started(&mut self, name: impl Into<String>) -> &mut TestResults {
        let scope = self.scope_mut();
        let child = TestResults::named(name);
        trace!(parent = %scope.name, suite = %child.name, "suite started");
        scope.children.push(child);
        let index = scope.children.len() - 1;
        scope.active = Some(index);
        &mut scope.children[index]
    }

    /// Closes the innermost active suite, which must be named `name`.
    pub fn register_suite_completed(&mut self, name: &str) -> Result<(), ResultsError> {
        let Some(parent) = self.innermost_parent_mut() else {
            return Err(ResultsError::SuiteMismatch {
                name: name.to_string(),
                active: None,
            });
        };
        let Some(index) = parent.active else {
            return Err(ResultsError::SuiteMismatch {
                name: name.to_string(),
                active: None,
            });
        };
        let child = &mut parent.children[index];
        if child.name != name {
            return Err(ResultsError::SuiteMismatch {
                name: name.to_string(),
                active: Some(child.name.clone()),
            });
        }
        child.finished = Some(Instant::now());
        trace!(suite = name, tests = child.count_tests(), "suite completed");
        parent.active = None;
        Ok(())
    }

    /// Stamps the end of this node's own span.
    pub fn mark_finished(&mut self) {
        if self.finished.is_none() {
            self.finished = Some(Instant::now());
        }
    }

    // ------------------------------------------------------------------------
    // Test lifecycle
    // ------------------------------------------------------------------------

    pub fn register_test_started(&mut self, suite: &str, test: &str) -> &TestRecord {
        let scope = self.scope_mut();
        trace!(suite, test, "test started");
        scope.tests += 1;
        scope.in_flight.push(TestRecord::started(suite, test));
        let index = scope.in_flight.len() - 1;
        &scope.in_flight[index]
    }

    pub fn register_test_passed(&mut self, suite: &str, test: &str) -> Result<&TestRecord, ResultsError> {
        self.finish_test(suite, test, TestState::Passed, None)
    }

    pub fn register_test_failed(
        &mut self,
        suite: &str,
        test: &str,
        trace: impl Into<String>,
    ) -> Result<&TestRecord, ResultsError> {
        self.finish_test(suite, test, TestState::Failed, Some(trace.into()))
    }

    pub fn register_test_error(
        &mut self,
        suite: &str,
        test: &str,
        trace: impl Into<String>,
    ) -> Result<&TestRecord, ResultsError> {
        self.finish_test(suite, test, TestState::Error, Some(trace.into()))
    }

    pub fn register_test_ignored(&mut self, suite: &str, test: &str) -> Result<&TestRecord, ResultsError> {
        self.finish_test(suite, test, TestState::Ignored, None)
    }

    fn finish_test(
        &mut self,
        suite: &str,
        test: &str,
        state: TestState,
        trace: Option<String>,
    ) -> Result<&TestRecord, ResultsError> {
        let scope = self.scope_mut();
        let mut record = match scope.in_flight.iter().position(|r| r.matches(suite, test)) {
            Some(index) => scope.in_flight.remove(index),
            None => {
                let record = TestRecord::new(suite, test);
                if !record.is_lifecycle_phase() {
                    return Err(scope.missing(suite, test));
                }
                scope.tests += 1;
                record
            }
        };
        record.finish(state, trace.clone())?;
        trace!(suite, test, state = %state, "test finished");
        match state {
            TestState::Passed => scope.passes += 1,
            TestState::Failed => scope.failures += 1,
            TestState::Error => scope.errors += 1,
            TestState::Ignored => scope.ignored += 1,
            TestState::Unstarted => {}
        }
        if let Some(text) = trace {
            let label = if state == TestState::Failed { "FAIL" } else { "ERROR" };
            scope
                .traces
                .push(format!("{}: {}.{}\n{}\n{}", label, suite, test, LIGHT_RULE, text));
        }
        scope.records.push(record);
        let index = scope.records.len() - 1;
        Ok(&scope.records[index])
    }

    fn missing(&self, suite: &str, test: &str) -> ResultsError {
        let finished = self.records.iter().any(|r| r.matches(suite, test));
        if finished {
            ResultsError::AlreadyFinished {
                suite: suite.to_string(),
                test: test.to_string(),
            }
        } else {
            ResultsError::NotStarted {
                suite: suite.to_string(),
                test: test.to_string(),
            }
        }
    }

    // ------------------------------------------------------------------------
    // Rollup
    // ------------------------------------------------------------------------

    fn rollup(&self, own: fn(&TestResults) -> usize) -> usize {
        own(self) + self.children.iter().map(|c| c.rollup(own)).sum::<usize>()
    }

    pub fn count_tests(&self) -> usize {
        self.rollup(|n| n.tests)
    }

    pub fn count_passes(&self) -> usize {
        self.rollup(|n| n.passes)
    }

    pub fn count_failures(&self) -> usize {
        self.rollup(|n| n.failures)
    }

    pub fn count_errors(&self) -> usize {
        self.rollup(|n| n.errors)
    }

    pub fn count_ignored(&self) -> usize {
        self.rollup(|n| n.ignored)
    }

    pub fn was_successful(&self) -> bool {
        self.count_failures() == 0 && self.count_errors() == 0
    }

    /// Verdict for the innermost active scope: "ignored" when everything in
    /// it was ignored, then "error", "failed" and "passed" in that order.
    pub fn state_description(&self) -> &'static str {
        let scope = self.scope();
        let ignored = scope.count_ignored();
        if ignored > 0 && ignored == scope.count_tests() {
            "ignored"
        } else if scope.count_errors() > 0 {
            "error"
        } else if scope.count_failures() > 0 {
            "failed"
        } else {
            "passed"
        }
    }

    fn latest_end(&self) -> Option<Instant> {
        let own = self.finished.into_iter();
        let records = self.records.iter().filter_map(TestRecord::end_time);
        let children = self.children.iter().filter_map(TestResults::latest_end);
        own.chain(records).chain(children).max()
    }

    /// From this node's start to the latest end stamped anywhere below it.
    pub fn duration(&self) -> Duration {
        self.latest_end()
            .map(|end| end.saturating_duration_since(self.started))
            .unwrap_or_default()
    }

    /// Retained traces, counts and a closing `OK` or `FAILED (...)` line for
    /// the whole tree from this node down.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for trace in self.all_traces() {
            out.push_str(HEAVY_RULE);
            out.push('\n');
            out.push_str(trace);
            out.push_str("\n\n");
        }
        out.push_str(LIGHT_RULE);
        out.push('\n');
        out.push_str(&format!(
            "Ran {} in {:.3}s\n\n",
            plural(self.count_tests(), "test"),
            self.duration().as_secs_f64()
        ));
        let (failures, errors, ignored) = (self.count_failures(), self.count_errors(), self.count_ignored());
        let mut parts = Vec::new();
        if failures > 0 {
            parts.push(plural(failures, "failure"));
        }
        if errors > 0 {
            parts.push(plural(errors, "error"));
        }
        if ignored > 0 {
            parts.push(format!("{} ignored", ignored));
        }
        if self.was_successful() {
            out.push_str("OK");
            if !parts.is_empty() {
                out.push_str(&format!(" ({})", parts.join(", ")));
            }
        } else {
            out.push_str(&format!("FAILED ({})", parts.join(", ")));
        }
        out.push('\n');
        out
    }

    pub fn to_report(&self) -> ResultsReport {
        ResultsReport::from(self)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.to_report())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invariant_holds(node: &TestResults) -> bool {
        node.count_tests()
            == node.count_passes() + node.count_failures() + node.count_errors() + node.count_ignored()
            && node.children().iter().all(invariant_holds)
    }

    #[test]
    fn registrations_route_to_the_active_suite() {
        let mut root = TestResults::new();
        root.register_suite_started("outer");
        root.register_suite_started("inner");
        assert_eq!(root.active_depth(), 2);

        root.register_test_started("inner", "a");
        root.register_test_passed("inner", "a").unwrap();
        root.register_suite_completed("inner").unwrap();
        root.register_test_started("outer", "b");
        root.register_test_failed("outer", "b", "boom").unwrap();
        root.register_suite_completed("outer").unwrap();

        assert_eq!(root.count_tests(), 2);
        assert_eq!(root.records().len(), 0);
        let outer = &root.children()[0];
        assert_eq!(outer.records().len(), 1);
        assert_eq!(outer.children()[0].count_passes(), 1);
        assert!(invariant_holds(&root));
    }

    #[test]
    fn direct_child_recording_matches_routing() {
        let mut routed = TestResults::new();
        routed.register_suite_started("s");
        routed.register_test_started("s", "t");
        routed.register_test_ignored("s", "t").unwrap();
        routed.register_suite_completed("s").unwrap();

        let mut direct = TestResults::new();
        let child = direct.register_suite_started("s");
        child.register_test_started("s", "t");
        child.register_test_ignored("s", "t").unwrap();
        direct.register_suite_completed("s").unwrap();

        assert_eq!(routed.to_report().ignored, direct.to_report().ignored);
        assert_eq!(routed.count_tests(), direct.count_tests());
    }

    #[test]
    fn finishing_twice_or_unstarted_is_an_error() {
        let mut root = TestResults::new();
        assert!(matches!(
            root.register_test_passed("s", "t"),
            Err(ResultsError::NotStarted { .. })
        ));
        root.register_test_started("s", "t");
        root.register_test_passed("s", "t").unwrap();
        assert!(matches!(
            root.register_test_passed("s", "t"),
            Err(ResultsError::AlreadyFinished { .. })
        ));
        assert!(invariant_holds(&root));
    }

    #[test]
    fn lifecycle_phases_are_counted_on_the_fly() {
        let mut root = TestResults::new();
        root.register_test_error("s", AFTER_CLASS, "teardown failed").unwrap();
        assert_eq!(root.count_tests(), 1);
        assert_eq!(root.count_errors(), 1);
        assert!(root.traces()[0].starts_with("ERROR: s.afterClass"));
    }

    #[test]
    fn completing_the_wrong_suite_is_rejected() {
        let mut root = TestResults::new();
        assert_eq!(
            root.register_suite_completed("s"),
            Err(ResultsError::SuiteMismatch {
                name: "s".into(),
                active: None
            })
        );
        root.register_suite_started("a");
        assert_eq!(
            root.register_suite_completed("b"),
            Err(ResultsError::SuiteMismatch {
                name: "b".into(),
                active: Some("a".into())
            })
        );
    }

    #[test]
    fn state_description_priority() {
        let mut root = TestResults::new();
        assert_eq!(root.state_description(), "passed");
        root.register_suite_started("s");
        root.register_test_started("s", "skipped");
        root.register_test_ignored("s", "skipped").unwrap();
        assert_eq!(root.state_description(), "ignored");
        root.register_test_started("s", "bad");
        root.register_test_failed("s", "bad", "f").unwrap();
        assert_eq!(root.state_description(), "failed");
        root.register_test_started("s", "worse");
        root.register_test_error("s", "worse", "e").unwrap();
        assert_eq!(root.state_description(), "error");
    }

    #[test]
    fn summary_pluralises_and_delivers_a_verdict() {
        let mut root = TestResults::new();
        root.register_test_started("s", "a");
        root.register_test_passed("s", "a").unwrap();
        assert!(root.summary().contains("Ran 1 test in "));
        assert!(root.summary().ends_with("OK\n"));

        root.register_test_started("s", "b");
        root.register_test_failed("s", "b", "nope").unwrap();
        let summary = root.summary();
        assert!(summary.contains("Ran 2 tests in "));
        assert!(summary.contains("FAIL: s.b"));
        assert!(summary.contains("FAILED (1 failure)"));
    }

    #[test]
    fn duration_covers_descendants() {
        let mut root = TestResults::new();
        let child = root.register_suite_started("s");
        child.register_test_started("s", "t");
        std::thread::sleep(Duration::from_millis(2));
        child.register_test_passed("s", "t").unwrap();
        root.register_suite_completed("s").unwrap();
        assert!(root.duration() >= root.children()[0].records()[0].duration().unwrap());
    }
}
