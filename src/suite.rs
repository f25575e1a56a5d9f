//! Runnable test trees.
//!
//! A [`Suite`] holds cases and nested suites plus optional hooks. Running a
//! suite records every outcome into a [`TestResults`] tree and notifies a
//! [`Reporter`]; test failures never propagate out of [`Suite::run`], only
//! result-tree misuse does.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, trace, warn};

use crate::errors::{Exception, Outcome, ResultsError, PANIC};
use crate::reporter::Reporter;
use crate::results::{TestResults, AFTER_CLASS, BEFORE_CLASS};

pub type Hook = Box<dyn Fn() -> Outcome>;

/// Runs `f`, turning a panic into a `Panic` exception when `catch` is set.
fn guarded(catch: bool, f: &dyn Fn() -> Outcome) -> Outcome {
    if !catch {
        return f();
    }
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        Err(Exception::new(&PANIC, panic_message(payload.as_ref())))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "test panicked".to_string()
    }
}

/// How one test ended, before it is written into the result tree.
enum Verdict {
    Passed,
    Failed(String),
    Error(String),
    Ignored,
}

impl Verdict {
    fn of(outcome: Outcome) -> Self {
        match outcome {
            Ok(()) => Verdict::Passed,
            Err(e) if e.is_skip() => Verdict::Ignored,
            Err(e) if e.is_assertion() => Verdict::Failed(e.trace()),
            Err(e) => Verdict::Error(e.trace()),
        }
    }

    /// Hook faults are errors even when they are assertion failures.
    fn of_hook(outcome: Outcome) -> Option<Self> {
        match outcome {
            Ok(()) => None,
            Err(e) if e.is_skip() => Some(Verdict::Ignored),
            Err(e) => Some(Verdict::Error(e.trace())),
        }
    }
}

/// Each-test hooks and panic policy handed down by the enclosing suite.
#[derive(Clone, Copy)]
pub struct Fixture<'a> {
    before_each: Option<&'a Hook>,
    after_each: Option<&'a Hook>,
    catch_panics: bool,
}

impl Default for Fixture<'_> {
    fn default() -> Self {
        Self::catching_panics(true)
    }
}

impl Fixture<'_> {
    /// No each-test hooks.
    pub fn catching_panics(catch_panics: bool) -> Self {
        Self {
            before_each: None,
            after_each: None,
            catch_panics,
        }
    }
}

// ============================================================================
// CASE
// ============================================================================

/// A single test.
pub struct Case {
    suite: String,
    name: String,
    body: Hook,
    ignored: Option<String>,
}

impl Case {
    pub fn new(
        suite: impl Into<String>,
        name: impl Into<String>,
        body: impl Fn() -> Outcome + 'static,
    ) -> Self {
        Self {
            suite: suite.into(),
            name: name.into(),
            body: Box::new(body),
            ignored: None,
        }
    }

    /// Marks the case as ignored; its body is never run.
    pub fn ignore(mut self, reason: impl Into<String>) -> Self {
        self.ignored = Some(reason.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn suite_name(&self) -> &str {
        &self.suite
    }

    pub fn count_tests(&self) -> usize {
        1
    }

    pub fn run(&self, results: &mut TestResults, reporter: &mut dyn Reporter) -> Result<(), ResultsError> {
        self.run_with(results, reporter, Fixture::default())
    }

    pub fn run_with(
        &self,
        results: &mut TestResults,
        reporter: &mut dyn Reporter,
        fixture: Fixture<'_>,
    ) -> Result<(), ResultsError> {
        results.register_test_started(&self.suite, &self.name);
        reporter.test_started(&self.suite, &self.name);
        let verdict = match &self.ignored {
            Some(reason) => {
                debug!(suite = %self.suite, test = %self.name, reason = %reason, "test ignored");
                Verdict::Ignored
            }
            None => self.execute(fixture),
        };
        self.record(results, reporter, verdict)
    }

    fn execute(&self, fixture: Fixture<'_>) -> Verdict {
        let catch = fixture.catch_panics;
        if let Some(hook) = fixture.before_each {
            if let Some(verdict) = Verdict::of_hook(guarded(catch, hook.as_ref())) {
                warn!(suite = %self.suite, test = %self.name, "before-each hook failed");
                return verdict;
            }
        }
        let verdict = Verdict::of(guarded(catch, self.body.as_ref()));
        let Some(hook) = fixture.after_each else {
            return verdict;
        };
        match (Verdict::of_hook(guarded(catch, hook.as_ref())), verdict) {
            (Some(Verdict::Error(trace)), Verdict::Passed) => {
                warn!(suite = %self.suite, test = %self.name, "after-each hook failed");
                Verdict::Error(trace)
            }
            (Some(Verdict::Ignored), verdict) => {
                debug!(suite = %self.suite, test = %self.name, "after-each hook skipped");
                verdict
            }
            (Some(_), verdict) => {
                warn!(suite = %self.suite, test = %self.name, "after-each hook failed after the test had already finished badly");
                verdict
            }
            (None, verdict) => verdict,
        }
    }

    fn record(
        &self,
        results: &mut TestResults,
        reporter: &mut dyn Reporter,
        verdict: Verdict,
    ) -> Result<(), ResultsError> {
        let (suite, test) = (self.suite.as_str(), self.name.as_str());
        let record = match verdict {
            Verdict::Passed => results.register_test_passed(suite, test)?,
            Verdict::Failed(trace) => results.register_test_failed(suite, test, trace)?,
            Verdict::Error(trace) => results.register_test_error(suite, test, trace)?,
            Verdict::Ignored => results.register_test_ignored(suite, test)?,
        }
        .clone();
        trace!(suite, test, state = %record.state(), "recorded");
        reporter.test_finished(&record, results);
        Ok(())
    }
}

impl fmt::Debug for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Case")
            .field("suite", &self.suite)
            .field("name", &self.name)
            .field("ignored", &self.ignored)
            .finish()
    }
}

// ============================================================================
// SUITE
// ============================================================================

#[derive(Debug)]
pub enum Node {
    Case(Case),
    Suite(Suite),
}

impl Node {
    pub fn count_tests(&self) -> usize {
        match self {
            Node::Case(case) => case.count_tests(),
            Node::Suite(suite) => suite.count_tests(),
        }
    }
}

impl From<Case> for Node {
    fn from(case: Case) -> Self {
        Node::Case(case)
    }
}

impl From<Suite> for Node {
    fn from(suite: Suite) -> Self {
        Node::Suite(suite)
    }
}

/// An ordered group of cases and nested suites. Each-test hooks apply to
/// the suite's own cases; nested suites bring their own.
pub struct Suite {
    name: String,
    children: Vec<Node>,
    before_all: Option<Hook>,
    after_all: Option<Hook>,
    before_each: Option<Hook>,
    after_each: Option<Hook>,
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            before_all: None,
            after_all: None,
            before_each: None,
            after_each: None,
        }
    }

    pub fn add(&mut self, child: impl Into<Node>) -> &mut Self {
        self.children.push(child.into());
        self
    }

    /// Adds a case named `name` belonging to this suite.
    pub fn case(mut self, name: impl Into<String>, body: impl Fn() -> Outcome + 'static) -> Self {
        let case = Case::new(self.name.clone(), name, body);
        self.add(case);
        self
    }

    pub fn with(mut self, child: impl Into<Node>) -> Self {
        self.add(child);
        self
    }

    pub fn before_all(mut self, hook: impl Fn() -> Outcome + 'static) -> Self {
        self.before_all = Some(Box::new(hook));
        self
    }

    pub fn after_all(mut self, hook: impl Fn() -> Outcome + 'static) -> Self {
        self.after_all = Some(Box::new(hook));
        self
    }

    pub fn before_each(mut self, hook: impl Fn() -> Outcome + 'static) -> Self {
        self.before_each = Some(Box::new(hook));
        self
    }

    pub fn after_each(mut self, hook: impl Fn() -> Outcome + 'static) -> Self {
        self.after_each = Some(Box::new(hook));
        self
    }

    pub fn suite_name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn count_tests(&self) -> usize {
        self.children.iter().map(Node::count_tests).sum()
    }

    pub fn run(&self, results: &mut TestResults, reporter: &mut dyn Reporter) -> Result<(), ResultsError> {
        self.run_with(results, reporter, true)
    }

    pub fn run_with(
        &self,
        results: &mut TestResults,
        reporter: &mut dyn Reporter,
        catch_panics: bool,
    ) -> Result<(), ResultsError> {
        results.register_suite_started(&self.name);
        reporter.suite_started(&self.name, results);
        debug!(suite = %self.name, tests = self.count_tests(), "running suite");

        let setup = match &self.before_all {
            Some(hook) => Verdict::of_hook(guarded(catch_panics, hook.as_ref())),
            None => None,
        };
        match setup {
            None => {
                self.run_children(results, reporter, catch_panics)?;
                self.tear_down(results, reporter, catch_panics)?;
            }
            Some(verdict) => {
                warn!(suite = %self.name, "before-all hook failed; no test in the suite runs");
                if self.count_tests() == 0 {
                    let fallback = Case::new(self.name.clone(), BEFORE_CLASS, || Ok(()));
                    fallback.mark(results, reporter, &verdict, true)?;
                } else {
                    self.mark_all(results, reporter, &verdict)?;
                }
            }
        }

        results.register_suite_completed(&self.name)?;
        reporter.suite_completed(&self.name, results);
        Ok(())
    }

    fn run_children(
        &self,
        results: &mut TestResults,
        reporter: &mut dyn Reporter,
        catch_panics: bool,
    ) -> Result<(), ResultsError> {
        let fixture = Fixture {
            before_each: self.before_each.as_ref(),
            after_each: self.after_each.as_ref(),
            catch_panics,
        };
        for child in &self.children {
            match child {
                Node::Case(case) => case.run_with(results, reporter, fixture)?,
                Node::Suite(suite) => suite.run_with(results, reporter, catch_panics)?,
            }
        }
        Ok(())
    }

    /// A failing after-all hook adds one `afterClass` error, a skipping one an
    /// ignored `afterClass`; results already recorded are left alone.
    fn tear_down(
        &self,
        results: &mut TestResults,
        reporter: &mut dyn Reporter,
        catch_panics: bool,
    ) -> Result<(), ResultsError> {
        let Some(hook) = &self.after_all else {
            return Ok(());
        };
        let record = match Verdict::of_hook(guarded(catch_panics, hook.as_ref())) {
            Some(Verdict::Error(trace)) => {
                warn!(suite = %self.name, "after-all hook failed");
                results.register_test_error(&self.name, AFTER_CLASS, trace)?
            }
            Some(Verdict::Ignored) => {
                debug!(suite = %self.name, "after-all hook skipped");
                results.register_test_ignored(&self.name, AFTER_CLASS)?
            }
            _ => return Ok(()),
        }
        .clone();
        reporter.test_finished(&record, results);
        Ok(())
    }

    /// Gives every case below this suite the before-all verdict, keeping the
    /// nested suite structure.
    fn mark_all(
        &self,
        results: &mut TestResults,
        reporter: &mut dyn Reporter,
        verdict: &Verdict,
    ) -> Result<(), ResultsError> {
        for child in &self.children {
            match child {
                Node::Case(case) => case.mark(results, reporter, verdict, false)?,
                Node::Suite(suite) => {
                    results.register_suite_started(&suite.name);
                    reporter.suite_started(&suite.name, results);
                    suite.mark_all(results, reporter, verdict)?;
                    results.register_suite_completed(&suite.name)?;
                    reporter.suite_completed(&suite.name, results);
                }
            }
        }
        Ok(())
    }
}

impl Case {
    /// Records `verdict` for this case without running it. Lifecycle phases
    /// are recorded without a start.
    fn mark(
        &self,
        results: &mut TestResults,
        reporter: &mut dyn Reporter,
        verdict: &Verdict,
        lifecycle: bool,
    ) -> Result<(), ResultsError> {
        if !lifecycle {
            results.register_test_started(&self.suite, &self.name);
            reporter.test_started(&self.suite, &self.name);
        }
        let verdict = match verdict {
            Verdict::Error(trace) => Verdict::Error(trace.clone()),
            Verdict::Failed(trace) => Verdict::Error(trace.clone()),
            Verdict::Ignored | Verdict::Passed => Verdict::Ignored,
        };
        self.record(results, reporter, verdict)
    }
}

impl fmt::Debug for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suite")
            .field("name", &self.name)
            .field("children", &self.children)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{skip, VALUE_ERROR};
    use crate::reporter::SilentReporter;
    use crate::results::TestState;

    #[test]
    fn verdicts_follow_the_exception_class() {
        assert!(matches!(Verdict::of(Ok(())), Verdict::Passed));
        assert!(matches!(Verdict::of(skip("later")), Verdict::Ignored));
        assert!(matches!(
            Verdict::of(Err(Exception::assertion("x"))),
            Verdict::Failed(_)
        ));
        assert!(matches!(
            Verdict::of(Err(Exception::new(&VALUE_ERROR, "x"))),
            Verdict::Error(_)
        ));
        assert!(matches!(
            Verdict::of_hook(Err(Exception::assertion("x"))),
            Some(Verdict::Error(_))
        ));
    }

    #[test]
    fn panics_become_errors() {
        let outcome = guarded(true, &|| -> Outcome { panic!("kaboom") });
        let err = outcome.unwrap_err();
        assert!(err.is_instance_of(&PANIC));
        assert_eq!(err.message(), "kaboom");
    }

    #[test]
    fn counts_nest() {
        let inner = Suite::new("inner").case("a", || Ok(())).case("b", || Ok(()));
        let outer = Suite::new("outer").case("c", || Ok(())).with(inner);
        assert_eq!(outer.count_tests(), 3);
        assert_eq!(outer.children().len(), 2);
    }

    #[test]
    fn ignored_cases_never_run() {
        let suite = Suite::new("s").with(
            Case::new("s", "todo", || panic!("must not run")).ignore("not ready"),
        );
        let mut results = TestResults::new();
        suite.run(&mut results, &mut SilentReporter).unwrap();
        assert_eq!(results.count_ignored(), 1);
        assert_eq!(results.all_records()[0].state(), TestState::Ignored);
    }

    #[test]
    fn skipping_after_hooks_are_not_failures() {
        let suite = Suite::new("s")
            .after_each(|| skip("nothing to clean"))
            .after_all(|| skip("no shared state"))
            .case("ok", || Ok(()));
        let mut results = TestResults::new();
        suite.run(&mut results, &mut SilentReporter).unwrap();
        assert_eq!(results.count_tests(), 2);
        assert_eq!(results.count_passes(), 1);
        assert_eq!(results.count_ignored(), 1);
        let records = results.all_records();
        assert_eq!(records[0].state(), TestState::Passed);
        assert_eq!(records[1].test(), AFTER_CLASS);
        assert_eq!(records[1].state(), TestState::Ignored);
        assert!(results.was_successful());
    }

    #[test]
    fn before_all_failure_without_cases_records_before_class() {
        let suite = Suite::new("empty").before_all(|| Err(Exception::new(&VALUE_ERROR, "setup")));
        let mut results = TestResults::new();
        suite.run(&mut results, &mut SilentReporter).unwrap();
        assert_eq!(results.count_errors(), 1);
        assert_eq!(results.all_records()[0].test(), BEFORE_CLASS);
    }
}
