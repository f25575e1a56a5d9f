//! Run configuration and the top-level runner.

use termcolor::{ColorChoice, StandardStream};
use tracing::{debug, info};

use crate::errors::ResultsError;
use crate::expect::{ExpectationRegistry, Tolerance};
use crate::reporter::{DotReporter, Reporter, SilentReporter, VerboseReporter};
use crate::results::TestResults;
use crate::suite::Suite;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// No console output.
    Quiet,
    #[default]
    Dots,
    Verbose,
}

/// Configuration for a test run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub use_colors: bool,
    pub verbosity: Verbosity,
    /// Turn panics in tests and hooks into errors instead of aborting.
    pub catch_panics: bool,
    pub default_tolerance: Tolerance,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            use_colors: atty::is(atty::Stream::Stderr),
            verbosity: Verbosity::default(),
            catch_panics: true,
            default_tolerance: Tolerance::default(),
        }
    }
}

impl RunConfig {
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_catch_panics(mut self, catch_panics: bool) -> Self {
        self.catch_panics = catch_panics;
        self
    }

    pub fn with_default_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.default_tolerance = tolerance;
        self
    }

    pub fn color_choice(&self) -> ColorChoice {
        if self.use_colors {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        }
    }

    /// A registry with the built-in families and this run's tolerance.
    pub fn registry(&self) -> ExpectationRegistry {
        ExpectationRegistry::with_defaults().with_default_tolerance(self.default_tolerance)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Runner {
    config: RunConfig,
}

impl Runner {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// The console reporter matching the configured verbosity, on stderr.
    pub fn reporter(&self) -> Box<dyn Reporter> {
        let stream = StandardStream::stderr(self.config.color_choice());
        match self.config.verbosity {
            Verbosity::Quiet => Box::new(SilentReporter),
            Verbosity::Dots => Box::new(DotReporter::new(stream)),
            Verbosity::Verbose => Box::new(VerboseReporter::new(stream)),
        }
    }

    /// Runs `suite` with the configured console reporter.
    pub fn run(&self, suite: &Suite) -> Result<TestResults, ResultsError> {
        let mut reporter = self.reporter();
        self.run_with(suite, reporter.as_mut())
    }

    /// Runs `suite`, reporting to `reporter`. Test failures end up in the
    /// returned tree; only result-tree misuse is an `Err`.
    pub fn run_with(&self, suite: &Suite, reporter: &mut dyn Reporter) -> Result<TestResults, ResultsError> {
        let mut results = TestResults::new();
        info!(suite = suite.suite_name(), tests = suite.count_tests(), "starting test run");
        suite.run_with(&mut results, reporter, self.config.catch_panics)?;
        results.mark_finished();
        debug!(
            passes = results.count_passes(),
            failures = results.count_failures(),
            errors = results.count_errors(),
            ignored = results.count_ignored(),
            "test run finished"
        );
        reporter.run_finished(&results);
        Ok(results)
    }
}
