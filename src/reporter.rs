//! Console reporting.
//!
//! Reporters observe a run through the [`Reporter`] callbacks. The built-in
//! ones write to any [`termcolor::WriteColor`], so tests can capture their
//! output with [`termcolor::NoColor`] or [`termcolor::Buffer`].

use std::io;

use termcolor::{Color, ColorSpec, WriteColor};

use crate::results::{TestRecord, TestResults, TestState};

/// Callbacks fired while a suite runs. All default to doing nothing.
pub trait Reporter {
    fn suite_started(&mut self, _name: &str, _results: &TestResults) {}

    fn suite_completed(&mut self, _name: &str, _results: &TestResults) {}

    fn test_started(&mut self, _suite: &str, _test: &str) {}

    fn test_finished(&mut self, _record: &TestRecord, _results: &TestResults) {}

    fn run_finished(&mut self, _results: &TestResults) {}
}

/// Reports nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl Reporter for SilentReporter {}

fn state_color(state: TestState) -> Option<Color> {
    match state {
        TestState::Passed => Some(Color::Green),
        TestState::Failed | TestState::Error => Some(Color::Red),
        TestState::Ignored => Some(Color::Yellow),
        TestState::Unstarted => None,
    }
}

fn write_colored<W: WriteColor>(out: &mut W, color: Option<Color>, bold: bool, text: &str) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(color).set_bold(bold))?;
    write!(out, "{}", text)?;
    out.reset()
}

/// Writes the run summary, colouring diff lines inside traces and the
/// closing verdict.
pub fn write_summary<W: WriteColor>(out: &mut W, results: &TestResults) -> io::Result<()> {
    for line in results.summary().lines() {
        let is_rule = line.chars().all(|c| c == '-' || c == '=');
        let color = if line.starts_with("OK") {
            Some((Color::Green, true))
        } else if line.starts_with("FAILED") {
            Some((Color::Red, true))
        } else if is_rule {
            None
        } else if line.starts_with('+') {
            Some((Color::Green, false))
        } else if line.starts_with('-') {
            Some((Color::Red, false))
        } else {
            None
        };
        match color {
            Some((color, bold)) => write_colored(out, Some(color), bold, line)?,
            None => write!(out, "{}", line)?,
        }
        writeln!(out)?;
    }
    Ok(())
}

// ============================================================================
// DOTS
// ============================================================================

/// One glyph per test: `.` passed, `F` failed, `E` error, `s` ignored.
pub struct DotReporter<W: WriteColor> {
    out: W,
}

impl<W: WriteColor> DotReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn glyph(state: TestState) -> &'static str {
        match state {
            TestState::Passed => ".",
            TestState::Failed => "F",
            TestState::Error => "E",
            TestState::Ignored => "s",
            TestState::Unstarted => "?",
        }
    }
}

impl<W: WriteColor> Reporter for DotReporter<W> {
    fn test_finished(&mut self, record: &TestRecord, _results: &TestResults) {
        let state = record.state();
        let _ = write_colored(&mut self.out, state_color(state), false, Self::glyph(state));
        let _ = self.out.flush();
    }

    fn run_finished(&mut self, results: &TestResults) {
        let _ = writeln!(self.out);
        let _ = writeln!(self.out);
        let _ = write_summary(&mut self.out, results);
        let _ = self.out.flush();
    }
}

// ============================================================================
// VERBOSE
// ============================================================================

/// Suite names and one line per test, indented by nesting depth.
pub struct VerboseReporter<W: WriteColor> {
    out: W,
}

impl<W: WriteColor> VerboseReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: WriteColor> Reporter for VerboseReporter<W> {
    fn suite_started(&mut self, name: &str, results: &TestResults) {
        let indent = "  ".repeat(results.active_depth().saturating_sub(1));
        let _ = writeln!(self.out, "{}{}", indent, name);
    }

    fn test_finished(&mut self, record: &TestRecord, results: &TestResults) {
        let indent = "  ".repeat(results.active_depth());
        let state = record.state();
        let _ = write!(self.out, "{}{} ... ", indent, record.test());
        let _ = write_colored(&mut self.out, state_color(state), true, state.as_str());
        let _ = writeln!(self.out);
    }

    fn run_finished(&mut self, results: &TestResults) {
        let _ = writeln!(self.out);
        let _ = write_summary(&mut self.out, results);
        let _ = self.out.flush();
    }
}
