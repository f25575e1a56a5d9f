//! Numeric assertions. Integers, floats and durations (in seconds) compare
//! with each other; equality is tolerance based.

use std::fmt;

use super::{Expectation, Family};
use crate::errors::Outcome;
use crate::value::Value;

pub const DEFAULT_RELATIVE_TOLERANCE: f64 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tolerance {
    /// Scaled by the larger magnitude of the two operands.
    Relative(f64),
    Absolute(f64),
}

impl Tolerance {
    /// Whether `a` and `b` are equal under this tolerance. Exactly equal
    /// values (zero against zero included) always are.
    pub fn accepts(&self, a: f64, b: f64) -> bool {
        if a == b {
            return true;
        }
        let diff = (a - b).abs();
        match *self {
            Tolerance::Relative(tol) => {
                diff <= tol * a.abs().max(b.abs()).max(f64::MIN_POSITIVE)
            }
            Tolerance::Absolute(tol) => diff <= tol,
        }
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance::Relative(DEFAULT_RELATIVE_TOLERANCE)
    }
}

impl fmt::Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tolerance::Relative(tol) => write!(f, "within relative tolerance {:e}", tol),
            Tolerance::Absolute(tol) => write!(f, "within absolute tolerance {}", tol),
        }
    }
}

impl<'r> Expectation<'r> {
    pub(super) fn tolerance(&self) -> Tolerance {
        self.settings
            .tolerance
            .unwrap_or_else(|| self.registry.default_tolerance())
    }

    pub(super) fn numeric_equal(&self, expected: &Value, tolerance: Tolerance) -> Outcome<&Self> {
        let holds = match (self.actual.as_f64(), expected.as_f64()) {
            (Some(a), Some(b)) => tolerance.accepts(a, b),
            _ => false,
        };
        let claim = self
            .claim("equal")
            .expected(expected)
            .detail(tolerance.to_string());
        self.verdict(holds, claim)
    }

    fn require_numeric(&self, assertion: &str) -> Outcome {
        match self.family {
            Family::Numeric => Ok(()),
            _ => Err(self.unsupported(assertion)),
        }
    }

    /// Equality under an explicit tolerance.
    pub fn to_equal_within(&self, expected: impl Into<Value>, tolerance: Tolerance) -> Outcome<&Self> {
        self.require_numeric("to_equal_within")?;
        let expected = expected.into();
        self.ensure_comparable(&expected, "compare")?;
        self.numeric_equal(&expected, tolerance)
    }

    fn compare(
        &self,
        assertion: &str,
        operation: &str,
        bound: Value,
        holds: impl Fn(f64, f64) -> bool,
    ) -> Outcome<&Self> {
        self.require_numeric(assertion)?;
        self.ensure_comparable(&bound, "compare")?;
        let holds = match (self.actual.as_f64(), bound.as_f64()) {
            (Some(a), Some(b)) => holds(a, b),
            _ => false,
        };
        self.verdict(holds, self.claim(operation).expected(&bound))
    }

    pub fn to_be_greater_than(&self, bound: impl Into<Value>) -> Outcome<&Self> {
        self.compare("to_be_greater_than", "be greater than", bound.into(), |a, b| a > b)
    }

    pub fn to_be_greater_than_or_equal(&self, bound: impl Into<Value>) -> Outcome<&Self> {
        self.compare(
            "to_be_greater_than_or_equal",
            "be greater than or equal to",
            bound.into(),
            |a, b| a >= b,
        )
    }

    pub fn to_be_less_than(&self, bound: impl Into<Value>) -> Outcome<&Self> {
        self.compare("to_be_less_than", "be less than", bound.into(), |a, b| a < b)
    }

    pub fn to_be_less_than_or_equal(&self, bound: impl Into<Value>) -> Outcome<&Self> {
        self.compare(
            "to_be_less_than_or_equal",
            "be less than or equal to",
            bound.into(),
            |a, b| a <= b,
        )
    }

    /// Inclusive on both ends.
    pub fn to_be_between(&self, low: impl Into<Value>, high: impl Into<Value>) -> Outcome<&Self> {
        self.require_numeric("to_be_between")?;
        let (low, high) = (low.into(), high.into());
        self.ensure_comparable(&low, "compare")?;
        self.ensure_comparable(&high, "compare")?;
        let holds = match (self.actual.as_f64(), low.as_f64(), high.as_f64()) {
            (Some(a), Some(lo), Some(hi)) => lo <= a && a <= hi,
            _ => false,
        };
        let claim = self.claim("be between").expected(format!("{} and {}", low, high));
        self.verdict(holds, claim)
    }
}
