//! Success/failure policies.
//!
//! Every assertion evaluates its predicate the same way under both polarities
//! and hands a [`Claim`] to its strategy. [`Assert`] raises on `fail`,
//! [`AssertNot`] raises on `success`.

use std::fmt;

use crate::errors::{Exception, Outcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negated,
}

impl Polarity {
    /// The verb phrase joining subject and operation.
    pub fn connective(&self) -> &'static str {
        match self {
            Polarity::Positive => "to",
            Polarity::Negated => "not to",
        }
    }
}

/// The parts of an assertion message, rendered once the polarity is known:
/// `"{prefix}: Expected {actual} {to|not to} {operation} {expected}, {detail}"`.
#[derive(Debug, Clone, PartialEq)]
pub struct Claim {
    actual: String,
    operation: String,
    expected: Option<String>,
    detail: Option<String>,
    prefix: Option<String>,
}

impl Claim {
    pub fn new(actual: impl fmt::Display, operation: impl Into<String>) -> Self {
        Self {
            actual: actual.to_string(),
            operation: operation.into(),
            expected: None,
            detail: None,
            prefix: None,
        }
    }

    pub fn expected(mut self, expected: impl fmt::Display) -> Self {
        self.expected = Some(expected.to_string());
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn prefix(mut self, prefix: Option<String>) -> Self {
        self.prefix = prefix;
        self
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn render(&self, polarity: Polarity) -> String {
        let mut out = String::new();
        if let Some(prefix) = &self.prefix {
            out.push_str(prefix);
            out.push_str(": ");
        }
        out.push_str("Expected ");
        out.push_str(&self.actual);
        out.push(' ');
        out.push_str(polarity.connective());
        out.push(' ');
        out.push_str(&self.operation);
        if let Some(expected) = &self.expected {
            out.push(' ');
            out.push_str(expected);
        }
        if let Some(detail) = &self.detail {
            out.push_str(", ");
            out.push_str(detail);
        }
        out
    }
}

/// Decides what a satisfied or unsatisfied predicate means.
pub trait AssertionStrategy {
    fn polarity(&self) -> Polarity;

    /// Called when the predicate holds.
    fn success(&self, claim: Claim) -> Outcome;

    /// Called when the predicate does not hold.
    fn fail(&self, claim: Claim) -> Outcome;
}

/// Positive policy: failing predicates raise.
#[derive(Debug, Clone, Copy, Default)]
pub struct Assert;

impl AssertionStrategy for Assert {
    fn polarity(&self) -> Polarity {
        Polarity::Positive
    }

    fn success(&self, _claim: Claim) -> Outcome {
        Ok(())
    }

    fn fail(&self, claim: Claim) -> Outcome {
        Err(Exception::assertion(claim.render(Polarity::Positive)))
    }
}

/// Negated policy: satisfied predicates raise.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssertNot;

impl AssertionStrategy for AssertNot {
    fn polarity(&self) -> Polarity {
        Polarity::Negated
    }

    fn success(&self, claim: Claim) -> Outcome {
        Err(Exception::assertion(claim.render(Polarity::Negated)))
    }

    fn fail(&self, _claim: Claim) -> Outcome {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_every_part() {
        let claim = Claim::new(3, "equal")
            .expected(4)
            .detail("off by one")
            .prefix(Some("totals".into()));
        assert_eq!(
            claim.render(Polarity::Positive),
            "totals: Expected 3 to equal 4, off by one"
        );
        assert_eq!(
            claim.render(Polarity::Negated),
            "totals: Expected 3 not to equal 4, off by one"
        );
    }

    #[test]
    fn strategies_are_mirror_images() {
        let claim = || Claim::new(1, "equal").expected(1);
        assert!(Assert.success(claim()).is_ok());
        assert_eq!(
            Assert.fail(claim()).unwrap_err().message(),
            "Expected 1 to equal 1"
        );
        assert!(AssertNot.fail(claim()).is_ok());
        assert_eq!(
            AssertNot.success(claim()).unwrap_err().message(),
            "Expected 1 not to equal 1"
        );
    }
}
