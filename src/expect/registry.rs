//! The expectation registry: an ordered stack of (predicate, family) rules.
//!
//! ## Registry Invariant
//! Lookup scans from the most recently registered rule to the oldest and the
//! first matching predicate wins. The default family is a catch-all below the
//! stack; it can be shadowed but never removed, so every value dispatches.

use std::fmt;
use std::rc::Rc;

use tracing::debug;

use super::numeric::{Tolerance, DEFAULT_RELATIVE_TOLERANCE};
use super::strategy::{Assert, AssertNot, AssertionStrategy};
use super::{Expect, Expectation};
use crate::value::Value;

pub type Predicate = Rc<dyn Fn(&Value) -> bool>;

/// Equality and formatting for a user-defined family of values.
pub trait CustomExpectations {
    fn name(&self) -> &str;

    fn equals(&self, actual: &Value, expected: &Value) -> bool;

    fn describe(&self, value: &Value) -> String {
        value.to_string()
    }
}

/// The assertion family an expectation dispatches to.
#[derive(Clone)]
pub enum Family {
    Default,
    Numeric,
    Text,
    Container,
    Dictionary,
    Spy,
    Custom(Rc<dyn CustomExpectations>),
}

impl Family {
    pub fn name(&self) -> &str {
        match self {
            Family::Default => "default",
            Family::Numeric => "numeric",
            Family::Text => "text",
            Family::Container => "container",
            Family::Dictionary => "dictionary",
            Family::Spy => "spy",
            Family::Custom(custom) => custom.name(),
        }
    }
}

impl fmt::Debug for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Family({})", self.name())
    }
}

/// One dispatch rule.
#[derive(Clone)]
pub struct ExpectationFactory {
    predicate: Predicate,
    family: Family,
}

impl ExpectationFactory {
    pub fn new(predicate: impl Fn(&Value) -> bool + 'static, family: Family) -> Self {
        Self {
            predicate: Rc::new(predicate),
            family,
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        (self.predicate)(value)
    }

    pub fn family(&self) -> &Family {
        &self.family
    }
}

impl fmt::Debug for ExpectationFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpectationFactory")
            .field("family", &self.family)
            .finish()
    }
}

// ============================================================================
// Built-in predicates
// ============================================================================

pub fn is_numeric(value: &Value) -> bool {
    matches!(value, Value::Int(_) | Value::Float(_) | Value::Duration(_))
}

pub fn is_text(value: &Value) -> bool {
    matches!(value, Value::Text(_))
}

pub fn is_container(value: &Value) -> bool {
    matches!(value, Value::List(_))
}

pub fn is_dictionary(value: &Value) -> bool {
    matches!(value, Value::Map(_))
}

pub fn is_spy(value: &Value) -> bool {
    matches!(value, Value::Spy(_))
}

// ============================================================================
// Registry
// ============================================================================

/// Maps a value's shape to the assertion family used to test it.
///
/// # Example
/// ```rust
/// use verity::ExpectationRegistry;
/// let registry = ExpectationRegistry::with_defaults();
/// registry.expect(3).to_be_greater_than(2).unwrap();
/// registry.expect("abc").not().to_start_with("b").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ExpectationRegistry {
    factories: Vec<ExpectationFactory>,
    fallback: Family,
    default_tolerance: Tolerance,
}

impl Default for ExpectationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpectationRegistry {
    /// A registry holding only the catch-all default family.
    pub fn new() -> Self {
        Self {
            factories: Vec::new(),
            fallback: Family::Default,
            default_tolerance: Tolerance::Relative(DEFAULT_RELATIVE_TOLERANCE),
        }
    }

    /// A registry seeded with the built-in families. Later entries shadow
    /// earlier ones.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register(is_text, Family::Text)
            .register(is_dictionary, Family::Dictionary)
            .register(is_container, Family::Container)
            .register(is_numeric, Family::Numeric)
            .register(is_spy, Family::Spy);
        registry
    }

    /// Tolerance used by numeric equality when none is given.
    pub fn with_default_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.default_tolerance = tolerance;
        self
    }

    pub fn default_tolerance(&self) -> Tolerance {
        self.default_tolerance
    }

    /// Pushes a rule on top of the stack. Not idempotent: registering the
    /// same family twice grows the stack and the newest rule wins.
    pub fn register(
        &mut self,
        predicate: impl Fn(&Value) -> bool + 'static,
        family: Family,
    ) -> &mut Self {
        debug!(family = family.name(), depth = self.factories.len() + 1, "registering expectation rule");
        self.factories.push(ExpectationFactory::new(predicate, family));
        self
    }

    /// Removes the most recent rule. The catch-all cannot be removed.
    pub fn pop(&mut self) -> Option<ExpectationFactory> {
        self.factories.pop()
    }

    /// Number of rules, the catch-all included.
    pub fn len(&self) -> usize {
        self.factories.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn family_for(&self, value: &Value) -> &Family {
        self.factories
            .iter()
            .rev()
            .find(|factory| factory.matches(value))
            .map_or(&self.fallback, ExpectationFactory::family)
    }

    /// Builds the expectation for `value`: a positive expectation whose
    /// `not()` is the same family bound to the negated strategy. Both share
    /// one `actual`.
    pub fn expect(&self, value: impl Into<Value>) -> Expect<'_> {
        let actual = Rc::new(value.into());
        let family = self.family_for(&actual).clone();
        debug!(family = family.name(), actual = %actual, "dispatching expectation");
        let strategy: Rc<dyn AssertionStrategy> = Rc::new(Assert);
        let reverse: Rc<dyn AssertionStrategy> = Rc::new(AssertNot);
        let negated = Expectation::new(self, Rc::clone(&actual), family.clone(), reverse);
        let positive = Expectation::new(self, actual, family, strategy);
        Expect::new(positive, negated)
    }
}
