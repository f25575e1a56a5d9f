//! # Expectations
//!
//! `registry.expect(value)` dispatches `value` to an assertion [`Family`]
//! and returns an [`Expect`]: the positive expectation plus its negated twin,
//! reachable through [`Expect::not`]. Both evaluate the same predicates; only
//! their [`AssertionStrategy`] differs.
//!
//! ## Module Structure
//!
//! - **`strategy`**: `Assert` / `AssertNot` and message rendering
//! - **`registry`**: dispatch rules and the built-in families
//! - **`default`**: assertions every value supports (`to_be`, `to_raise`, ...)
//! - **`numeric`**, **`text`**, **`container`**, **`dictionary`**, **`calls`**:
//!   family-specific assertions
//!
//! Every assertion returns `Ok(&self)` so modifiers like `times()` can chain.

use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use crate::errors::{Exception, Outcome, ATTRIBUTE_ERROR, TYPE_MISMATCH};
use crate::value::{Value, ValueKind};

mod calls;
mod container;
mod default;
mod dictionary;
mod numeric;
mod registry;
mod strategy;
mod text;

pub use default::RaiseOptions;
pub use numeric::{Tolerance, DEFAULT_RELATIVE_TOLERANCE};
pub use registry::{
    is_container, is_dictionary, is_numeric, is_spy, is_text, CustomExpectations,
    ExpectationFactory, ExpectationRegistry, Family, Predicate,
};
pub use strategy::{Assert, AssertNot, AssertionStrategy, Claim, Polarity};
pub use text::{line_diff, Pattern};

/// Shorthand for [`ExpectationRegistry::expect`].
pub fn expect<'r>(registry: &'r ExpectationRegistry, value: impl Into<Value>) -> Expect<'r> {
    registry.expect(value)
}

/// Per-expectation configuration. Always applied to both branches.
#[derive(Debug, Clone, Default)]
struct Settings {
    message: Option<String>,
    call_number: Option<usize>,
    tolerance: Option<Tolerance>,
}

/// One branch of an expectation: a shared actual value, its family and the
/// strategy deciding what a predicate outcome means.
pub struct Expectation<'r> {
    registry: &'r ExpectationRegistry,
    actual: Rc<Value>,
    family: Family,
    strategy: Rc<dyn AssertionStrategy>,
    settings: Settings,
}

impl<'r> Expectation<'r> {
    fn new(
        registry: &'r ExpectationRegistry,
        actual: Rc<Value>,
        family: Family,
        strategy: Rc<dyn AssertionStrategy>,
    ) -> Self {
        Self {
            registry,
            actual,
            family,
            strategy,
            settings: Settings::default(),
        }
    }

    pub fn actual(&self) -> &Value {
        &self.actual
    }

    pub fn actual_rc(&self) -> &Rc<Value> {
        &self.actual
    }

    pub fn family(&self) -> &Family {
        &self.family
    }

    pub fn polarity(&self) -> Polarity {
        self.strategy.polarity()
    }

    pub fn message(&self) -> Option<&str> {
        self.settings.message.as_deref()
    }

    pub fn call_number(&self) -> Option<usize> {
        self.settings.call_number
    }

    // ------------------------------------------------------------------------
    // Shared plumbing
    // ------------------------------------------------------------------------

    fn describe(&self, value: &Value) -> String {
        match &self.family {
            Family::Custom(custom) => custom.describe(value),
            _ => value.to_string(),
        }
    }

    fn claim(&self, operation: impl Into<String>) -> Claim {
        Claim::new(self.describe(&self.actual), operation).prefix(self.settings.message.clone())
    }

    fn verdict(&self, holds: bool, claim: Claim) -> Outcome<&Self> {
        if holds {
            self.strategy.success(claim)?;
        } else {
            self.strategy.fail(claim)?;
        }
        Ok(self)
    }

    fn with_prefix(&self, message: String) -> String {
        match &self.settings.message {
            Some(prefix) => format!("{}: {}", prefix, message),
            None => message,
        }
    }

    fn unsupported(&self, assertion: &str) -> Exception {
        Exception::new(
            &ATTRIBUTE_ERROR,
            self.with_prefix(format!(
                "{} expectations have no assertion '{}' (actual: {})",
                self.family.name(),
                assertion,
                self.actual
            )),
        )
    }

    /// Comparing values of incompatible kinds is a malformed test, raised
    /// whatever the polarity.
    fn ensure_comparable(&self, expected: &Value, operation: &str) -> Outcome {
        let (actual_kind, expected_kind) = (self.actual.kind(), expected.kind());
        if actual_kind.is_compatible_with(expected_kind) {
            return Ok(());
        }
        Err(Exception::type_mismatch(self.with_prefix(format!(
            "Cannot {} {} {} with {} {}",
            operation, actual_kind, self.actual, expected_kind, expected
        ))))
    }

    fn nested(&self, value: Value) -> Expect<'r> {
        let inner = self.registry.expect(value);
        match self.settings.tolerance {
            Some(tolerance) => inner.with_tolerance(tolerance),
            None => inner,
        }
    }

    /// Compares `actual` and `expected` through the registry, returning the
    /// nested message when they differ. Elements of different kinds differ.
    fn nested_mismatch(&self, actual: &Value, expected: &Value) -> Outcome<Option<String>> {
        match self.nested(actual.clone()).to_equal(expected.clone()) {
            Ok(_) => Ok(None),
            Err(e) if e.is_assertion() || e.is_instance_of(&TYPE_MISMATCH) => {
                Ok(Some(e.message().to_string()))
            }
            Err(e) => Err(e),
        }
    }

    // ------------------------------------------------------------------------
    // Assertions dispatched by family
    // ------------------------------------------------------------------------

    /// Equality, using the comparison of the dispatched family.
    pub fn to_equal(&self, expected: impl Into<Value>) -> Outcome<&Self> {
        let expected = expected.into();
        self.ensure_comparable(&expected, "compare")?;
        match &self.family {
            Family::Numeric => self.numeric_equal(&expected, self.tolerance()),
            Family::Text => self.text_equal(&expected),
            Family::Container => self.container_equal(&expected),
            Family::Dictionary => self.dictionary_equal(&expected),
            Family::Custom(custom) => {
                let holds = custom.equals(&self.actual, &expected);
                self.verdict(holds, self.claim("equal").expected(custom.describe(&expected)))
            }
            Family::Default | Family::Spy => self.default_equal(&expected),
        }
    }

    /// Substring for text, membership for lists, key presence for maps.
    pub fn to_contain(&self, item: impl Into<Value>) -> Outcome<&Self> {
        let item = item.into();
        match &self.family {
            Family::Text => self.text_contain(&item),
            Family::Container => self.container_contain(&item),
            Family::Dictionary => self.to_contain_key(item),
            _ => Err(self.unsupported("to_contain")),
        }
    }

    pub fn to_have_length(&self, length: usize) -> Outcome<&Self> {
        let actual_len = self.sized("to_have_length")?;
        let claim = self
            .claim("have length")
            .expected(length)
            .detail(format!("but its length is {}", actual_len));
        self.verdict(actual_len == length, claim)
    }

    pub fn to_be_empty(&self) -> Outcome<&Self> {
        let actual_len = self.sized("to_be_empty")?;
        let claim = self
            .claim("be empty")
            .detail(format!("but its length is {}", actual_len));
        self.verdict(actual_len == 0, claim)
    }

    fn sized(&self, assertion: &str) -> Outcome<usize> {
        match (&self.family, self.actual.len()) {
            (Family::Text | Family::Container | Family::Dictionary, Some(len)) => Ok(len),
            _ => Err(self.unsupported(assertion)),
        }
    }

    /// Chain terminator for readable phrasing: `called_exactly(1)?.time()`.
    pub fn time(&self) -> &Self {
        self
    }

    /// Chain terminator for readable phrasing: `called_exactly(2)?.times()`.
    pub fn times(&self) -> &Self {
        self
    }

    pub fn to_be_kind(&self, kind: ValueKind) -> Outcome<&Self> {
        let actual_kind = self.actual.kind();
        let claim = self
            .claim("be of kind")
            .expected(kind)
            .detail(format!("but it is {}", actual_kind));
        self.verdict(actual_kind == kind, claim)
    }
}

/// The result of `registry.expect(value)`: the positive expectation, with its
/// negated twin behind [`Expect::not`]. Configuration applies to both.
pub struct Expect<'r> {
    positive: Expectation<'r>,
    negated: Expectation<'r>,
}

impl<'r> Expect<'r> {
    fn new(positive: Expectation<'r>, negated: Expectation<'r>) -> Self {
        Self { positive, negated }
    }

    /// The negated expectation. It cannot be negated again.
    pub fn not(&self) -> &Expectation<'r> {
        &self.negated
    }

    fn configure(mut self, apply: impl Fn(&mut Settings)) -> Self {
        apply(&mut self.positive.settings);
        apply(&mut self.negated.settings);
        self
    }

    /// Prefixes every message raised by this expectation.
    pub fn with_message(self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.configure(|s| s.message = Some(message.clone()))
    }

    /// Restricts spy assertions to the `n`th call (1-based).
    pub fn for_call_number(self, n: usize) -> Self {
        self.configure(|s| s.call_number = Some(n))
    }

    /// Tolerance for numeric equality, including numbers nested in lists
    /// and maps.
    pub fn with_tolerance(self, tolerance: Tolerance) -> Self {
        self.configure(|s| s.tolerance = Some(tolerance))
    }
}

impl fmt::Debug for Expectation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expectation")
            .field("actual", &self.actual)
            .field("family", &self.family)
            .field("polarity", &self.polarity())
            .finish()
    }
}

impl fmt::Debug for Expect<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expect")
            .field("actual", &self.positive.actual)
            .field("family", &self.positive.family)
            .field("message", &self.positive.settings.message)
            .finish()
    }
}

impl<'r> Deref for Expect<'r> {
    type Target = Expectation<'r>;

    fn deref(&self) -> &Expectation<'r> {
        &self.positive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_is_mirrored_onto_not() {
        let registry = ExpectationRegistry::with_defaults();
        let e = registry.expect(1).with_message("totals").for_call_number(2);
        assert_eq!(e.message(), Some("totals"));
        assert_eq!(e.not().message(), Some("totals"));
        assert_eq!(e.not().call_number(), Some(2));
        assert_eq!(e.polarity(), Polarity::Positive);
        assert_eq!(e.not().polarity(), Polarity::Negated);
    }

    #[test]
    fn type_mismatch_ignores_polarity() {
        let registry = ExpectationRegistry::with_defaults();
        let e = registry.expect("1");
        let positive = e.to_equal(1).unwrap_err();
        let negated = e.not().to_equal(1).unwrap_err();
        assert!(positive.is_instance_of(&TYPE_MISMATCH));
        assert!(negated.is_instance_of(&TYPE_MISMATCH));
        assert!(!negated.is_assertion());
    }

    #[test]
    fn user_message_prefixes_failures() {
        let registry = ExpectationRegistry::with_defaults();
        let err = registry
            .expect(true)
            .with_message("flag")
            .to_be_falsy()
            .unwrap_err();
        assert_eq!(err.message(), "flag: Expected true to be falsy");
    }

    #[test]
    fn unsupported_assertions_name_the_family() {
        let registry = ExpectationRegistry::with_defaults();
        let err = registry.expect(true).to_have_length(1).unwrap_err();
        assert!(err.is_instance_of(&ATTRIBUTE_ERROR));
        assert!(err.message().contains("default expectations have no assertion 'to_have_length'"));
    }

    #[test]
    fn expectations_debug_without_the_registry() {
        let registry = ExpectationRegistry::with_defaults();
        let e = registry.expect(vec![1]);
        assert_eq!(
            format!("{:?}", e.not()),
            "Expectation { actual: [1], family: Family(container), polarity: Negated }"
        );
        let err = e.to_contain(2).unwrap_err();
        assert!(err.is_assertion());
    }

    #[test]
    fn elements_of_different_kinds_are_unequal() {
        let registry = ExpectationRegistry::with_defaults();
        let e = registry.expect(Value::list(vec![Value::from(1), Value::from("a")]));
        let reordered = || Value::list(vec![Value::from("a"), Value::from(1)]);
        e.not().to_equal(reordered()).unwrap();
        let err = e.to_equal(reordered()).unwrap_err();
        assert!(err.is_assertion());
        assert!(err.message().contains("but element [0] differs: Cannot compare number 1 with text \"a\""));

        let m = registry.expect(Value::map([("k", 1)]));
        m.not().to_equal(Value::map([("k", "1")])).unwrap();
    }

    #[test]
    fn length_checks_cover_all_sized_families() {
        let registry = ExpectationRegistry::with_defaults();
        registry.expect("héllo").to_have_length(5).unwrap();
        registry.expect(vec![1, 2]).to_have_length(2).unwrap();
        registry.expect(Value::map([("a", 1)])).not().to_be_empty().unwrap();
        registry.expect(Vec::<i64>::new()).to_be_empty().unwrap();
    }
}
