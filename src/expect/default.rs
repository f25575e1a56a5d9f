//! Assertions every value supports, whatever family it dispatches to.

use super::{Expectation, Pattern};
use crate::errors::{Exception, ExceptionClass, Outcome, TYPE_ERROR};
use crate::value::{Args, Value};

/// Extra conditions on the exception expected by
/// [`Expectation::to_raise_with`].
#[derive(Debug, Clone, Default)]
pub struct RaiseOptions {
    pub expected_message: Option<String>,
    pub expected_message_matches: Option<Pattern>,
}

impl RaiseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// The exception message must equal `message` exactly.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.expected_message = Some(message.into());
        self
    }

    /// The exception message must contain a match for `pattern`.
    pub fn matching(mut self, pattern: impl Into<Pattern>) -> Self {
        self.expected_message_matches = Some(pattern.into());
        self
    }

    fn describe(&self) -> String {
        let mut out = String::new();
        if let Some(message) = &self.expected_message {
            out.push_str(&format!(" with message {:?}", message));
        }
        if let Some(pattern) = &self.expected_message_matches {
            out.push_str(&format!(" with message matching {}", pattern));
        }
        out
    }
}

impl<'r> Expectation<'r> {
    pub(super) fn default_equal(&self, expected: &Value) -> Outcome<&Self> {
        let holds = *self.actual == *expected;
        self.verdict(holds, self.claim("equal").expected(expected))
    }

    /// Identity: spies and callables must be the same handle.
    pub fn to_be(&self, expected: impl Into<Value>) -> Outcome<&Self> {
        let expected = expected.into();
        let holds = self.actual.is_identical(&expected);
        self.verdict(holds, self.claim("be").expected(&expected))
    }

    pub fn to_be_truthy(&self) -> Outcome<&Self> {
        self.verdict(self.actual.is_truthy(), self.claim("be truthy"))
    }

    pub fn to_be_falsy(&self) -> Outcome<&Self> {
        self.verdict(!self.actual.is_truthy(), self.claim("be falsy"))
    }

    pub fn to_be_nil(&self) -> Outcome<&Self> {
        self.verdict(self.actual.is_nil(), self.claim("be nil"))
    }

    /// Arbitrary predicate; `description` completes "Expected x to ...".
    pub fn to_satisfy(
        &self,
        description: &str,
        predicate: impl Fn(&Value) -> bool,
    ) -> Outcome<&Self> {
        let holds = predicate(&self.actual);
        self.verdict(holds, self.claim(description))
    }

    pub fn to_raise(&self, class: &'static ExceptionClass) -> Outcome<&Self> {
        self.to_raise_with(class, RaiseOptions::default())
    }

    /// Calls the actual value with no arguments and checks what it raised.
    /// Nothing raised counts as an unsatisfied predicate, so the negated
    /// branch passes.
    pub fn to_raise_with(
        &self,
        class: &'static ExceptionClass,
        options: RaiseOptions,
    ) -> Outcome<&Self> {
        let outcome = match &*self.actual {
            Value::Callable(callable) => callable.call(&Args::new()),
            Value::Spy(spy) => spy.call(Args::new()),
            other => {
                return Err(Exception::new(
                    &TYPE_ERROR,
                    self.with_prefix(format!("to_raise needs a callable, got {} {}", other.type_name(), other)),
                ))
            }
        };
        let claim = self.claim(format!("raise {}{}", class, options.describe()));
        let raised = match outcome {
            Ok(_) => return self.verdict(false, claim.detail("but nothing was raised")),
            Err(raised) => raised,
        };
        if !raised.is_instance_of(class) {
            return self.verdict(false, claim.detail(format!("but it raised {}", raised)));
        }
        if let Some(expected) = &options.expected_message {
            if raised.message() != expected {
                let detail = format!("but the message was {:?}", raised.message());
                return self.verdict(false, claim.detail(detail));
            }
        }
        if let Some(pattern) = &options.expected_message_matches {
            if !pattern.regex()?.is_match(raised.message()) {
                let detail = format!("but the message was {:?}", raised.message());
                return self.verdict(false, claim.detail(detail));
            }
        }
        self.verdict(true, claim.detail(format!("and it raised {}", raised)))
    }

    /// Fails unconditionally, under either polarity.
    pub fn fail(&self, message: impl Into<String>) -> Outcome<&Self> {
        Err(Exception::assertion(self.with_prefix(message.into())))
    }
}
