//! Verity error handling.
//!
//! Everything a test body, hook or assertion can raise is an [`Exception`]:
//! a message tagged with an [`ExceptionClass`]. Classes form a static
//! hierarchy so `to_raise` can match a class or any of its subclasses, and so
//! the runner can tell assertion failures from errors.
//!
//! Bookkeeping misuse of the result tree is reported separately as
//! [`ResultsError`]; it is a programming error, not a test outcome.

use std::fmt;
use std::ptr;

use miette::Diagnostic;
use thiserror::Error;

/// Result of anything that may raise an [`Exception`].
pub type Outcome<T = ()> = Result<T, Exception>;

// ============================================================================
// EXCEPTION CLASSES
// ============================================================================

/// A node in the exception class hierarchy.
///
/// Classes are compared by identity, so they are declared as statics:
///
/// ```rust
/// use verity::errors::{ExceptionClass, VALUE_ERROR};
/// static PARSE_ERROR: ExceptionClass = ExceptionClass::new("ParseError", Some(&VALUE_ERROR));
/// assert!(PARSE_ERROR.is_subclass_of(&VALUE_ERROR));
/// ```
#[derive(Debug)]
pub struct ExceptionClass {
    name: &'static str,
    parent: Option<&'static ExceptionClass>,
}

impl ExceptionClass {
    pub const fn new(name: &'static str, parent: Option<&'static ExceptionClass>) -> Self {
        Self { name, parent }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parent(&self) -> Option<&'static ExceptionClass> {
        self.parent
    }

    /// True when `self` is `other` or descends from it.
    pub fn is_subclass_of(&self, other: &ExceptionClass) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if ptr::eq(class, other) {
                return true;
            }
            current = class.parent;
        }
        false
    }
}

impl PartialEq for ExceptionClass {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self, other)
    }
}

impl fmt::Display for ExceptionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

pub static BASE_EXCEPTION: ExceptionClass = ExceptionClass::new("BaseException", None);
pub static EXCEPTION: ExceptionClass = ExceptionClass::new("Exception", Some(&BASE_EXCEPTION));
/// Raised when a Rust panic unwinds out of a test body or hook.
pub static PANIC: ExceptionClass = ExceptionClass::new("Panic", Some(&BASE_EXCEPTION));
/// Raised by [`skip`]; the runner records the test as ignored.
pub static SKIP: ExceptionClass = ExceptionClass::new("SkipTest", Some(&BASE_EXCEPTION));

pub static ASSERTION_ERROR: ExceptionClass =
    ExceptionClass::new("AssertionError", Some(&EXCEPTION));
pub static TYPE_ERROR: ExceptionClass = ExceptionClass::new("TypeError", Some(&EXCEPTION));
/// Comparison of values of incompatible kinds. Never subject to negation.
pub static TYPE_MISMATCH: ExceptionClass =
    ExceptionClass::new("TypeMismatch", Some(&TYPE_ERROR));
pub static VALUE_ERROR: ExceptionClass = ExceptionClass::new("ValueError", Some(&EXCEPTION));
pub static ATTRIBUTE_ERROR: ExceptionClass =
    ExceptionClass::new("AttributeError", Some(&EXCEPTION));
pub static LOOKUP_ERROR: ExceptionClass = ExceptionClass::new("LookupError", Some(&EXCEPTION));
pub static KEY_ERROR: ExceptionClass = ExceptionClass::new("KeyError", Some(&LOOKUP_ERROR));
pub static INDEX_ERROR: ExceptionClass = ExceptionClass::new("IndexError", Some(&LOOKUP_ERROR));
pub static ARITHMETIC_ERROR: ExceptionClass =
    ExceptionClass::new("ArithmeticError", Some(&EXCEPTION));
pub static ZERO_DIVISION_ERROR: ExceptionClass =
    ExceptionClass::new("ZeroDivisionError", Some(&ARITHMETIC_ERROR));
pub static RUNTIME_ERROR: ExceptionClass = ExceptionClass::new("RuntimeError", Some(&EXCEPTION));
pub static NOT_IMPLEMENTED_ERROR: ExceptionClass =
    ExceptionClass::new("NotImplementedError", Some(&RUNTIME_ERROR));

// ============================================================================
// EXCEPTION
// ============================================================================

/// A raised fault: class, message and optional context notes.
#[derive(Debug, Clone, Error)]
#[error("{}: {message}", .class.name())]
pub struct Exception {
    class: &'static ExceptionClass,
    message: String,
    notes: Vec<String>,
}

impl Exception {
    pub fn new(class: &'static ExceptionClass, message: impl Into<String>) -> Self {
        Self {
            class,
            message: message.into(),
            notes: Vec::new(),
        }
    }

    /// An assertion failure carrying a rendered diagnostic message.
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::new(&ASSERTION_ERROR, message)
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::new(&TYPE_MISMATCH, message)
    }

    /// Attaches a context note, rendered after the message.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn class(&self) -> &'static ExceptionClass {
        self.class
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn is_instance_of(&self, class: &ExceptionClass) -> bool {
        self.class.is_subclass_of(class)
    }

    pub fn is_assertion(&self) -> bool {
        self.is_instance_of(&ASSERTION_ERROR)
    }

    pub fn is_skip(&self) -> bool {
        self.is_instance_of(&SKIP)
    }

    /// Multi-line text kept by the result tree for failed and errored tests.
    pub fn trace(&self) -> String {
        let mut out = self.to_string();
        for note in &self.notes {
            out.push_str("\n  note: ");
            out.push_str(note);
        }
        out
    }
}

impl Diagnostic for Exception {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!("verity::{}", self.class.name())))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        if self.notes.is_empty() {
            None
        } else {
            Some(Box::new(self.notes.join("\n")))
        }
    }
}

/// Ends the current test as ignored.
///
/// ```rust
/// use verity::errors::{skip, Outcome};
/// fn not_on_this_platform() -> Outcome {
///     skip("requires a GPU")
/// }
/// assert!(not_on_this_platform().unwrap_err().is_skip());
/// ```
pub fn skip<T>(reason: impl Into<String>) -> Outcome<T> {
    Err(Exception::new(&SKIP, reason))
}

// ============================================================================
// RESULT TREE MISUSE
// ============================================================================

/// Programming errors in result-tree bookkeeping.
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum ResultsError {
    #[error("test '{suite}.{test}' finished without having been started")]
    #[diagnostic(
        code(verity::results::not_started),
        help("call register_test_started before reporting an outcome")
    )]
    NotStarted { suite: String, test: String },

    #[error("test '{suite}.{test}' has already finished")]
    #[diagnostic(code(verity::results::already_finished))]
    AlreadyFinished { suite: String, test: String },

    #[error("test '{suite}.{test}' cannot finish in state '{state}'")]
    #[diagnostic(code(verity::results::invalid_state))]
    InvalidState {
        suite: String,
        test: String,
        state: &'static str,
    },

    #[error("suite '{name}' completed while {}", describe_active(.active))]
    #[diagnostic(
        code(verity::results::suite_mismatch),
        help("suites must be completed innermost first")
    )]
    SuiteMismatch {
        name: String,
        active: Option<String>,
    },
}

fn describe_active(active: &Option<String>) -> String {
    match active {
        Some(name) => format!("suite '{}' is active", name),
        None => "no suite is active".to_string(),
    }
}
