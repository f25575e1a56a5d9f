//! Recording stand-ins for callables.
//!
//! Code under test receives a [`Spy`] (or the [`Callable`] returned by
//! [`Spy::as_callable`]) instead of the real function. Every invocation is
//! appended to the spy's call log before its configured behaviour runs.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::errors::{Exception, ExceptionClass, Outcome, VALUE_ERROR};
use crate::value::{Args, Callable, Value};

/// One recorded invocation. `ordinal` is 1-based.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRecord {
    pub ordinal: usize,
    pub args: Args,
}

/// What a spy does after recording a call. Exactly one is active; setting a
/// new behaviour replaces the previous one.
#[derive(Clone)]
pub enum SpyBehavior {
    /// Record only and return nil.
    Record,
    Return(Value),
    Raise {
        class: &'static ExceptionClass,
        message: String,
    },
    /// Forward to the real implementation given to [`Spy::on`].
    CallThrough,
    CallFake(Callable),
}

impl SpyBehavior {
    pub fn describe(&self) -> String {
        match self {
            SpyBehavior::Record => "record".to_string(),
            SpyBehavior::Return(v) => format!("return {}", v),
            SpyBehavior::Raise { class, message } => format!("raise {}({:?})", class, message),
            SpyBehavior::CallThrough => "call through".to_string(),
            SpyBehavior::CallFake(c) => format!("call fake {}", c.name()),
        }
    }
}

struct SpyState {
    name: String,
    calls: Vec<CallRecord>,
    behavior: SpyBehavior,
    delegate: Option<Callable>,
}

/// A shared handle to a recording spy. Clones observe the same call log.
#[derive(Clone)]
pub struct Spy(Rc<RefCell<SpyState>>);

impl Spy {
    /// A spy with no real implementation; calls return nil.
    pub fn new(name: impl Into<String>) -> Self {
        Self(Rc::new(RefCell::new(SpyState {
            name: name.into(),
            calls: Vec::new(),
            behavior: SpyBehavior::Record,
            delegate: None,
        })))
    }

    /// A spy standing in for `delegate`. It records but does not forward
    /// until [`Spy::and_call_through`] is configured.
    pub fn on(name: impl Into<String>, delegate: Callable) -> Self {
        let spy = Self::new(name);
        spy.0.borrow_mut().delegate = Some(delegate);
        spy
    }

    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }

    pub fn behavior(&self) -> SpyBehavior {
        self.0.borrow().behavior.clone()
    }

    fn set_behavior(&self, behavior: SpyBehavior) -> &Self {
        let mut state = self.0.borrow_mut();
        trace!(spy = %state.name, behavior = %behavior.describe(), "spy configured");
        state.behavior = behavior;
        drop(state);
        self
    }

    pub fn and_return(&self, value: impl Into<Value>) -> &Self {
        self.set_behavior(SpyBehavior::Return(value.into()))
    }

    pub fn and_raise(&self, class: &'static ExceptionClass, message: impl Into<String>) -> &Self {
        self.set_behavior(SpyBehavior::Raise {
            class,
            message: message.into(),
        })
    }

    pub fn and_call_fake(&self, fake: Callable) -> &Self {
        self.set_behavior(SpyBehavior::CallFake(fake))
    }

    /// Forwards calls to the real implementation. Fails when the spy was
    /// created without one.
    pub fn and_call_through(&self) -> Outcome<&Self> {
        if self.0.borrow().delegate.is_none() {
            return Err(Exception::new(
                &VALUE_ERROR,
                format!("spy '{}' has no real implementation to call through to", self.name()),
            ));
        }
        Ok(self.set_behavior(SpyBehavior::CallThrough))
    }

    /// Back to recording only.
    pub fn and_stub(&self) -> &Self {
        self.set_behavior(SpyBehavior::Record)
    }

    /// Records the call, then applies the configured behaviour.
    pub fn call(&self, args: Args) -> Outcome<Value> {
        let (behavior, delegate) = {
            let mut state = self.0.borrow_mut();
            let ordinal = state.calls.len() + 1;
            trace!(spy = %state.name, ordinal, args = %args, "spy called");
            state.calls.push(CallRecord { ordinal, args: args.clone() });
            (state.behavior.clone(), state.delegate.clone())
        };
        match behavior {
            SpyBehavior::Record => Ok(Value::Nil),
            SpyBehavior::Return(value) => Ok(value),
            SpyBehavior::Raise { class, message } => Err(Exception::new(class, message)),
            SpyBehavior::CallThrough => match delegate {
                Some(real) => real.call(&args),
                None => Ok(Value::Nil),
            },
            SpyBehavior::CallFake(fake) => fake.call(&args),
        }
    }

    /// A callable that invokes this spy, for injection into code that takes
    /// plain callables.
    pub fn as_callable(&self) -> Callable {
        let spy = self.clone();
        Callable::new(&self.name(), move |args| spy.call(args.clone()))
    }

    pub fn call_count(&self) -> usize {
        self.0.borrow().calls.len()
    }

    pub fn calls(&self) -> Vec<CallRecord> {
        self.0.borrow().calls.clone()
    }

    /// The `n`th call, 1-based.
    pub fn nth_call(&self, n: usize) -> Option<CallRecord> {
        let state = self.0.borrow();
        n.checked_sub(1).and_then(|i| state.calls.get(i)).cloned()
    }

    pub fn most_recent_call(&self) -> Option<CallRecord> {
        self.0.borrow().calls.last().cloned()
    }

    pub fn was_called_with(&self, args: &Args) -> bool {
        self.0.borrow().calls.iter().any(|c| &c.args == args)
    }

    /// Clears the call log; the behaviour is kept.
    pub fn reset(&self) {
        self.0.borrow_mut().calls.clear();
    }

    pub fn ptr_eq(&self, other: &Spy) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Spy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0.borrow();
        f.debug_struct("Spy")
            .field("name", &state.name)
            .field("calls", &state.calls.len())
            .field("behavior", &state.behavior.describe())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::errors::KEY_ERROR;

    fn doubler() -> Callable {
        Callable::new("double", |args| {
            let n = args.positional.first().and_then(Value::as_f64).unwrap_or(0.0);
            Ok(Value::from(n * 2.0))
        })
    }

    #[test]
    fn records_every_call_in_order() {
        let spy = Spy::new("save");
        spy.call(args![1; a = 2]).unwrap();
        spy.call(args!["x"]).unwrap();
        let calls = spy.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].ordinal, 1);
        assert_eq!(calls[0].args, args![1; a = 2]);
        assert_eq!(spy.nth_call(2).unwrap().args, args!["x"]);
        assert!(spy.nth_call(0).is_none());
        assert!(spy.nth_call(3).is_none());
    }

    #[test]
    fn last_configured_behavior_wins() {
        let spy = Spy::on("double", doubler());
        spy.and_return(7);
        assert_eq!(spy.call(args![1]).unwrap(), Value::from(7));
        spy.and_raise(&KEY_ERROR, "missing");
        let err = spy.call(args![1]).unwrap_err();
        assert!(err.is_instance_of(&KEY_ERROR));
        spy.and_call_through().unwrap();
        assert_eq!(spy.call(args![4]).unwrap(), Value::from(8.0));
        assert_eq!(spy.call_count(), 3);
    }

    #[test]
    fn call_through_requires_a_delegate() {
        let spy = Spy::new("orphan");
        let err = spy.and_call_through().unwrap_err();
        assert!(err.message().contains("orphan"));
        assert!(matches!(spy.behavior(), SpyBehavior::Record));
    }

    #[test]
    fn fake_receives_the_arguments() {
        let spy = Spy::new("echo");
        spy.and_call_fake(Callable::new("first", |args| {
            Ok(args.positional.first().cloned().unwrap_or_default())
        }));
        assert_eq!(spy.call(args!["hi"]).unwrap(), Value::from("hi"));
    }

    #[test]
    fn injected_callable_records_on_the_spy() {
        let spy = Spy::new("hook");
        let callable = spy.as_callable();
        callable.call(&args![1]).unwrap();
        callable.call(&args![2]).unwrap();
        assert_eq!(spy.call_count(), 2);
        assert!(spy.was_called_with(&args![2]));
        spy.reset();
        assert_eq!(spy.call_count(), 0);
    }
}
