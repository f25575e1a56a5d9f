use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use im::OrdMap;

use crate::errors::Outcome;
use crate::spy::Spy;

/// A value under test.
///
/// Values are dynamically shaped so that one registry can pick the right
/// family of assertions at runtime.
///
/// # Examples
///
/// ```rust
/// use verity::Value;
/// let n = Value::from(3.5);
/// assert_eq!(n.type_name(), "float");
/// let s = Value::from("hello");
/// assert_eq!(s.type_name(), "text");
/// assert!(Value::default().is_nil());
/// ```
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Duration(Duration),
    Text(String),
    List(Vec<Value>),
    Map(OrdMap<String, Value>),
    Spy(Spy),
    Callable(Callable),
}

/// The comparable kind of a value. Integers, floats and durations share the
/// `Number` kind so they can be compared with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Nil,
    Bool,
    Number,
    Text,
    List,
    Map,
    Spy,
    Callable,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Nil => "nil",
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::Text => "text",
            ValueKind::List => "list",
            ValueKind::Map => "map",
            ValueKind::Spy => "spy",
            ValueKind::Callable => "callable",
        }
    }

    /// Nil is compatible with every kind; otherwise kinds must agree.
    pub fn is_compatible_with(&self, other: ValueKind) -> bool {
        *self == ValueKind::Nil || other == ValueKind::Nil || *self == other
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Value {
    /// Builds a list value from anything convertible into values.
    pub fn list<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Value {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Builds a map value from key/value pairs.
    ///
    /// ```rust
    /// use verity::Value;
    /// let m = Value::map([("a", 1), ("b", 2)]);
    /// assert_eq!(m.to_string(), "{a: 1, b: 2}");
    /// ```
    pub fn map<K: Into<String>, V: Into<Value>>(entries: impl IntoIterator<Item = (K, V)>) -> Value {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Returns the fine-grained type name of the value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Duration(_) => "duration",
            Value::Text(_) => "text",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Spy(_) => "spy",
            Value::Callable(_) => "callable",
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Nil => ValueKind::Nil,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) | Value::Float(_) | Value::Duration(_) => ValueKind::Number,
            Value::Text(_) => ValueKind::Text,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
            Value::Spy(_) => ValueKind::Spy,
            Value::Callable(_) => ValueKind::Callable,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Numeric view of the value. Durations are measured in seconds.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            Value::Duration(d) => Some(d.as_secs_f64()),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&OrdMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_spy(&self) -> Option<&Spy> {
        match self {
            Value::Spy(s) => Some(s),
            _ => None,
        }
    }

    /// Truthiness: nil, false, zero and empty collections are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::Duration(d) => !d.is_zero(),
            Value::Text(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(m) => !m.is_empty(),
            Value::Spy(_) | Value::Callable(_) => true,
        }
    }

    /// Length of a text, list or map.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Text(s) => Some(s.chars().count()),
            Value::List(items) => Some(items.len()),
            Value::Map(m) => Some(m.len()),
            _ => None,
        }
    }

    /// Identity: spies and callables are identical only to themselves,
    /// everything else is identical when it is equal and of the same type.
    pub fn is_identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Spy(a), Value::Spy(b)) => a.ptr_eq(b),
            (Value::Callable(a), Value::Callable(b)) => a.ptr_eq(b),
            _ => self.type_name() == other.type_name() && self == other,
        }
    }

    // ------------------------------------------------------------------------
    // Display formatting helpers
    // ------------------------------------------------------------------------

    fn fmt_list(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
        write!(f, "[")?;
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", item)?;
        }
        write!(f, "]")
    }

    fn fmt_map(f: &mut fmt::Formatter<'_>, map: &OrdMap<String, Value>) -> fmt::Result {
        write!(f, "{{")?;
        let mut first = true;
        for (k, v) in map.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", k, v)?;
            first = false;
        }
        write!(f, "}}")
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Duration(a), Value::Duration(b)) => a == b,
            (
                Value::Int(_) | Value::Float(_) | Value::Duration(_),
                Value::Int(_) | Value::Float(_) | Value::Duration(_),
            ) => self.as_f64() == other.as_f64(),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Spy(a), Value::Spy(b)) => a.ptr_eq(b),
            (Value::Callable(a), Value::Callable(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{:?}", n),
            Value::Duration(d) => write!(f, "{:?}", d),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::List(items) => Value::fmt_list(f, items),
            Value::Map(map) => Value::fmt_map(f, map),
            Value::Spy(spy) => write!(f, "<spy {}>", spy.name()),
            Value::Callable(c) => write!(f, "<callable {}>", c.name()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Nil
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<Duration> for Value {
    fn from(d: Duration) -> Self {
        Value::Duration(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::list(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Nil, Into::into)
    }
}

impl From<OrdMap<String, Value>> for Value {
    fn from(m: OrdMap<String, Value>) -> Self {
        Value::Map(m)
    }
}

impl From<Spy> for Value {
    fn from(spy: Spy) -> Self {
        Value::Spy(spy)
    }
}

impl From<&Spy> for Value {
    fn from(spy: &Spy) -> Self {
        Value::Spy(spy.clone())
    }
}

impl From<Callable> for Value {
    fn from(c: Callable) -> Self {
        Value::Callable(c)
    }
}

// ============================================================================
// CALL ARGUMENTS
// ============================================================================

/// Positional and keyword arguments of one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    pub positional: Vec<Value>,
    pub keyword: OrdMap<String, Value>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }
}

impl fmt::Display for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        let mut first = true;
        for value in &self.positional {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
            first = false;
        }
        for (key, value) in self.keyword.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", key, value)?;
            first = false;
        }
        write!(f, ")")
    }
}

/// Builds [`Args`]: positional values first, keyword pairs after a `;`.
///
/// ```rust
/// use verity::args;
/// let a = args![1, "two"; flag = true];
/// assert_eq!(a.to_string(), "(1, \"two\", flag=true)");
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Args::new()
    };
    ($($pos:expr),* $(,)? $(; $($key:ident = $kw:expr),* $(,)?)?) => {{
        #[allow(unused_mut)]
        let mut args = $crate::Args::new();
        $( args = args.arg($pos); )*
        $( $( args = args.kwarg(stringify!($key), $kw); )* )?
        args
    }};
}

// ============================================================================
// CALLABLES
// ============================================================================

pub type NativeFn = dyn Fn(&Args) -> Outcome<Value>;

/// A named, shareable function value. Used as the subject of `to_raise`
/// and as the real implementation behind a spy.
#[derive(Clone)]
pub struct Callable {
    name: Rc<str>,
    func: Rc<NativeFn>,
}

impl Callable {
    pub fn new(name: &str, func: impl Fn(&Args) -> Outcome<Value> + 'static) -> Self {
        Self {
            name: Rc::from(name),
            func: Rc::new(func),
        }
    }

    /// A zero-argument callable.
    pub fn thunk(name: &str, func: impl Fn() -> Outcome<Value> + 'static) -> Self {
        Self::new(name, move |_| func())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &Args) -> Outcome<Value> {
        (self.func)(args)
    }

    pub fn ptr_eq(&self, other: &Callable) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<callable {}>", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_compare_across_int_and_float() {
        assert_eq!(Value::from(2), Value::from(2.0));
        assert_ne!(Value::from(2), Value::from("2"));
        assert_eq!(Value::from(2).kind(), Value::from(2.5).kind());
    }

    #[test]
    fn durations_equal_their_seconds() {
        assert_eq!(Value::from(Duration::from_secs(2)), Value::from(2));
        assert_eq!(Value::from(1.5), Value::from(Duration::from_millis(1500)));
        assert_ne!(Value::from(Duration::from_secs(2)), Value::from("2"));
    }

    #[test]
    fn display_reads_like_a_literal() {
        let v = Value::list(vec![Value::from(1), Value::from("a"), Value::Nil]);
        assert_eq!(v.to_string(), "[1, \"a\", nil]");
        assert_eq!(Value::from(1.0).to_string(), "1.0");
    }

    #[test]
    fn truthiness_follows_emptiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from(vec![0]).is_truthy());
        assert!(!Value::from(0.0).is_truthy());
    }

    #[test]
    fn identity_requires_same_type() {
        assert!(Value::from(1).is_identical(&Value::from(1)));
        assert!(!Value::from(1).is_identical(&Value::from(1.0)));
    }

    #[test]
    fn args_macro_orders_keywords() {
        let a = args![1; b = 2, a = 3];
        assert_eq!(a.to_string(), "(1, a=3, b=2)");
        assert!(args![].is_empty());
    }
}
