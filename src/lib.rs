//! Fluent expectations, spies and a suite runner with a hierarchical result
//! tree.
//!
//! ```rust
//! use verity::prelude::*;
//!
//! let registry = ExpectationRegistry::with_defaults();
//! registry.expect(vec![1, 2, 3]).to_contain(2).unwrap();
//! registry.expect("hello").not().to_match("^x").unwrap();
//!
//! let greet = Spy::new("greet");
//! greet.call(args!["ada"; loud = true]).unwrap();
//! registry
//!     .expect(&greet)
//!     .for_call_number(1)
//!     .to_have_been_called_with(args!["ada"; loud = true])
//!     .unwrap();
//! ```

pub use crate::errors::{skip, Exception, ExceptionClass, Outcome, ResultsError};
pub use crate::expect::{
    expect, Expect, Expectation, ExpectationRegistry, Family, Pattern, RaiseOptions, Tolerance,
};
pub use crate::reporter::{DotReporter, Reporter, SilentReporter, VerboseReporter};
pub use crate::results::{ResultsReport, TestRecord, TestResults, TestState};
pub use crate::runner::{RunConfig, Runner, Verbosity};
pub use crate::spy::{CallRecord, Spy, SpyBehavior};
pub use crate::suite::{Case, Node, Suite};
pub use crate::value::{Args, Callable, Value, ValueKind};

pub mod errors;
pub mod expect;
pub mod reporter;
pub mod results;
pub mod runner;
pub mod spy;
pub mod suite;
pub mod value;

/// Everything a test author usually needs.
pub mod prelude {
    pub use crate::args;
    pub use crate::errors::{
        skip, Exception, Outcome, ASSERTION_ERROR, KEY_ERROR, TYPE_ERROR, TYPE_MISMATCH,
        VALUE_ERROR,
    };
    pub use crate::expect::{
        CustomExpectations, ExpectationRegistry, Family, Pattern, RaiseOptions, Tolerance,
    };
    pub use crate::results::TestResults;
    pub use crate::runner::{RunConfig, Runner, Verbosity};
    pub use crate::spy::Spy;
    pub use crate::suite::{Case, Suite};
    pub use crate::value::{Args, Callable, Value, ValueKind};
}
