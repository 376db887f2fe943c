//! Checkr Monitor - event registry, flag table and assertion programs
//!
//! [`Checkr`] is the bridge an agent talks to: it defines events and
//! predicates, posts lifecycle events into the shared evaluator and binds
//! assertion programs from an [`AssertionCatalog`].

pub mod assertions;
pub mod catalog;
pub mod checkr;
pub mod context;
pub mod flags;
pub mod registry;
pub mod verdict;

pub use catalog::{AssertionCatalog, EntryPoint, LoadError, ModuleSpec};
pub use checkr::{BoundProgram, Checkr, FLAGS_SYMBOL};
pub use context::{AssertionContext, ASSERTION_TARGET};
pub use flags::FlagTable;
pub use registry::{Symbol, SymbolTable};
pub use verdict::{Outcome, Verdict, VerdictLog};

pub use checkr_eval::{
    EvalError, EvalResult, Evaluator, Event, ObserverEvent, Predicate, SharedEvaluator,
    TaskResult, Time,
};
