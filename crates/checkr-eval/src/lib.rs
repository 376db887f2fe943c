//! Checkr Eval - cooperative temporal evaluator driven by a virtual clock
//!
//! Watcher tasks are plain futures. They only make progress inside
//! [`Evaluator::run_until`], which delivers posted events one at a time and
//! polls every task until none of them can move.

pub mod error;
pub mod evaluator;
pub mod event;
pub mod predicate;
pub mod scope;
pub mod wait;

pub use error::{EvalError, EvalResult};
pub use evaluator::{Evaluator, SharedEvaluator, TaskResult, WatcherTask};
pub use event::{Event, ObserverEvent};
pub use predicate::Predicate;
pub use scope::Scope;
pub use wait::{FirstOf, Timeout, Wait, WaitEvent, WaitPred};

/// Virtual time, in seconds since the owning agent was constructed.
pub type Time = f64;
