//! Evaluator error types

use crate::Time;

pub type EvalResult<T> = Result<T, EvalError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("clock regression: requested t={requested} but clock is at t={current}")]
    ClockRegression { requested: Time, current: Time },

    #[error("unresolved symbol: {0}")]
    UnresolvedSymbol(String),

    #[error("symbol '{name}' is not {expected}")]
    WrongKind { name: String, expected: &'static str },

    #[error("watchers did not settle at t={time} after {passes} passes")]
    Livelock { time: Time, passes: usize },

    #[error("watcher '{task}' failed: {message}")]
    TaskFailed { task: String, message: String },
}

impl From<EvalError> for checkr_core::Error {
    fn from(e: EvalError) -> Self {
        checkr_core::Error::Evaluator(e.to_string())
    }
}
