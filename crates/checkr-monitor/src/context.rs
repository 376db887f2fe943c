//! The namespace handed to a loaded assertion program

use crate::flags::FlagTable;
use crate::registry::{Symbol, SymbolTable};
use crate::verdict::{Outcome, Verdict, VerdictLog};
use checkr_eval::{
    EvalResult, Event, FirstOf, ObserverEvent, Predicate, Scope, TaskResult, Time, Timeout, Wait,
    WaitEvent, WaitPred,
};
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

/// Log target for everything assertion programs write.
pub const ASSERTION_TARGET: &str = "checkr::assertion";

/// Everything an assertion program can see: the shared registry, the live
/// flag table, the evaluator's clock and the wait combinators.
///
/// The context holds references, not copies. Symbols defined after the
/// program was loaded resolve normally, and redefinitions take effect on
/// the next lookup.
#[derive(Clone)]
pub struct AssertionContext {
    program: Arc<str>,
    symbols: SymbolTable,
    flags: FlagTable,
    scope: Scope,
    verdicts: VerdictLog,
}

impl AssertionContext {
    pub(crate) fn new(
        program: &str,
        symbols: SymbolTable,
        flags: FlagTable,
        scope: Scope,
        verdicts: VerdictLog,
    ) -> Self {
        Self {
            program: Arc::from(program),
            symbols,
            flags,
            scope,
            verdicts,
        }
    }

    /// The `module:entry` spec this program was loaded from.
    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn symbol(&self, name: &str) -> Option<Symbol> {
        self.symbols.get(name)
    }

    pub fn event(&self, name: &str) -> EvalResult<Event> {
        self.symbols.event(name)
    }

    pub fn observer(&self, name: &str) -> EvalResult<ObserverEvent> {
        self.symbols.observer(name)
    }

    pub fn pred(&self, name: &str) -> EvalResult<Predicate> {
        self.symbols.pred(name)
    }

    pub fn value(&self, name: &str) -> Option<serde_json::Value> {
        self.symbols.value(name)
    }

    pub fn flags(&self) -> &FlagTable {
        &self.flags
    }

    pub fn now(&self) -> Time {
        self.scope.now()
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Start a sub-watcher named `<program>/<name>`.
    pub fn spawn<F>(&self, name: &str, task: F)
    where
        F: Future<Output = TaskResult> + Send + 'static,
    {
        self.scope.spawn(format!("{}/{}", self.program, name), task);
    }

    pub fn wait_event(&self, event: impl AsRef<Event>) -> WaitEvent {
        self.scope.wait_event(event)
    }

    pub fn wait_pred(&self, pred: &Predicate) -> WaitPred {
        self.scope.wait_pred(pred)
    }

    pub fn timeout(&self, delay: Time) -> Timeout {
        self.scope.timeout(delay)
    }

    pub fn first_of(&self, waits: Vec<Wait>) -> FirstOf {
        self.scope.first_of(waits)
    }

    pub fn pass(&self, message: impl Into<String>) {
        let message = message.into();
        info!(target: ASSERTION_TARGET, program = %self.program, t = self.now(), "PASS {}", message);
        self.record(Outcome::Pass, message);
    }

    pub fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(target: ASSERTION_TARGET, program = %self.program, t = self.now(), "FAIL {}", message);
        self.record(Outcome::Fail, message);
    }

    fn record(&self, outcome: Outcome, message: String) {
        self.verdicts.record(Verdict {
            program: self.program.to_string(),
            time: self.now(),
            outcome,
            message,
        });
    }
}
