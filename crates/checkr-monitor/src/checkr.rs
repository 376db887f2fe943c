//! A Checkr bridges an agent with the temporal evaluator.
//!
//! It owns the flag table and the symbol registry, advances virtual time on
//! behalf of the agent, and binds assertion programs into the evaluator.

use crate::catalog::{AssertionCatalog, LoadError, ModuleSpec};
use crate::context::AssertionContext;
use crate::flags::FlagTable;
use crate::registry::{Symbol, SymbolTable};
use crate::verdict::VerdictLog;
use checkr_core::Payload;
use checkr_eval::{EvalResult, Evaluator, Event, ObserverEvent, Predicate, SharedEvaluator, Time};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

/// Registry name under which the live flag table is published.
pub const FLAGS_SYMBOL: &str = "flags";

/// Handle returned by [`Checkr::load_spec`].
#[derive(Clone)]
pub struct BoundProgram {
    pub spec: ModuleSpec,
    pub context: AssertionContext,
}

pub struct Checkr {
    symbols: SymbolTable,
    flags: FlagTable,
    evaluator: SharedEvaluator,
    catalog: Arc<AssertionCatalog>,
    verdicts: VerdictLog,
    bound: Mutex<Vec<String>>,
}

impl Default for Checkr {
    fn default() -> Self {
        Self::new()
    }
}

impl Checkr {
    /// A checkr with its own evaluator and the built-in assertion catalog.
    pub fn new() -> Self {
        Self::with_parts(Evaluator::new().shared(), Arc::new(AssertionCatalog::builtin()))
    }

    /// Share `evaluator` with other checkrs. Posts are serialized by the
    /// evaluator's lock. Timestamps must come from a common time source,
    /// read through [`post_and_run_now`](Self::post_and_run_now), or later
    /// callers will see a clock regression.
    pub fn with_parts(evaluator: SharedEvaluator, catalog: Arc<AssertionCatalog>) -> Self {
        let symbols = SymbolTable::new();
        let flags = FlagTable::new();
        symbols.define(FLAGS_SYMBOL, flags.clone());
        Self {
            symbols,
            flags,
            evaluator,
            catalog,
            verdicts: VerdictLog::new(),
            bound: Mutex::new(Vec::new()),
        }
    }

    pub fn with_evaluator(evaluator: SharedEvaluator) -> Self {
        Self::with_parts(evaluator, Arc::new(AssertionCatalog::builtin()))
    }

    pub fn with_catalog(catalog: AssertionCatalog) -> Self {
        Self::with_parts(Evaluator::new().shared(), Arc::new(catalog))
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn flags(&self) -> &FlagTable {
        &self.flags
    }

    pub fn verdicts(&self) -> &VerdictLog {
        &self.verdicts
    }

    pub fn evaluator(&self) -> &SharedEvaluator {
        &self.evaluator
    }

    pub fn catalog(&self) -> &AssertionCatalog {
        &self.catalog
    }

    /// Specs of every program loaded so far, in load order.
    pub fn bound_programs(&self) -> Vec<String> {
        self.bound.lock().clone()
    }

    /// Last advanced virtual time.
    pub fn now(&self) -> Time {
        self.evaluator.lock().now()
    }

    // -- flags --

    pub fn set_flag(&self, name: &str) {
        self.flags.set(name);
    }

    pub fn clear_flag(&self, name: &str) {
        self.flags.clear(name);
    }

    pub fn get_flag(&self, name: &str) -> u8 {
        self.flags.get(name)
    }

    pub fn clear_all_flags(&self) {
        self.flags.clear_all();
    }

    // -- registry --

    /// Define or redefine a symbol. Bound programs see it on their next lookup.
    pub fn define_symbol(&self, name: &str, symbol: impl Into<Symbol>) {
        let symbol = symbol.into();
        let kind = symbol.kind();
        if self.symbols.define(name, symbol).is_some() {
            debug!("REDEFINE {} {}", kind, name);
        }
        debug!(
            bound = self.bound.lock().len(),
            "DEFINE {}: {}", kind, name
        );
    }

    pub fn define_event(&self, name: &str) -> Event {
        let event = Event::new(name);
        self.define_symbol(name, event.clone());
        event
    }

    pub fn define_observer_event(&self, name: &str) -> ObserverEvent {
        let event = ObserverEvent::new(name);
        self.define_symbol(name, event.clone());
        event
    }

    /// Predicate that is true while the flag of the same name is set.
    pub fn define_pred(&self, name: &str) -> Predicate {
        let flag = name.to_string();
        self.define_predicate(name, move |flags| flags.is_set(&flag))
    }

    /// Predicate over the flag table, evaluated at wait time.
    pub fn define_predicate<F>(&self, name: &str, test: F) -> Predicate
    where
        F: Fn(&FlagTable) -> bool + Send + Sync + 'static,
    {
        info!("DEFINE PRED: {}", name);
        let flags = self.flags.clone();
        let pred = Predicate::new(name, move || test(&flags));
        self.define_symbol(name, pred.clone());
        pred
    }

    /// Log every symbol in the registry.
    pub fn dump(&self) {
        for name in self.symbols.names() {
            if let Some(symbol) = self.symbols.get(&name) {
                info!("{}: {:?}", name, symbol);
            }
        }
    }

    // -- time --

    /// Post `payload` to `event` at `t` and advance the evaluator to `t`.
    ///
    /// Every watcher whose wait is satisfied at or before `t` has been
    /// stepped when this returns. A `t` behind the evaluator's clock is
    /// rejected with `ClockRegression` and nothing is posted.
    pub fn post_and_run(&self, t: Time, event: &Event, payload: Payload) -> EvalResult<()> {
        self.post_and_run_now(|| t, event, payload)
    }

    /// Like [`post_and_run`](Self::post_and_run), but the timestamp is read
    /// from `now` while the evaluator lock is held. Checkrs sharing an
    /// evaluator and a clock can then never post behind each other.
    pub fn post_and_run_now(
        &self,
        now: impl FnOnce() -> Time,
        event: &Event,
        payload: Payload,
    ) -> EvalResult<()> {
        let mut evaluator = self.evaluator.lock();
        let t = now();
        debug!(event = %event.name(), t, "post_and_run {}", payload);
        evaluator.post_at(t, event, payload)?;
        evaluator.run_until(t)
    }

    // -- assertions --

    /// Bind the program named by `spec` (`module:entry`) and start it.
    ///
    /// The program is first stepped by the next `post_and_run`.
    pub fn load_spec(&self, spec: &str) -> Result<BoundProgram, LoadError> {
        let spec = ModuleSpec::parse(spec)?;
        let entry = self.catalog.resolve(&spec)?;
        let name = spec.to_string();

        let mut evaluator = self.evaluator.lock();
        let context = AssertionContext::new(
            &name,
            self.symbols.clone(),
            self.flags.clone(),
            evaluator.scope(),
            self.verdicts.clone(),
        );
        evaluator.start(name.clone(), entry(context.clone()));
        drop(evaluator);

        info!("LOADSPEC ASSERTION MODULE: {}", name);
        self.bound.lock().push(name);
        Ok(BoundProgram { spec, context })
    }
}
