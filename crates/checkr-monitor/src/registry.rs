//! Shared symbol table
//!
//! The agent defines events and predicates here; assertion programs look
//! them up by name. Every holder of a `SymbolTable` sees the same entries, so
//! a program bound early still resolves symbols defined after it was loaded.

use crate::flags::FlagTable;
use checkr_eval::{EvalError, EvalResult, Event, ObserverEvent, Predicate};
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub enum Symbol {
    Event(Event),
    Observer(ObserverEvent),
    Pred(Predicate),
    Flags(FlagTable),
    Value(serde_json::Value),
}

impl Symbol {
    pub fn kind(&self) -> &'static str {
        match self {
            Symbol::Event(_) => "event",
            Symbol::Observer(_) => "observer event",
            Symbol::Pred(_) => "predicate",
            Symbol::Flags(_) => "flag table",
            Symbol::Value(_) => "value",
        }
    }
}

impl From<Event> for Symbol {
    fn from(e: Event) -> Self {
        Symbol::Event(e)
    }
}

impl From<ObserverEvent> for Symbol {
    fn from(e: ObserverEvent) -> Self {
        Symbol::Observer(e)
    }
}

impl From<Predicate> for Symbol {
    fn from(p: Predicate) -> Self {
        Symbol::Pred(p)
    }
}

impl From<FlagTable> for Symbol {
    fn from(f: FlagTable) -> Self {
        Symbol::Flags(f)
    }
}

impl From<serde_json::Value> for Symbol {
    fn from(v: serde_json::Value) -> Self {
        Symbol::Value(v)
    }
}

#[derive(Clone, Default)]
pub struct SymbolTable {
    symbols: Arc<DashMap<String, Symbol>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. Returns the previous definition, if any.
    pub fn define(&self, name: impl Into<String>, symbol: impl Into<Symbol>) -> Option<Symbol> {
        self.symbols.insert(name.into(), symbol.into())
    }

    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.symbols.get(name).map(|s| s.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    /// Resolve any waitable event. Observer events resolve to their
    /// underlying event.
    pub fn event(&self, name: &str) -> EvalResult<Event> {
        match self.lookup(name)? {
            Symbol::Event(e) => Ok(e),
            Symbol::Observer(o) => Ok(o.event().clone()),
            _ => Err(wrong_kind(name, "an event")),
        }
    }

    pub fn observer(&self, name: &str) -> EvalResult<ObserverEvent> {
        match self.lookup(name)? {
            Symbol::Observer(o) => Ok(o),
            _ => Err(wrong_kind(name, "an observer event")),
        }
    }

    pub fn pred(&self, name: &str) -> EvalResult<Predicate> {
        match self.lookup(name)? {
            Symbol::Pred(p) => Ok(p),
            _ => Err(wrong_kind(name, "a predicate")),
        }
    }

    pub fn value(&self, name: &str) -> Option<serde_json::Value> {
        match self.get(name)? {
            Symbol::Value(v) => Some(v),
            _ => None,
        }
    }

    /// All names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.symbols.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    fn lookup(&self, name: &str) -> EvalResult<Symbol> {
        self.get(name)
            .ok_or_else(|| EvalError::UnresolvedSymbol(name.to_string()))
    }
}

fn wrong_kind(name: &str, expected: &'static str) -> EvalError {
    EvalError::WrongKind {
        name: name.to_string(),
        expected,
    }
}
