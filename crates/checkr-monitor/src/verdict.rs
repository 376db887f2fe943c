//! Pass/fail records produced by assertion programs

use checkr_eval::Time;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Verdict {
    /// The `module:entry` spec of the program that produced it.
    pub program: String,
    pub time: Time,
    pub outcome: Outcome,
    pub message: String,
}

impl Verdict {
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Pass
    }
}

#[derive(Clone, Default)]
pub struct VerdictLog {
    entries: Arc<Mutex<Vec<Verdict>>>,
}

impl VerdictLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, verdict: Verdict) {
        self.entries.lock().push(verdict);
    }

    pub fn all(&self) -> Vec<Verdict> {
        self.entries.lock().clone()
    }

    pub fn failures(&self) -> Vec<Verdict> {
        self.entries
            .lock()
            .iter()
            .filter(|v| !v.passed())
            .cloned()
            .collect()
    }

    /// Verdicts recorded by one program.
    pub fn for_program(&self, program: &str) -> Vec<Verdict> {
        self.entries
            .lock()
            .iter()
            .filter(|v| v.program == program)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
