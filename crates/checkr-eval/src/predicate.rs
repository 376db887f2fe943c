//! Lazily evaluated boolean predicates

use std::sync::Arc;

/// A named boolean test.
///
/// The closure is run every time the predicate is evaluated, so it reads
/// whatever state it closes over (typically the flag table) at that moment.
#[derive(Clone)]
pub struct Predicate {
    name: Arc<str>,
    test: Arc<dyn Fn() -> bool + Send + Sync>,
}

impl Predicate {
    pub fn new(name: impl Into<String>, test: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        Self {
            name: Arc::from(name.into()),
            test: Arc::new(test),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn eval(&self) -> bool {
        (self.test)()
    }

    pub fn not(&self) -> Predicate {
        let inner = self.clone();
        Predicate::new(format!("!{}", self.name), move || !inner.eval())
    }

    pub fn and(&self, other: &Predicate) -> Predicate {
        let (a, b) = (self.clone(), other.clone());
        Predicate::new(format!("({} & {})", self.name, other.name), move || {
            a.eval() && b.eval()
        })
    }

    pub fn or(&self, other: &Predicate) -> Predicate {
        let (a, b) = (self.clone(), other.clone());
        Predicate::new(format!("({} | {})", self.name, other.name), move || {
            a.eval() || b.eval()
        })
    }

    /// Two handles refer to the same predicate definition.
    pub fn same(&self, other: &Predicate) -> bool {
        Arc::ptr_eq(&self.test, &other.test)
    }
}

impl std::fmt::Debug for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Pred({})", self.name)
    }
}
