//! Named assertion programs available to `load_spec`

use crate::assertions;
use crate::context::AssertionContext;
use checkr_eval::{TaskResult, WatcherTask};
use futures::FutureExt;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;

/// Builds the root watcher task of a program from its context.
pub type EntryPoint = Arc<dyn Fn(AssertionContext) -> WatcherTask + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("malformed assertion spec '{0}', expected module:entry")]
    Malformed(String),

    #[error("assertion module not found: {0}")]
    ModuleNotFound(String),

    #[error("entry point '{entry}' not found in assertion module '{module}'")]
    EntryNotFound { module: String, entry: String },
}

impl From<LoadError> for checkr_core::Error {
    fn from(e: LoadError) -> Self {
        let spec = match &e {
            LoadError::Malformed(s) | LoadError::ModuleNotFound(s) => s.clone(),
            LoadError::EntryNotFound { module, entry } => format!("{}:{}", module, entry),
        };
        checkr_core::Error::load_failed(spec, e.to_string())
    }
}

/// A parsed `module:entry` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSpec {
    pub module: String,
    pub entry: String,
}

impl ModuleSpec {
    pub fn parse(spec: &str) -> Result<Self, LoadError> {
        match spec.split_once(':') {
            Some((module, entry))
                if !module.trim().is_empty()
                    && !entry.trim().is_empty()
                    && !entry.contains(':') =>
            {
                Ok(Self {
                    module: module.trim().to_string(),
                    entry: entry.trim().to_string(),
                })
            }
            _ => Err(LoadError::Malformed(spec.to_string())),
        }
    }
}

impl std::fmt::Display for ModuleSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.module, self.entry)
    }
}

#[derive(Clone, Default)]
pub struct AssertionCatalog {
    modules: HashMap<String, HashMap<String, EntryPoint>>,
}

impl AssertionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with every program shipped in this crate.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.register("assertion1", "mainfn", assertions::assertion1::mainfn);
        catalog.register("tool_discipline", "mainfn", assertions::tool_discipline::mainfn);
        catalog.register("query_liveness", "mainfn", assertions::query_liveness::mainfn);
        catalog
    }

    /// Register an entry point. Replaces any existing entry with the same name.
    pub fn register<F, Fut>(&mut self, module: &str, entry: &str, f: F)
    where
        F: Fn(AssertionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TaskResult> + Send + 'static,
    {
        let entry_point: EntryPoint = Arc::new(move |ctx| f(ctx).boxed());
        self.modules
            .entry(module.to_string())
            .or_default()
            .insert(entry.to_string(), entry_point);
    }

    /// A dotted module path such as `checkr_agents.assertions.assertion1`
    /// falls back to its last segment.
    pub fn resolve(&self, spec: &ModuleSpec) -> Result<EntryPoint, LoadError> {
        let module = self
            .modules
            .get(&spec.module)
            .or_else(|| {
                let (_, short) = spec.module.rsplit_once('.')?;
                self.modules.get(short)
            })
            .ok_or_else(|| LoadError::ModuleNotFound(spec.module.clone()))?;
        module
            .get(&spec.entry)
            .cloned()
            .ok_or_else(|| LoadError::EntryNotFound {
                module: spec.module.clone(),
                entry: spec.entry.clone(),
            })
    }

    /// Every `module:entry`, sorted.
    pub fn list(&self) -> Vec<String> {
        let sorted: BTreeMap<_, _> = self.modules.iter().collect();
        sorted
            .into_iter()
            .flat_map(|(module, entries)| {
                let mut names: Vec<_> = entries.keys().collect();
                names.sort();
                names
                    .into_iter()
                    .map(move |entry| format!("{}:{}", module, entry))
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_module_spec() {
        let spec = ModuleSpec::parse("assertion1:mainfn").unwrap();
        assert_eq!(spec.module, "assertion1");
        assert_eq!(spec.entry, "mainfn");
        assert_eq!(spec.to_string(), "assertion1:mainfn");

        for bad in ["assertion1", ":mainfn", "assertion1:", "a:b:c", ""] {
            assert_eq!(ModuleSpec::parse(bad), Err(LoadError::Malformed(bad.to_string())));
        }
    }

    #[test]
    fn builtin_catalog_lists_programs() {
        let catalog = AssertionCatalog::builtin();
        assert_eq!(
            catalog.list(),
            vec![
                "assertion1:mainfn",
                "query_liveness:mainfn",
                "tool_discipline:mainfn"
            ]
        );
    }

    #[test]
    fn resolve_reports_missing_pieces() {
        let catalog = AssertionCatalog::builtin();
        let missing_module = ModuleSpec::parse("assertion2:mainfn").unwrap();
        assert!(matches!(
            catalog.resolve(&missing_module),
            Err(LoadError::ModuleNotFound(m)) if m == "assertion2"
        ));
        let missing_entry = ModuleSpec::parse("assertion1:mainfn2").unwrap();
        assert!(matches!(
            catalog.resolve(&missing_entry),
            Err(LoadError::EntryNotFound { .. })
        ));
    }

    #[test]
    fn dotted_module_path_resolves_by_last_segment() {
        let catalog = AssertionCatalog::builtin();
        let dotted = ModuleSpec::parse("checkr_agents.assertions.assertion1:mainfn").unwrap();
        assert!(catalog.resolve(&dotted).is_ok());
        let unknown = ModuleSpec::parse("checkr_agents.assertions.nope:mainfn").unwrap();
        assert!(matches!(
            catalog.resolve(&unknown),
            Err(LoadError::ModuleNotFound(m)) if m == "checkr_agents.assertions.nope"
        ));
    }
}
