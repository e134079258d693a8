//! Named sweep kinds and importable modules.
//!
//! A `Registry` is built once, up front, and is read-only while scripts run.
//! Parameters for everything it holds are declared through its builder so that
//! they all draw ids from the same generator.
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{Result, SweepError};
use crate::node::Template;
use crate::param::{Param, ParamIdGenerator};
use crate::sweep::SweepKind;
use crate::value::{ParamType, Value};

// ------------- Export -------------
#[derive(Debug, Clone)]
pub enum Export {
    Kind(Arc<SweepKind>),
    Object(Template),
}

#[derive(Debug, Clone, Default)]
pub struct Module {
    exports: BTreeMap<String, Export>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_kind(mut self, kind: SweepKind) -> Self {
        self.exports.insert(kind.name().to_owned(), Export::Kind(Arc::new(kind)));
        self
    }
    pub fn with_object(mut self, name: &str, template: Template) -> Self {
        self.exports.insert(name.to_owned(), Export::Object(template));
        self
    }
    pub fn export(&self, name: &str) -> Option<&Export> {
        self.exports.get(name)
    }
    pub fn exports(&self) -> impl Iterator<Item = (&str, &Export)> {
        self.exports.iter().map(|(n, e)| (n.as_str(), e))
    }
}

// ------------- Scope -------------
/// Names imported outside of any sweep.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    names: BTreeMap<String, Export>,
}

impl Scope {
    pub fn insert(&mut self, name: &str, export: Export) {
        self.names.insert(name.to_owned(), export);
    }
    pub fn get(&self, name: &str) -> Option<&Export> {
        self.names.get(name)
    }
    pub fn kind(&self, name: &str) -> Option<Arc<SweepKind>> {
        match self.names.get(name) {
            Some(Export::Kind(kind)) => Some(Arc::clone(kind)),
            _ => None,
        }
    }
}

// ------------- Registry -------------
#[derive(Debug)]
pub struct Registry {
    kinds: BTreeMap<String, Arc<SweepKind>>,
    modules: BTreeMap<String, Module>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }
    /// A built-in kind, available to `begin` without any import.
    pub fn kind(&self, name: &str) -> Option<Arc<SweepKind>> {
        self.kinds.get(name).cloned()
    }
    pub fn module(&self, path: &str) -> Option<&Module> {
        self.modules.get(path)
    }
    /// Resolves `a.b` (every export of module `a.b`), `a.b.*` (the same) or
    /// `a.b.Item` (one export of module `a.b`).
    pub fn resolve_import(&self, path: &[String], all: bool) -> Result<Vec<(String, Export)>> {
        let dotted = path.join(".");
        let everything = |module: &Module| module.exports().map(|(n, e)| (n.to_owned(), e.clone())).collect::<Vec<_>>();
        if let Some(module) = self.modules.get(&dotted) {
            return Ok(everything(module));
        }
        let not_found = || SweepError::Import { path: dotted.clone(), reason: "no such module or export".into() };
        if all {
            return Err(not_found());
        }
        let (item, module_path) = path.split_last().ok_or_else(not_found)?;
        let module = self.modules.get(&module_path.join(".")).ok_or_else(not_found)?;
        let export = module.export(item).ok_or_else(not_found)?;
        Ok(vec![(item.clone(), export.clone())])
    }
}

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    ids: ParamIdGenerator,
    kinds: BTreeMap<String, Arc<SweepKind>>,
    modules: BTreeMap<String, Module>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn param(&mut self, expected_type: ParamType, name: &str, default: impl Into<Value>) -> Result<Arc<Param>> {
        Ok(Arc::new(Param::new(&mut self.ids, expected_type, name, default)?))
    }
    pub fn param_with_options(&mut self, expected_type: ParamType, name: &str, default: impl Into<Value>, options: Vec<Value>) -> Result<Arc<Param>> {
        Ok(Arc::new(Param::new(&mut self.ids, expected_type, name, default)?.with_valid_opts(options)?))
    }
    pub fn kind(&mut self, kind: SweepKind) -> &mut Self {
        self.kinds.insert(kind.name().to_owned(), Arc::new(kind));
        self
    }
    pub fn module(&mut self, path: &str, module: Module) -> &mut Self {
        self.modules.insert(path.to_owned(), module);
        self
    }
    pub fn build(self) -> Registry {
        Registry { kinds: self.kinds, modules: self.modules }
    }
}
