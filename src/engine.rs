use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use crate::command::{Command, SetValue, SweepValues};
use crate::error::{Result, SweepError};
use crate::expression::resolve_eagerly;
use crate::registry::{Export, Registry, Scope};
use crate::selection::{Selection, TreeScope};
use crate::sweep::DesignSweep;
use crate::value::{AttrValue, Value};

/// Applies commands one at a time, tracking the sweep they act on.
///
/// At most one sweep is active. `end` hands the finished sweep back to the
/// caller; everything else changes the active sweep or the global scope.
pub struct Engine<'r> {
    registry: &'r Registry,
    globals: Scope,
    active: Option<DesignSweep>,
    configured: BTreeSet<String>,
}

impl<'r> Engine<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry, globals: Scope::default(), active: None, configured: BTreeSet::new() }
    }
    pub fn active(&self) -> Option<&DesignSweep> {
        self.active.as_ref()
    }
    pub fn globals(&self) -> &Scope {
        &self.globals
    }
    /// Names of every sweep that has ended so far.
    pub fn configured(&self) -> &BTreeSet<String> {
        &self.configured
    }
    /// Applies a command, returning the sweep it finished, if any.
    pub fn apply(&mut self, command: &Command) -> Result<Option<DesignSweep>> {
        match command {
            Command::Begin { kind, name } => self.begin(kind, name).map(|_| None),
            Command::End { name } => self.end(name.as_deref()).map(Some),
            Command::Set { param, selection, value } => self.set(param, selection, value).map(|_| None),
            Command::Sweep { param, selection, values } => self.sweep(param, selection, values).map(|_| None),
            Command::Use { path, all } => self.import(path, *all).map(|_| None),
            Command::Generate { target } => self.generate(target).map(|_| None),
            Command::Source { path } => Err(SweepError::Import {
                path: path.display().to_string(),
                reason: "source statements are expanded when a file is loaded".into(),
            }),
        }
    }

    fn active_mut(&mut self, command: &'static str) -> Result<&mut DesignSweep> {
        let sweep = self.active.as_mut().ok_or(SweepError::NoActiveSweep { command })?;
        sweep.ensure_active()?;
        Ok(sweep)
    }

    fn begin(&mut self, kind: &str, name: &str) -> Result<()> {
        if let Some(active) = &self.active {
            return Err(SweepError::SweepActive { name: active.name().unwrap_or_default().to_owned() });
        }
        if self.configured.contains(name) {
            return Err(SweepError::DuplicateSweepName { name: name.to_owned() });
        }
        let kind = self
            .globals
            .kind(kind)
            .or_else(|| self.registry.kind(kind))
            .ok_or_else(|| SweepError::UnknownSweepType { name: kind.to_owned() })?;
        let mut sweep = DesignSweep::new(kind);
        sweep.initialize(name);
        info!(sweep = name, kind = sweep.kind().name(), "began sweep");
        self.active = Some(sweep);
        Ok(())
    }

    fn end(&mut self, name: Option<&str>) -> Result<DesignSweep> {
        let mut sweep = self.active.take().ok_or(SweepError::NoActiveSweep { command: "end" })?;
        sweep.end()?;
        let ended = sweep.name().unwrap_or_default().to_owned();
        if let Some(name) = name {
            if name != ended {
                warn!(sweep = %ended, named = name, "end names a different sweep than the active one");
            }
        }
        if !self.configured.insert(ended.clone()) {
            return Err(SweepError::DuplicateSweepName { name: ended });
        }
        info!(sweep = %ended, "ended sweep");
        Ok(sweep)
    }

    fn set(&mut self, param: &str, selection: &Selection, value: &SetValue) -> Result<()> {
        let sweep = self.active_mut("set")?;
        let root = sweep.root();
        let targets = selection.select(sweep.tree(), root)?;
        let value = match value {
            SetValue::Literal(v) => AttrValue::Value(v.clone()),
            SetValue::Expression(e) => resolve_eagerly(e, &TreeScope::new(sweep.tree(), root))?,
        };
        let mut assigned = 0;
        for id in targets {
            let node = sweep.tree_mut().node_mut(id);
            if !node.has_attr(param) {
                continue;
            }
            let declared = node.sweepable().and_then(|s| s.param(param)).cloned();
            let assigned_value = match (&value, declared) {
                (AttrValue::Value(v), Some(p)) => AttrValue::Value(p.coerce(v.clone())),
                _ => value.clone(),
            };
            node.set_attr(param, assigned_value);
            // a fixed value replaces any sweep of this parameter on this node
            if let Some(sweepable) = node.sweepable_mut() {
                sweepable.remove_sweep_range(param);
            }
            assigned += 1;
        }
        if assigned == 0 {
            return Err(SweepError::EmptySelection { attr: param.to_owned() });
        }
        debug!(param, selection = %selection, nodes = assigned, value = %value, "set");
        Ok(())
    }

    fn sweep(&mut self, param: &str, selection: &Selection, values: &SweepValues) -> Result<()> {
        let sweep = self.active_mut("sweep")?;
        let values = values.expand(param)?;
        let targets = selection.select(sweep.tree(), sweep.root())?;
        // every range is checked before any is installed
        let mut ranges = Vec::new();
        for id in targets {
            let Some(declared) = sweep.tree().node(id).sweepable().and_then(|s| s.param(param)) else {
                continue;
            };
            let range: Vec<Value> = values.iter().map(|v| declared.coerce(v.clone())).collect();
            for value in &range {
                declared.check_value(value)?;
            }
            ranges.push((id, range));
        }
        let mut installed = 0;
        for (id, range) in ranges {
            if let Some(sweepable) = sweep.tree_mut().node_mut(id).sweepable_mut() {
                if sweepable.set_sweep_range(param, range) {
                    installed += 1;
                }
            }
        }
        if installed == 0 {
            return Err(SweepError::EmptySelection { attr: param.to_owned() });
        }
        debug!(param, selection = %selection, nodes = installed, values = values.len(), "sweep");
        Ok(())
    }

    fn import(&mut self, path: &[String], all: bool) -> Result<()> {
        let exports = self.registry.resolve_import(path, all)?;
        match self.active.as_mut() {
            Some(sweep) => {
                sweep.ensure_active()?;
                let root = sweep.root();
                for (name, export) in exports {
                    match export {
                        Export::Object(template) => {
                            sweep.tree_mut().instantiate_under(root, &name, &template)?;
                        }
                        Export::Kind(_) => debug!(name = %name, "sweep kinds are not imported into a sweep"),
                    }
                }
            }
            None => {
                for (name, export) in exports {
                    self.globals.insert(&name, export);
                }
            }
        }
        Ok(())
    }

    fn generate(&mut self, target: &str) -> Result<()> {
        self.active_mut("generate")?.add_generate_output(target)
    }
}
