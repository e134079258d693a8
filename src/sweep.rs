use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::error::{Result, SweepError};
use crate::node::{Node, NodeId, Tree};
use crate::param::Param;
use crate::settings::Settings;
use crate::value::{AttrValue, Value};

// ------------- OutputHandler -------------
/// Produces one kind of output for a finished sweep, returning the files written.
pub trait OutputHandler: Send + Sync + fmt::Debug {
    fn generate(&self, sweep: &DesignSweep, settings: &Settings) -> Result<Vec<PathBuf>>;
}

// ------------- SweepKind -------------
/// A kind of design sweep: the parameters its root declares and the outputs it can generate.
#[derive(Debug, Clone)]
pub struct SweepKind {
    name: String,
    params: Vec<Arc<Param>>,
    outputs: BTreeMap<String, Arc<dyn OutputHandler>>,
}

impl SweepKind {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_owned(), params: Vec::new(), outputs: BTreeMap::new() }
    }
    pub fn with_params(mut self, params: &[Arc<Param>]) -> Self {
        self.params.extend(params.iter().cloned());
        self
    }
    pub fn with_output(mut self, output: &str, handler: Arc<dyn OutputHandler>) -> Self {
        self.outputs.insert(output.to_owned(), handler);
        self
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn params(&self) -> &[Arc<Param>] {
        &self.params
    }
    pub fn handler(&self, output: &str) -> Option<&Arc<dyn OutputHandler>> {
        self.outputs.get(output)
    }
    pub fn outputs(&self) -> impl Iterator<Item = &str> {
        self.outputs.keys().map(String::as_str)
    }
}

// ------------- DesignSweep -------------
pub const OUTPUT_DIR: &str = "output_dir";

/// A sweep being built by a script, rooted at a sweepable node of its kind.
#[derive(Debug, Clone)]
pub struct DesignSweep {
    kind: Arc<SweepKind>,
    tree: Tree,
    root: NodeId,
    name: Option<String>,
    done: bool,
    generate_outputs: BTreeSet<String>,
}

impl DesignSweep {
    pub fn new(kind: Arc<SweepKind>) -> Self {
        let mut tree = Tree::new();
        let mut root = Node::with_params(kind.name(), "", kind.params());
        root.set_attr(OUTPUT_DIR, AttrValue::Value(Value::Str(String::new())));
        let root = tree.add(root);
        Self { kind, tree, root, name: None, done: false, generate_outputs: BTreeSet::new() }
    }
    pub fn initialize(&mut self, name: &str) {
        self.name = Some(name.to_owned());
        self.tree.node_mut(self.root).set_name(name);
    }
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
    pub fn kind(&self) -> &Arc<SweepKind> {
        &self.kind
    }
    pub fn tree(&self) -> &Tree {
        &self.tree
    }
    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }
    pub fn root(&self) -> NodeId {
        self.root
    }
    pub fn is_done(&self) -> bool {
        self.done
    }
    /// Fails unless the sweep has begun and has not ended.
    pub fn ensure_active(&self) -> Result<()> {
        match (&self.name, self.done) {
            (None, _) => Err(SweepError::NotInitialized),
            (Some(name), true) => Err(SweepError::SweepDone { name: name.clone() }),
            (Some(_), false) => Ok(()),
        }
    }
    pub fn end(&mut self) -> Result<()> {
        self.ensure_active()?;
        self.done = true;
        Ok(())
    }
    pub fn add_generate_output(&mut self, output: &str) -> Result<()> {
        self.ensure_active()?;
        self.generate_outputs.insert(output.to_owned());
        Ok(())
    }
    pub fn generate_outputs(&self) -> &BTreeSet<String> {
        &self.generate_outputs
    }
    /// Directory below the output root where this sweep's files go.
    pub fn output_dir(&self) -> String {
        match self.tree.node(self.root).attr(OUTPUT_DIR) {
            Some(AttrValue::Value(Value::Str(dir))) => dir.clone(),
            Some(AttrValue::Value(other)) => other.to_string(),
            _ => String::new(),
        }
    }
    /// Checks every requested output has a handler and every declared parameter value is valid.
    pub fn validate(&self) -> Result<()> {
        for output in &self.generate_outputs {
            if self.kind.handler(output).is_none() {
                return Err(SweepError::MissingHandler { kind: self.kind.name().to_owned(), output: output.clone() });
            }
        }
        self.tree.validate(self.root)
    }
    pub fn generate_all_outputs(&self, settings: &Settings) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for output in &self.generate_outputs {
            let handler = self.kind.handler(output).ok_or_else(|| SweepError::MissingHandler {
                kind: self.kind.name().to_owned(),
                output: output.clone(),
            })?;
            info!(sweep = self.name().unwrap_or_default(), output = %output, "generating output");
            written.extend(handler.generate(self, settings)?);
        }
        Ok(written)
    }
}
