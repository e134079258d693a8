//! Expansion of a finished sweep into every concrete configuration.
//!
//! Generation first discovers which parameter ids carry a range anywhere in the
//! sweep's sweepable tree. The same id swept on several nodes is one axis, so
//! every such range must have the same length. Axes are ordered by ascending id
//! and walked as a row-major grid, the highest id varying fastest.
//!
//! Each configuration is a `View`: a detached snapshot of the sweepable tree
//! filled in three passes.
//!
//! 1. Swept parameters take the value at their axis index.
//! 2. Deferred expressions are evaluated against the whole configuration,
//!    repeatedly, until none are left. A round that resolves nothing means the
//!    remaining expressions wait on each other and generation fails.
//! 3. Attributes still unassigned take their parameter's default.
use serde_json::{Map, Value as Json};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{Result, SweepError};
use crate::expression::{Environment, EvalError, Expression, Resolved};
use crate::node::{NodeId, Tree};
use crate::param::{Param, ParamId};
use crate::sweep::DesignSweep;
use crate::value::{AttrValue, Value};

// ------------- View -------------
#[derive(Debug, Clone, PartialEq)]
pub struct ViewAttr {
    name: String,
    value: AttrValue,
    param: Option<Arc<Param>>,
}

impl ViewAttr {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn value(&self) -> &AttrValue {
        &self.value
    }
    pub fn param(&self) -> Option<&Arc<Param>> {
        self.param.as_ref()
    }
    fn assign(&mut self, value: Value) {
        self.value = AttrValue::Value(match &self.param {
            Some(param) => param.coerce(value),
            None => value,
        });
    }
}

/// One configuration of a sweepable node and its sweepable children.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    source: NodeId,
    type_name: String,
    name: String,
    attrs: Vec<ViewAttr>,
    children: Vec<(String, View)>,
}

impl View {
    /// Copies the user attributes of `id` and, recursively, its sweepable children.
    pub fn snapshot(tree: &Tree, id: NodeId) -> View {
        let node = tree.node(id);
        let attrs = node
            .attrs()
            .filter(|(name, _)| node.user_attrs().contains(*name))
            .map(|(name, value)| ViewAttr {
                name: name.to_owned(),
                value: value.clone(),
                param: node.sweepable().and_then(|s| s.param(name)).cloned(),
            })
            .collect();
        let children = node
            .children()
            .filter(|(_, child)| tree.node(*child).is_sweepable())
            .map(|(slot, child)| (slot.to_owned(), View::snapshot(tree, child)))
            .collect();
        View { source: id, type_name: node.type_name().to_owned(), name: node.name().to_owned(), attrs, children }
    }
    pub fn source(&self) -> NodeId {
        self.source
    }
    pub fn type_name(&self) -> &str {
        &self.type_name
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn key(&self) -> String {
        format!("{}(\"{}\")", self.type_name, self.name)
    }
    pub fn attrs(&self) -> &[ViewAttr] {
        &self.attrs
    }
    pub fn get(&self, attr: &str) -> Option<&AttrValue> {
        self.attrs.iter().find(|a| a.name == attr).map(|a| &a.value)
    }
    pub fn value(&self, attr: &str) -> Option<&Value> {
        self.get(attr).and_then(AttrValue::value)
    }
    pub fn child(&self, slot: &str) -> Option<&View> {
        self.children.iter().find(|(n, _)| n == slot).map(|(_, v)| v)
    }
    pub fn children(&self) -> impl Iterator<Item = (&str, &View)> {
        self.children.iter().map(|(n, v)| (n.as_str(), v))
    }
    /// Follows a dotted path of child slots, then reads the last segment as an attribute.
    pub fn lookup(&self, dotted: &str) -> Option<&Value> {
        let parts: Vec<&str> = dotted.split('.').collect();
        let (attr, slots) = parts.split_last()?;
        let mut view = self;
        for slot in slots {
            view = view.child(slot)?;
        }
        view.value(attr)
    }
    fn at_mut(&mut self, path: &[usize]) -> &mut View {
        let mut view = self;
        for index in path {
            view = &mut view.children[*index].1;
        }
        view
    }
    fn collect_pending(&self, at: &mut Vec<usize>, found: &mut Vec<(Vec<usize>, usize, Expression)>) {
        for (index, attr) in self.attrs.iter().enumerate() {
            if let AttrValue::Deferred(expr) = &attr.value {
                found.push((at.clone(), index, expr.clone()));
            }
        }
        for (index, (_, child)) in self.children.iter().enumerate() {
            at.push(index);
            child.collect_pending(at, found);
            at.pop();
        }
    }
    pub fn to_json(&self) -> Json {
        let mut map = Map::new();
        map.insert(self.key(), Json::Object(self.body()));
        Json::Object(map)
    }
    fn body(&self) -> Map<String, Json> {
        let mut body = Map::new();
        body.insert("name".to_owned(), Json::from(self.name.as_str()));
        body.insert("type".to_owned(), Json::from(self.type_name.as_str()));
        for attr in &self.attrs {
            body.insert(attr.name.clone(), attr.value.to_json());
        }
        for (_, child) in &self.children {
            body.insert(child.key(), Json::Object(child.body()));
        }
        body
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {{", self.key())?;
        let mut first = true;
        for attr in &self.attrs {
            let shown = match (&attr.value, &attr.param) {
                (AttrValue::Value(v), Some(param)) => param.format(v),
                (other, _) => other.to_string(),
            };
            write!(f, "{}{}={}", if first { "" } else { ", " }, attr.name, shown)?;
            first = false;
        }
        for (_, child) in &self.children {
            write!(f, "{}{}", if first { "" } else { ", " }, child)?;
            first = false;
        }
        write!(f, "}}")
    }
}

impl Environment for View {
    fn resolve(&self, path: &[String]) -> std::result::Result<Resolved<'_>, EvalError> {
        let dotted = || path.join(".");
        let Some((attr, slots)) = path.split_last() else {
            return Err(EvalError::Missing(String::new()));
        };
        let mut view = self;
        for slot in slots {
            view = match view.child(slot) {
                Some(child) => child,
                None if view.get(slot).is_some() => {
                    return Err(EvalError::NotNumeric { path: dotted(), found: format!("{} a value", slot) });
                }
                None => return Err(EvalError::Missing(dotted())),
            };
        }
        match view.attrs.iter().find(|a| a.name == *attr) {
            Some(ViewAttr { value: AttrValue::Value(v), .. }) => Ok(Resolved::Value(v)),
            // an untouched parameter reads as its default
            Some(ViewAttr { value: AttrValue::Unassigned, param: Some(param), .. }) => Ok(Resolved::Value(param.default_value())),
            Some(ViewAttr { value: AttrValue::Unassigned, param: None, .. }) => Ok(Resolved::Unassigned),
            Some(ViewAttr { value: AttrValue::Deferred(_), .. }) => Ok(Resolved::Pending),
            None if view.child(attr).is_some() => Err(EvalError::NotNumeric { path: dotted(), found: "an object".into() }),
            None => Err(EvalError::Missing(dotted())),
        }
    }
}

// ------------- Passes -------------
fn apply_sweep_values(view: &mut View, tree: &Tree, axes: &[ParamId], indices: &[usize]) {
    if let Some(sweepable) = tree.node(view.source).sweepable() {
        for (id, index) in axes.iter().zip(indices) {
            let Some(value) = sweepable.sweep_range(*id).and_then(|range| range.get(*index)) else {
                continue;
            };
            let Some(name) = sweepable.param_name(*id) else {
                continue;
            };
            if let Some(attr) = view.attrs.iter_mut().find(|a| a.name == name) {
                attr.assign(value.clone());
            }
        }
    }
    for (_, child) in view.children.iter_mut() {
        apply_sweep_values(child, tree, axes, indices);
    }
}

fn apply_expression_values(root: &mut View) -> Result<()> {
    loop {
        let mut pending = Vec::new();
        root.collect_pending(&mut Vec::new(), &mut pending);
        if pending.is_empty() {
            return Ok(());
        }
        let mut resolved = Vec::new();
        let mut blocked = None;
        for (at, index, expr) in &pending {
            match expr.eval(&*root) {
                Ok(outcome) => resolved.push((at, *index, outcome.into_value())),
                Err(EvalError::Pending(path)) => {
                    blocked.get_or_insert((expr, path));
                }
                Err(e) => return Err(e.into_sweep_error(expr)),
            }
        }
        if resolved.is_empty() {
            let (expr, path) = blocked.map(|(e, p)| (e.to_string(), p)).unwrap_or_default();
            return Err(SweepError::Expression {
                expr,
                reason: format!("it depends on {}, which never resolves", path),
            });
        }
        for (at, index, value) in resolved {
            let attr = &mut root.at_mut(at).attrs[index];
            attr.assign(value);
            if let (AttrValue::Value(v), Some(param)) = (&attr.value, &attr.param) {
                param.check_value(v)?;
            }
        }
    }
}

fn apply_default_values(view: &mut View) {
    for attr in view.attrs.iter_mut() {
        if let (AttrValue::Unassigned, Some(param)) = (&attr.value, &attr.param) {
            attr.value = AttrValue::Value(param.default_value().clone());
        }
    }
    for (_, child) in view.children.iter_mut() {
        apply_default_values(child);
    }
}

// ------------- GridIndices -------------
/// Row-major walk over a grid of the given shape; the last dimension varies fastest.
#[derive(Debug, Clone)]
pub struct GridIndices {
    shape: Vec<usize>,
    current: Vec<usize>,
    done: bool,
}

impl GridIndices {
    pub fn new(shape: Vec<usize>) -> Self {
        let done = shape.contains(&0);
        Self { current: vec![0; shape.len()], shape, done }
    }
}

impl Iterator for GridIndices {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.current.clone();
        if self.shape.is_empty() {
            self.done = true;
        }
        for i in (0..self.shape.len()).rev() {
            self.current[i] += 1;
            if self.current[i] < self.shape[i] {
                break;
            }
            self.current[i] = 0;
            if i == 0 {
                self.done = true;
            }
        }
        Some(result)
    }
}

// ------------- ConfigGenerator -------------
pub struct ConfigGenerator<'s> {
    sweep: &'s DesignSweep,
}

impl<'s> ConfigGenerator<'s> {
    pub fn new(sweep: &'s DesignSweep) -> Self {
        Self { sweep }
    }
    /// Swept ids with their range length, ascending by id.
    pub fn axes(&self) -> Result<Vec<(ParamId, usize)>> {
        let tree = self.sweep.tree();
        let mut lengths: BTreeMap<ParamId, usize> = BTreeMap::new();
        for id in tree.sweepable_chain(self.sweep.root()) {
            let Some(sweepable) = tree.node(id).sweepable() else {
                continue;
            };
            for (param, range) in sweepable.swept() {
                let previous = *lengths.entry(param).or_insert(range.len());
                if previous != range.len() {
                    return Err(SweepError::MismatchingRange {
                        param: sweepable.param_name(param).unwrap_or_default().to_owned(),
                        this_len: range.len(),
                        prev_len: previous,
                    });
                }
            }
        }
        Ok(lengths.into_iter().collect())
    }
    pub fn count(&self) -> Result<usize> {
        Ok(self.axes()?.iter().map(|(_, len)| *len).product())
    }
    /// Lazily yields every configuration in grid order.
    pub fn iter(&self) -> Result<Configs<'s>> {
        let axes = self.axes()?;
        debug!(sweep = self.sweep.name().unwrap_or_default(), axes = axes.len(), "discovered sweep axes");
        let (ids, shape): (Vec<ParamId>, Vec<usize>) = axes.into_iter().unzip();
        Ok(Configs {
            tree: self.sweep.tree(),
            template: View::snapshot(self.sweep.tree(), self.sweep.root()),
            ids,
            grid: GridIndices::new(shape),
        })
    }
    pub fn generate(&self) -> Result<ConfigSet> {
        let views = self.iter()?.collect::<Result<Vec<View>>>()?;
        info!(sweep = self.sweep.name().unwrap_or_default(), configs = views.len(), "generated configurations");
        Ok(ConfigSet { views })
    }
}

pub struct Configs<'s> {
    tree: &'s Tree,
    template: View,
    ids: Vec<ParamId>,
    grid: GridIndices,
}

impl Iterator for Configs<'_> {
    type Item = Result<View>;

    fn next(&mut self) -> Option<Self::Item> {
        let indices = self.grid.next()?;
        let mut view = self.template.clone();
        apply_sweep_values(&mut view, self.tree, &self.ids, &indices);
        Some(apply_expression_values(&mut view).map(|_| {
            apply_default_values(&mut view);
            view
        }))
    }
}

// ------------- ConfigSet -------------
#[derive(Debug, Clone, Default)]
pub struct ConfigSet {
    views: Vec<View>,
}

impl ConfigSet {
    pub fn len(&self) -> usize {
        self.views.len()
    }
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
    pub fn views(&self) -> &[View] {
        &self.views
    }
    pub fn iter(&self) -> std::slice::Iter<'_, View> {
        self.views.iter()
    }
    pub fn to_json(&self) -> Json {
        Json::Array(self.views.iter().map(View::to_json).collect())
    }
    pub fn write<W: Write>(&self, writer: W, pretty: bool) -> Result<()> {
        let json = self.to_json();
        if pretty {
            serde_json::to_writer_pretty(writer, &json)?;
        } else {
            serde_json::to_writer(writer, &json)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ConfigSet {
    type Item = &'a View;
    type IntoIter = std::slice::Iter<'a, View>;
    fn into_iter(self) -> Self::IntoIter {
        self.views.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_walks_last_axis_fastest() {
        let grid: Vec<Vec<usize>> = GridIndices::new(vec![2, 3]).collect();
        assert_eq!(grid.len(), 6);
        assert_eq!(grid[0], vec![0, 0]);
        assert_eq!(grid[1], vec![0, 1]);
        assert_eq!(grid[3], vec![1, 0]);
    }

    #[test]
    fn no_axes_is_one_configuration() {
        assert_eq!(GridIndices::new(vec![]).count(), 1);
        assert_eq!(GridIndices::new(vec![3, 0]).count(), 0);
    }
}
