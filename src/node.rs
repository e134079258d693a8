//! The object model: nodes living in an arena `Tree`, attribute slots, and the
//! sweepable state attached to nodes that declare parameters.
//!
//! Every node owns an ordered list of named slots. A slot holds either a child
//! node or an attribute value. Children are only reachable through their parent's
//! slots, and attaching a node below one of its own descendants is refused, so
//! the structure stays a tree.
use bimap::BiMap;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::error::{Result, SweepError};
use crate::param::{Param, ParamHasher, ParamId};
use crate::value::{AttrValue, Value};

// ------------- NodeId -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Node(NodeId),
    Value(AttrValue),
}

/// Attribute names with a leading or trailing underscore are private: they are
/// kept in slots but never reported as user attributes.
pub fn is_user_attr(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('_') && !name.ends_with('_')
}

// ------------- Sweepable -------------
/// Either way of naming a declared parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamRef<'a> {
    Name(&'a str),
    Id(ParamId),
}
impl<'a> From<&'a str> for ParamRef<'a> {
    fn from(name: &'a str) -> Self { ParamRef::Name(name) }
}
impl<'a> From<&'a String> for ParamRef<'a> {
    fn from(name: &'a String) -> Self { ParamRef::Name(name) }
}
impl From<ParamId> for ParamRef<'_> {
    fn from(id: ParamId) -> Self { ParamRef::Id(id) }
}

#[derive(Debug, Clone, Default)]
pub struct Sweepable {
    params: Vec<Arc<Param>>,
    ids: BiMap<String, ParamId>,
    ranges: HashMap<ParamId, Vec<Value>, ParamHasher>,
}

impl Sweepable {
    fn new(params: &[Arc<Param>]) -> Self {
        let mut sweepable = Sweepable::default();
        for param in params {
            sweepable.add_param(Arc::clone(param));
        }
        sweepable
    }
    fn add_param(&mut self, param: Arc<Param>) {
        // redeclaring a name replaces the earlier declaration
        if let Some((_, old)) = self.ids.remove_by_left(param.name()) {
            self.params.retain(|p| p.id() != old);
            self.ranges.remove(&old);
        }
        self.ids.insert(param.name().to_owned(), param.id());
        self.params.push(param);
    }
    fn id_of(&self, key: ParamRef) -> Option<ParamId> {
        match key {
            ParamRef::Name(name) => self.ids.get_by_left(name).copied(),
            ParamRef::Id(id) => self.ids.contains_right(&id).then_some(id),
        }
    }
    pub fn params(&self) -> &[Arc<Param>] {
        &self.params
    }
    pub fn param<'a>(&self, key: impl Into<ParamRef<'a>>) -> Option<&Arc<Param>> {
        let id = self.id_of(key.into())?;
        self.params.iter().find(|p| p.id() == id)
    }
    pub fn param_id(&self, name: &str) -> Option<ParamId> {
        self.ids.get_by_left(name).copied()
    }
    pub fn param_name(&self, id: ParamId) -> Option<&str> {
        self.ids.get_by_right(&id).map(String::as_str)
    }
    pub fn declares<'a>(&self, key: impl Into<ParamRef<'a>>) -> bool {
        self.id_of(key.into()).is_some()
    }
    pub fn has_sweep_range<'a>(&self, key: impl Into<ParamRef<'a>>) -> bool {
        self.sweep_range(key).is_some()
    }
    pub fn sweep_range<'a>(&self, key: impl Into<ParamRef<'a>>) -> Option<&[Value]> {
        let id = self.id_of(key.into())?;
        self.ranges.get(&id).map(Vec::as_slice)
    }
    /// Installs a range for a declared parameter. Returns false if the name is not declared.
    pub fn set_sweep_range(&mut self, name: &str, values: Vec<Value>) -> bool {
        match self.param_id(name) {
            Some(id) => {
                self.ranges.insert(id, values);
                true
            }
            None => false,
        }
    }
    pub fn remove_sweep_range<'a>(&mut self, key: impl Into<ParamRef<'a>>) -> Option<Vec<Value>> {
        let id = self.id_of(key.into())?;
        self.ranges.remove(&id)
    }
    /// Drops a declaration along with both directions of its name mapping and any range.
    pub fn remove_param<'a>(&mut self, key: impl Into<ParamRef<'a>>) -> Option<Arc<Param>> {
        let id = self.id_of(key.into())?;
        self.ids.remove_by_right(&id);
        self.ranges.remove(&id);
        let at = self.params.iter().position(|p| p.id() == id)?;
        Some(self.params.remove(at))
    }
    /// Active ranges keyed by parameter id, in ascending id order.
    pub fn swept(&self) -> Vec<(ParamId, &[Value])> {
        let mut swept: Vec<_> = self.ranges.iter().map(|(id, r)| (*id, r.as_slice())).collect();
        swept.sort_by_key(|(id, _)| *id);
        swept
    }
}

// ------------- Node -------------
#[derive(Debug, Clone)]
pub struct Node {
    type_name: String,
    name: String,
    parent: Option<NodeId>,
    slots: Vec<(String, Slot)>,
    user_attrs: BTreeSet<String>,
    sweepable: Option<Sweepable>,
}

impl Node {
    pub fn plain(type_name: &str, name: &str) -> Self {
        Self {
            type_name: type_name.to_owned(),
            name: name.to_owned(),
            parent: None,
            slots: Vec::new(),
            user_attrs: BTreeSet::new(),
            sweepable: None,
        }
    }
    /// A node declaring the given parameters; each gets an unassigned attribute slot.
    pub fn with_params(type_name: &str, name: &str, params: &[Arc<Param>]) -> Self {
        let mut node = Node::plain(type_name, name);
        let sweepable = Sweepable::new(params);
        for param in sweepable.params() {
            node.set_attr(param.name(), AttrValue::Unassigned);
        }
        node.sweepable = Some(sweepable);
        node
    }
    pub fn type_name(&self) -> &str {
        &self.type_name
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_owned();
    }
    /// `TypeName("name")`, the key a node is reported under.
    pub fn key(&self) -> String {
        format!("{}(\"{}\")", self.type_name, self.name)
    }
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
    pub fn is_sweepable(&self) -> bool {
        self.sweepable.is_some()
    }
    pub fn sweepable(&self) -> Option<&Sweepable> {
        self.sweepable.as_ref()
    }
    pub fn sweepable_mut(&mut self) -> Option<&mut Sweepable> {
        self.sweepable.as_mut()
    }
    pub fn slots(&self) -> impl Iterator<Item = (&str, &Slot)> {
        self.slots.iter().map(|(n, s)| (n.as_str(), s))
    }
    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }
    pub fn child(&self, name: &str) -> Option<NodeId> {
        match self.slot(name) {
            Some(Slot::Node(id)) => Some(*id),
            _ => None,
        }
    }
    pub fn children(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.slots.iter().filter_map(|(n, s)| match s {
            Slot::Node(id) => Some((n.as_str(), *id)),
            Slot::Value(_) => None,
        })
    }
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.slots.iter().filter_map(|(n, s)| match s {
            Slot::Value(v) => Some((n.as_str(), v)),
            Slot::Node(_) => None,
        })
    }
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        match self.slot(name) {
            Some(Slot::Value(v)) => Some(v),
            _ => None,
        }
    }
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }
    /// Assigns a value slot, creating it if needed. Refuses to overwrite a child slot.
    pub fn set_attr(&mut self, name: &str, value: AttrValue) -> bool {
        match self.slots.iter_mut().find(|(n, _)| n == name) {
            Some((_, Slot::Node(_))) => return false,
            Some((_, slot)) => *slot = Slot::Value(value),
            None => self.slots.push((name.to_owned(), Slot::Value(value))),
        }
        if is_user_attr(name) {
            self.user_attrs.insert(name.to_owned());
        }
        true
    }
    pub fn user_attrs(&self) -> &BTreeSet<String> {
        &self.user_attrs
    }
    fn put_child(&mut self, name: &str, child: NodeId) -> Option<NodeId> {
        self.user_attrs.remove(name);
        match self.slots.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => {
                let previous = match slot {
                    Slot::Node(old) => Some(*old),
                    Slot::Value(_) => None,
                };
                *slot = Slot::Node(child);
                previous
            }
            None => {
                self.slots.push((name.to_owned(), Slot::Node(child)));
                None
            }
        }
    }
}

// ------------- Template -------------
/// A declarative description of a subtree, instantiated into a `Tree` on `use`.
#[derive(Debug, Clone)]
pub struct Template {
    type_name: String,
    name: String,
    params: Vec<Arc<Param>>,
    attrs: Vec<(String, Value)>,
    children: Vec<(String, Template)>,
}

impl Template {
    pub fn sweepable(type_name: &str, name: &str, params: &[Arc<Param>]) -> Self {
        Self {
            type_name: type_name.to_owned(),
            name: name.to_owned(),
            params: params.to_vec(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }
    pub fn attr(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attrs.push((name.to_owned(), value.into()));
        self
    }
    /// Adds a child under the given slot name, or replaces one with the same slot name.
    pub fn child(mut self, slot: &str, child: Template) -> Self {
        self.put_child(slot, child);
        self
    }
    pub fn put_child(&mut self, slot: &str, child: Template) {
        match self.children.iter_mut().find(|(n, _)| n == slot) {
            Some((_, existing)) => *existing = child,
            None => self.children.push((slot.to_owned(), child)),
        }
    }
    pub fn child_mut(&mut self, slot: &str) -> Option<&mut Template> {
        self.children.iter_mut().find(|(n, _)| n == slot).map(|(_, t)| t)
    }
    pub fn type_name(&self) -> &str {
        &self.type_name
    }
    pub fn name(&self) -> &str {
        &self.name
    }
}

// ------------- Tree -------------
#[derive(Debug, Clone, Default)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
    /// Adds a detached node.
    pub fn add(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }
    /// Ids are only ever handed out by the tree that owns them.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(id).parent, move |p| self.node(*p).parent)
    }
    /// Places `child` in `parent`'s slot `name`. A child already in that slot is detached.
    pub fn attach(&mut self, parent: NodeId, name: &str, child: NodeId) -> Result<()> {
        if parent == child || self.ancestors(parent).any(|a| a == child) {
            return Err(SweepError::Cycle { name: name.to_owned() });
        }
        if let Some(old_parent) = self.node(child).parent {
            let old = self.node_mut(old_parent);
            old.slots.retain(|(_, s)| *s != Slot::Node(child));
        }
        if let Some(previous) = self.node_mut(parent).put_child(name, child) {
            if previous != child {
                self.node_mut(previous).parent = None;
            }
        }
        self.node_mut(child).parent = Some(parent);
        Ok(())
    }
    /// Builds a detached subtree from a template and returns its root.
    pub fn instantiate(&mut self, template: &Template) -> Result<NodeId> {
        let mut node = Node::with_params(&template.type_name, &template.name, &template.params);
        for (name, value) in &template.attrs {
            node.set_attr(name, AttrValue::Value(value.clone()));
        }
        let id = self.add(node);
        for (slot, child) in &template.children {
            let child_id = self.instantiate(child)?;
            self.attach(id, slot, child_id)?;
        }
        Ok(id)
    }
    pub fn instantiate_under(&mut self, parent: NodeId, slot: &str, template: &Template) -> Result<NodeId> {
        let id = self.instantiate(template)?;
        self.attach(parent, slot, id)?;
        Ok(id)
    }
    /// All nodes below `id` in pre-order, following slot order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        self.collect_descendants(id, &mut found);
        found
    }
    fn collect_descendants(&self, id: NodeId, found: &mut Vec<NodeId>) {
        for (_, child) in self.node(id).children() {
            found.push(child);
            self.collect_descendants(child, found);
        }
    }
    /// `id` and every sweepable node reachable from it through sweepable children.
    pub fn sweepable_chain(&self, id: NodeId) -> Vec<NodeId> {
        let mut found = vec![id];
        let mut at = 0;
        while at < found.len() {
            let current = found[at];
            found.extend(self.node(current).children().map(|(_, c)| c).filter(|c| self.node(*c).is_sweepable()));
            at += 1;
        }
        found
    }
    /// Checks every declared parameter's current value, recursing through sweepable children.
    pub fn validate(&self, id: NodeId) -> Result<()> {
        let node = self.node(id);
        if let Some(sweepable) = node.sweepable() {
            for param in sweepable.params() {
                if let Some(value) = node.attr(param.name()) {
                    param.validate(value)?;
                }
            }
        }
        for (_, child) in node.children() {
            if self.node(child).is_sweepable() {
                self.validate(child)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::ParamIdGenerator;
    use crate::value::ParamType;

    fn params() -> Vec<Arc<Param>> {
        let mut ids = ParamIdGenerator::new();
        vec![
            Arc::new(Param::new(&mut ids, ParamType::Int, "int_param", 0).unwrap()),
            Arc::new(Param::new(&mut ids, ParamType::Str, "str_param", "x").unwrap()),
        ]
    }

    #[test]
    fn declared_params_get_unassigned_slots() {
        let node = Node::with_params("Fake", "f", &params());
        assert_eq!(node.attr("int_param"), Some(&AttrValue::Unassigned));
        assert!(node.user_attrs().contains("str_param"));
    }

    #[test]
    fn private_names_are_not_user_attrs() {
        let mut node = Node::plain("Fake", "f");
        node.set_attr("_hidden", AttrValue::Unassigned);
        node.set_attr("done_", AttrValue::Unassigned);
        node.set_attr("shown", AttrValue::Unassigned);
        assert_eq!(node.user_attrs().len(), 1);
    }

    #[test]
    fn attaching_an_ancestor_is_refused() {
        let mut tree = Tree::new();
        let a = tree.add(Node::plain("A", "a"));
        let b = tree.add(Node::plain("B", "b"));
        tree.attach(a, "b", b).unwrap();
        assert!(matches!(tree.attach(b, "a", a), Err(SweepError::Cycle { .. })));
        assert!(matches!(tree.attach(a, "a", a), Err(SweepError::Cycle { .. })));
    }

    #[test]
    fn removing_a_param_drops_both_mappings() {
        let ps = params();
        let mut node = Node::with_params("Fake", "f", &ps);
        let sweepable = node.sweepable_mut().unwrap();
        assert!(sweepable.set_sweep_range("int_param", vec![Value::Int(1)]));
        let removed = sweepable.remove_param("int_param").unwrap();
        assert!(!sweepable.declares(removed.id()));
        assert!(!sweepable.declares("int_param"));
        assert!(sweepable.swept().is_empty());
    }
}
