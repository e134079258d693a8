use std::fmt;

use crate::error::{Result, SweepError};
use crate::expression::{Environment, EvalError, Resolved};
use crate::node::{NodeId, Slot, Tree};
use crate::value::AttrValue;

// ------------- PathToken -------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathToken {
    Name(String),
    /// direct children
    Star,
    /// all descendants
    StarStar,
}

impl From<&str> for PathToken {
    fn from(token: &str) -> Self {
        match token {
            "*" => PathToken::Star,
            "**" => PathToken::StarStar,
            name => PathToken::Name(name.to_owned()),
        }
    }
}

impl fmt::Display for PathToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PathToken::Name(name) => write!(f, "{}", name),
            PathToken::Star => write!(f, "*"),
            PathToken::StarStar => write!(f, "**"),
        }
    }
}

// ------------- Selection -------------
/// A dotted selection path such as `top1.middle1`, `top1.*` or `**`.
///
/// Names walk down through child slots. A trailing `*` selects the children of
/// the node reached so far and `**` selects all of its descendants; in both cases
/// the node reached so far is included too, after the others. Anything following
/// a wildcard is ignored. An empty selection means `**` from the sweep root.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    tokens: Vec<PathToken>,
}

impl Selection {
    pub fn new(tokens: Vec<PathToken>) -> Self {
        Self { tokens }
    }
    pub fn everything() -> Self {
        Self::default()
    }
    pub fn parse(path: &str) -> Self {
        if path.is_empty() {
            return Self::everything();
        }
        Self::new(path.split('.').map(PathToken::from).collect())
    }
    pub fn tokens(&self) -> &[PathToken] {
        &self.tokens
    }
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
    pub fn select(&self, tree: &Tree, env: NodeId) -> Result<Vec<NodeId>> {
        select(tree, env, &self.tokens)
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.tokens.is_empty() {
            return write!(f, "**");
        }
        let tokens: Vec<String> = self.tokens.iter().map(|t| t.to_string()).collect();
        write!(f, "{}", tokens.join("."))
    }
}

fn joined(tokens: &[PathToken]) -> String {
    Selection::new(tokens.to_vec()).to_string()
}

pub fn select(tree: &Tree, env: NodeId, tokens: &[PathToken]) -> Result<Vec<NodeId>> {
    if tree.get(env).is_none() {
        return Err(SweepError::NotANode { path: format!("<node {}>", env.index()) });
    }
    let everything = [PathToken::StarStar];
    let tokens = if tokens.is_empty() { &everything[..] } else { tokens };
    let mut current = env;
    for (at, token) in tokens.iter().enumerate() {
        match token {
            PathToken::Name(name) => match tree.node(current).slot(name) {
                Some(Slot::Node(child)) => current = *child,
                Some(Slot::Value(_)) => return Err(SweepError::NotANode { path: joined(&tokens[..=at]) }),
                None => return Err(SweepError::Selection { path: joined(tokens) }),
            },
            PathToken::Star => {
                let mut found: Vec<NodeId> = tree.node(current).children().map(|(_, c)| c).collect();
                found.push(current);
                return Ok(found);
            }
            PathToken::StarStar => {
                let mut found = tree.descendants(current);
                found.push(current);
                return Ok(found);
            }
        }
    }
    Ok(vec![current])
}

/// Follows a path of child names without wildcards.
pub fn resolve_node(tree: &Tree, env: NodeId, names: &[String]) -> Result<NodeId> {
    let mut current = env;
    for (at, name) in names.iter().enumerate() {
        match tree.node(current).slot(name) {
            Some(Slot::Node(child)) => current = *child,
            Some(Slot::Value(_)) => return Err(SweepError::NotANode { path: names[..=at].join(".") }),
            None => return Err(SweepError::Selection { path: names.join(".") }),
        }
    }
    Ok(current)
}

// ------------- TreeScope -------------
/// Resolves expression paths against a live tree, relative to one node.
pub struct TreeScope<'a> {
    tree: &'a Tree,
    root: NodeId,
}

impl<'a> TreeScope<'a> {
    pub fn new(tree: &'a Tree, root: NodeId) -> Self {
        Self { tree, root }
    }
}

impl Environment for TreeScope<'_> {
    fn resolve(&self, path: &[String]) -> std::result::Result<Resolved<'_>, EvalError> {
        let Some((attr, nodes)) = path.split_last() else {
            return Err(EvalError::Missing(String::new()));
        };
        let owner = resolve_node(self.tree, self.root, nodes).map_err(|e| match e {
            SweepError::NotANode { path } => EvalError::NotNumeric { path, found: "a value".into() },
            _ => EvalError::Missing(path.join(".")),
        })?;
        match self.tree.node(owner).slot(attr) {
            Some(Slot::Value(AttrValue::Value(v))) => Ok(Resolved::Value(v)),
            Some(Slot::Value(AttrValue::Unassigned)) => Ok(Resolved::Unassigned),
            Some(Slot::Value(AttrValue::Deferred(_))) => Ok(Resolved::Pending),
            Some(Slot::Node(_)) => Err(EvalError::NotNumeric { path: path.join("."), found: "an object".into() }),
            None => Err(EvalError::Missing(path.join("."))),
        }
    }
}
