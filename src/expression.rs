//! Arithmetic and comparison expressions over attribute paths.
//!
//! Precedence, loosest first: comparison chains (`a < b <= c`), then `+ -`, then
//! `* /`, then unary sign. Arithmetic accepts scalars and vectors; a scalar
//! paired with a vector applies elementwise, and two vectors must have the same
//! length. Truth values take part in arithmetic as 1 and 0. Division follows
//! IEEE-754, so dividing by zero yields an infinity or NaN rather than an error.
use std::fmt;
use std::str::FromStr;

use crate::error::SweepError;
use crate::value::{AttrValue, Value};

// ------------- Operators -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    fn apply(&self, a: f64, b: f64) -> f64 {
        match self {
            ArithOp::Add => a + b,
            ArithOp::Sub => a - b,
            ArithOp::Mul => a * b,
            ArithOp::Div => a / b,
        }
    }
    pub fn symbol(&self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Ne,
    Eq,
}

impl CmpOp {
    fn test(&self, a: f64, b: f64) -> bool {
        match self {
            CmpOp::Lt => a < b,
            CmpOp::Le => a <= b,
            CmpOp::Gt => a > b,
            CmpOp::Ge => a >= b,
            CmpOp::Ne => a != b,
            CmpOp::Eq => a == b,
        }
    }
    pub fn symbol(&self) -> &'static str {
        match self {
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Ne => "!=",
            CmpOp::Eq => "==",
        }
    }
}

impl FromStr for CmpOp {
    type Err = SweepError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "<" => Ok(CmpOp::Lt),
            "<=" => Ok(CmpOp::Le),
            ">" => Ok(CmpOp::Gt),
            ">=" => Ok(CmpOp::Ge),
            "!=" => Ok(CmpOp::Ne),
            "==" => Ok(CmpOp::Eq),
            other => Err(SweepError::Expression { expr: other.into(), reason: "unknown comparison".into() }),
        }
    }
}

// ------------- Expression -------------
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Constant(f64),
    Path(Vec<String>),
    Negate(Box<Expression>),
    Arith(ArithOp, Box<Expression>, Box<Expression>),
    /// `first op1 e1 op2 e2 ...`, true when every adjacent pair satisfies its operator
    Compare(Box<Expression>, Vec<(CmpOp, Expression)>),
}

impl Expression {
    pub fn path(dotted: &str) -> Self {
        Expression::Path(dotted.split('.').map(str::to_owned).collect())
    }
    pub fn arith(op: ArithOp, left: Expression, right: Expression) -> Self {
        Expression::Arith(op, Box::new(left), Box::new(right))
    }
    pub fn eval<E: Environment + ?Sized>(&self, env: &E) -> Result<Outcome, EvalError> {
        match self {
            Expression::Constant(c) => Ok(Outcome::Scalar(*c)),
            Expression::Path(path) => lookup(env, path),
            Expression::Negate(inner) => Ok(match inner.eval(env)?.numeric() {
                Outcome::Vector(v) => Outcome::Vector(v.into_iter().map(|x| -x).collect()),
                Outcome::Scalar(x) => Outcome::Scalar(-x),
                Outcome::Truth(_) => unreachable!("numeric() never yields a truth value"),
            }),
            Expression::Arith(op, left, right) => combine(*op, left.eval(env)?, right.eval(env)?),
            Expression::Compare(first, rest) => {
                let mut lhs = first.eval(env)?.scalar()?;
                for (op, expr) in rest {
                    let rhs = expr.eval(env)?.scalar()?;
                    if !op.test(lhs, rhs) {
                        return Ok(Outcome::Truth(false));
                    }
                    lhs = rhs;
                }
                Ok(Outcome::Truth(true))
            }
        }
    }
}

impl FromStr for Expression {
    type Err = SweepError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parser::parse_expression(s)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expression::Constant(c) => write!(f, "{}", c),
            Expression::Path(p) => write!(f, "{}", p.join(".")),
            Expression::Negate(inner) => write!(f, "-{}", inner),
            Expression::Arith(op, l, r) => write!(f, "({} {} {})", l, op.symbol(), r),
            Expression::Compare(first, rest) => {
                write!(f, "{}", first)?;
                for (op, e) in rest {
                    write!(f, " {} {}", op.symbol(), e)?;
                }
                Ok(())
            }
        }
    }
}

// ------------- Outcome -------------
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Scalar(f64),
    Vector(Vec<f64>),
    Truth(bool),
}

impl Outcome {
    fn numeric(self) -> Outcome {
        match self {
            Outcome::Truth(b) => Outcome::Scalar(if b { 1.0 } else { 0.0 }),
            other => other,
        }
    }
    fn scalar(self) -> Result<f64, EvalError> {
        match self.numeric() {
            Outcome::Scalar(x) => Ok(x),
            _ => Err(EvalError::VectorComparison),
        }
    }
    /// Arithmetic results are stored as floats, comparisons as booleans.
    pub fn into_value(self) -> Value {
        match self {
            Outcome::Scalar(x) => Value::Float(x),
            Outcome::Vector(v) => Value::List(v.into_iter().map(Value::Float).collect()),
            Outcome::Truth(b) => Value::Bool(b),
        }
    }
}

fn combine(op: ArithOp, left: Outcome, right: Outcome) -> Result<Outcome, EvalError> {
    Ok(match (left.numeric(), right.numeric()) {
        (Outcome::Scalar(a), Outcome::Scalar(b)) => Outcome::Scalar(op.apply(a, b)),
        (Outcome::Vector(v), Outcome::Scalar(b)) => Outcome::Vector(v.into_iter().map(|a| op.apply(a, b)).collect()),
        (Outcome::Scalar(a), Outcome::Vector(v)) => Outcome::Vector(v.into_iter().map(|b| op.apply(a, b)).collect()),
        (Outcome::Vector(a), Outcome::Vector(b)) => {
            if a.len() != b.len() {
                return Err(EvalError::ShapeMismatch { left: a.len(), right: b.len() });
            }
            Outcome::Vector(a.into_iter().zip(b).map(|(x, y)| op.apply(x, y)).collect())
        }
        _ => unreachable!("numeric() never yields a truth value"),
    })
}

fn lookup<E: Environment + ?Sized>(env: &E, path: &[String]) -> Result<Outcome, EvalError> {
    let dotted = || path.join(".");
    match env.resolve(path)? {
        Resolved::Unassigned => Err(EvalError::Unassigned(dotted())),
        Resolved::Pending => Err(EvalError::Pending(dotted())),
        Resolved::Value(Value::List(items)) => items
            .iter()
            .map(|item| item.as_f64().ok_or_else(|| EvalError::NotNumeric { path: dotted(), found: item.to_string() }))
            .collect::<Result<Vec<f64>, _>>()
            .map(Outcome::Vector),
        Resolved::Value(v) => v
            .as_f64()
            .map(Outcome::Scalar)
            .ok_or_else(|| EvalError::NotNumeric { path: dotted(), found: v.to_string() }),
    }
}

// ------------- Environment -------------
/// What a path resolved to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved<'a> {
    Value(&'a Value),
    Unassigned,
    /// holds an expression that has not been evaluated yet
    Pending,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    Missing(String),
    Unassigned(String),
    Pending(String),
    NotNumeric { path: String, found: String },
    ShapeMismatch { left: usize, right: usize },
    VectorComparison,
}

impl EvalError {
    pub fn into_sweep_error(self, expr: &Expression) -> SweepError {
        let expr = expr.to_string();
        match self {
            EvalError::Missing(path) => SweepError::Selection { path },
            EvalError::Unassigned(path) => SweepError::Unassigned { path },
            EvalError::ShapeMismatch { left, right } => SweepError::ShapeMismatch { left, right },
            EvalError::Pending(path) => SweepError::Expression { expr, reason: format!("{} depends on an unresolved expression", path) },
            EvalError::NotNumeric { path, found } => SweepError::Expression { expr, reason: format!("{} is {}, not a number", path, found) },
            EvalError::VectorComparison => SweepError::Expression { expr, reason: "vectors cannot be compared".into() },
        }
    }
}

/// A place expression paths are looked up in.
pub trait Environment {
    fn resolve(&self, path: &[String]) -> Result<Resolved<'_>, EvalError>;
}

/// Evaluates at command time. A reference to something not yet assigned, or to
/// another pending expression, keeps the expression for later; a reference to a
/// path that does not exist leaves the attribute unassigned.
pub fn resolve_eagerly<E: Environment + ?Sized>(expr: &Expression, env: &E) -> crate::error::Result<AttrValue> {
    match expr.eval(env) {
        Ok(outcome) => Ok(AttrValue::Value(outcome.into_value())),
        Err(EvalError::Unassigned(_)) | Err(EvalError::Pending(_)) => Ok(AttrValue::Deferred(expr.clone())),
        Err(EvalError::Missing(_)) => Ok(AttrValue::Unassigned),
        Err(e) => Err(e.into_sweep_error(expr)),
    }
}
