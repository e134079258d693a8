// used to print out readable forms of a value
use std::fmt;

use crate::expression::Expression;

// ------------- Value -------------
/// A concrete attribute value. Lists are flat: they hold scalars only.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    List(Vec<Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bool(_) => "bool",
            Value::List(_) => "list",
        }
    }
    /// Numeric reading of a scalar; booleans count as 1 and 0.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Str(_) | Value::List(_) => None,
        }
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Int(i) => serde_json::Value::from(*i),
            // non-finite floats have no JSON form
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::from(s.as_str()),
            Value::Bool(b) => serde_json::Value::from(*b),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "\"{}\"", s),
            Value::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Value::List(items) => {
                let items: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self { Value::Int(i) }
}
impl From<i32> for Value {
    fn from(i: i32) -> Self { Value::Int(i as i64) }
}
impl From<f64> for Value {
    fn from(x: f64) -> Self { Value::Float(x) }
}
impl From<bool> for Value {
    fn from(b: bool) -> Self { Value::Bool(b) }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::Str(s.to_owned()) }
}
impl From<String> for Value {
    fn from(s: String) -> Self { Value::Str(s) }
}
impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self { Value::List(items.into_iter().map(Into::into).collect()) }
}

// ------------- ParamType -------------
/// The declared type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    Int,
    Float,
    Str,
    Bool,
}

impl ParamType {
    pub fn admits(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (ParamType::Int, Value::Int(_))
                | (ParamType::Float, Value::Float(_))
                | (ParamType::Str, Value::Str(_))
                | (ParamType::Bool, Value::Bool(_))
        )
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ParamType::Int => "int",
            ParamType::Float => "float",
            ParamType::Str => "str",
            ParamType::Bool => "bool",
        };
        write!(f, "{}", name)
    }
}

// ------------- AttrValue -------------
/// What an attribute slot currently holds.
///
/// `Unassigned` is distinct from every concrete value, including a parameter's
/// default: it means nobody has touched the attribute yet, and it never reads as
/// a number. `Deferred` keeps an expression that could not be evaluated when it
/// was set and is retried when configurations are generated.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AttrValue {
    #[default]
    Unassigned,
    Value(Value),
    Deferred(Expression),
}

impl AttrValue {
    pub fn is_unassigned(&self) -> bool {
        matches!(self, AttrValue::Unassigned)
    }
    pub fn is_deferred(&self) -> bool {
        matches!(self, AttrValue::Deferred(_))
    }
    pub fn value(&self) -> Option<&Value> {
        match self {
            AttrValue::Value(v) => Some(v),
            _ => None,
        }
    }
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AttrValue::Value(v) => v.to_json(),
            AttrValue::Unassigned => serde_json::Value::Null,
            AttrValue::Deferred(expr) => serde_json::Value::from(expr.to_string()),
        }
    }
}

impl From<Value> for AttrValue {
    fn from(v: Value) -> Self { AttrValue::Value(v) }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AttrValue::Unassigned => write!(f, "<unassigned>"),
            AttrValue::Value(v) => write!(f, "{}", v),
            AttrValue::Deferred(expr) => write!(f, "<deferred {}>", expr),
        }
    }
}
