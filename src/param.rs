use core::hash::BuildHasherDefault;
use seahash::SeaHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{Result, SweepError};
use crate::value::{AttrValue, ParamType, Value};

// ------------- ParamId -------------
pub type ParamId = u64;

pub type ParamHasher = BuildHasherDefault<SeaHasher>;

pub const GENESIS: ParamId = 0;

/// Hands out parameter identities. Ids are never reused within one generator,
/// so two declarations only share an id when they are the same `Param`.
#[derive(Debug, Default)]
pub struct ParamIdGenerator {
    lower_bound: ParamId,
}

impl ParamIdGenerator {
    pub fn new() -> Self {
        Self { lower_bound: GENESIS }
    }
    pub fn generate(&mut self) -> ParamId {
        self.lower_bound += 1;
        self.lower_bound
    }
}

// ------------- Param -------------
pub type FormatFn = fn(&Value) -> String;

/// A typed, named parameter declaration.
///
/// Equality and hashing go by id only. A `Param` is usually shared through an
/// `Arc` by every node type that declares it, which is what makes a sweep over
/// it a single joint axis during generation.
#[derive(Debug, Clone)]
pub struct Param {
    id: ParamId,
    name: String,
    default: Value,
    expected_type: ParamType,
    valid_opts: Option<Vec<Value>>,
    format_func: Option<FormatFn>,
}

impl Param {
    pub fn new(ids: &mut ParamIdGenerator, expected_type: ParamType, name: &str, default: impl Into<Value>) -> Result<Self> {
        let default = default.into();
        if !expected_type.admits(&default) {
            return Err(SweepError::ParamType {
                param: name.to_owned(),
                what: "default value",
                value: default.to_string(),
                expected: expected_type.to_string(),
            });
        }
        Ok(Self {
            id: ids.generate(),
            name: name.to_owned(),
            default,
            expected_type,
            valid_opts: None,
            format_func: None,
        })
    }
    /// Restricts the parameter to a fixed set of options, which must include the default.
    pub fn with_valid_opts(mut self, opts: Vec<Value>) -> Result<Self> {
        for opt in &opts {
            if !self.expected_type.admits(opt) {
                return Err(SweepError::ParamType {
                    param: self.name.clone(),
                    what: "valid option",
                    value: opt.to_string(),
                    expected: self.expected_type.to_string(),
                });
            }
        }
        self.valid_opts = Some(opts);
        self.check_option(&self.default)?;
        Ok(self)
    }
    pub fn with_format(mut self, format_func: FormatFn) -> Self {
        self.format_func = Some(format_func);
        self
    }
    pub fn id(&self) -> ParamId {
        self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn default_value(&self) -> &Value {
        &self.default
    }
    pub fn expected_type(&self) -> ParamType {
        self.expected_type
    }
    pub fn valid_opts(&self) -> Option<&[Value]> {
        self.valid_opts.as_deref()
    }
    /// Checks a current value. Unassigned and deferred values are always acceptable.
    pub fn validate(&self, value: &AttrValue) -> Result<()> {
        match value {
            AttrValue::Value(v) => self.check_value(v),
            AttrValue::Unassigned | AttrValue::Deferred(_) => Ok(()),
        }
    }
    /// Checks a concrete value against the declared type and options.
    pub fn check_value(&self, value: &Value) -> Result<()> {
        if !self.expected_type.admits(value) {
            return Err(SweepError::ParamType {
                param: self.name.clone(),
                what: "value",
                value: value.to_string(),
                expected: self.expected_type.to_string(),
            });
        }
        self.check_option(value)
    }
    /// Brings a computed number to the declared numeric type when that loses nothing.
    pub fn coerce(&self, value: Value) -> Value {
        match (self.expected_type, value) {
            (ParamType::Int, Value::Float(x)) if x.fract() == 0.0 && x.abs() < i64::MAX as f64 => Value::Int(x as i64),
            (ParamType::Float, Value::Int(i)) => Value::Float(i as f64),
            (_, other) => other,
        }
    }
    pub fn format(&self, value: &Value) -> String {
        match self.format_func {
            Some(f) => f(value),
            None => value.to_string(),
        }
    }
    fn check_option(&self, value: &Value) -> Result<()> {
        match &self.valid_opts {
            Some(opts) if !opts.contains(value) => Err(SweepError::InvalidOption {
                param: self.name.clone(),
                value: value.to_string(),
                options: opts.iter().map(|o| o.to_string()).collect::<Vec<_>>().join(", "),
            }),
            _ => Ok(()),
        }
    }
}

impl PartialEq for Param {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Param {}
impl Hash for Param {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}#{}: {} = {}", self.name, self.id, self.expected_type, self.default)
    }
}
