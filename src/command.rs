use std::fmt;
use std::path::PathBuf;

use crate::error::{Result, SweepError};
use crate::expression::Expression;
use crate::selection::Selection;
use crate::value::Value;

// ------------- Command -------------
/// One statement of a sweep file.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Begin { kind: String, name: String },
    End { name: Option<String> },
    Set { param: String, selection: Selection, value: SetValue },
    Sweep { param: String, selection: Selection, values: SweepValues },
    Use { path: Vec<String>, all: bool },
    Generate { target: String },
    /// Spliced away when a file is loaded; never executed.
    Source { path: PathBuf },
}

impl Command {
    pub fn keyword(&self) -> &'static str {
        match self {
            Command::Begin { .. } => "begin",
            Command::End { .. } => "end",
            Command::Set { .. } => "set",
            Command::Sweep { .. } => "sweep",
            Command::Use { .. } => "use",
            Command::Generate { .. } => "generate",
            Command::Source { .. } => "source",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SetValue {
    Literal(Value),
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SweepValues {
    Range(RangeSpec),
    List(Vec<Value>),
}

impl SweepValues {
    /// The concrete values this sweep installs. Ranges are checked here, once.
    pub fn expand(&self, param: &str) -> Result<Vec<Value>> {
        match self {
            SweepValues::Range(range) => range.values(param),
            SweepValues::List(values) => Ok(values.clone()),
        }
    }
}

// ------------- Ranges -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Linear,
    Exponential,
}

impl StepKind {
    pub fn parse(param: &str, keyword: &str) -> Result<Self> {
        match keyword {
            "linstep" => Ok(StepKind::Linear),
            "expstep" => Ok(StepKind::Exponential),
            other => Err(SweepError::InvalidStepType { param: param.to_owned(), keyword: other.to_owned() }),
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StepKind::Linear => write!(f, "linstep"),
            StepKind::Exponential => write!(f, "expstep"),
        }
    }
}

/// `from start to end [linstep|expstep] step`, inclusive of `end` when it is hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    pub start: i64,
    pub end: i64,
    pub step: i64,
    pub kind: StepKind,
}

impl RangeSpec {
    pub fn linear(start: i64, end: i64, step: i64) -> Self {
        Self { start, end, step, kind: StepKind::Linear }
    }
    pub fn exponential(start: i64, end: i64, step: i64) -> Self {
        Self { start, end, step, kind: StepKind::Exponential }
    }
    pub fn values(&self, param: &str) -> Result<Vec<Value>> {
        let bad_step = |reason| SweepError::InvalidStepAmount {
            param: param.to_owned(),
            step: self.step,
            kind: self.kind.to_string(),
            reason,
        };
        let mut values = Vec::new();
        match self.kind {
            StepKind::Linear => {
                if self.step == 0 {
                    return Err(bad_step("linear steps cannot be zero"));
                }
                let mut v = self.start;
                while (self.step > 0 && v <= self.end) || (self.step < 0 && v >= self.end) {
                    values.push(Value::Int(v));
                    match v.checked_add(self.step) {
                        Some(next) => v = next,
                        None => break,
                    }
                }
            }
            StepKind::Exponential => {
                if self.step <= 1 {
                    return Err(bad_step("exponential steps must be greater than 1"));
                }
                if self.start == 0 || self.end == 0 {
                    return Err(SweepError::ZeroExpBound { param: param.to_owned() });
                }
                if self.start < 0 || self.end < 0 {
                    return Err(SweepError::NegativeExpBound { param: param.to_owned() });
                }
                let mut v = self.start;
                while v <= self.end {
                    values.push(Value::Int(v));
                    match v.checked_mul(self.step) {
                        Some(next) => v = next,
                        None => break,
                    }
                }
            }
        }
        Ok(values)
    }
}
