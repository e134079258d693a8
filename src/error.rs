use thiserror::Error;

#[derive(Error, Debug)]
pub enum SweepError {
    // ---- selection ----
    #[error("Failed to find object named {path}")]
    Selection { path: String },
    #[error("{path} is not an object that can be selected into")]
    NotANode { path: String },
    #[error("No selected object has an attribute named \"{attr}\"")]
    EmptySelection { attr: String },

    // ---- types ----
    #[error("{path} has no value yet and cannot be used as a number")]
    Unassigned { path: String },
    #[error("Expected {what} {value} of parameter {param} to be {expected}")]
    ParamType { param: String, what: &'static str, value: String, expected: String },
    #[error("Value {value} is not a valid option for parameter {param}. Valid options are: {options}")]
    InvalidOption { param: String, value: String, options: String },

    // ---- ranges ----
    #[error("Parameter {param} has invalid step type {keyword}")]
    InvalidStepType { param: String, keyword: String },
    #[error("Sweep range {param} with step type {kind} cannot have step amount {step}: {reason}")]
    InvalidStepAmount { param: String, step: i64, kind: String, reason: &'static str },
    #[error("Start/end of sweep range {param} cannot be zero for exponential steps")]
    ZeroExpBound { param: String },
    #[error("Start/end of sweep range {param} must be positive for exponential steps")]
    NegativeExpBound { param: String },
    #[error("Parameter {param} has sweep range of length {this_len}, which is not equal to a previous sweep of this parameter with length {prev_len}")]
    MismatchingRange { param: String, this_len: usize, prev_len: usize },

    // ---- lifecycle ----
    #[error("Sweep has not been initialized with a begin statement")]
    NotInitialized,
    #[error("Sweep {name} is done and can no longer be changed")]
    SweepDone { name: String },
    #[error("Sweep {name} is still active; end it before beginning another")]
    SweepActive { name: String },
    #[error("{command} requires an active sweep")]
    NoActiveSweep { command: &'static str },
    #[error("{name} was already declared as the name of another sweep")]
    DuplicateSweepName { name: String },
    #[error("Cannot attach {name}: the tree would no longer be acyclic")]
    Cycle { name: String },

    // ---- import / lookup ----
    #[error("Unknown sweep type {name}")]
    UnknownSweepType { name: String },
    #[error("Failed to import {path}: {reason}")]
    Import { path: String, reason: String },
    #[error("{path} sources itself through a chain of source statements")]
    SourceCycle { path: String },

    // ---- validation ----
    #[error("{kind} has no generator for output {output}")]
    MissingHandler { kind: String, output: String },

    // ---- expressions ----
    #[error("Cannot evaluate expression {expr}: {reason}")]
    Expression { expr: String, reason: String },
    #[error("Cannot combine vectors of length {left} and {right}")]
    ShapeMismatch { left: usize, right: usize },

    // ---- surroundings ----
    #[error("Invalid syntax on line {line}, column {col}: {message}")]
    Syntax { line: usize, col: usize, message: String },
    #[error("On line {line}: {text}\n{source}")]
    Command { line: usize, text: String, #[source] source: Box<SweepError> },
    #[error("I/O error: {0}")]
    Io(String),
    #[error("JSON error: {0}")]
    Json(String),
    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SweepError>;

impl SweepError {
    /// Attaches the statement that was being executed when this error happened.
    pub fn at(self, line: usize, text: &str) -> Self {
        match self {
            already @ SweepError::Command { .. } => already,
            other => SweepError::Command { line, text: text.to_owned(), source: Box::new(other) },
        }
    }

    /// The innermost error, looking through statement context.
    pub fn root(&self) -> &SweepError {
        match self {
            SweepError::Command { source, .. } => source.root(),
            other => other,
        }
    }
}

// Helper conversions
impl From<std::io::Error> for SweepError {
    fn from(e: std::io::Error) -> Self { Self::Io(e.to_string()) }
}
impl From<serde_json::Error> for SweepError {
    fn from(e: serde_json::Error) -> Self { Self::Json(e.to_string()) }
}
impl From<config::ConfigError> for SweepError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
