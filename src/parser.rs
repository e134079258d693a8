//! Turns sweep files into `Statement`s.
//!
//! Each non-blank line is one statement and is parsed on its own against the
//! pest grammar in `sweep.pest`. `source "file"` statements are replaced by the
//! statements of the named file, resolved relative to the file that sources it.
use pest::Parser;
use pest::error::LineColLocation;
use pest::iterators::{Pair, Pairs};
use pest_derive::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::command::{Command, RangeSpec, SetValue, StepKind, SweepValues};
use crate::error::{Result, SweepError};
use crate::expression::{ArithOp, Expression};
use crate::selection::{PathToken, Selection};
use crate::value::Value;

#[derive(Parser)]
#[grammar = "sweep.pest"]
struct SweepParser;

// ------------- Statement -------------
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// 1-based line within `origin`
    pub line: usize,
    pub text: String,
    pub command: Command,
    pub origin: Option<PathBuf>,
}

fn syntax(err: pest::error::Error<Rule>, line: usize) -> SweepError {
    let col = match err.line_col {
        LineColLocation::Pos((_, col)) => col,
        LineColLocation::Span((_, col), _) => col,
    };
    SweepError::Syntax { line, col, message: err.variant.message().to_string() }
}

fn malformed(pair: &Pair<Rule>, line: usize, message: &str) -> SweepError {
    SweepError::Syntax { line, col: pair.line_col().1, message: format!("{}: {}", message, pair.as_str()) }
}

fn next<'i>(pairs: &mut Pairs<'i, Rule>, line: usize, what: &str) -> Result<Pair<'i, Rule>> {
    pairs.next().ok_or_else(|| SweepError::Syntax { line, col: 0, message: format!("expected {}", what) })
}

/// Parses one line. Blank and comment-only lines give `None`.
pub fn parse_line(text: &str, line: usize) -> Result<Option<Command>> {
    let mut pairs = SweepParser::parse(Rule::line, text).map_err(|e| syntax(e, line))?;
    let root = next(&mut pairs, line, "a statement")?;
    match root.into_inner().find(|p| p.as_rule() != Rule::EOI) {
        Some(statement) => build_command(statement, line).map(Some).map_err(|e| e.at(line, text.trim())),
        None => Ok(None),
    }
}

/// Parses a whole script without expanding `source` statements.
pub fn parse(text: &str) -> Result<Vec<Statement>> {
    let mut statements = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        if let Some(command) = parse_line(raw, index + 1)? {
            statements.push(Statement { line: index + 1, text: raw.trim().to_owned(), command, origin: None });
        }
    }
    Ok(statements)
}

/// Parses a script and splices in sourced files relative to `base`.
pub fn expand(text: &str, base: &Path) -> Result<Vec<Statement>> {
    Loader::default().expand(text, base, None)
}

/// Reads and parses a sweep file, splicing in sourced files.
pub fn load(path: &Path) -> Result<Vec<Statement>> {
    Loader::default().load(path)
}

pub fn parse_expression(text: &str) -> Result<Expression> {
    let mut pairs = SweepParser::parse(Rule::expression_only, text).map_err(|e| syntax(e, 1))?;
    let root = next(&mut pairs, 1, "an expression")?;
    let expression = next(&mut root.into_inner(), 1, "an expression")?;
    build_expression(expression, 1)
}

// ------------- Loader -------------
#[derive(Debug, Default)]
struct Loader {
    // files currently being loaded, outermost first
    stack: Vec<PathBuf>,
}

impl Loader {
    fn load(&mut self, path: &Path) -> Result<Vec<Statement>> {
        let import_error = |e: std::io::Error| SweepError::Import { path: path.display().to_string(), reason: e.to_string() };
        let canonical = fs::canonicalize(path).map_err(import_error)?;
        if self.stack.contains(&canonical) {
            return Err(SweepError::SourceCycle { path: path.display().to_string() });
        }
        let text = fs::read_to_string(&canonical).map_err(import_error)?;
        let base = canonical.parent().map(Path::to_path_buf).unwrap_or_default();
        self.stack.push(canonical.clone());
        let statements = self.expand(&text, &base, Some(&canonical));
        self.stack.pop();
        statements
    }
    fn expand(&mut self, text: &str, base: &Path, origin: Option<&Path>) -> Result<Vec<Statement>> {
        let mut expanded = Vec::new();
        for mut statement in parse(text)? {
            if let Command::Source { path } = &statement.command {
                let target = base.join(path);
                debug!(line = statement.line, file = %target.display(), "sourcing");
                let sourced = self.load(&target).map_err(|e| e.at(statement.line, &statement.text))?;
                expanded.extend(sourced);
                continue;
            }
            statement.origin = origin.map(Path::to_path_buf);
            expanded.push(statement);
        }
        Ok(expanded)
    }
}

// ------------- Commands -------------
fn idents<'i>(pair: Pair<'i, Rule>) -> impl Iterator<Item = String> + 'i {
    pair.into_inner().filter(|p| p.as_rule() == Rule::ident).map(|p| p.as_str().to_owned())
}

fn build_command(pair: Pair<Rule>, line: usize) -> Result<Command> {
    let rule = pair.as_rule();
    match rule {
        Rule::begin_cmd => {
            let mut names = idents(pair);
            let kind = names.next();
            let name = names.next();
            match (kind, name) {
                (Some(kind), Some(name)) => Ok(Command::Begin { kind, name }),
                _ => Err(SweepError::Syntax { line, col: 0, message: "begin needs a sweep type and a name".into() }),
            }
        }
        Rule::end_cmd => Ok(Command::End { name: idents(pair).next() }),
        Rule::generate_cmd => {
            let target = idents(pair).next().unwrap_or_default();
            Ok(Command::Generate { target })
        }
        Rule::source_cmd => {
            let string = pair.into_inner().find(|p| p.as_rule() == Rule::string);
            match string {
                Some(s) => Ok(Command::Source { path: PathBuf::from(string_text(s)) }),
                None => Err(SweepError::Syntax { line, col: 0, message: "source needs a quoted file name".into() }),
            }
        }
        Rule::use_cmd => {
            let module = pair.into_inner().find(|p| p.as_rule() == Rule::module_path);
            let Some(module) = module else {
                return Err(SweepError::Syntax { line, col: 0, message: "use needs a module path".into() });
            };
            let mut path = Vec::new();
            let mut all = false;
            for part in module.into_inner() {
                match part.as_rule() {
                    Rule::ident => path.push(part.as_str().to_owned()),
                    Rule::use_all => all = true,
                    _ => {}
                }
            }
            Ok(Command::Use { path, all })
        }
        Rule::set_cmd | Rule::sweep_cmd => {
            let mut param = String::new();
            let mut selection = Selection::everything();
            let mut set_value = None;
            let mut sweep_values = None;
            for part in pair.into_inner() {
                match part.as_rule() {
                    Rule::set_kw | Rule::sweep_kw => {}
                    Rule::ident => param = part.as_str().to_owned(),
                    Rule::selection => selection = build_selection(part),
                    Rule::range => sweep_values = Some(SweepValues::Range(build_range(part, &param, line)?)),
                    Rule::list if rule == Rule::sweep_cmd => {
                        if let Value::List(values) = build_literal(part, line)? {
                            sweep_values = Some(SweepValues::List(values));
                        }
                    }
                    Rule::expression => set_value = Some(SetValue::Expression(build_expression(part, line)?)),
                    _ => set_value = Some(SetValue::Literal(build_literal(part, line)?)),
                }
            }
            match (rule, set_value, sweep_values) {
                (Rule::set_cmd, Some(value), _) => Ok(Command::Set { param, selection, value }),
                (Rule::sweep_cmd, _, Some(values)) => Ok(Command::Sweep { param, selection, values }),
                _ => Err(SweepError::Syntax { line, col: 0, message: format!("{} needs a value", param) }),
            }
        }
        _ => Err(malformed(&pair, line, "unexpected statement")),
    }
}

fn build_selection(pair: Pair<Rule>) -> Selection {
    let tokens = pair
        .into_inner()
        .filter(|p| p.as_rule() == Rule::select_path)
        .flat_map(|path| path.into_inner())
        .map(|token| PathToken::from(token.as_str()))
        .collect();
    Selection::new(tokens)
}

fn build_range(pair: Pair<Rule>, param: &str, line: usize) -> Result<RangeSpec> {
    let mut bounds = Vec::new();
    let mut kind = StepKind::Linear;
    let mut step = 1;
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::int_literal => bounds.push(parse_int(&part, line)?),
            Rule::step => {
                for piece in part.into_inner() {
                    match piece.as_rule() {
                        Rule::step_kind => kind = StepKind::parse(param, piece.as_str())?,
                        Rule::int_literal => step = parse_int(&piece, line)?,
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
    match bounds[..] {
        [start, end] => Ok(RangeSpec { start, end, step, kind }),
        _ => Err(SweepError::Syntax { line, col: 0, message: "a range needs a start and an end".into() }),
    }
}

fn parse_int(pair: &Pair<Rule>, line: usize) -> Result<i64> {
    pair.as_str().parse::<i64>().map_err(|_| malformed(pair, line, "integer out of range"))
}

fn string_text(pair: Pair<Rule>) -> String {
    pair.into_inner().next().map(|inner| inner.as_str().to_owned()).unwrap_or_default()
}

fn build_literal(pair: Pair<Rule>, line: usize) -> Result<Value> {
    match pair.as_rule() {
        Rule::int_literal => parse_int(&pair, line).map(Value::Int),
        Rule::float_literal => pair.as_str().parse::<f64>().map(Value::Float).map_err(|_| malformed(&pair, line, "bad number")),
        Rule::boolean => Ok(Value::Bool(pair.as_str().eq_ignore_ascii_case("true"))),
        Rule::string => Ok(Value::Str(string_text(pair))),
        Rule::list => pair.into_inner().map(|item| build_literal(item, line)).collect::<Result<Vec<_>>>().map(Value::List),
        _ => Err(malformed(&pair, line, "expected a literal")),
    }
}

// ------------- Expressions -------------
fn build_expression(pair: Pair<Rule>, line: usize) -> Result<Expression> {
    let mut inner = pair.into_inner();
    let first = build_arith(next(&mut inner, line, "an operand")?, line)?;
    let mut rest = Vec::new();
    while let Some(op) = inner.next() {
        let rhs = build_arith(next(&mut inner, line, "an operand")?, line)?;
        rest.push((op.as_str().parse()?, rhs));
    }
    if rest.is_empty() { Ok(first) } else { Ok(Expression::Compare(Box::new(first), rest)) }
}

fn build_arith(pair: Pair<Rule>, line: usize) -> Result<Expression> {
    let mut inner = pair.into_inner();
    let mut acc = build_term(next(&mut inner, line, "a term")?, line)?;
    while let Some(op) = inner.next() {
        let rhs = build_term(next(&mut inner, line, "a term")?, line)?;
        let op = if op.as_str() == "+" { ArithOp::Add } else { ArithOp::Sub };
        acc = Expression::arith(op, acc, rhs);
    }
    Ok(acc)
}

fn build_term(pair: Pair<Rule>, line: usize) -> Result<Expression> {
    let mut inner = pair.into_inner();
    let mut acc = build_unary(next(&mut inner, line, "a factor")?, line)?;
    while let Some(op) = inner.next() {
        let rhs = build_unary(next(&mut inner, line, "a factor")?, line)?;
        let op = if op.as_str() == "*" { ArithOp::Mul } else { ArithOp::Div };
        acc = Expression::arith(op, acc, rhs);
    }
    Ok(acc)
}

fn build_unary(pair: Pair<Rule>, line: usize) -> Result<Expression> {
    let mut inner = pair.into_inner();
    let first = next(&mut inner, line, "an operand")?;
    match first.as_rule() {
        Rule::sign => {
            let operand = build_unary(next(&mut inner, line, "an operand")?, line)?;
            if first.as_str() == "-" { Ok(Expression::Negate(Box::new(operand))) } else { Ok(operand) }
        }
        Rule::number => first.as_str().parse::<f64>().map(Expression::Constant).map_err(|_| malformed(&first, line, "bad number")),
        Rule::attr_path => Ok(Expression::Path(idents(first).collect())),
        Rule::expression => build_expression(first, line),
        _ => Err(malformed(&first, line, "unexpected operand")),
    }
}
