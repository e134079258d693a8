use dsweep::command::{Command, RangeSpec, SetValue, StepKind, SweepValues};
use dsweep::error::SweepError;
use dsweep::parser::{parse, parse_line};
use dsweep::selection::{PathToken, Selection};
use dsweep::value::Value;

fn one(text: &str) -> Command {
    parse_line(text, 1).unwrap().unwrap()
}

#[test]
fn statement_forms() {
    assert_eq!(one("end"), Command::End { name: None });
    assert_eq!(one("end mysweep"), Command::End { name: Some("mysweep".into()) });
    assert_eq!(one("generate configs"), Command::Generate { target: "configs".into() });
    assert_eq!(one("source 'other.sweep'"), Command::Source { path: "other.sweep".into() });
    assert_eq!(
        one("use hls.machsuite.*"),
        Command::Use { path: vec!["hls".into(), "machsuite".into()], all: true }
    );
    assert_eq!(
        one("use hls.machsuite.aes_aes"),
        Command::Use { path: vec!["hls".into(), "machsuite".into(), "aes_aes".into()], all: false }
    );
}

#[test]
fn set_literals() {
    let value = |text: &str| match one(text) {
        Command::Set { value: SetValue::Literal(v), .. } => v,
        other => panic!("{other:?}"),
    };
    assert_eq!(value("set p 3"), Value::Int(3));
    assert_eq!(value("set p -3"), Value::Int(-3));
    assert_eq!(value("set p True"), Value::Bool(true));
    assert_eq!(value("set p false"), Value::Bool(false));
    assert_eq!(value("set p \"cyclic\""), Value::Str("cyclic".into()));
    assert_eq!(value("set p [1, 2.5, \"x\", True]"), Value::List(vec![
        Value::Int(1),
        Value::Float(2.5),
        Value::Str("x".into()),
        Value::Bool(true),
    ]));
}

#[test]
fn set_expression_is_not_a_literal() {
    match one("set p for top1.middle1 3 + 4") {
        Command::Set { selection, value: SetValue::Expression(_), .. } => {
            assert_eq!(selection, Selection::new(vec![PathToken::Name("top1".into()), PathToken::Name("middle1".into())]));
        }
        other => panic!("{other:?}"),
    }
    assert!(matches!(one("set p 2.5"), Command::Set { value: SetValue::Expression(_), .. }));
}

#[test]
fn sweep_ranges() {
    assert_eq!(
        one("sweep unrolling for ** from 1 to 8 expstep 2"),
        Command::Sweep {
            param: "unrolling".into(),
            selection: Selection::new(vec![PathToken::StarStar]),
            values: SweepValues::Range(RangeSpec::exponential(1, 8, 2)),
        }
    );
    assert_eq!(
        one("sweep cycle_time from 10 to 1 -3"),
        Command::Sweep {
            param: "cycle_time".into(),
            selection: Selection::everything(),
            values: SweepValues::Range(RangeSpec { start: 10, end: 1, step: -3, kind: StepKind::Linear }),
        }
    );
    assert!(matches!(
        one("sweep kind [\"a\", \"b\"]"),
        Command::Sweep { values: SweepValues::List(_), .. }
    ));
}

#[test]
fn scripts_keep_line_numbers() {
    let statements = parse("# header\n\nbegin ExhaustiveSweep s   # inline\n  end s\n").unwrap();
    assert_eq!(statements.len(), 2);
    assert_eq!(statements[0].line, 3);
    assert_eq!(statements[1].line, 4);
    assert_eq!(statements[1].text, "end s");
}

#[test]
fn error_syntax() {
    let err = parse("begin ExhaustiveSweep s\nsweep p from 1 too 3\n").unwrap_err();
    assert!(matches!(err, SweepError::Syntax { line: 2, .. }));
    assert!(parse_line("begin OnlyOneName", 1).is_err());
    assert!(parse_line("setp 3", 1).is_err());
}
