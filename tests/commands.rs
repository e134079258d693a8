mod common;

use common::{attr, fake_registry, range, run, setup};
use std::sync::Arc;

use dsweep::catalog::{self, exhaustive_sweep};
use dsweep::engine::Engine;
use dsweep::error::SweepError;
use dsweep::expression::Expression;
use dsweep::generate::ConfigGenerator;
use dsweep::registry::{Export, Registry};
use dsweep::sweep::DesignSweep;
use dsweep::value::{AttrValue, Value};

fn int(i: i64) -> AttrValue {
    AttrValue::Value(Value::Int(i))
}

fn ints(values: &[i64]) -> Option<Vec<Value>> {
    Some(values.iter().map(|i| Value::Int(*i)).collect())
}

#[test]
fn set_single_node() {
    let mut engine = setup();
    run(&mut engine, "set sweep_param for top1 3").unwrap();
    assert_eq!(attr(&engine, "top1.sweep_param"), int(3));
    assert_eq!(attr(&engine, "top1.middle1.sweep_param"), AttrValue::Unassigned);
    assert_eq!(attr(&engine, "sweep_param"), AttrValue::Unassigned);
}

#[test]
fn set_later_statement_wins() {
    let mut engine = setup();
    run(&mut engine, "set sweep_param for top1.* 4\nset sweep_param for top1.middle1 3").unwrap();
    assert_eq!(attr(&engine, "top1.sweep_param"), int(4));
    assert_eq!(attr(&engine, "top1.middle1.sweep_param"), int(3));
    assert_eq!(attr(&engine, "top1.middle2.sweep_param"), int(4));
}

#[test]
fn set_everything_and_plain_attributes() {
    let mut engine = setup();
    run(&mut engine, "set str_param \"b\"\nset low0 for top1.** \"changed\"").unwrap();
    for path in ["str_param", "top1.str_param", "top1.middle1.str_param", "top1.middle2.str_param"] {
        assert_eq!(attr(&engine, path), AttrValue::Value(Value::Str("b".into())));
    }
    assert_eq!(attr(&engine, "top1.middle2.low0"), AttrValue::Value(Value::Str("changed".into())));
}

#[test]
fn set_output_dir() {
    let mut engine = setup();
    run(&mut engine, "set output_dir \"results/run1\"").unwrap();
    assert_eq!(engine.active().unwrap().output_dir(), "results/run1");
}

#[test]
fn set_expressions() {
    let mut engine = setup();
    run(&mut engine, "set sweep_param for top1 3\nset sweep_param for top1.middle1 top1.sweep_param * 2").unwrap();
    // integral results land in an int parameter as ints
    assert_eq!(attr(&engine, "top1.middle1.sweep_param"), int(6));
    run(&mut engine, "set low0 for top1.middle1 top1.sweep_param / 2").unwrap();
    assert_eq!(attr(&engine, "top1.middle1.low0"), AttrValue::Value(Value::Float(1.5)));
    run(&mut engine, "set low1 for top1.middle1 1 < top1.sweep_param").unwrap();
    assert_eq!(attr(&engine, "top1.middle1.low1"), AttrValue::Value(Value::Bool(true)));
}

#[test]
fn set_expression_on_unassigned_is_deferred() {
    let mut engine = setup();
    run(&mut engine, "set sweep_param for top1.middle2 top1.middle1.sweep_param + 1").unwrap();
    let expected: Expression = "top1.middle1.sweep_param + 1".parse().unwrap();
    assert_eq!(attr(&engine, "top1.middle2.sweep_param"), AttrValue::Deferred(expected));
}

#[test]
fn set_expression_on_missing_path_is_unassigned() {
    let mut engine = setup();
    run(&mut engine, "set sweep_param for top1 4\nset sweep_param for top1 nowhere.value + 1").unwrap();
    assert_eq!(attr(&engine, "top1.sweep_param"), AttrValue::Unassigned);
}

#[test]
fn set_clears_range_and_sweep_restores_it() {
    let mut engine = setup();
    run(&mut engine, "sweep sweep_param for top1 from 1 to 8 linstep 2").unwrap();
    assert_eq!(range(&engine, "top1", "sweep_param"), ints(&[1, 3, 5, 7]));
    run(&mut engine, "set sweep_param for top1 2").unwrap();
    assert_eq!(range(&engine, "top1", "sweep_param"), None);
    assert_eq!(attr(&engine, "top1.sweep_param"), int(2));
    run(&mut engine, "sweep sweep_param for top1 [3, 9]").unwrap();
    assert_eq!(range(&engine, "top1", "sweep_param"), ints(&[3, 9]));
}

#[test]
fn sweep_everything() {
    let mut engine = setup();
    run(&mut engine, "sweep sweep_param from 1 to 8 expstep 2").unwrap();
    for path in ["", "top1", "top1.middle1", "top1.middle2"] {
        assert_eq!(range(&engine, path, "sweep_param"), ints(&[1, 2, 4, 8]));
    }
    run(&mut engine, "sweep sweep_param for top1.middle1 from 4 to 16 expstep 3").unwrap();
    assert_eq!(range(&engine, "top1.middle1", "sweep_param"), ints(&[4, 12]));
}

#[test]
fn sweep_default_step_is_one() {
    let mut engine = setup();
    run(&mut engine, "sweep sweep_param for top1 from 1 to 3").unwrap();
    assert_eq!(range(&engine, "top1", "sweep_param"), ints(&[1, 2, 3]));
}

#[test]
fn error_set_without_attribute() {
    let mut engine = setup();
    let err = run(&mut engine, "set nothing_here for top1 3").unwrap_err();
    assert!(matches!(err, SweepError::EmptySelection { .. }));
    assert!(err.to_string().contains("nothing_here"));
}

#[test]
fn error_sweep_without_declaration() {
    let mut engine = setup();
    // low0 is an attribute but not a declared parameter
    let err = run(&mut engine, "sweep low0 for top1.** [1, 2]").unwrap_err();
    assert!(matches!(err, SweepError::EmptySelection { .. }));
}

#[test]
fn error_bad_ranges() {
    let mut engine = setup();
    let cases = [
        ("sweep sweep_param from 1 to 8 linstep 0", "step amount 0"),
        ("sweep sweep_param from 1 to 8 expstep 1", "step amount 1"),
        ("sweep sweep_param from 1 to 8 expstep -2", "step amount -2"),
        ("sweep sweep_param from 0 to 8 expstep 2", "cannot be zero"),
        ("sweep sweep_param from -1 to 8 expstep 2", "must be positive"),
        ("sweep sweep_param from 1 to 8 logstep 2", "invalid step type logstep"),
    ];
    for (script, message) in cases {
        let err = run(&mut engine, script).unwrap_err();
        assert!(err.to_string().contains(message), "{script}: {err}");
    }
    assert_eq!(range(&engine, "top1", "sweep_param"), None);
}

#[test]
fn error_lifecycle() {
    let registry = Box::leak(Box::new(fake_registry()));
    let mut engine = Engine::new(registry);
    let err = run(&mut engine, "set sweep_param 1").unwrap_err();
    assert!(matches!(err, SweepError::NoActiveSweep { command: "set" }));
    let err = run(&mut engine, "generate configs").unwrap_err();
    assert!(matches!(err, SweepError::NoActiveSweep { command: "generate" }));
    let err = run(&mut engine, "end").unwrap_err();
    assert!(matches!(err, SweepError::NoActiveSweep { command: "end" }));
    let err = run(&mut engine, "begin NoSuchSweep s").unwrap_err();
    assert!(matches!(err, SweepError::UnknownSweepType { .. }));

    run(&mut engine, "begin ExhaustiveSweep first").unwrap();
    let err = run(&mut engine, "begin ExhaustiveSweep second").unwrap_err();
    assert!(matches!(err, SweepError::SweepActive { .. }));
    let done = engine.apply(&dsweep::command::Command::End { name: Some("first".into()) }).unwrap().unwrap();
    assert!(done.is_done());
    assert!(matches!(done.ensure_active(), Err(SweepError::SweepDone { .. })));
    let err = run(&mut engine, "begin ExhaustiveSweep first").unwrap_err();
    assert!(matches!(err, SweepError::DuplicateSweepName { .. }));
    assert!(engine.configured().contains("first"));
}

#[test]
fn use_outside_a_sweep_fills_global_scope() {
    let registry = Box::leak(Box::new(fake_registry()));
    let mut engine = Engine::new(registry);
    run(&mut engine, "use fake.*").unwrap();
    assert!(matches!(engine.globals().get("top1"), Some(Export::Object(_))));
    let err = run(&mut engine, "use fake.nothing").unwrap_err();
    assert!(matches!(err, SweepError::Import { .. }));
    let err = run(&mut engine, "use nowhere.*").unwrap_err();
    assert!(matches!(err, SweepError::Import { .. }));
}

#[test]
fn use_inside_a_sweep_attaches_objects() {
    let mut engine = setup();
    run(&mut engine, "use fake").unwrap();
    let sweep = engine.active().unwrap();
    assert_eq!(sweep.tree().node(sweep.root()).children().count(), 1);
    assert_eq!(attr(&engine, "top1.middle0"), AttrValue::Value(Value::Str("a middle value".into())));
}

#[test]
fn generate_records_outputs() {
    let mut engine = setup();
    run(&mut engine, "generate configs\ngenerate configs").unwrap();
    assert_eq!(engine.active().unwrap().generate_outputs().len(), 1);
}

#[test]
fn sweep_twice_is_idempotent() {
    let mut engine = setup();
    run(&mut engine, "sweep sweep_param for top1 from 1 to 5 linstep 2").unwrap();
    let count = ConfigGenerator::new(engine.active().unwrap()).count().unwrap();
    run(&mut engine, "sweep sweep_param for top1 from 1 to 5 linstep 2").unwrap();
    assert_eq!(range(&engine, "top1", "sweep_param"), ints(&[1, 3, 5]));
    assert_eq!(ConfigGenerator::new(engine.active().unwrap()).count().unwrap(), count);
    assert_eq!(count, 3);
}

#[test]
fn error_sweep_value_of_wrong_type() {
    let mut engine = setup();
    let err = run(&mut engine, "sweep sweep_param for top1.** [1, \"x\"]").unwrap_err();
    assert!(matches!(err, SweepError::ParamType { .. }));
    assert!(err.to_string().contains("sweep_param"));
    // nothing is installed when any value is rejected
    assert_eq!(range(&engine, "top1", "sweep_param"), None);
    assert_eq!(range(&engine, "top1.middle1", "sweep_param"), None);
}

#[test]
fn error_sweep_value_not_an_option() {
    let registry: &'static Registry = Box::leak(Box::new(catalog::standard().unwrap()));
    let mut engine = Engine::new(registry);
    run(&mut engine, "begin ExhaustiveSweep s\nuse hls.machsuite.aes_aes").unwrap();
    let err = run(&mut engine, "sweep pipelining for aes_aes [0, 7]").unwrap_err();
    assert!(matches!(err, SweepError::InvalidOption { .. }));
    run(&mut engine, "sweep pipelining for aes_aes [0, 1]").unwrap();
}

#[test]
fn error_lifecycle_before_begin() {
    let mut sweep = DesignSweep::new(Arc::new(exhaustive_sweep()));
    assert!(matches!(sweep.add_generate_output("configs"), Err(SweepError::NotInitialized)));
    assert!(matches!(sweep.end(), Err(SweepError::NotInitialized)));
    sweep.initialize("later");
    sweep.end().unwrap();
    let err = sweep.add_generate_output("configs").unwrap_err();
    assert!(matches!(err, SweepError::SweepDone { .. }));
}
