mod common;

use common::{run, setup};
use dsweep::catalog;
use dsweep::engine::Engine;
use dsweep::error::SweepError;
use dsweep::registry::Registry;
use dsweep::generate::{ConfigGenerator, View};
use dsweep::value::Value;

fn views(engine: &dsweep::engine::Engine) -> Vec<View> {
    let sweep = engine.active().unwrap();
    ConfigGenerator::new(sweep).generate().unwrap().views().to_vec()
}

fn int_at(view: &View, path: &str) -> i64 {
    match view.lookup(path) {
        Some(Value::Int(i)) => *i,
        other => panic!("expected an int at {path}, got {other:?}"),
    }
}

#[test]
fn nothing_swept_is_one_configuration_of_defaults() {
    let engine = setup();
    let views = views(&engine);
    assert_eq!(views.len(), 1);
    assert_eq!(int_at(&views[0], "top1.middle1.sweep_param"), 0);
    assert_eq!(views[0].lookup("top1.str_param"), Some(&Value::Str("a".into())));
}

#[test]
fn independent_parameters_multiply() {
    let mut engine = setup();
    run(&mut engine, "sweep sweep_param for top1 from 1 to 3\nsweep str_param for top1 [\"a\", \"b\"]").unwrap();
    let sweep = engine.active().unwrap();
    assert_eq!(ConfigGenerator::new(sweep).count().unwrap(), 6);
    let views = views(&engine);
    assert_eq!(views.len(), 6);
    // str_param was declared after sweep_param, so it varies fastest
    let seen: Vec<(i64, String)> = views
        .iter()
        .map(|v| (int_at(v, "top1.sweep_param"), v.lookup("top1.str_param").and_then(Value::as_str).unwrap().to_owned()))
        .collect();
    assert_eq!(seen[0], (1, "a".to_owned()));
    assert_eq!(seen[1], (1, "b".to_owned()));
    assert_eq!(seen[2], (2, "a".to_owned()));
    assert_eq!(seen[5], (3, "b".to_owned()));
}

#[test]
fn one_parameter_on_many_nodes_is_one_axis() {
    let mut engine = setup();
    run(&mut engine, "sweep sweep_param from 1 to 4").unwrap();
    let views = views(&engine);
    assert_eq!(views.len(), 4);
    for (index, view) in views.iter().enumerate() {
        let expected = index as i64 + 1;
        for path in ["sweep_param", "top1.sweep_param", "top1.middle1.sweep_param", "top1.middle2.sweep_param"] {
            assert_eq!(int_at(view, path), expected);
        }
    }
}

#[test]
fn error_mismatching_ranges() {
    let mut engine = setup();
    run(&mut engine, "sweep sweep_param for top1 from 1 to 4\nsweep sweep_param for top1.middle1 [1, 2]").unwrap();
    let sweep = engine.active().unwrap();
    let err = ConfigGenerator::new(sweep).generate().unwrap_err();
    assert!(matches!(err, SweepError::MismatchingRange { .. }));
    assert!(err.to_string().contains("sweep_param"));
}

#[test]
fn fixed_values_override_defaults() {
    let mut engine = setup();
    run(&mut engine, "set sweep_param for top1.middle2 9\nsweep sweep_param for top1 [1, 2]").unwrap();
    let views = views(&engine);
    assert_eq!(views.len(), 2);
    assert_eq!(int_at(&views[1], "top1.middle2.sweep_param"), 9);
    assert_eq!(int_at(&views[1], "top1.middle1.sweep_param"), 0);
    assert_eq!(int_at(&views[1], "top1.sweep_param"), 2);
}

#[test]
fn deferred_expressions_follow_swept_values() {
    let mut engine = setup();
    run(
        &mut engine,
        "set sweep_param for top1.middle1 top1.sweep_param * 10\n\
         set sweep_param for top1.middle2 top1.middle1.sweep_param + 1\n\
         sweep sweep_param for top1 [1, 2, 3]",
    )
    .unwrap();
    let views = views(&engine);
    assert_eq!(views.len(), 3);
    for (index, view) in views.iter().enumerate() {
        let top = index as i64 + 1;
        assert_eq!(int_at(view, "top1.sweep_param"), top);
        assert_eq!(int_at(view, "top1.middle1.sweep_param"), top * 10);
        assert_eq!(int_at(view, "top1.middle2.sweep_param"), top * 10 + 1);
    }
}

#[test]
fn deferred_reference_to_untouched_parameter_reads_default() {
    let mut engine = setup();
    run(&mut engine, "set sweep_param for top1.middle1 top1.sweep_param + 5").unwrap();
    let views = views(&engine);
    assert_eq!(int_at(&views[0], "top1.middle1.sweep_param"), 5);
}

#[test]
fn error_circular_expressions() {
    let mut engine = setup();
    run(
        &mut engine,
        "set sweep_param for top1.middle1 top1.middle2.sweep_param + 1\n\
         set sweep_param for top1.middle2 top1.middle1.sweep_param + 1",
    )
    .unwrap();
    let sweep = engine.active().unwrap();
    let err = ConfigGenerator::new(sweep).generate().unwrap_err();
    assert!(matches!(err, SweepError::Expression { .. }));
    assert!(err.to_string().contains("never resolves"));
}

#[test]
fn views_report_as_nested_maps() {
    let mut engine = setup();
    run(&mut engine, "sweep sweep_param for top1.middle1 [7]").unwrap();
    let json = views(&engine)[0].to_json();
    let root = &json["FakeSweep(\"mysweep\")"];
    assert_eq!(root["type"], "FakeSweep");
    assert_eq!(root["name"], "mysweep");
    assert_eq!(root["output_dir"], "");
    let top1 = &root["FakeDesignSweep(\"top1\")"];
    assert_eq!(top1["middle0"], "a middle value");
    assert_eq!(top1["FakeDesignSweep(\"middle1\")"]["sweep_param"], 7);
    assert_eq!(top1["FakeDesignSweep(\"middle2\")"]["low1"], "another second low value");
}

#[test]
fn generation_leaves_the_sweep_untouched() {
    let mut engine = setup();
    run(&mut engine, "sweep sweep_param for top1 [1, 2]").unwrap();
    let _ = views(&engine);
    let sweep = engine.active().unwrap();
    let top1 = sweep.tree().node(sweep.tree().node(sweep.root()).child("top1").unwrap());
    assert!(top1.attr("sweep_param").unwrap().is_unassigned());
}

#[test]
fn error_deferred_result_of_wrong_type() {
    let mut engine = setup();
    run(
        &mut engine,
        "sweep sweep_param for top1 from 1 to 2\n\
         set str_param for top1.middle1 top1.sweep_param + 1",
    )
    .unwrap();
    let err = ConfigGenerator::new(engine.active().unwrap()).generate().unwrap_err();
    assert!(matches!(err, SweepError::ParamType { .. }));
    assert!(err.to_string().contains("str_param"));
}

#[test]
fn error_deferred_result_outside_options() {
    let registry: &'static Registry = Box::leak(Box::new(catalog::standard().unwrap()));
    let mut engine = Engine::new(registry);
    run(
        &mut engine,
        "begin ExhaustiveSweep s\n\
         use hls.machsuite.aes_aes\n\
         sweep cycle_time for aes_aes from 1 to 4\n\
         set pipelining for aes_aes aes_aes.cycle_time / 2",
    )
    .unwrap();
    // cycle_time 1 gives 0.5, which an int parameter cannot hold
    let err = ConfigGenerator::new(engine.active().unwrap()).generate().unwrap_err();
    assert!(matches!(err, SweepError::ParamType { .. }));
    assert!(err.to_string().contains("pipelining"));
}
