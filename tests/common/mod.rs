#![allow(dead_code)]
use std::sync::Arc;

use dsweep::catalog::exhaustive_sweep;
use dsweep::engine::Engine;
use dsweep::node::Template;
use dsweep::output::JsonConfigs;
use dsweep::parser;
use dsweep::registry::{Module, Registry};
use dsweep::selection::resolve_node;
use dsweep::sweep::SweepKind;
use dsweep::value::{AttrValue, ParamType};
use dsweep::Result;

/// Builds this structure under a `FakeSweep` root once `fake.top1` is used:
///
/// ```text
/// top1 { sweep_param, str_param, middle0 = "a middle value",
///        middle1 { sweep_param, str_param, low0, low1 },
///        middle2 { sweep_param, str_param, low0, low1 } }
/// ```
///
/// The root and every node declare the same two parameters.
pub fn fake_registry() -> Registry {
    let mut builder = Registry::builder();
    let sweep_param = builder.param(ParamType::Int, "sweep_param", 0).unwrap();
    let str_param = builder.param(ParamType::Str, "str_param", "a").unwrap();
    let params = [sweep_param, str_param];
    let fake = |name: &str| Template::sweepable("FakeDesignSweep", name, &params);
    let top1 = fake("top1")
        .attr("middle0", "a middle value")
        .child("middle1", fake("middle1").attr("low0", "a low value").attr("low1", "another low value"))
        .child("middle2", fake("middle2").attr("low0", "a second low value").attr("low1", "another second low value"));
    builder.kind(exhaustive_sweep());
    builder.kind(SweepKind::new("FakeSweep").with_params(&params).with_output("configs", Arc::new(JsonConfigs)));
    builder.module("fake", Module::new().with_object("top1", top1));
    builder.build()
}

pub fn run(engine: &mut Engine, script: &str) -> Result<()> {
    for statement in parser::parse(script)? {
        engine.apply(&statement.command)?;
    }
    Ok(())
}

/// An engine with `mysweep` begun and `top1` attached.
pub fn setup() -> Engine<'static> {
    // lifetime workaround: leak the registry for the test's duration
    let registry: &'static Registry = Box::leak(Box::new(fake_registry()));
    let mut engine = Engine::new(registry);
    run(&mut engine, "begin FakeSweep mysweep\nuse fake.top1").unwrap();
    engine
}

/// Reads `a.b.attr` from the active sweep.
pub fn attr(engine: &Engine, dotted: &str) -> AttrValue {
    let sweep = engine.active().unwrap();
    let parts: Vec<String> = dotted.split('.').map(str::to_owned).collect();
    let (last, nodes) = parts.split_last().unwrap();
    let id = resolve_node(sweep.tree(), sweep.root(), nodes).unwrap();
    sweep.tree().node(id).attr(last).unwrap().clone()
}

/// Range installed on the node at `path` (empty for the root).
pub fn range(engine: &Engine, path: &str, param: &str) -> Option<Vec<dsweep::value::Value>> {
    let sweep = engine.active().unwrap();
    let parts: Vec<String> = if path.is_empty() { vec![] } else { path.split('.').map(str::to_owned).collect() };
    let id = resolve_node(sweep.tree(), sweep.root(), &parts).unwrap();
    sweep.tree().node(id).sweepable().unwrap().sweep_range(param).map(|r| r.to_vec())
}
