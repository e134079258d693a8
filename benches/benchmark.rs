use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use dsweep::catalog;
use dsweep::engine::Engine;
use dsweep::generate::ConfigGenerator;
use dsweep::parser;
use dsweep::sweep::DesignSweep;

// four axes over the aes benchmark: 4 x 3 x 4 x 2 = 96 configurations
const SCRIPT: &str = "begin ExhaustiveSweep bench
use hls.machsuite.aes_aes
sweep cycle_time for aes_aes from 1 to 4
sweep pipelining for aes_aes [0, 1]
sweep unrolling for aes_aes.** from 1 to 8 expstep 2
sweep partition_type for aes_aes.* [\"cyclic\", \"block\", \"complete\"]
set partition_factor for aes_aes.* aes_aes.cycle_time * 2
end bench
";

fn build_sweep() -> DesignSweep {
    let registry = catalog::standard().unwrap();
    let mut engine = Engine::new(&registry);
    let mut finished = None;
    for statement in parser::parse(SCRIPT).unwrap() {
        if let Some(done) = engine.apply(&statement.command).unwrap() {
            finished = Some(done);
        }
    }
    finished.unwrap()
}

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse sweep script", |b| {
        b.iter(|| parser::parse(black_box(SCRIPT)).unwrap())
    });
}

fn bench_generate(c: &mut Criterion) {
    let sweep = build_sweep();
    c.bench_function("generate 96 configurations", |b| {
        b.iter(|| ConfigGenerator::new(black_box(&sweep)).generate().unwrap())
    });
}

fn bench_to_json(c: &mut Criterion) {
    let sweep = build_sweep();
    let configs = ConfigGenerator::new(&sweep).generate().unwrap();
    c.bench_function("configurations to json", |b| b.iter(|| black_box(&configs).to_json()));
}

criterion_group!(benches, bench_parse, bench_generate, bench_to_json);
criterion_main!(benches);
