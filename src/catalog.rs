//! The registry every `dsweep` run starts from.
//!
//! - `ExhaustiveSweep`, built in, generating the `configs` output.
//! - `hls.sweeps` exports `AcceleratorSweep`, a sweep kind whose root also
//!   declares `cycle_time`.
//! - `hls.machsuite` exports the `aes_aes` benchmark: arrays with partitioning
//!   parameters and functions holding loops with an unrolling factor.
//!
//! All benchmark parameters are shared declarations, so sweeping `unrolling`
//! over every loop of a benchmark is a single axis.
use std::sync::Arc;

use crate::error::Result;
use crate::node::Template;
use crate::output::JsonConfigs;
use crate::param::Param;
use crate::registry::{Module, Registry, RegistryBuilder};
use crate::sweep::SweepKind;
use crate::value::{ParamType, Value};

pub const CONFIGS: &str = "configs";

pub fn exhaustive_sweep() -> SweepKind {
    SweepKind::new("ExhaustiveSweep").with_output(CONFIGS, Arc::new(JsonConfigs))
}

/// Parameters shared by the high-level-synthesis node types.
#[derive(Debug, Clone)]
pub struct HlsParams {
    pub cycle_time: Arc<Param>,
    pub pipelining: Arc<Param>,
    pub partition_type: Arc<Param>,
    pub partition_factor: Arc<Param>,
    pub unrolling: Arc<Param>,
}

impl HlsParams {
    pub fn declare(builder: &mut RegistryBuilder) -> Result<Self> {
        Ok(Self {
            cycle_time: builder.param(ParamType::Int, "cycle_time", 1)?,
            pipelining: builder.param_with_options(ParamType::Int, "pipelining", 0, vec![Value::Int(0), Value::Int(1)])?,
            partition_type: builder.param_with_options(
                ParamType::Str,
                "partition_type",
                "cyclic",
                vec!["cyclic".into(), "block".into(), "complete".into()],
            )?,
            partition_factor: builder.param(ParamType::Int, "partition_factor", 1)?,
            unrolling: builder.param(ParamType::Int, "unrolling", 1)?,
        })
    }
    pub fn benchmark(&self, name: &str) -> Template {
        Template::sweepable("Benchmark", name, &[self.cycle_time.clone(), self.pipelining.clone()])
    }
    pub fn array(&self, name: &str, size: i64, word_length: i64) -> Template {
        Template::sweepable("Array", name, &[self.partition_type.clone(), self.partition_factor.clone()])
            .attr("size", size)
            .attr("word_length", word_length)
    }
    /// Adds `loop_name` under `function`, creating the function on first use.
    pub fn add_loop(&self, benchmark: &mut Template, function: &str, loop_name: &str) {
        if benchmark.child_mut(function).is_none() {
            benchmark.put_child(function, Template::sweepable("Function", function, &[]));
        }
        if let Some(f) = benchmark.child_mut(function) {
            f.put_child(loop_name, Template::sweepable("Loop", loop_name, &[self.unrolling.clone()]));
        }
    }
}

fn aes_aes(hls: &HlsParams) -> Template {
    let mut aes = hls
        .benchmark("aes-aes")
        .child("ctx", hls.array("ctx", 96, 1))
        .child("k", hls.array("k", 32, 1))
        .child("buf", hls.array("buf", 16, 1))
        .child("rcon", hls.array("rcon", 1, 1))
        .child("sbox", hls.array("sbox", 256, 1));
    hls.add_loop(&mut aes, "aes_addRoundKey_cpy", "cpkey");
    hls.add_loop(&mut aes, "aes_subBytes", "sub");
    hls.add_loop(&mut aes, "aes_addRoundKey", "addkey");
    hls.add_loop(&mut aes, "aes256_encrypt_ecb", "ecb1");
    hls.add_loop(&mut aes, "aes256_encrypt_ecb", "ecb2");
    hls.add_loop(&mut aes, "aes256_encrypt_ecb", "ecb3");
    aes
}

pub fn standard() -> Result<Registry> {
    let mut builder = Registry::builder();
    let hls = HlsParams::declare(&mut builder)?;
    builder.kind(exhaustive_sweep());
    builder.module(
        "hls.sweeps",
        Module::new().with_kind(
            SweepKind::new("AcceleratorSweep")
                .with_params(&[hls.cycle_time.clone()])
                .with_output(CONFIGS, Arc::new(JsonConfigs)),
        ),
    );
    builder.module("hls.machsuite", Module::new().with_object("aes_aes", aes_aes(&hls)));
    Ok(builder.build())
}
