//! dsweep – an interpreter for design-sweep files.
//!
//! A sweep file describes a tree of configurable objects and, for some of their
//! parameters, ranges of values to try. Running it expands the sweep into every
//! concrete configuration, the Cartesian product of all swept parameters, with
//! derived values computed and untouched parameters at their defaults.
//!
//! ```text
//! begin ExhaustiveSweep unroll_study
//! use hls.machsuite.aes_aes          # attach a benchmark to the sweep
//! set cycle_time for aes_aes 5
//! sweep unrolling for aes_aes.** from 1 to 8 expstep 2
//! set partition_factor for aes_aes.* aes_aes.cycle_time * 2
//! generate configs
//! end unroll_study
//! ```
//!
//! ## Object model
//! * A [`node::Tree`] owns every [`node::Node`]; children live in named slots of
//!   their parent and the tree refuses cycles.
//! * A [`param::Param`] is a typed parameter declaration with a default. Its
//!   identity is its id, handed out by a [`param::ParamIdGenerator`]. Node types
//!   share declarations through `Arc`, and one id swept on many nodes is one axis.
//! * Nodes declaring parameters carry a [`node::Sweepable`] with the active sweep
//!   ranges, indexed both by name and by id.
//! * A [`sweep::DesignSweep`] roots the tree and tracks the lifecycle
//!   `begin … end` of one sweep along with the outputs it should generate.
//!
//! ## Modules
//! * [`selection`] – dotted paths with `*` and `**` wildcards.
//! * [`expression`] – arithmetic and chained comparisons over attribute paths,
//!   with deferred evaluation of references that are not assigned yet.
//! * [`parser`] – the pest grammar (`sweep.pest`) and `source` splicing.
//! * [`engine`] – applies [`command::Command`]s to the active sweep.
//! * [`generate`] – expands a finished sweep into [`generate::View`]s.
//! * [`output`] – writes configurations as JSON.
//! * [`registry`] and [`catalog`] – sweep kinds and importable modules.
//! * [`interpreter`] – runs whole scripts end to end.
//! * [`settings`] – runtime settings from `dsweep.toml` and `DSWEEP_*` variables.
//!
//! ## Quick Start
//! ```
//! use dsweep::{catalog, generate::ConfigGenerator, interpreter::Interpreter, settings::Settings};
//! let registry = catalog::standard().unwrap();
//! let settings = Settings { dry_run: true, ..Settings::default() };
//! let mut interpreter = Interpreter::new(&registry, settings);
//! let script = "use hls.sweeps.AcceleratorSweep
//! begin AcceleratorSweep demo
//! sweep cycle_time from 1 to 8 linstep 2
//! generate configs
//! end demo";
//! let reports = interpreter.execute(script).unwrap();
//! assert_eq!(reports[0].name, "demo");
//! let sweep = &interpreter.finished()[0];
//! assert_eq!(ConfigGenerator::new(sweep).count().unwrap(), 4);
//! ```

pub mod catalog;
pub mod command;
pub mod engine;
pub mod error;
pub mod expression;
pub mod generate;
pub mod interpreter;
pub mod node;
pub mod output;
pub mod param;
pub mod parser;
pub mod registry;
pub mod selection;
pub mod settings;
pub mod sweep;
pub mod value;

pub use error::{Result, SweepError};
