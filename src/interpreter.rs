use std::path::{Path, PathBuf};
use tracing::info;

use crate::engine::Engine;
use crate::error::Result;
use crate::parser::{self, Statement};
use crate::registry::Registry;
use crate::settings::Settings;
use crate::sweep::DesignSweep;

/// What running a script produced for one sweep.
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub name: String,
    pub kind: String,
    pub outputs: Vec<String>,
    pub files: Vec<PathBuf>,
}

/// Runs whole scripts: each statement goes to the engine, and every sweep that
/// ends is validated and has its requested outputs generated right away.
pub struct Interpreter<'r> {
    engine: Engine<'r>,
    settings: Settings,
    finished: Vec<DesignSweep>,
}

impl<'r> Interpreter<'r> {
    pub fn new(registry: &'r Registry, settings: Settings) -> Self {
        Self { engine: Engine::new(registry), settings, finished: Vec::new() }
    }
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
    pub fn engine(&self) -> &Engine<'r> {
        &self.engine
    }
    /// Sweeps that have ended, in the order they ended.
    pub fn finished(&self) -> &[DesignSweep] {
        &self.finished
    }
    /// Runs script text; `source` paths are taken relative to the working directory.
    pub fn execute(&mut self, script: &str) -> Result<Vec<SweepReport>> {
        let statements = parser::expand(script, Path::new("."))?;
        self.run(&statements)
    }
    pub fn execute_file(&mut self, path: &Path) -> Result<Vec<SweepReport>> {
        let statements = parser::load(path)?;
        info!(file = %path.display(), statements = statements.len(), "loaded sweep file");
        self.run(&statements)
    }
    pub fn run(&mut self, statements: &[Statement]) -> Result<Vec<SweepReport>> {
        let mut reports = Vec::new();
        for statement in statements {
            let finished = self.engine.apply(&statement.command).map_err(|e| e.at(statement.line, &statement.text))?;
            if let Some(sweep) = finished {
                let report = self.finish(&sweep).map_err(|e| e.at(statement.line, &statement.text))?;
                reports.push(report);
                self.finished.push(sweep);
            }
        }
        if let Some(active) = self.engine.active() {
            info!(sweep = active.name().unwrap_or_default(), "script ended with a sweep still open");
        }
        Ok(reports)
    }
    fn finish(&self, sweep: &DesignSweep) -> Result<SweepReport> {
        sweep.validate()?;
        let files = sweep.generate_all_outputs(&self.settings)?;
        Ok(SweepReport {
            name: sweep.name().unwrap_or_default().to_owned(),
            kind: sweep.kind().name().to_owned(),
            outputs: sweep.generate_outputs().iter().cloned().collect(),
            files,
        })
    }
}
