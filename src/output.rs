use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::error::Result;
use crate::generate::ConfigGenerator;
use crate::settings::Settings;
use crate::sweep::{DesignSweep, OutputHandler};

/// Writes every configuration of a sweep as one JSON array to
/// `<output_root>/<output_dir>/<sweep name>.json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonConfigs;

impl JsonConfigs {
    pub fn target(sweep: &DesignSweep, settings: &Settings) -> PathBuf {
        settings
            .output_root
            .join(sweep.output_dir())
            .join(format!("{}.json", sweep.name().unwrap_or("sweep")))
    }
}

impl OutputHandler for JsonConfigs {
    fn generate(&self, sweep: &DesignSweep, settings: &Settings) -> Result<Vec<PathBuf>> {
        let configs = ConfigGenerator::new(sweep).generate()?;
        let path = JsonConfigs::target(sweep, settings);
        if settings.dry_run {
            for view in &configs {
                debug!(config = %view, "dry run");
            }
            info!(path = %path.display(), configs = configs.len(), "dry run, nothing written");
            return Ok(Vec::new());
        }
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut writer = BufWriter::new(File::create(&path)?);
        configs.write(&mut writer, settings.pretty_json)?;
        writer.flush()?;
        info!(path = %path.display(), configs = configs.len(), "wrote configurations");
        Ok(vec![path])
    }
}
