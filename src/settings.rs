use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Runtime settings, read from `dsweep.toml` (or a given file) and then from
/// `DSWEEP_*` environment variables, later sources winning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// directory output handlers write below
    pub output_root: PathBuf,
    pub log_level: String,
    pub pretty_json: bool,
    /// generate and count configurations without writing files
    pub dry_run: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("."),
            log_level: "info".to_owned(),
            pretty_json: true,
            dry_run: false,
        }
    }
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("dsweep").required(false),
        };
        let settings = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix("DSWEEP").try_parsing(true))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}
