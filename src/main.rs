use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use dsweep::catalog;
use dsweep::interpreter::Interpreter;
use dsweep::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "dsweep")]
#[command(about = "Expands a design-sweep file into every configuration it describes")]
struct Args {
    /// Sweep file to run
    file: PathBuf,

    /// Settings file (default: dsweep.toml in the working directory, if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory that output directories are created under
    #[arg(short, long)]
    output_root: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Count configurations without writing any files
    #[arg(long)]
    dry_run: bool,
}

fn init_logging(level: &str) {
    // RUST_LOG wins over the configured level
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("dsweep={level}")));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    let mut settings = match Settings::load(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(root) = args.output_root {
        settings.output_root = root;
    }
    if let Some(level) = args.log_level {
        settings.log_level = level;
    }
    settings.dry_run |= args.dry_run;
    init_logging(&settings.log_level);

    let registry = match catalog::standard() {
        Ok(registry) => registry,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let mut interpreter = Interpreter::new(&registry, settings);
    match interpreter.execute_file(&args.file) {
        Ok(reports) => {
            for report in &reports {
                for file in &report.files {
                    println!("{}", file.display());
                }
                info!(sweep = %report.name, kind = %report.kind, outputs = ?report.outputs, "sweep done");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
