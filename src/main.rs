use clap::{Parser, Subcommand};
use desqueeze::config::{self, DaemonConfig};
use desqueeze::daemon::Daemon;
use desqueeze::tools::{Exiftool, MetadataTool};
use desqueeze::{output, process};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "desqueeze")]
#[command(about = "Desqueeze raw photos shot through an anamorphic adapter")]
#[command(long_about = "\
Desqueeze raw photos shot through an anamorphic adapter

Watches an import directory for camera raw files. Files whose metadata shows
the adapter (a nominal focal length with no recorded aperture) are converted
to DNG in the export directory, tagged with the adapter's DefaultScale, and
given desqueezed embedded previews. The original raw is deleted once its DNG
is complete; everything else is left alone.

Requires exiftool, dnglab and ImageMagick (magick) at runtime.

Run 'desqueeze gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Configuration file (stock defaults when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Import directory, overrides [paths] import
    #[arg(long, global = true)]
    import: Option<PathBuf>,

    /// Export directory, overrides [paths] export
    #[arg(long, global = true)]
    export: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan now, then again after every interval, forever
    Run,
    /// Run a single scan and print what happened to each file
    Scan,
    /// Show how files would be classified without touching them
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run => {
            let config = load(&cli)?;
            info!(
                import = %config.paths.import.display(),
                export = %config.paths.export.display(),
                interval_secs = config.schedule.interval_secs,
                "Starting daemon"
            );
            Daemon::from_config(&config)?.run(None);
        }
        Command::Scan => {
            let config = load(&cli)?;
            let report = Daemon::from_config(&config)?.run_once()?;
            output::print_scan_report(&report);
        }
        Command::Check { ref files } => {
            let config = load_unchecked(&cli)?;
            let process_config = process::ProcessConfig::from_daemon_config(&config);
            let mut tool = Exiftool::new(&config.tools.exiftool)?;
            for file in files {
                let metadata = tool.read(file)?;
                let verdict = process::evaluate(&metadata, &process_config);
                output::print_check(file, &metadata, &verdict);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Config with CLI path overrides applied, before directory checks.
fn load_unchecked(cli: &Cli) -> Result<DaemonConfig, config::ConfigError> {
    let mut config = config::load_config(cli.config.as_deref())?;
    if let Some(import) = &cli.import {
        config.paths.import = import.clone();
    }
    if let Some(export) = &cli.export {
        config.paths.export = export.clone();
    }
    Ok(config)
}

/// Config for commands that touch the import and export directories.
fn load(cli: &Cli) -> Result<DaemonConfig, config::ConfigError> {
    let config = load_unchecked(cli)?;
    config::check_directories(&config.paths)?;
    Ok(config)
}
