//! surgemon
//!
//! Runs one province's storm-surge warning pass from a TOML configuration.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use surgemon_service::config::{self, SurgeConfig};
use surgemon_service::logging::{self, LogLevel, Stage};
use surgemon_service::model::SurgeError;
use surgemon_service::pipeline::{self, RunOptions};
use surgemon_service::verify;

/// Storm-surge warnings, notifications and maps for one province
#[derive(Parser, Debug)]
#[command(name = "surgemon")]
#[command(about = "Derive storm-surge warnings from an ADCIRC run and administrative boundaries")]
struct Args {
    /// Configuration file (default: $SURGEMON_CONFIG, then surgemon.toml)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Check the configured inputs, print a JSON report and exit
    #[arg(long)]
    verify: bool,

    /// Do not scan the elevation time series for onset times
    #[arg(long)]
    skip_onset: bool,

    /// Do not write KML / GeoJSON maps
    #[arg(long)]
    skip_render: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let path = config::resolve_config_path(args.config.as_deref());
    let config = match config::load_config(&path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration {}: {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config);
    logging::info(
        Stage::System,
        Some(&config.scope.province),
        &format!("configuration loaded from {}", path.display()),
    );

    if args.verify {
        return run_verify(&config);
    }

    let options = RunOptions {
        skip_onset: args.skip_onset,
        skip_render: args.skip_render,
    };
    match pipeline::run_from_config(&config, options) {
        Ok(summary) => {
            logging::info(
                Stage::System,
                Some(&summary.scope),
                &format!(
                    "{} warnings, {} notifications, {} onset records; {} nodes unclaimed",
                    summary.warnings.len(),
                    summary.notifications.len(),
                    summary.onsets.len(),
                    summary.pool_remaining
                ),
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            logging::log_failure(Stage::System, Some(&config.scope.province), "warning run", &e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &SurgeConfig) {
    let level = LogLevel::parse(&config.logging.level).unwrap_or(LogLevel::Info);
    logging::init_logger(level, config.logging.file.as_deref(), config.logging.timestamps);
}

fn run_verify(config: &SurgeConfig) -> ExitCode {
    let report = match verify::run_verification(config) {
        Ok(r) => r,
        Err(e) => {
            logging::log_failure(Stage::System, Some(&config.scope.province), "verification", &e);
            return ExitCode::FAILURE;
        }
    };
    verify::print_summary(&report);
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            let err = SurgeError::Inconsistent(format!("cannot serialize report: {}", e));
            logging::log_failure(Stage::System, None, "verification", &err);
            return ExitCode::FAILURE;
        }
    }
    if report.summary.overall == verify::VerificationStatus::Failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
