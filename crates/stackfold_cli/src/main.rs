//! stackfold CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments or file not found
//! - 3: Template parse error
//! - 4: Configuration error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stackfold_core::StackError;
use stackfold_yaml::{DocumentError, ErrorKind};

mod commands;
mod config;

use commands::{Cli, Commands};
use config::StackfoldConfig;

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const PARSE_ERROR: u8 = 3;
    pub const CONFIG_ERROR: u8 = 4;
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let result = StackfoldConfig::load(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Flatten(args) => commands::flatten::execute(args, &config),
        Commands::Retain(args) => commands::retain::execute(args, &config),
    });

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Logs go to stderr; stdout carries the rendered template.
fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("stackfold={},warn", level)));

    let registry = tracing_subscriber::registry().with(filter);
    let log_result = if cli.log_json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };

    if log_result.is_err() {
        // Logging already initialized, continue
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    let kind = e.chain().find_map(|cause| {
        cause
            .downcast_ref::<StackError>()
            .map(StackError::kind)
            .or_else(|| cause.downcast_ref::<DocumentError>().map(DocumentError::kind))
    });

    match kind {
        Some(ErrorKind::NotFound) => ExitCodes::INVALID_ARGS,
        Some(ErrorKind::Parse) | Some(ErrorKind::Shape) => ExitCodes::PARSE_ERROR,
        Some(ErrorKind::Config) => ExitCodes::CONFIG_ERROR,
        Some(ErrorKind::Io) | None => {
            if e.to_string().to_lowercase().contains("configuration") {
                ExitCodes::CONFIG_ERROR
            } else {
                ExitCodes::GENERAL_ERROR
            }
        }
    }
}
