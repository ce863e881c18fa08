//! # mssdk CLI entry point
//!
//! Parses command-line arguments, resolves configuration, and dispatches
//! to subcommand handlers inside the CLI's telemetry scope.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use mssdk_cli::archive::{run_pack, run_unpack, PackArgs, UnpackArgs};
use mssdk_cli::config::{LogFormat, SdkConfig};
use mssdk_cli::hash::{run_hash, HashArgs};
use mssdk_cli::telemetry::Telemetry;
use mssdk_cli::validate::{run_validate, ValidateArgs};
use mssdk_cli::EXIT_ERROR;

/// Mapping Suite SDK: validate, sign and package mapping packages.
#[derive(Parser, Debug)]
#[command(name = "mssdk", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, value_enum, global = true)]
    log_format: Option<LogFormat>,

    /// Bulk validation worker threads.
    #[arg(long, global = true)]
    workers: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate mapping packages from an archive, a folder or a git repository.
    Validate(ValidateArgs),

    /// Compute the signature of a package folder.
    Hash(HashArgs),

    /// Pack a package folder into a .zip, .tar or .tar.gz archive.
    Pack(PackArgs),

    /// Unpack a package archive into a directory.
    Unpack(UnpackArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match SdkConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::from(EXIT_ERROR);
        }
    };
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    if let Some(workers) = cli.workers {
        config.workers = Some(workers);
    }

    let telemetry = Telemetry::new(cli.verbose, config.log_format);
    let code = telemetry.in_scope(|| {
        tracing::debug!(?config, "mssdk starting");
        let result = match &cli.command {
            Commands::Validate(args) => run_validate(args, &config),
            Commands::Hash(args) => run_hash(args),
            Commands::Pack(args) => run_pack(args),
            Commands::Unpack(args) => run_unpack(args),
        };
        match result {
            Ok(code) => code,
            Err(e) => {
                tracing::error!("{e:#}");
                eprintln!("error: {e:#}");
                EXIT_ERROR
            }
        }
    });
    telemetry.shutdown();
    ExitCode::from(code)
}
