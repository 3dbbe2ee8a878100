// Copyright (c) 2026 fhgate contributors
// SPDX-License-Identifier: AGPL-3.0

//! # fhgate CLI
//!
//! Offline tooling around the NFS file handle subsystem.
//!
//! ## Commands
//!
//! - `fhgate inspect [--proto v2|v3|v4] <HEX>` - Decode and check a raw handle
//! - `fhgate root-fh` - Run PUTROOTFH on an empty compound context
//! - `fhgate config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use fhgate_cli::commands::{self, ConfigCommand, InspectArgs};

/// fhgate - NFS file handle inspection
#[derive(Parser)]
#[command(name = "fhgate")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "FHGATE_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "FHGATE_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a raw file handle and run the handle predicates on it
    #[command(name = "inspect")]
    Inspect(InspectArgs),

    /// Build the pseudo root handle as PUTROOTFH does and print the context
    #[command(name = "root-fh")]
    RootFh,

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Inspect(args)) => commands::inspect::handle_command(args),
        Some(Commands::RootFh) => commands::root_fh::handle_command(cli.config),
        Some(Commands::Config { command }) => commands::config::handle_command(command, cli.config),
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    Ok(())
}
