// Copyright (c) 2026 fhgate contributors
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use fhgate_core::domain::server_config::ServerConfigManifest;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path
        #[arg(short, long, default_value = "./fhgate-config.yaml")]
        output: PathBuf,
    },
}

pub fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths),
        ConfigCommand::Validate { file } => validate(file.or(config_override)),
        ConfigCommand::Generate { output } => generate(output),
    }
}

fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = ServerConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. FHGATE_CONFIG_PATH: {}",
            std::env::var("FHGATE_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./fhgate-config.yaml");
        println!("  4. /etc/fhgate/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!("  Name: {}", config.metadata.name);
    println!();

    println!("{}", "NFSv4 Handles:".bold());
    println!("  Expire on reboot: {}", config.spec.nfsv4.fh_expire);
    println!("  Report expiry as error: {}", config.spec.nfsv4.returns_err_fh_expired);
    println!();

    println!("{}", "Pseudo Filesystem:".bold());
    println!("  Export id: {}", config.pseudo_export_id());
    println!("  Root: {}", config.spec.pseudofs.root_name);
    println!();

    println!("{}", "Exports:".bold());
    if config.spec.exports.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for export in &config.spec.exports {
        println!("  {} → {}", export.id.to_string().bold(), export.path);
    }
    println!();

    Ok(())
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = ServerConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

fn generate(output: PathBuf) -> Result<()> {
    let sample = include_str!("../../templates/config-minimal.yaml");

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_template_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("fhgate-config.yaml");
        generate(output.clone()).unwrap();

        let config = ServerConfigManifest::from_yaml_file(&output).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.spec.exports.len(), 1);
    }

    #[test]
    fn test_validate_rejects_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(
            &path,
            "apiVersion: fhgate.io/v1\nkind: ServerConfig\nmetadata:\n  name: x\nspec:\n  exports:\n    - id: 0\n      path: /clash\n",
        )
        .unwrap();
        assert!(validate(Some(path)).is_err());
    }
}
