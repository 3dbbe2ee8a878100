// Copyright (c) 2026 fhgate contributors
// SPDX-License-Identifier: AGPL-3.0

//! PUTROOTFH dry run
//!
//! Builds the pseudo root handle the way a compound call does and prints the
//! resulting handle context.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use fhgate_core::application::put_root_fh;
use fhgate_core::domain::compound::CompoundHandleContext;
use fhgate_core::domain::file_handle::VersionedHandle;
use fhgate_core::domain::gateway::ProtocolVersion;
use fhgate_core::domain::pseudofs::PseudoFs;
use fhgate_core::domain::server_config::ServerConfigManifest;
use fhgate_core::domain::server_state::{ServerBootTime, ServerState};
use fhgate_core::infrastructure::nfs::{CompoundDump, HandleCodec, HandleDump};

/// Run PUTROOTFH on a fresh context built from `config`
pub fn run(config: &ServerConfigManifest, boot_time: ServerBootTime) -> Result<CompoundHandleContext> {
    let state = ServerState::new(boot_time, config.handle_policy());
    let codec = HandleCodec::new(state);
    let pseudofs = PseudoFs::new(config.pseudo_export_id(), config.spec.pseudofs.root_name.clone());

    let mut ctx = CompoundHandleContext::new();
    put_root_fh(&codec, &pseudofs, &mut ctx)
        .map_err(|e| anyhow::anyhow!("PUTROOTFH failed ({:?}): {}", e.nfs4_status(), e))?;
    Ok(ctx)
}

pub fn handle_command(config_override: Option<PathBuf>) -> Result<()> {
    let config = ServerConfigManifest::load_or_default(config_override)
        .context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;

    let boot_time = ServerBootTime::now();
    info!(boot_time = %boot_time, "Running PUTROOTFH");
    let ctx = run(&config, boot_time)?;

    println!("{}", "Compound handle context:".bold());
    print!("{}", CompoundDump(&ctx));
    println!();

    let layout = VersionedHandle::parse(ProtocolVersion::V4, ctx.root().handle.as_bytes())
        .context("Root handle does not parse as v4")?;
    println!("{}", "Root handle layout:".bold());
    println!("  {}", HandleDump(&layout));

    Ok(())
}
