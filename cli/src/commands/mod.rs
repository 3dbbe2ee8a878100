// Copyright (c) 2026 fhgate contributors
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the fhgate CLI

pub mod config;
pub mod inspect;
pub mod root_fh;

pub use self::config::ConfigCommand;
pub use self::inspect::InspectArgs;
