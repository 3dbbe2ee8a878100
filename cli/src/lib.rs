// Copyright (c) 2026 fhgate contributors
// SPDX-License-Identifier: AGPL-3.0
//! fhgate CLI library - exposes testable components
//!
//! # Architecture
//!
//! - **Layer:** Interface / Presentation Layer
//! - **Purpose:** Command implementations for the `fhgate` binary

pub mod commands;
