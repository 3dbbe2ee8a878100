// Copyright (c) 2026 fhgate contributors
// SPDX-License-Identifier: AGPL-3.0
//! Application services
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Compound operations and export-routed handle service

pub mod file_handle_service;
pub mod put_root_fh;

pub use file_handle_service::{ExportError, ExportRegistry, FileHandleService, ResolvedHandle};
pub use put_root_fh::put_root_fh;
