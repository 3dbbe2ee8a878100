// Copyright (c) 2026 fhgate contributors
// SPDX-License-Identifier: AGPL-3.0
//! Domain model
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Handle layouts, exports, compound context and configuration

pub mod compound;
pub mod export;
pub mod file_handle;
pub mod gateway;
pub mod pseudofs;
pub mod server_config;
pub mod server_state;
pub mod status;
