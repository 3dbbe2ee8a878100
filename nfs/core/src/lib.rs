// Copyright (c) 2026 fhgate contributors
// SPDX-License-Identifier: AGPL-3.0
//! fhgate core
//!
//! File handle subsystem of a user-space NFS server: versioned wire handle
//! codec, routing predicates, the compound request handle context and
//! PUTROOTFH.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Crate root

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
