// Copyright (c) 2026 fhgate contributors
// SPDX-License-Identifier: AGPL-3.0

//! NFS file handle infrastructure
//!
//! ## Data flow
//! ```text
//! inbound bytes → predicates (export id, shape)
//!   → HandleCodec::decode (gateway expand) → object reference
//! object reference → HandleCodec::encode (gateway digest) → wire bytes
//! ```
//!
//! The codec never interprets the opaque payload; only the export's
//! `HandleGateway` does.

pub mod diagnostics;
pub mod file_handle;
pub mod predicates;

pub use diagnostics::{describe_compound, CompoundDump, HandleDump};
pub use file_handle::HandleCodec;
