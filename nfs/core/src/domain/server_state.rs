// Copyright (c) 2026 fhgate contributors
// SPDX-License-Identifier: AGPL-3.0
//! Server lifetime state
//!
//! Values fixed once at startup and read by every request afterwards. They are
//! passed to the codec explicitly so tests can run in parallel with different
//! boot times and policies.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Boot time stamp and handle expiry policy

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Instant the server instance started, in seconds since the epoch
///
/// Stored in 32 bits on the wire. Zero is reserved for "never expires", so
/// `now()` never yields it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerBootTime(pub u32);

impl ServerBootTime {
    pub fn now() -> Self {
        let secs = Utc::now().timestamp() as u32;
        Self(secs.max(1))
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ServerBootTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle expiry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlePolicy {
    /// Stamp v4 handles with the boot time so a restart invalidates them
    pub expire_on_reboot: bool,
    /// Surface a boot-time mismatch as an error instead of accepting the handle
    pub report_expired_as_error: bool,
}

impl Default for HandlePolicy {
    fn default() -> Self {
        Self {
            expire_on_reboot: false,
            report_expired_as_error: true,
        }
    }
}

/// Process-wide read-only state injected into the codec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerState {
    pub boot_time: ServerBootTime,
    pub policy: HandlePolicy,
}

impl ServerState {
    pub fn new(boot_time: ServerBootTime, policy: HandlePolicy) -> Self {
        Self { boot_time, policy }
    }

    /// Boot time to embed in freshly encoded v4 handles (0 = never expires)
    pub fn boot_time_stamp(&self) -> u32 {
        if self.policy.expire_on_reboot {
            self.boot_time.as_u32()
        } else {
            0
        }
    }
}
