// Copyright (c) 2026 fhgate contributors
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::gateway::HandleGateway;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Value Objects
// ============================================================================

/// Identifier of an export (a configured subtree of the served namespace)
///
/// Stored as a signed 16-bit value at a fixed offset of every wire handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExportId(pub i16);

impl ExportId {
    /// Export id reserved for the pseudo filesystem unless configured otherwise
    pub const PSEUDO: ExportId = ExportId(0);

    pub fn value(&self) -> i16 {
        self.0
    }
}

impl fmt::Display for ExportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i16> for ExportId {
    fn from(value: i16) -> Self {
        Self(value)
    }
}

/// Context handed to the gateway on every digest/expand call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportContext {
    pub export_id: ExportId,
    /// Exported path (e.g. "/data/projects")
    pub path: String,
}

impl ExportContext {
    pub fn new(export_id: ExportId, path: impl Into<String>) -> Self {
        Self {
            export_id,
            path: path.into(),
        }
    }
}

// ============================================================================
// Entity
// ============================================================================

/// A loaded export: its context plus the gateway of the backend serving it
///
/// Read-only after startup; shared between worker threads behind an `Arc`.
#[derive(Clone)]
pub struct Export {
    context: ExportContext,
    gateway: Arc<dyn HandleGateway>,
}

impl Export {
    pub fn new(context: ExportContext, gateway: Arc<dyn HandleGateway>) -> Self {
        Self { context, gateway }
    }

    pub fn id(&self) -> ExportId {
        self.context.export_id
    }

    pub fn context(&self) -> &ExportContext {
        &self.context
    }

    pub fn gateway(&self) -> &dyn HandleGateway {
        self.gateway.as_ref()
    }
}

impl fmt::Debug for Export {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Export")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
