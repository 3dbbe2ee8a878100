// Copyright (c) 2026 fhgate contributors
// SPDX-License-Identifier: AGPL-3.0
//! File Handle Application Service
//!
//! Request-path entry point for handles: routes an inbound handle to its
//! export, applies the expiry policy and decodes it; encodes outbound object
//! references for a known export.
//!
//! ## Inbound flow
//! - Shape check (absent or oversized handles are rejected early)
//! - v4 pseudo handles are turned away (they belong to the pseudo namespace)
//! - `extract_export_id` (unchecked routing read)
//! - Export registry lookup
//! - v4 boot-time expiry check
//! - Full decode, including the gateway `expand` call
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Export routing and handle statistics around the codec

use crate::domain::export::{Export, ExportContext, ExportId};
use crate::domain::file_handle::{CodecError, WireHandle};
use crate::domain::gateway::{GatewayError, HandleGateway, ObjectHandle, ProtocolVersion};
use crate::domain::server_config::{ExportConfig, ServerConfigManifest};
use crate::infrastructure::nfs::file_handle::HandleCodec;
use crate::infrastructure::nfs::predicates;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

pub const ENCODE_COUNTER: &str = "fhgate_handle_encode_total";
pub const DECODE_COUNTER: &str = "fhgate_handle_decode_total";

/// Export registry errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExportError {
    #[error("Export {0} is already registered")]
    AlreadyRegistered(ExportId),

    #[error("Export {0} is not registered")]
    NotRegistered(ExportId),
}

/// Export table keyed by export id
///
/// Filled at startup and read by every request; cloning shares the table.
#[derive(Clone, Default)]
pub struct ExportRegistry {
    exports: Arc<RwLock<HashMap<ExportId, Export>>>,
}

impl ExportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table from the configured exports
    ///
    /// The manifest only names exports; `gateway_for` attaches the backend
    /// that serves each one. The pseudo filesystem export is not included.
    pub fn from_config<F>(manifest: &ServerConfigManifest, gateway_for: F) -> Result<Self, ExportError>
    where
        F: Fn(&ExportConfig) -> Arc<dyn HandleGateway>,
    {
        let registry = Self::new();
        for config in &manifest.spec.exports {
            let context = ExportContext::new(ExportId(config.id), config.path.clone());
            registry.register(Export::new(context, gateway_for(config)))?;
        }
        Ok(registry)
    }

    /// Register an export under its id
    pub fn register(&self, export: Export) -> Result<(), ExportError> {
        let id = export.id();
        let mut exports = self.exports.write();
        if exports.contains_key(&id) {
            return Err(ExportError::AlreadyRegistered(id));
        }
        debug!(export_id = %id, path = %export.context().path, "Registered export");
        exports.insert(id, export);
        Ok(())
    }

    pub fn deregister(&self, id: ExportId) -> Result<Export, ExportError> {
        let removed = self
            .exports
            .write()
            .remove(&id)
            .ok_or(ExportError::NotRegistered(id))?;
        debug!(export_id = %id, "Deregistered export");
        Ok(removed)
    }

    pub fn lookup(&self, id: ExportId) -> Option<Export> {
        self.exports.read().get(&id).cloned()
    }

    pub fn list_exports(&self) -> Vec<ExportId> {
        let mut ids: Vec<ExportId> = self.exports.read().keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn count(&self) -> usize {
        self.exports.read().len()
    }
}

/// A decoded inbound handle with the export it was routed to
#[derive(Debug, Clone)]
pub struct ResolvedHandle {
    pub export: Export,
    pub object: ObjectHandle,
}

/// Handle encode/decode with export routing
#[derive(Clone)]
pub struct FileHandleService {
    codec: HandleCodec,
    registry: ExportRegistry,
}

impl FileHandleService {
    pub fn new(codec: HandleCodec, registry: ExportRegistry) -> Self {
        Self { codec, registry }
    }

    pub fn codec(&self) -> &HandleCodec {
        &self.codec
    }

    pub fn registry(&self) -> &ExportRegistry {
        &self.registry
    }

    /// Encode `object` for the export registered under `export_id`
    ///
    /// An unknown export fails as a backend digest failure, since no gateway
    /// is available to produce the payload.
    pub fn encode(
        &self,
        version: ProtocolVersion,
        export_id: ExportId,
        object: &ObjectHandle,
    ) -> Result<WireHandle, CodecError> {
        let result = match self.registry.lookup(export_id) {
            Some(export) => self.codec.encode(version, &export, object, None),
            None => Err(CodecError::BackendDigestFailed(GatewayError::UnknownExport(
                export_id.value(),
            ))),
        };
        record(ENCODE_COUNTER, version, &result);
        result
    }

    /// Route and decode an inbound handle
    pub fn decode(
        &self,
        version: ProtocolVersion,
        handle: Option<&[u8]>,
    ) -> Result<ResolvedHandle, CodecError> {
        let result = self.resolve(version, handle);
        record(DECODE_COUNTER, version, &result);
        result
    }

    fn resolve(
        &self,
        version: ProtocolVersion,
        handle: Option<&[u8]>,
    ) -> Result<ResolvedHandle, CodecError> {
        let bytes = match handle {
            Some(bytes) if !predicates::is_structurally_invalid(version, handle) => bytes,
            _ => {
                return Err(CodecError::Malformed {
                    version,
                    len: handle.map_or(0, <[u8]>::len),
                })
            }
        };

        if version == ProtocolVersion::V4 {
            let pseudofs_id = predicates::pseudofs_id(bytes);
            let pseudofs_flag = predicates::is_pseudo(bytes);
            if pseudofs_flag || pseudofs_id != 0 {
                debug!(pseudofs_id, pseudofs_flag, "Pseudo file handle routed to the real filesystem");
                return Err(CodecError::NotARealHandle {
                    pseudofs_id,
                    pseudofs_flag,
                });
            }
        }

        let export_id = predicates::extract_export_id(version, bytes)?;
        let export = self.registry.lookup(export_id).ok_or_else(|| {
            debug!(export_id = %export_id, %version, "File handle for unknown export");
            CodecError::StaleOrCorrupted(GatewayError::UnknownExport(export_id.value()))
        })?;

        if version == ProtocolVersion::V4 {
            let state = self.codec.state();
            predicates::is_expired(bytes, state.boot_time, state.policy)?;
        }

        let object = self.codec.decode(version, bytes, &export)?;
        Ok(ResolvedHandle { export, object })
    }
}

fn record<T>(name: &'static str, version: ProtocolVersion, result: &Result<T, CodecError>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(e) => e.kind(),
    };
    metrics::counter!(name, "version" => version.as_str(), "outcome" => outcome).increment(1);
}
