// Copyright (c) 2026 fhgate contributors
// SPDX-License-Identifier: AGPL-3.0

//! Pseudo filesystem root
//!
//! The synthetic namespace shown at the protocol root when no real export is
//! mounted there. Only the root entry is modelled here; building the rest of
//! the tree belongs to the pseudo-namespace service.
//!
//! The pseudo filesystem is exposed as an ordinary `Export` whose gateway
//! digests an entry into its id, so the root handle goes through the same v4
//! encode path as any real object.

use crate::domain::export::{Export, ExportContext, ExportId};
use crate::domain::gateway::{GatewayError, HandleGateway, ObjectHandle, ProtocolVersion};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Entry of the pseudo namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PseudoFsEntry {
    /// Stamped into `pseudofs_id` of v4 handles
    pub id: u16,
    pub name: String,
}

impl PseudoFsEntry {
    /// Object reference of this entry, as understood by the pseudo gateway
    pub fn object_handle(&self) -> ObjectHandle {
        ObjectHandle::new(self.id.to_be_bytes().to_vec())
    }
}

/// Marks a v4 handle as belonging to the pseudo namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PseudoMarker {
    pub pseudofs_id: u16,
}

impl From<&PseudoFsEntry> for PseudoMarker {
    fn from(entry: &PseudoFsEntry) -> Self {
        Self {
            pseudofs_id: entry.id,
        }
    }
}

/// Pseudo filesystem: root entry plus the export it is served under
///
/// Read-only after startup.
#[derive(Debug, Clone)]
pub struct PseudoFs {
    root: PseudoFsEntry,
    export: Export,
}

impl PseudoFs {
    pub const ROOT_ID: u16 = 0;

    pub fn new(export_id: ExportId, root_name: impl Into<String>) -> Self {
        let gateway = PseudoFsGateway {
            root_id: Self::ROOT_ID,
        };
        Self::with_gateway(export_id, root_name, Arc::new(gateway))
    }

    /// Serve the pseudo namespace through `gateway` instead of the built-in
    /// entry-id gateway
    pub fn with_gateway(
        export_id: ExportId,
        root_name: impl Into<String>,
        gateway: Arc<dyn HandleGateway>,
    ) -> Self {
        let root = PseudoFsEntry {
            id: Self::ROOT_ID,
            name: root_name.into(),
        };
        let export = Export::new(ExportContext::new(export_id, root.name.clone()), gateway);
        Self { root, export }
    }

    pub fn root(&self) -> &PseudoFsEntry {
        &self.root
    }

    pub fn export(&self) -> &Export {
        &self.export
    }

    pub fn export_id(&self) -> ExportId {
        self.export.id()
    }
}

/// Digest/expand for pseudo entries: the opaque payload is the entry id
struct PseudoFsGateway {
    root_id: u16,
}

impl PseudoFsGateway {
    fn entry_id(bytes: &[u8]) -> Result<u16, GatewayError> {
        match bytes {
            [hi, lo, ..] => Ok(u16::from_be_bytes([*hi, *lo])),
            _ => Err(GatewayError::InvalidPayload(format!(
                "pseudo entry id needs 2 bytes, got {}",
                bytes.len()
            ))),
        }
    }
}

impl HandleGateway for PseudoFsGateway {
    fn digest(
        &self,
        _export: &ExportContext,
        _version: ProtocolVersion,
        object: &ObjectHandle,
    ) -> Result<Vec<u8>, GatewayError> {
        let id = Self::entry_id(object.as_bytes())?;
        Ok(id.to_be_bytes().to_vec())
    }

    fn expand(
        &self,
        _export: &ExportContext,
        _version: ProtocolVersion,
        opaque: &[u8],
    ) -> Result<ObjectHandle, GatewayError> {
        let id = Self::entry_id(opaque)?;
        if id != self.root_id {
            return Err(GatewayError::NotFound);
        }
        Ok(ObjectHandle::new(id.to_be_bytes().to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_entry() {
        let pseudofs = PseudoFs::new(ExportId(0), "/");
        assert_eq!(pseudofs.root().id, PseudoFs::ROOT_ID);
        assert_eq!(pseudofs.root().name, "/");
        assert_eq!(pseudofs.export_id(), ExportId(0));
        assert_eq!(pseudofs.export().context().path, "/");
    }

    #[test]
    fn test_gateway_roundtrip() {
        let pseudofs = PseudoFs::new(ExportId(0), "/");
        let export = pseudofs.export();
        let object = pseudofs.root().object_handle();

        let mut opaque = export
            .gateway()
            .digest(export.context(), ProtocolVersion::V4, &object)
            .unwrap();
        opaque.resize(64, 0);
        let expanded = export
            .gateway()
            .expand(export.context(), ProtocolVersion::V4, &opaque)
            .unwrap();
        assert_eq!(expanded, object);
    }

    #[test]
    fn test_gateway_rejects_unknown_entry() {
        let pseudofs = PseudoFs::new(ExportId(0), "/");
        let export = pseudofs.export();
        let result = export
            .gateway()
            .expand(export.context(), ProtocolVersion::V4, &[0, 9, 0, 0]);
        assert_eq!(result, Err(GatewayError::NotFound));

        let result = export
            .gateway()
            .digest(export.context(), ProtocolVersion::V4, &ObjectHandle::new(vec![1]));
        assert!(matches!(result, Err(GatewayError::InvalidPayload(_))));
    }
}
