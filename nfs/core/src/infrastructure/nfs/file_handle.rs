// Copyright (c) 2026 fhgate contributors
// SPDX-License-Identifier: AGPL-3.0
//! NFS FileHandle Codec
//!
//! Converts backend object references to wire handles and back for each
//! protocol version. The opaque payload is produced and consumed by the
//! export's `HandleGateway`; the codec adds the export id, flags, boot time
//! and checksum around it.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Versioned encode/decode/validate of wire file handles

use crate::domain::export::Export;
use crate::domain::file_handle::{
    CodecError, FileHandleV2, FileHandleV3, FileHandleV4, HandleLayout, WireHandle,
    V2_OPAQUE_LEN, V3_OPAQUE_LEN, V4_OPAQUE_LEN,
};
use crate::domain::gateway::{GatewayError, ObjectHandle, ProtocolVersion};
use crate::domain::pseudofs::PseudoMarker;
use crate::domain::server_state::ServerState;
use tracing::{debug, warn};

/// Versioned file handle codec
///
/// Holds only read-only server state, so one instance can be shared by every
/// worker thread.
#[derive(Debug, Clone, Copy)]
pub struct HandleCodec {
    state: ServerState,
}

impl HandleCodec {
    pub fn new(state: ServerState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &ServerState {
        &self.state
    }

    /// Encode for the caller's protocol version.
    ///
    /// `pseudo` is only meaningful for v4 and is ignored otherwise.
    pub fn encode(
        &self,
        version: ProtocolVersion,
        export: &Export,
        object: &ObjectHandle,
        pseudo: Option<PseudoMarker>,
    ) -> Result<WireHandle, CodecError> {
        match version {
            ProtocolVersion::V2 => self.encode_v2(export, object),
            ProtocolVersion::V3 => self.encode_v3(export, object),
            ProtocolVersion::V4 => self.encode_v4(export, object, pseudo),
        }
    }

    /// Decode with the layout of the caller's protocol version.
    pub fn decode(
        &self,
        version: ProtocolVersion,
        handle: &[u8],
        export: &Export,
    ) -> Result<ObjectHandle, CodecError> {
        match version {
            ProtocolVersion::V2 => self.decode_v2(handle, export),
            ProtocolVersion::V3 => self.decode_v3(handle, export),
            ProtocolVersion::V4 => self.decode_v4(handle, export),
        }
    }

    pub fn encode_v2(&self, export: &Export, object: &ObjectHandle) -> Result<WireHandle, CodecError> {
        let opaque = digest_into::<V2_OPAQUE_LEN>(export, ProtocolVersion::V2, object)?;
        let handle = FileHandleV2::new(export.id(), opaque);
        Ok(handle.to_wire())
    }

    pub fn encode_v3(&self, export: &Export, object: &ObjectHandle) -> Result<WireHandle, CodecError> {
        let opaque = digest_into::<V3_OPAQUE_LEN>(export, ProtocolVersion::V3, object)?;
        let handle = FileHandleV3::new(export.id(), opaque);
        Ok(handle.to_wire())
    }

    pub fn encode_v4(
        &self,
        export: &Export,
        object: &ObjectHandle,
        pseudo: Option<PseudoMarker>,
    ) -> Result<WireHandle, CodecError> {
        let opaque = digest_into::<V4_OPAQUE_LEN>(export, ProtocolVersion::V4, object)?;
        let mut handle = FileHandleV4::new(export.id(), self.state.boot_time_stamp(), opaque);
        if let Some(marker) = pseudo {
            handle.pseudofs_flag = true;
            handle.pseudofs_id = marker.pseudofs_id;
        }
        if handle.server_boot_time != 0 {
            debug!(export_id = %export.id(), boot_time = handle.server_boot_time, "Encoded expirable v4 file handle");
        }
        Ok(handle.to_wire())
    }

    pub fn decode_v2(&self, handle: &[u8], export: &Export) -> Result<ObjectHandle, CodecError> {
        let parsed = FileHandleV2::parse(handle)?;
        let computed = parsed.computed_checksum();
        if parsed.checksum != computed {
            warn!(
                export_id = %parsed.export_id,
                embedded = parsed.checksum,
                expected = computed,
                "Invalid checksum in v2 file handle"
            );
            return Err(CodecError::ChecksumMismatch {
                version: ProtocolVersion::V2,
                embedded: parsed.checksum as u64,
                computed: computed as u64,
            });
        }
        expand(export, ProtocolVersion::V2, parsed.opaque())
    }

    pub fn decode_v3(&self, handle: &[u8], export: &Export) -> Result<ObjectHandle, CodecError> {
        let parsed = FileHandleV3::parse(handle)?;
        let computed = parsed.computed_checksum();
        if parsed.checksum != computed {
            warn!(
                export_id = %parsed.export_id,
                embedded = parsed.checksum,
                expected = computed,
                "Invalid checksum in v3 file handle"
            );
            return Err(CodecError::ChecksumMismatch {
                version: ProtocolVersion::V3,
                embedded: parsed.checksum,
                computed,
            });
        }
        expand(export, ProtocolVersion::V3, parsed.opaque())
    }

    /// Real-filesystem decode. Pseudo handles belong to the pseudo-namespace
    /// path and are rejected here.
    pub fn decode_v4(&self, handle: &[u8], export: &Export) -> Result<ObjectHandle, CodecError> {
        let parsed = FileHandleV4::parse(handle)?;
        if parsed.pseudofs_id != 0 || parsed.pseudofs_flag {
            debug!(
                pseudofs_id = parsed.pseudofs_id,
                pseudofs_flag = parsed.pseudofs_flag,
                "v4 pseudo file handle on the real filesystem path"
            );
            return Err(CodecError::NotARealHandle {
                pseudofs_id: parsed.pseudofs_id,
                pseudofs_flag: parsed.pseudofs_flag,
            });
        }
        expand(export, ProtocolVersion::V4, parsed.opaque())
    }
}

fn digest_into<const N: usize>(
    export: &Export,
    version: ProtocolVersion,
    object: &ObjectHandle,
) -> Result<[u8; N], CodecError> {
    let digest = export
        .gateway()
        .digest(export.context(), version, object)
        .map_err(|e| {
            warn!(export_id = %export.id(), %version, error = %e, "Backend digest failed");
            CodecError::BackendDigestFailed(e)
        })?;

    if digest.len() > N {
        return Err(CodecError::BackendDigestFailed(GatewayError::PayloadTooLarge {
            version,
            actual: digest.len(),
            capacity: N,
        }));
    }

    let mut opaque = [0u8; N];
    opaque[..digest.len()].copy_from_slice(&digest);
    Ok(opaque)
}

fn expand(export: &Export, version: ProtocolVersion, opaque: &[u8]) -> Result<ObjectHandle, CodecError> {
    export
        .gateway()
        .expand(export.context(), version, opaque)
        .map_err(|e| {
            debug!(export_id = %export.id(), %version, error = %e, "Backend expand failed");
            CodecError::StaleOrCorrupted(e)
        })
}
