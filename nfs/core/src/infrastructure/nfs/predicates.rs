// Copyright (c) 2026 fhgate contributors
// SPDX-License-Identifier: AGPL-3.0
//! File handle predicates
//!
//! Cheap queries on raw wire bytes used for request routing before the full,
//! gateway-calling decode. None of them allocate or call a gateway, and none of
//! them validate the handle: a `true`/`false` answer says nothing about whether
//! the handle would decode.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Structural checks on undecoded handles

use crate::domain::export::ExportId;
use crate::domain::file_handle::{
    layout_size, CodecError, EXPORT_ID_OFFSET, V4_BOOT_TIME_OFFSET, V4_PSEUDOFS_FLAG_OFFSET,
    V4_PSEUDOFS_ID_OFFSET, V4_REFID_OFFSET, XATTR_POS_OFFSET,
};
use crate::domain::gateway::ProtocolVersion;
use crate::domain::server_state::{HandlePolicy, ServerBootTime};
use tracing::debug;

fn read_u16(handle: &[u8], offset: usize) -> Option<u16> {
    handle
        .get(offset..offset + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
}

fn read_u32(handle: &[u8], offset: usize) -> Option<u32> {
    handle
        .get(offset..offset + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

/// True when the handle carries no bytes
pub fn is_empty(handle: &[u8]) -> bool {
    handle.is_empty()
}

/// Read the export id without validating anything else
///
/// This is the routing fast path: length, checksum and flags are NOT checked,
/// so any handle of at least two bytes yields some export id, including
/// garbage ones. Never use the result for an access-control decision before
/// the handle has been fully decoded.
///
/// Fails with `Malformed` only when the export id field itself is missing.
pub fn extract_export_id(version: ProtocolVersion, handle: &[u8]) -> Result<ExportId, CodecError> {
    read_u16(handle, EXPORT_ID_OFFSET)
        .map(|raw| ExportId(raw as i16))
        .ok_or(CodecError::Malformed {
            version,
            len: handle.len(),
        })
}

/// True when the handle designates an extended-attribute pseudo-object
pub fn is_xattr(handle: &[u8]) -> bool {
    handle.get(XATTR_POS_OFFSET).is_some_and(|&pos| pos != 0)
}

/// v4 only: true when the handle belongs to the pseudo namespace
pub fn is_pseudo(handle: &[u8]) -> bool {
    handle
        .get(V4_PSEUDOFS_FLAG_OFFSET)
        .is_some_and(|&flag| flag != 0)
}

/// v4 only: pseudo namespace entry id, 0 when absent or too short to carry one
pub fn pseudofs_id(handle: &[u8]) -> u16 {
    read_u16(handle, V4_PSEUDOFS_ID_OFFSET).unwrap_or(0)
}

/// v4 only: true when the handle is a pure referral
pub fn is_referral(handle: &[u8]) -> bool {
    read_u16(handle, V4_REFID_OFFSET).is_some_and(|refid| refid > 0)
}

/// Coarse sanity bound: absent, or longer than the version's layout
pub fn is_structurally_invalid(version: ProtocolVersion, handle: Option<&[u8]>) -> bool {
    match handle {
        None => true,
        Some(bytes) => bytes.len() > layout_size(version),
    }
}

/// v4 only: boot-time expiry check
///
/// With expiry disabled every handle is valid. With expiry enabled a handle
/// stamped by another server instance is reported as `Expired` only when the
/// policy asks for it; otherwise it is silently accepted. A handle too short to
/// carry a boot time counts as stamped by another instance.
pub fn is_expired(
    handle: &[u8],
    current_boot_time: ServerBootTime,
    policy: HandlePolicy,
) -> Result<(), CodecError> {
    if !policy.expire_on_reboot {
        return Ok(());
    }

    let issued = read_u32(handle, V4_BOOT_TIME_OFFSET);
    if issued == Some(current_boot_time.as_u32()) {
        return Ok(());
    }

    let issued = issued.unwrap_or(0);
    debug!(
        issued,
        current = current_boot_time.as_u32(),
        report = policy.report_expired_as_error,
        "File handle issued by another server instance"
    );
    if policy.report_expired_as_error {
        return Err(CodecError::Expired {
            issued,
            current: current_boot_time.as_u32(),
        });
    }
    Ok(())
}
