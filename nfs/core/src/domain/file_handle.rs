// Copyright (c) 2026 fhgate contributors
// SPDX-License-Identifier: AGPL-3.0
//! NFS wire file handle layouts
//!
//! Bit-exact layouts of the three handle formats. Every field is read and
//! written at a fixed offset of a byte buffer whose length has been checked
//! first; nothing is ever reinterpreted in place.
//!
//! ```text
//! v2 (32 bytes)
//!   [0..2]   export_id       i16
//!   [2]      xattr_pos       u8
//!   [3]      reserved
//!   [4..8]   checksum        u32
//!   [8..32]  opaque          24 bytes
//!
//! v3 (64 bytes)
//!   [0..2]   export_id       i16
//!   [2]      xattr_pos       u8
//!   [3]      reserved
//!   [4..20]  checksum field  u64 in [4..12], [12..20] zero
//!   [20..64] opaque          44 bytes
//!
//! v4 (88 bytes)
//!   [0..2]   export_id       i16
//!   [2]      xattr_pos       u8
//!   [3]      pseudofs_flag   u8
//!   [4]      ds_flag         u8
//!   [5]      reserved
//!   [6..8]   pseudofs_id     u16
//!   [8..10]  refid           u16
//!   [10..12] reserved
//!   [12..16] server_boot_time u32
//!   [16..24] checksum        u64 (carried, never validated)
//!   [24..88] opaque          64 bytes
//! ```
//!
//! Integers are big-endian. `export_id` and `xattr_pos` share their offsets
//! across versions so routing predicates can read them without a full parse.
//!
//! # Checksum
//!
//! v2 and v3 carry `export_id + opaque[1] + opaque[3] + opaque[5]` computed in
//! the version's integer width with wrapping addition. It samples three payload
//! bytes only, so corruption anywhere else in the payload goes unnoticed. That
//! weakness is part of the deployed wire format; changing the formula would
//! invalidate every handle clients already hold.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Handle layouts, checksum and codec error taxonomy

use crate::domain::export::ExportId;
use crate::domain::gateway::{GatewayError, ProtocolVersion};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

pub const EXPORT_ID_OFFSET: usize = 0;
pub const XATTR_POS_OFFSET: usize = 2;
pub const V4_PSEUDOFS_FLAG_OFFSET: usize = 3;
pub const V4_PSEUDOFS_ID_OFFSET: usize = 6;
pub const V4_REFID_OFFSET: usize = 8;
pub const V4_BOOT_TIME_OFFSET: usize = 12;

pub const V2_SIZE: usize = 32;
pub const V2_OPAQUE_OFFSET: usize = 8;
pub const V2_OPAQUE_LEN: usize = V2_SIZE - V2_OPAQUE_OFFSET;

pub const V3_SIZE: usize = 64;
pub const V3_CHECKSUM_FIELD_LEN: usize = 16;
pub const V3_OPAQUE_OFFSET: usize = 20;
pub const V3_OPAQUE_LEN: usize = V3_SIZE - V3_OPAQUE_OFFSET;

pub const V4_SIZE: usize = 88;
pub const V4_OPAQUE_OFFSET: usize = 24;
pub const V4_OPAQUE_LEN: usize = V4_SIZE - V4_OPAQUE_OFFSET;

/// Payload offsets sampled by the checksum
const CHECKSUM_SAMPLE_OFFSETS: [usize; 3] = [1, 3, 5];

/// Codec errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Malformed {version} file handle ({len} bytes)")]
    Malformed { version: ProtocolVersion, len: usize },

    #[error("Invalid checksum in {version} file handle: embedded {embedded:#x}, expected {computed:#x}")]
    ChecksumMismatch {
        version: ProtocolVersion,
        embedded: u64,
        computed: u64,
    },

    #[error("Not a real filesystem handle (pseudofs_id={pseudofs_id}, pseudofs_flag={pseudofs_flag})")]
    NotARealHandle { pseudofs_id: u16, pseudofs_flag: bool },

    #[error("Backend digest failed: {0}")]
    BackendDigestFailed(GatewayError),

    #[error("Stale or corrupted file handle: {0}")]
    StaleOrCorrupted(GatewayError),

    #[error("File handle expired: issued at boot {issued}, server booted at {current}")]
    Expired { issued: u32, current: u32 },
}

impl CodecError {
    /// Short stable name, used as a metrics label
    pub fn kind(&self) -> &'static str {
        match self {
            CodecError::Malformed { .. } => "malformed",
            CodecError::ChecksumMismatch { .. } => "checksum_mismatch",
            CodecError::NotARealHandle { .. } => "not_a_real_handle",
            CodecError::BackendDigestFailed(_) => "backend_digest_failed",
            CodecError::StaleOrCorrupted(_) => "stale_or_corrupted",
            CodecError::Expired { .. } => "expired",
        }
    }
}

/// Opaque handle bytes as exchanged with clients
///
/// Zero length means "no handle". Cloning shares the underlying buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct WireHandle(Bytes);

impl WireHandle {
    pub fn empty() -> Self {
        Self(Bytes::new())
    }

    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl AsRef<[u8]> for WireHandle {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Wrapping checksum in 32 bits
///
/// The export id is sign-extended, payload bytes are zero-extended.
pub fn checksum32(export_id: ExportId, opaque: &[u8]) -> u32 {
    CHECKSUM_SAMPLE_OFFSETS
        .iter()
        .map(|&i| opaque.get(i).copied().unwrap_or(0) as u32)
        .fold(export_id.0 as i32 as u32, u32::wrapping_add)
}

/// Wrapping checksum in 64 bits
pub fn checksum64(export_id: ExportId, opaque: &[u8]) -> u64 {
    CHECKSUM_SAMPLE_OFFSETS
        .iter()
        .map(|&i| opaque.get(i).copied().unwrap_or(0) as u64)
        .fold(export_id.0 as i64 as u64, u64::wrapping_add)
}

/// Common view over the per-version layouts
pub trait HandleLayout: Sized {
    const VERSION: ProtocolVersion;
    /// Exact wire size of the layout
    const SIZE: usize;
    /// Capacity of the opaque payload
    const OPAQUE_LEN: usize;

    /// Parse a wire buffer. Fails with `Malformed` unless `bytes.len() == SIZE`.
    fn parse(bytes: &[u8]) -> Result<Self, CodecError>;

    /// Serialize into a zero-initialized buffer of exactly `SIZE` bytes.
    fn to_wire(&self) -> WireHandle;

    fn export_id(&self) -> ExportId;

    fn xattr_pos(&self) -> u8;

    fn opaque(&self) -> &[u8];

    /// Fails with `Malformed` unless `bytes.len() == SIZE`.
    fn check_len(bytes: &[u8]) -> Result<(), CodecError> {
        if bytes.len() != Self::SIZE {
            return Err(CodecError::Malformed {
                version: Self::VERSION,
                len: bytes.len(),
            });
        }
        Ok(())
    }
}

fn copy_opaque<const N: usize>(src: &mut &[u8]) -> [u8; N] {
    let mut opaque = [0u8; N];
    src.copy_to_slice(&mut opaque);
    opaque
}

// ============================================================================
// v2
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandleV2 {
    pub export_id: ExportId,
    pub xattr_pos: u8,
    pub checksum: u32,
    pub opaque: [u8; V2_OPAQUE_LEN],
}

impl FileHandleV2 {
    pub fn new(export_id: ExportId, opaque: [u8; V2_OPAQUE_LEN]) -> Self {
        let mut handle = Self {
            export_id,
            xattr_pos: 0,
            checksum: 0,
            opaque,
        };
        handle.checksum = handle.computed_checksum();
        handle
    }

    /// Checksum over the current field values (never over `self.checksum`)
    pub fn computed_checksum(&self) -> u32 {
        checksum32(self.export_id, &self.opaque)
    }
}

impl HandleLayout for FileHandleV2 {
    const VERSION: ProtocolVersion = ProtocolVersion::V2;
    const SIZE: usize = V2_SIZE;
    const OPAQUE_LEN: usize = V2_OPAQUE_LEN;

    fn parse(bytes: &[u8]) -> Result<Self, CodecError> {
        Self::check_len(bytes)?;
        let mut src = bytes;
        let export_id = ExportId(src.get_i16());
        let xattr_pos = src.get_u8();
        src.advance(1);
        let checksum = src.get_u32();
        let opaque = copy_opaque::<V2_OPAQUE_LEN>(&mut src);
        Ok(Self {
            export_id,
            xattr_pos,
            checksum,
            opaque,
        })
    }

    fn to_wire(&self) -> WireHandle {
        let mut buf = BytesMut::zeroed(V2_SIZE);
        let mut dst = &mut buf[..];
        dst.put_i16(self.export_id.0);
        dst.put_u8(self.xattr_pos);
        dst.put_u8(0);
        dst.put_u32(self.checksum);
        dst.put_slice(&self.opaque);
        WireHandle(buf.freeze())
    }

    fn export_id(&self) -> ExportId {
        self.export_id
    }

    fn xattr_pos(&self) -> u8 {
        self.xattr_pos
    }

    fn opaque(&self) -> &[u8] {
        &self.opaque
    }
}

// ============================================================================
// v3
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandleV3 {
    pub export_id: ExportId,
    pub xattr_pos: u8,
    pub checksum: u64,
    pub opaque: [u8; V3_OPAQUE_LEN],
}

impl FileHandleV3 {
    pub fn new(export_id: ExportId, opaque: [u8; V3_OPAQUE_LEN]) -> Self {
        let mut handle = Self {
            export_id,
            xattr_pos: 0,
            checksum: 0,
            opaque,
        };
        handle.checksum = handle.computed_checksum();
        handle
    }

    pub fn computed_checksum(&self) -> u64 {
        checksum64(self.export_id, &self.opaque)
    }
}

impl HandleLayout for FileHandleV3 {
    const VERSION: ProtocolVersion = ProtocolVersion::V3;
    const SIZE: usize = V3_SIZE;
    const OPAQUE_LEN: usize = V3_OPAQUE_LEN;

    fn parse(bytes: &[u8]) -> Result<Self, CodecError> {
        Self::check_len(bytes)?;
        let mut src = bytes;
        let export_id = ExportId(src.get_i16());
        let xattr_pos = src.get_u8();
        src.advance(1);
        let checksum = src.get_u64();
        src.advance(V3_CHECKSUM_FIELD_LEN - 8);
        let opaque = copy_opaque::<V3_OPAQUE_LEN>(&mut src);
        Ok(Self {
            export_id,
            xattr_pos,
            checksum,
            opaque,
        })
    }

    fn to_wire(&self) -> WireHandle {
        let mut buf = BytesMut::zeroed(V3_SIZE);
        let mut dst = &mut buf[..];
        dst.put_i16(self.export_id.0);
        dst.put_u8(self.xattr_pos);
        dst.put_u8(0);
        dst.put_u64(self.checksum);
        dst.put_bytes(0, V3_CHECKSUM_FIELD_LEN - 8);
        dst.put_slice(&self.opaque);
        WireHandle(buf.freeze())
    }

    fn export_id(&self) -> ExportId {
        self.export_id
    }

    fn xattr_pos(&self) -> u8 {
        self.xattr_pos
    }

    fn opaque(&self) -> &[u8] {
        &self.opaque
    }
}

// ============================================================================
// v4
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandleV4 {
    pub export_id: ExportId,
    pub xattr_pos: u8,
    pub pseudofs_flag: bool,
    pub ds_flag: u8,
    pub pseudofs_id: u16,
    pub refid: u16,
    /// Zero means the handle never expires
    pub server_boot_time: u32,
    pub checksum: u64,
    pub opaque: [u8; V4_OPAQUE_LEN],
}

impl FileHandleV4 {
    /// A real-filesystem handle: no pseudo, data-server or referral markers.
    pub fn new(export_id: ExportId, server_boot_time: u32, opaque: [u8; V4_OPAQUE_LEN]) -> Self {
        Self {
            export_id,
            xattr_pos: 0,
            pseudofs_flag: false,
            ds_flag: 0,
            pseudofs_id: 0,
            refid: 0,
            server_boot_time,
            checksum: 0,
            opaque,
        }
    }

    pub fn is_pseudo(&self) -> bool {
        self.pseudofs_flag
    }

    pub fn is_referral(&self) -> bool {
        self.refid > 0
    }
}

impl HandleLayout for FileHandleV4 {
    const VERSION: ProtocolVersion = ProtocolVersion::V4;
    const SIZE: usize = V4_SIZE;
    const OPAQUE_LEN: usize = V4_OPAQUE_LEN;

    fn parse(bytes: &[u8]) -> Result<Self, CodecError> {
        Self::check_len(bytes)?;
        let mut src = bytes;
        let export_id = ExportId(src.get_i16());
        let xattr_pos = src.get_u8();
        let pseudofs_flag = src.get_u8() != 0;
        let ds_flag = src.get_u8();
        src.advance(1);
        let pseudofs_id = src.get_u16();
        let refid = src.get_u16();
        src.advance(2);
        let server_boot_time = src.get_u32();
        let checksum = src.get_u64();
        let opaque = copy_opaque::<V4_OPAQUE_LEN>(&mut src);
        Ok(Self {
            export_id,
            xattr_pos,
            pseudofs_flag,
            ds_flag,
            pseudofs_id,
            refid,
            server_boot_time,
            checksum,
            opaque,
        })
    }

    fn to_wire(&self) -> WireHandle {
        let mut buf = BytesMut::zeroed(V4_SIZE);
        let mut dst = &mut buf[..];
        dst.put_i16(self.export_id.0);
        dst.put_u8(self.xattr_pos);
        dst.put_u8(u8::from(self.pseudofs_flag));
        dst.put_u8(self.ds_flag);
        dst.put_u8(0);
        dst.put_u16(self.pseudofs_id);
        dst.put_u16(self.refid);
        dst.put_u16(0);
        dst.put_u32(self.server_boot_time);
        dst.put_u64(self.checksum);
        dst.put_slice(&self.opaque);
        WireHandle(buf.freeze())
    }

    fn export_id(&self) -> ExportId {
        self.export_id
    }

    fn xattr_pos(&self) -> u8 {
        self.xattr_pos
    }

    fn opaque(&self) -> &[u8] {
        &self.opaque
    }
}

// ============================================================================
// Tagged variant
// ============================================================================

/// Decoded layout of any supported version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionedHandle {
    V2(FileHandleV2),
    V3(FileHandleV3),
    V4(FileHandleV4),
}

impl VersionedHandle {
    /// Parse `bytes` with the layout of the caller's protocol version.
    pub fn parse(version: ProtocolVersion, bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(match version {
            ProtocolVersion::V2 => VersionedHandle::V2(FileHandleV2::parse(bytes)?),
            ProtocolVersion::V3 => VersionedHandle::V3(FileHandleV3::parse(bytes)?),
            ProtocolVersion::V4 => VersionedHandle::V4(FileHandleV4::parse(bytes)?),
        })
    }

    pub fn version(&self) -> ProtocolVersion {
        match self {
            VersionedHandle::V2(_) => ProtocolVersion::V2,
            VersionedHandle::V3(_) => ProtocolVersion::V3,
            VersionedHandle::V4(_) => ProtocolVersion::V4,
        }
    }

    pub fn export_id(&self) -> ExportId {
        match self {
            VersionedHandle::V2(h) => h.export_id(),
            VersionedHandle::V3(h) => h.export_id(),
            VersionedHandle::V4(h) => h.export_id(),
        }
    }

    pub fn opaque(&self) -> &[u8] {
        match self {
            VersionedHandle::V2(h) => h.opaque(),
            VersionedHandle::V3(h) => h.opaque(),
            VersionedHandle::V4(h) => h.opaque(),
        }
    }

    pub fn to_wire(&self) -> WireHandle {
        match self {
            VersionedHandle::V2(h) => h.to_wire(),
            VersionedHandle::V3(h) => h.to_wire(),
            VersionedHandle::V4(h) => h.to_wire(),
        }
    }
}

/// Exact wire size of a version's layout (also its maximum accepted length)
pub fn layout_size(version: ProtocolVersion) -> usize {
    match version {
        ProtocolVersion::V2 => V2_SIZE,
        ProtocolVersion::V3 => V3_SIZE,
        ProtocolVersion::V4 => V4_SIZE,
    }
}

/// Opaque payload capacity of a version's layout
pub fn opaque_capacity(version: ProtocolVersion) -> usize {
    match version {
        ProtocolVersion::V2 => V2_OPAQUE_LEN,
        ProtocolVersion::V3 => V3_OPAQUE_LEN,
        ProtocolVersion::V4 => V4_OPAQUE_LEN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_opaque<const N: usize>() -> [u8; N] {
        let mut opaque = [0u8; N];
        for (i, b) in opaque.iter_mut().enumerate() {
            *b = (i as u8).wrapping_mul(7).wrapping_add(3);
        }
        opaque
    }

    #[test]
    fn test_layout_sizes() {
        assert_eq!(V2_OPAQUE_LEN, 24);
        assert_eq!(V3_OPAQUE_LEN, 44);
        assert_eq!(V4_OPAQUE_LEN, 64);
        assert_eq!(FileHandleV2::new(ExportId(1), [0; V2_OPAQUE_LEN]).to_wire().len(), 32);
        assert_eq!(FileHandleV3::new(ExportId(1), [0; V3_OPAQUE_LEN]).to_wire().len(), 64);
        assert_eq!(FileHandleV4::new(ExportId(1), 0, [0; V4_OPAQUE_LEN]).to_wire().len(), 88);
    }

    #[test]
    fn test_v2_field_offsets() {
        let handle = FileHandleV2::new(ExportId(0x0102), sample_opaque());
        let wire = handle.to_wire();
        let bytes = wire.as_bytes();

        assert_eq!(&bytes[0..2], &[0x01, 0x02]);
        assert_eq!(bytes[2], 0);
        assert_eq!(bytes[3], 0);
        assert_eq!(&bytes[4..8], &handle.checksum.to_be_bytes());
        assert_eq!(&bytes[8..32], &handle.opaque);
    }

    #[test]
    fn test_v3_checksum_field_tail_is_zero() {
        let handle = FileHandleV3::new(ExportId(9), sample_opaque());
        let wire = handle.to_wire();
        let bytes = wire.as_bytes();

        assert_eq!(&bytes[4..12], &handle.checksum.to_be_bytes());
        assert!(bytes[12..20].iter().all(|&b| b == 0));
        assert_eq!(&bytes[20..64], &handle.opaque);
    }

    #[test]
    fn test_v4_field_offsets() {
        let mut handle = FileHandleV4::new(ExportId(-2), 0xAABBCCDD, sample_opaque());
        handle.pseudofs_flag = true;
        handle.pseudofs_id = 0x0304;
        handle.refid = 0x0506;
        handle.ds_flag = 1;
        handle.xattr_pos = 7;
        let wire = handle.to_wire();
        let bytes = wire.as_bytes();

        assert_eq!(&bytes[0..2], &(-2i16).to_be_bytes());
        assert_eq!(bytes[2], 7);
        assert_eq!(bytes[3], 1);
        assert_eq!(bytes[4], 1);
        assert_eq!(&bytes[6..8], &[0x03, 0x04]);
        assert_eq!(&bytes[8..10], &[0x05, 0x06]);
        assert_eq!(&bytes[12..16], &[0xAA, 0xBB, 0xCC, 0xDD]);
        assert_eq!(&bytes[24..88], &handle.opaque);
    }

    #[test]
    fn test_parse_preserves_all_fields() {
        let mut v4 = FileHandleV4::new(ExportId(12), 77, sample_opaque());
        v4.refid = 3;
        v4.xattr_pos = 1;
        let parsed = FileHandleV4::parse(v4.to_wire().as_bytes()).unwrap();
        assert_eq!(parsed, v4);

        let v2 = FileHandleV2::new(ExportId(-1), sample_opaque());
        assert_eq!(FileHandleV2::parse(v2.to_wire().as_bytes()).unwrap(), v2);
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        for len in [0usize, 1, 31, 33, 64, 88] {
            let bytes = vec![0u8; len];
            let result = FileHandleV2::parse(&bytes);
            assert!(
                matches!(result, Err(CodecError::Malformed { version: ProtocolVersion::V2, len: l }) if l == len),
                "length {} accepted",
                len
            );
        }
        assert!(matches!(
            FileHandleV4::parse(&[0u8; 87]),
            Err(CodecError::Malformed { .. })
        ));
        assert!(matches!(
            VersionedHandle::parse(ProtocolVersion::V3, &[0u8; 88]),
            Err(CodecError::Malformed { .. })
        ));
    }

    #[test]
    fn test_checksum_formula() {
        let mut opaque = [0u8; V2_OPAQUE_LEN];
        opaque[1] = 10;
        opaque[3] = 20;
        opaque[5] = 30;
        opaque[0] = 200;
        opaque[2] = 200;
        assert_eq!(checksum32(ExportId(5), &opaque), 65);
        assert_eq!(checksum64(ExportId(5), &opaque), 65);
    }

    #[test]
    fn test_checksum_sign_extends_export_id() {
        let opaque = [0u8; V3_OPAQUE_LEN];
        assert_eq!(checksum32(ExportId(-1), &opaque), u32::MAX);
        assert_eq!(checksum64(ExportId(-1), &opaque), u64::MAX);

        let mut opaque = [0u8; V3_OPAQUE_LEN];
        opaque[1] = 1;
        assert_eq!(checksum64(ExportId(-1), &opaque), 0);
    }

    #[test]
    fn test_checksum_detects_sampled_offsets() {
        let base = sample_opaque::<V3_OPAQUE_LEN>();
        let reference = checksum64(ExportId(4), &base);

        for offset in [1usize, 3, 5] {
            for bit in 0..8 {
                let mut flipped = base;
                flipped[offset] ^= 1 << bit;
                assert_ne!(checksum64(ExportId(4), &flipped), reference);
            }
        }
        for bit in 0..16 {
            let export_id = ExportId(4 ^ (1i16 << bit));
            assert_ne!(checksum64(export_id, &base), reference);
        }
    }

    #[test]
    fn test_checksum_misses_unsampled_offsets() {
        // Only offsets 1, 3 and 5 feed the checksum; this is the wire format.
        let base = sample_opaque::<V2_OPAQUE_LEN>();
        let reference = checksum32(ExportId(4), &base);
        for offset in [0usize, 2, 4, 6, 7, 23] {
            let mut flipped = base;
            flipped[offset] ^= 0xFF;
            assert_eq!(checksum32(ExportId(4), &flipped), reference);
        }
    }

    #[test]
    fn test_versioned_handle_dispatch() {
        let v3 = FileHandleV3::new(ExportId(3), sample_opaque());
        let parsed = VersionedHandle::parse(ProtocolVersion::V3, v3.to_wire().as_bytes()).unwrap();
        assert_eq!(parsed.version(), ProtocolVersion::V3);
        assert_eq!(parsed.export_id(), ExportId(3));
        assert_eq!(parsed.opaque(), &v3.opaque[..]);
        assert_eq!(parsed.to_wire(), v3.to_wire());
    }

    #[test]
    fn test_error_kinds() {
        let err = CodecError::Malformed {
            version: ProtocolVersion::V4,
            len: 3,
        };
        assert_eq!(err.kind(), "malformed");
        assert_eq!(
            CodecError::StaleOrCorrupted(GatewayError::NotFound).kind(),
            "stale_or_corrupted"
        );
    }
}
