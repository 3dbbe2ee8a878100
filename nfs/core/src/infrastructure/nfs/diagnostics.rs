// Copyright (c) 2026 fhgate contributors
// SPDX-License-Identifier: AGPL-3.0
//! File handle diagnostics
//!
//! Human-readable renderings for logs and the `fhgate` CLI. Output format is
//! for people, not for parsing.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Debug rendering of handles and compound contexts

use crate::domain::compound::{CompoundHandleContext, HandleSlot};
use crate::domain::file_handle::{VersionedHandle, WireHandle};
use std::fmt;

impl fmt::Display for WireHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "len={} {}", self.len(), hex::encode_upper(self.as_bytes()))
    }
}

/// Field-by-field rendering of a parsed layout
pub struct HandleDump<'a>(pub &'a VersionedHandle);

impl fmt::Display for HandleDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            VersionedHandle::V2(h) => write!(
                f,
                "nfs2 export_id={} xattr_pos={} checksum={:#010x} opaque={}",
                h.export_id,
                h.xattr_pos,
                h.checksum,
                hex::encode_upper(h.opaque)
            ),
            VersionedHandle::V3(h) => write!(
                f,
                "nfs3 export_id={} xattr_pos={} checksum={:#018x} opaque={}",
                h.export_id,
                h.xattr_pos,
                h.checksum,
                hex::encode_upper(h.opaque)
            ),
            VersionedHandle::V4(h) => write!(
                f,
                "nfs4 export_id={} xattr_pos={} pseudofs_flag={} ds_flag={} pseudofs_id={} \
                 refid={} server_boot_time={} checksum={:#018x} opaque={}",
                h.export_id,
                h.xattr_pos,
                h.pseudofs_flag,
                h.ds_flag,
                h.pseudofs_id,
                h.refid,
                h.server_boot_time,
                h.checksum,
                hex::encode_upper(h.opaque)
            ),
        }
    }
}

/// Slot-per-line rendering of a compound context
pub struct CompoundDump<'a>(pub &'a CompoundHandleContext);

fn write_slot(f: &mut fmt::Formatter<'_>, name: &str, slot: &HandleSlot) -> fmt::Result {
    if slot.is_empty() {
        writeln!(f, "{name:<11}<empty>")
    } else {
        writeln!(f, "{name:<11}{}", slot.handle)
    }
}

impl fmt::Display for CompoundDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ctx = self.0;
        write_slot(f, "current", ctx.current())?;
        writeln!(f, "{:<11}{:?}", "kind", ctx.current_kind())?;
        write_slot(f, "saved", ctx.saved())?;
        write_slot(f, "root", ctx.root())?;
        write_slot(f, "public", ctx.public())?;
        write_slot(f, "mounted_on", ctx.mounted_on())
    }
}

/// Render all five slots of a compound context, one per line
pub fn describe_compound(ctx: &CompoundHandleContext) -> String {
    CompoundDump(ctx).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::compound::FileKind;
    use crate::domain::export::ExportId;
    use crate::domain::file_handle::{FileHandleV2, FileHandleV4, V2_OPAQUE_LEN, V4_OPAQUE_LEN};

    #[test]
    fn test_wire_handle_display() {
        let handle = WireHandle::from_bytes(vec![0x00, 0x2A, 0xFF]);
        assert_eq!(handle.to_string(), "len=3 002AFF");
        assert_eq!(WireHandle::empty().to_string(), "len=0 ");
    }

    #[test]
    fn test_handle_dump_v2() {
        let handle = VersionedHandle::V2(FileHandleV2::new(ExportId(1), [0; V2_OPAQUE_LEN]));
        let dump = HandleDump(&handle).to_string();
        assert!(dump.starts_with("nfs2 export_id=1 xattr_pos=0 checksum=0x00000001"));
    }

    #[test]
    fn test_handle_dump_v4() {
        let mut v4 = FileHandleV4::new(ExportId(-2), 99, [0xAB; V4_OPAQUE_LEN]);
        v4.pseudofs_flag = true;
        let dump = HandleDump(&VersionedHandle::V4(v4)).to_string();
        assert!(dump.contains("export_id=-2"));
        assert!(dump.contains("pseudofs_flag=true"));
        assert!(dump.contains("server_boot_time=99"));
        assert!(dump.ends_with(&"AB".repeat(V4_OPAQUE_LEN)));
    }

    #[test]
    fn test_describe_compound() {
        let mut ctx = CompoundHandleContext::new();
        ctx.set_current(
            HandleSlot::new(WireHandle::from_bytes(vec![0xCA, 0xFE]), None),
            FileKind::PseudoDirectory,
        );
        let text = describe_compound(&ctx);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "current    len=2 CAFE");
        assert_eq!(lines[1], "kind       PseudoDirectory");
        assert_eq!(lines[2], "saved      <empty>");
        assert_eq!(lines[5], "mounted_on <empty>");
    }

    #[test]
    fn test_compound_dump_display() {
        let mut ctx = CompoundHandleContext::new();
        ctx.set_saved(HandleSlot::new(WireHandle::from_bytes(vec![0x01]), None));
        let dump = CompoundDump(&ctx);

        assert_eq!(format!("{dump}"), describe_compound(&ctx));
        let text = dump.to_string();
        assert!(text.starts_with("current    <empty>\nkind       "));
        assert!(text.contains("saved      len=1 01\n"));
        assert!(text.ends_with("mounted_on <empty>\n"));
    }
}
