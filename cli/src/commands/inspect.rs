// Copyright (c) 2026 fhgate contributors
// SPDX-License-Identifier: AGPL-3.0

//! Raw handle inspection
//!
//! Runs every predicate on a hex-encoded handle and dumps its layout. Nothing
//! here calls a backend gateway, so the opaque payload is shown but never
//! resolved.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use fhgate_core::domain::export::ExportId;
use fhgate_core::domain::file_handle::{CodecError, VersionedHandle, WireHandle};
use fhgate_core::domain::gateway::ProtocolVersion;
use fhgate_core::domain::server_state::{HandlePolicy, ServerBootTime};
use fhgate_core::infrastructure::nfs::{predicates, HandleDump};

#[derive(Args)]
pub struct InspectArgs {
    /// Protocol version whose layout applies (v2, v3, v4)
    #[arg(short, long, default_value = "v4")]
    pub proto: ProtocolVersion,

    /// Current server boot time; enables the v4 expiry check
    #[arg(long, value_name = "SECS")]
    pub boot_time: Option<u32>,

    /// Handle bytes as hex (an optional 0x prefix and whitespace are ignored)
    #[arg(value_name = "HEX")]
    pub handle: String,
}

/// Everything the predicates and the layout parser say about one handle
#[derive(Debug)]
pub struct InspectReport {
    pub version: ProtocolVersion,
    pub handle: WireHandle,
    pub export_id: Result<ExportId, CodecError>,
    pub structurally_invalid: bool,
    pub xattr: bool,
    /// v4 only
    pub pseudo: Option<bool>,
    /// v4 only
    pub referral: Option<bool>,
    /// v4 with a boot time only
    pub expiry: Option<Result<(), CodecError>>,
    pub layout: Result<VersionedHandle, CodecError>,
    /// v2/v3 with a parseable layout only
    pub checksum_valid: Option<bool>,
}

pub fn parse_hex(input: &str) -> Result<Vec<u8>> {
    let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
        .unwrap_or(&cleaned);
    hex::decode(digits).with_context(|| format!("Invalid hex handle: '{}'", input))
}

pub fn inspect(version: ProtocolVersion, bytes: &[u8], boot_time: Option<u32>) -> InspectReport {
    let is_v4 = version == ProtocolVersion::V4;
    let layout = VersionedHandle::parse(version, bytes);
    let checksum_valid = match &layout {
        Ok(VersionedHandle::V2(h)) => Some(h.checksum == h.computed_checksum()),
        Ok(VersionedHandle::V3(h)) => Some(h.checksum == h.computed_checksum()),
        _ => None,
    };
    let expiry = match boot_time {
        Some(secs) if is_v4 => Some(predicates::is_expired(
            bytes,
            ServerBootTime(secs),
            HandlePolicy {
                expire_on_reboot: true,
                report_expired_as_error: true,
            },
        )),
        _ => None,
    };

    InspectReport {
        version,
        handle: WireHandle::from_bytes(bytes.to_vec()),
        export_id: predicates::extract_export_id(version, bytes),
        structurally_invalid: predicates::is_structurally_invalid(version, Some(bytes)),
        xattr: predicates::is_xattr(bytes),
        pseudo: is_v4.then(|| predicates::is_pseudo(bytes)),
        referral: is_v4.then(|| predicates::is_referral(bytes)),
        expiry,
        layout,
        checksum_valid,
    }
}

pub fn handle_command(args: InspectArgs) -> Result<()> {
    let bytes = parse_hex(&args.handle)?;
    let report = inspect(args.proto, &bytes, args.boot_time);
    print_report(&report);
    Ok(())
}

fn yes_no(value: bool) -> colored::ColoredString {
    if value {
        "yes".yellow()
    } else {
        "no".normal()
    }
}

fn print_report(report: &InspectReport) {
    println!("{} {}", "Handle:".bold(), report.handle);
    println!("  Protocol: {}", report.version);
    if predicates::is_empty(report.handle.as_bytes()) {
        println!("  {}", "empty handle".yellow());
    }
    match &report.export_id {
        Ok(id) => println!("  Export id (unchecked): {}", id),
        Err(e) => println!("  Export id: {}", e.to_string().red()),
    }
    println!("  Oversized: {}", yes_no(report.structurally_invalid));
    println!("  Extended attribute: {}", yes_no(report.xattr));
    if let Some(pseudo) = report.pseudo {
        println!("  Pseudo filesystem: {}", yes_no(pseudo));
    }
    if let Some(referral) = report.referral {
        println!("  Referral: {}", yes_no(referral));
    }
    match &report.expiry {
        Some(Ok(())) => println!("  Expiry: {}", "current boot".green()),
        Some(Err(e)) => println!("  Expiry: {}", e.to_string().red()),
        None => {}
    }
    println!();

    println!("{}", "Layout:".bold());
    match &report.layout {
        Ok(layout) => {
            println!("  {}", HandleDump(layout));
            match report.checksum_valid {
                Some(true) => println!("  Checksum: {}", "valid".green()),
                Some(false) => println!("  Checksum: {}", "MISMATCH".red()),
                None => {}
            }
        }
        Err(e) => println!(
            "  {} (NFSv4 status {:?})",
            e.to_string().red(),
            e.nfs4_status()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhgate_core::domain::file_handle::{FileHandleV3, FileHandleV4, HandleLayout};

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("0x00 2a FF").unwrap(), vec![0x00, 0x2A, 0xFF]);
        assert_eq!(parse_hex("").unwrap(), Vec::<u8>::new());
        assert!(parse_hex("abc").is_err());
        assert!(parse_hex("zz").is_err());
    }

    #[test]
    fn test_inspect_v3_handle() {
        let handle = FileHandleV3::new(ExportId(4), [0x11; 44]).to_wire();
        let report = inspect(ProtocolVersion::V3, handle.as_bytes(), None);

        assert_eq!(report.export_id.unwrap(), ExportId(4));
        assert!(!report.structurally_invalid);
        assert!(report.pseudo.is_none());
        assert!(report.expiry.is_none());
        assert_eq!(report.checksum_valid, Some(true));
        assert!(report.layout.is_ok());
    }

    #[test]
    fn test_inspect_corrupted_v3_checksum() {
        let mut bytes = FileHandleV3::new(ExportId(4), [0x11; 44]).to_wire().as_bytes().to_vec();
        bytes[21] ^= 0xFF;
        let report = inspect(ProtocolVersion::V3, &bytes, None);
        assert_eq!(report.checksum_valid, Some(false));
    }

    #[test]
    fn test_inspect_v4_expiry() {
        let mut v4 = FileHandleV4::new(ExportId(1), 500, [0; 64]);
        v4.pseudofs_flag = true;
        let wire = v4.to_wire();

        let report = inspect(ProtocolVersion::V4, wire.as_bytes(), Some(600));
        assert_eq!(report.pseudo, Some(true));
        assert_eq!(report.referral, Some(false));
        assert!(matches!(
            report.expiry,
            Some(Err(CodecError::Expired { issued: 500, current: 600 }))
        ));

        let report = inspect(ProtocolVersion::V4, wire.as_bytes(), Some(500));
        assert!(matches!(report.expiry, Some(Ok(()))));
    }

    #[test]
    fn test_inspect_garbage() {
        let report = inspect(ProtocolVersion::V2, &[0xFF; 40], None);
        assert!(report.structurally_invalid);
        assert_eq!(report.export_id.unwrap(), ExportId(-1));
        assert!(matches!(report.layout, Err(CodecError::Malformed { len: 40, .. })));
        assert!(report.checksum_valid.is_none());
    }
}
