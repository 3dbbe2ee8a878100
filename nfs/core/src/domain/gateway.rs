// Copyright (c) 2026 fhgate contributors
// SPDX-License-Identifier: AGPL-3.0

//! Backend Handle Gateway - Anti-Corruption Layer for storage backends
//!
//! Each storage backend knows how to turn one of its internal object references
//! into an opaque byte blob (digest) and back (expand). The handle codec only
//! ever sees those bytes; it never interprets them.
//!
//! Implementations may perform backing-store I/O and block the calling thread.
//! The codec treats every call as a plain blocking call and never retries it.

use crate::domain::export::ExportContext;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// NFS protocol version a handle is built for.
///
/// Each version has its own incompatible wire layout and its own opaque
/// payload capacity, so gateways receive it on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtocolVersion {
    V2,
    V3,
    V4,
}

impl ProtocolVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolVersion::V2 => "v2",
            ProtocolVersion::V3 => "v3",
            ProtocolVersion::V4 => "v4",
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProtocolVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v2" | "2" => Ok(ProtocolVersion::V2),
            "v3" | "3" => Ok(ProtocolVersion::V3),
            "v4" | "4" => Ok(ProtocolVersion::V4),
            other => Err(format!("unknown protocol version '{}'", other)),
        }
    }
}

/// Backend object reference
///
/// Internal to the server; the structure is backend-specific. This is what a
/// successful decode yields and what encode consumes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ObjectHandle(pub Vec<u8>);

impl ObjectHandle {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Gateway errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Object not found in backend")]
    NotFound,

    #[error("Opaque payload rejected by backend: {0}")]
    InvalidPayload(String),

    #[error("Digest of {actual} bytes exceeds {version} opaque capacity of {capacity} bytes")]
    PayloadTooLarge {
        version: ProtocolVersion,
        actual: usize,
        capacity: usize,
    },

    #[error("No export registered with id {0}")]
    UnknownExport(i16),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Backend handle gateway trait
///
/// Per-export capability. `digest` must return at most the opaque capacity of
/// `version`; the codec zero-pads shorter digests, so `expand` receives the
/// full fixed-size opaque field and must tolerate trailing zero bytes.
pub trait HandleGateway: Send + Sync {
    /// Convert an object reference into opaque handle bytes.
    fn digest(
        &self,
        export: &ExportContext,
        version: ProtocolVersion,
        object: &ObjectHandle,
    ) -> Result<Vec<u8>, GatewayError>;

    /// Convert opaque handle bytes back into an object reference.
    fn expand(
        &self,
        export: &ExportContext,
        version: ProtocolVersion,
        opaque: &[u8],
    ) -> Result<ObjectHandle, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_version_parse() {
        assert_eq!("v4".parse::<ProtocolVersion>().unwrap(), ProtocolVersion::V4);
        assert_eq!("3".parse::<ProtocolVersion>().unwrap(), ProtocolVersion::V3);
        assert_eq!("V2".parse::<ProtocolVersion>().unwrap(), ProtocolVersion::V2);
        assert!("v5".parse::<ProtocolVersion>().is_err());
    }

    #[test]
    fn test_protocol_version_display() {
        assert_eq!(ProtocolVersion::V3.to_string(), "v3");
    }
}
