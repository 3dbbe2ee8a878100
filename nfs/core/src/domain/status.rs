// Copyright (c) 2026 fhgate contributors
// SPDX-License-Identifier: AGPL-3.0

//! Protocol status mapping
//!
//! Every handle error ends up as a status code returned to the client. Nothing
//! is retried on the server side; the client decides whether to re-resolve.

use crate::domain::compound::CompoundError;
use crate::domain::file_handle::CodecError;
use nfsserve::nfs::nfsstat3;

/// NFSv4 status codes produced by the handle subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
#[allow(non_camel_case_types)]
pub enum Nfs4Status {
    NFS4_OK = 0,
    NFS4ERR_STALE = 70,
    NFS4ERR_BADHANDLE = 10001,
    NFS4ERR_SERVERFAULT = 10006,
    NFS4ERR_FHEXPIRED = 10014,
    NFS4ERR_RESOURCE = 10018,
    NFS4ERR_NOFILEHANDLE = 10020,
}

impl Nfs4Status {
    pub fn code(&self) -> u32 {
        *self as u32
    }
}

impl CodecError {
    pub fn nfs4_status(&self) -> Nfs4Status {
        match self {
            CodecError::Malformed { .. }
            | CodecError::ChecksumMismatch { .. }
            | CodecError::NotARealHandle { .. } => Nfs4Status::NFS4ERR_BADHANDLE,
            CodecError::StaleOrCorrupted(_) => Nfs4Status::NFS4ERR_STALE,
            CodecError::BackendDigestFailed(_) => Nfs4Status::NFS4ERR_SERVERFAULT,
            CodecError::Expired { .. } => Nfs4Status::NFS4ERR_FHEXPIRED,
        }
    }

    /// v2 and v3 share the v3 status space; there is no expired status there.
    pub fn nfs3_status(&self) -> nfsstat3 {
        match self {
            CodecError::Malformed { .. }
            | CodecError::ChecksumMismatch { .. }
            | CodecError::NotARealHandle { .. } => nfsstat3::NFS3ERR_BADHANDLE,
            CodecError::StaleOrCorrupted(_) | CodecError::Expired { .. } => nfsstat3::NFS3ERR_STALE,
            CodecError::BackendDigestFailed(_) => nfsstat3::NFS3ERR_SERVERFAULT,
        }
    }
}

impl CompoundError {
    pub fn nfs4_status(&self) -> Nfs4Status {
        match self {
            CompoundError::NoFileHandle => Nfs4Status::NFS4ERR_NOFILEHANDLE,
            CompoundError::AllocationFailure { .. } => Nfs4Status::NFS4ERR_RESOURCE,
            CompoundError::Codec(e) => e.nfs4_status(),
        }
    }

    pub fn nfs3_status(&self) -> nfsstat3 {
        match self {
            CompoundError::NoFileHandle => nfsstat3::NFS3ERR_BADHANDLE,
            CompoundError::AllocationFailure { .. } => nfsstat3::NFS3ERR_SERVERFAULT,
            CompoundError::Codec(e) => e.nfs3_status(),
        }
    }
}
