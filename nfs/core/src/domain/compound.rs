// Copyright (c) 2026 fhgate contributors
// SPDX-License-Identifier: AGPL-3.0
//! Compound request handle context
//!
//! The five file handle slots shared by the operations of one compound call.
//! A context is created empty at the start of the call, mutated by each
//! operation in order and dropped at the end. It is owned by the worker thread
//! running the call and is never shared, so it carries no locking.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Request-scoped handle state

use crate::domain::file_handle::{CodecError, WireHandle};
use crate::domain::gateway::ObjectHandle;
use thiserror::Error;

/// Compound operation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompoundError {
    #[error("No file handle in the required slot")]
    NoFileHandle,

    #[error("Failed to allocate {size} bytes for a file handle")]
    AllocationFailure { size: usize },

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Type of the object the current handle designates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileKind {
    #[default]
    Unknown,
    /// Directory of the pseudo namespace, no backing object
    PseudoDirectory,
    Directory,
    Regular,
    Symlink,
}

/// One handle slot: empty, or wire bytes plus the object they decode to
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HandleSlot {
    pub handle: WireHandle,
    /// `None` for pseudo-namespace handles, which have no backing object
    pub object: Option<ObjectHandle>,
}

impl HandleSlot {
    pub fn new(handle: WireHandle, object: Option<ObjectHandle>) -> Self {
        Self { handle, object }
    }

    pub fn is_empty(&self) -> bool {
        self.handle.is_empty()
    }
}

/// Copy a handle into a freshly allocated buffer
///
/// Allocation failure is reported instead of aborting the process.
pub fn copy_handle(handle: &WireHandle) -> Result<WireHandle, CompoundError> {
    let size = handle.len();
    let mut buf = Vec::new();
    buf.try_reserve_exact(size)
        .map_err(|_| CompoundError::AllocationFailure { size })?;
    buf.extend_from_slice(handle.as_bytes());
    Ok(WireHandle::from_bytes(buf))
}

/// Handle state of one compound call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompoundHandleContext {
    current: HandleSlot,
    current_kind: FileKind,
    saved: HandleSlot,
    saved_kind: FileKind,
    root: HandleSlot,
    public: HandleSlot,
    mounted_on: HandleSlot,
}

impl CompoundHandleContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &HandleSlot {
        &self.current
    }

    pub fn current_kind(&self) -> FileKind {
        self.current_kind
    }

    /// Backing object of the current handle, if any
    pub fn current_object(&self) -> Option<&ObjectHandle> {
        self.current.object.as_ref()
    }

    pub fn saved(&self) -> &HandleSlot {
        &self.saved
    }

    pub fn root(&self) -> &HandleSlot {
        &self.root
    }

    pub fn public(&self) -> &HandleSlot {
        &self.public
    }

    pub fn mounted_on(&self) -> &HandleSlot {
        &self.mounted_on
    }

    pub fn set_current(&mut self, slot: HandleSlot, kind: FileKind) {
        self.current = slot;
        self.current_kind = kind;
    }

    pub fn set_saved(&mut self, slot: HandleSlot) {
        self.saved = slot;
    }

    pub fn set_root(&mut self, slot: HandleSlot) {
        self.root = slot;
    }

    pub fn set_public(&mut self, slot: HandleSlot) {
        self.public = slot;
    }

    pub fn set_mounted_on(&mut self, slot: HandleSlot) {
        self.mounted_on = slot;
    }

    /// The current slot, or `NoFileHandle` when it is empty
    pub fn require_current(&self) -> Result<&HandleSlot, CompoundError> {
        if self.current.is_empty() {
            return Err(CompoundError::NoFileHandle);
        }
        Ok(&self.current)
    }

    /// Copy `current` into `saved`
    pub fn save_current(&mut self) -> Result<(), CompoundError> {
        let current = self.require_current()?;
        let slot = HandleSlot::new(copy_handle(&current.handle)?, current.object.clone());
        self.saved = slot;
        self.saved_kind = self.current_kind;
        Ok(())
    }

    /// Copy `saved` back into `current`
    pub fn restore_saved(&mut self) -> Result<(), CompoundError> {
        if self.saved.is_empty() {
            return Err(CompoundError::NoFileHandle);
        }
        let slot = HandleSlot::new(copy_handle(&self.saved.handle)?, self.saved.object.clone());
        self.current = slot;
        self.current_kind = self.saved_kind;
        Ok(())
    }
}
