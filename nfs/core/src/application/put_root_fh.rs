// Copyright (c) 2026 fhgate contributors
// SPDX-License-Identifier: AGPL-3.0
//! PUTROOTFH
//!
//! Seeds a compound call with the pseudo filesystem root handle.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Root handle initialization of the compound context

use crate::domain::compound::{copy_handle, CompoundError, CompoundHandleContext, FileKind, HandleSlot};
use crate::domain::pseudofs::{PseudoFs, PseudoMarker};
use crate::infrastructure::nfs::file_handle::HandleCodec;
use tracing::{debug, warn};

/// Run PUTROOTFH against `ctx`.
///
/// `root` and `current` always receive the root handle; `mounted_on` and
/// `public` only when they are still empty. The current object becomes the
/// pseudo root directory, which has no backing object.
///
/// Every copy is allocated before the first slot is written, so on error the
/// context is left exactly as it was.
pub fn put_root_fh(
    codec: &HandleCodec,
    pseudofs: &PseudoFs,
    ctx: &mut CompoundHandleContext,
) -> Result<(), CompoundError> {
    let root = pseudofs.root();
    let handle = codec
        .encode_v4(pseudofs.export(), &root.object_handle(), Some(PseudoMarker::from(root)))
        .map_err(|e| {
            warn!(export_id = %pseudofs.export_id(), error = %e, "Failed to build pseudo root file handle");
            CompoundError::from(e)
        })?;

    let root_copy = copy_handle(&handle)?;
    let current_copy = copy_handle(&handle)?;
    let mounted_on_copy = if ctx.mounted_on().is_empty() {
        Some(copy_handle(&handle)?)
    } else {
        None
    };
    let public_copy = if ctx.public().is_empty() {
        Some(copy_handle(&handle)?)
    } else {
        None
    };

    ctx.set_root(HandleSlot::new(root_copy, None));
    ctx.set_current(HandleSlot::new(current_copy, None), FileKind::PseudoDirectory);
    if let Some(copy) = mounted_on_copy {
        ctx.set_mounted_on(HandleSlot::new(copy, None));
    }
    if let Some(copy) = public_copy {
        ctx.set_public(HandleSlot::new(copy, None));
    }

    debug!(
        export_id = %pseudofs.export_id(),
        root = %root.name,
        len = handle.len(),
        "PUTROOTFH set current file handle to pseudo root"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::export::{ExportContext, ExportId};
    use crate::domain::file_handle::{
        CodecError, FileHandleV4, HandleLayout, WireHandle, V4_OPAQUE_LEN, V4_SIZE,
    };
    use crate::domain::gateway::{GatewayError, HandleGateway, ObjectHandle, ProtocolVersion};
    use crate::domain::server_state::{HandlePolicy, ServerBootTime, ServerState};
    use crate::infrastructure::nfs::predicates;
    use std::sync::Arc;

    fn codec() -> HandleCodec {
        HandleCodec::new(ServerState::new(ServerBootTime(42), HandlePolicy::default()))
    }

    /// Digest either fails outright or returns `len` bytes
    enum BrokenGateway {
        Offline,
        Oversized(usize),
    }

    impl HandleGateway for BrokenGateway {
        fn digest(
            &self,
            _export: &ExportContext,
            _version: ProtocolVersion,
            _object: &ObjectHandle,
        ) -> Result<Vec<u8>, GatewayError> {
            match self {
                BrokenGateway::Offline => Err(GatewayError::Backend("backend offline".to_string())),
                BrokenGateway::Oversized(len) => Ok(vec![0xAA; *len]),
            }
        }

        fn expand(
            &self,
            _export: &ExportContext,
            _version: ProtocolVersion,
            _opaque: &[u8],
        ) -> Result<ObjectHandle, GatewayError> {
            Err(GatewayError::NotFound)
        }
    }

    fn populated_context() -> CompoundHandleContext {
        let mut ctx = CompoundHandleContext::new();
        ctx.set_current(
            HandleSlot::new(WireHandle::from_bytes(vec![3; 88]), Some(ObjectHandle::new(vec![3]))),
            FileKind::Regular,
        );
        ctx.set_public(HandleSlot::new(WireHandle::from_bytes(vec![4; 88]), None));
        ctx
    }

    #[test]
    fn test_put_root_fh_on_empty_context() {
        let pseudofs = PseudoFs::new(ExportId(0), "/");
        let mut ctx = CompoundHandleContext::new();

        put_root_fh(&codec(), &pseudofs, &mut ctx).unwrap();

        let current = ctx.current().handle.clone();
        assert_eq!(current.len(), V4_SIZE);
        assert_eq!(ctx.root().handle, current);
        assert_eq!(ctx.public().handle, current);
        assert_eq!(ctx.mounted_on().handle, current);
        assert_eq!(ctx.current_kind(), FileKind::PseudoDirectory);
        assert!(ctx.current_object().is_none());
        assert!(ctx.saved().is_empty());
        assert!(predicates::is_pseudo(current.as_bytes()));
    }

    #[test]
    fn test_put_root_fh_keeps_existing_public_and_mounted_on() {
        let pseudofs = PseudoFs::new(ExportId(0), "/");
        let mut ctx = CompoundHandleContext::new();
        let preset = WireHandle::from_bytes(vec![7u8; 16]);
        ctx.set_public(HandleSlot::new(preset.clone(), None));
        ctx.set_mounted_on(HandleSlot::new(preset.clone(), None));

        put_root_fh(&codec(), &pseudofs, &mut ctx).unwrap();

        assert_eq!(ctx.public().handle, preset);
        assert_eq!(ctx.mounted_on().handle, preset);
        assert_eq!(ctx.root().handle, ctx.current().handle);
        assert_ne!(ctx.current().handle, preset);
    }

    #[test]
    fn test_put_root_fh_replaces_current() {
        let pseudofs = PseudoFs::new(ExportId(0), "/");
        let mut ctx = CompoundHandleContext::new();
        ctx.set_current(
            HandleSlot::new(
                WireHandle::from_bytes(vec![1; 88]),
                Some(crate::domain::gateway::ObjectHandle::new(vec![1])),
            ),
            FileKind::Regular,
        );

        put_root_fh(&codec(), &pseudofs, &mut ctx).unwrap();

        assert_eq!(ctx.current_kind(), FileKind::PseudoDirectory);
        assert!(ctx.current_object().is_none());
        assert_eq!(ctx.current().handle, ctx.root().handle);
    }

    #[test]
    fn test_root_handle_layout() {
        let pseudofs = PseudoFs::new(ExportId(3), "/");
        let mut ctx = CompoundHandleContext::new();
        put_root_fh(&codec(), &pseudofs, &mut ctx).unwrap();

        let parsed = FileHandleV4::parse(ctx.root().handle.as_bytes()).unwrap();
        assert_eq!(parsed.export_id, ExportId(3));
        assert!(parsed.pseudofs_flag);
        assert_eq!(parsed.pseudofs_id, PseudoFs::ROOT_ID);
        assert_eq!(parsed.server_boot_time, 0);
    }

    #[test]
    fn test_put_root_fh_digest_failure_leaves_context_untouched() {
        let pseudofs = PseudoFs::with_gateway(ExportId(0), "/", Arc::new(BrokenGateway::Offline));
        let mut ctx = populated_context();
        let before = ctx.clone();

        let err = put_root_fh(&codec(), &pseudofs, &mut ctx).unwrap_err();

        assert!(matches!(
            err,
            CompoundError::Codec(CodecError::BackendDigestFailed(GatewayError::Backend(_)))
        ));
        assert_eq!(ctx, before);
    }

    #[test]
    fn test_put_root_fh_oversized_digest_leaves_context_untouched() {
        let gateway = BrokenGateway::Oversized(V4_OPAQUE_LEN + 1);
        let pseudofs = PseudoFs::with_gateway(ExportId(0), "/", Arc::new(gateway));
        let mut ctx = CompoundHandleContext::new();
        let before = ctx.clone();

        let err = put_root_fh(&codec(), &pseudofs, &mut ctx).unwrap_err();

        assert!(matches!(
            err,
            CompoundError::Codec(CodecError::BackendDigestFailed(
                GatewayError::PayloadTooLarge { .. }
            ))
        ));
        assert_eq!(ctx, before);
        assert!(ctx.root().is_empty());
    }
}
