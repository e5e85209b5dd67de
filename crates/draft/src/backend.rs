//! Persistence contract consumed by the controller

use crate::error::BackendError;
use async_trait::async_trait;
use keepsake_core::{AttachmentData, AttachmentRef, Entity, EntityId, PersistField};
use std::collections::BTreeMap;

/// Abstract persistence backend for one journal
///
/// `persist` receives only the changed fields (a partial payload) and must be
/// idempotent under retry with an identical payload. Attachment binaries
/// never appear in the persist payload: the controller uploads staged
/// replacements through `upload_attachment` first and sends the resolved
/// references.
#[async_trait]
pub trait PersistBackend: Send + Sync {
    /// Apply a partial field update, returning the confirmed entity
    async fn persist(
        &self,
        id: EntityId,
        fields: BTreeMap<String, PersistField>,
    ) -> Result<Entity, BackendError>;

    /// Store an attachment binary, returning a stable reference
    async fn upload_attachment(&self, data: AttachmentData) -> Result<AttachmentRef, BackendError>;
}
