//! In-memory store for tests and scratch sessions

use crate::apply_fields;
use async_trait::async_trait;
use dashmap::DashMap;
use keepsake_core::{AttachmentData, AttachmentRef, Entity, EntityId, PersistField};
use keepsake_draft::{BackendError, PersistBackend};
use std::collections::BTreeMap;
use ulid::Ulid;

/// Concurrent-map-backed store with the same surface as `JournalStore`
#[derive(Default)]
pub struct MemoryStore {
    entities: DashMap<EntityId, Entity>,
    attachments: DashMap<Ulid, AttachmentData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, entity: &Entity) {
        self.entities.insert(entity.id, entity.clone());
    }

    pub fn get(&self, id: EntityId) -> Option<Entity> {
        self.entities.get(&id).map(|e| e.value().clone())
    }

    pub fn list(&self) -> Vec<Entity> {
        let mut entities: Vec<_> = self.entities.iter().map(|e| e.value().clone()).collect();
        entities.sort_by_key(|e| e.id);
        entities
    }

    pub fn count(&self) -> usize {
        self.entities.len()
    }
}

#[async_trait]
impl PersistBackend for MemoryStore {
    async fn persist(
        &self,
        id: EntityId,
        fields: BTreeMap<String, PersistField>,
    ) -> Result<Entity, BackendError> {
        let mut entry = self
            .entities
            .get_mut(&id)
            .ok_or_else(|| BackendError::UnknownEntity(id.to_string()))?;
        apply_fields(entry.value_mut(), fields);
        Ok(entry.value().clone())
    }

    async fn upload_attachment(&self, data: AttachmentData) -> Result<AttachmentRef, BackendError> {
        let reference = AttachmentRef {
            id: Ulid::new(),
            len: data.len(),
        };
        self.attachments.insert(reference.id, data);
        Ok(reference)
    }
}
