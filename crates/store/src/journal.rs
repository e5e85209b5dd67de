//! Durable entity journal using sled

use crate::apply_fields;
use anyhow::Context;
use async_trait::async_trait;
use keepsake_core::{AttachmentData, AttachmentRef, Entity, EntityId, PersistField};
use keepsake_draft::{BackendError, PersistBackend};
use sled::Db;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;
use ulid::Ulid;

/// Sled-backed store for journal entities and attachment binaries
///
/// Two trees:
/// - `entities`: ULID key (big-endian u128) -> bincode-serialized entity
/// - `attachments`: ULID key -> raw binary
pub struct JournalStore {
    db: Db,
    entities: sled::Tree,
    attachments: sled::Tree,
}

impl JournalStore {
    /// Open or create a store at the given path
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let db = sled::open(path.join("journal.db"))
            .with_context(|| format!("Failed to open journal at {}", path.display()))?;
        let entities = db.open_tree("entities")?;
        let attachments = db.open_tree("attachments")?;

        Ok(Self {
            db,
            entities,
            attachments,
        })
    }

    fn key(id: EntityId) -> [u8; 16] {
        u128::from(id.0).to_be_bytes()
    }

    fn put(&self, entity: &Entity) -> anyhow::Result<()> {
        let value = bincode::serialize(entity).context("Failed to serialize entity")?;
        self.entities.insert(Self::key(entity.id), value)?;

        // Flush to ensure durability
        self.db.flush()?;
        Ok(())
    }

    /// Store a new entity
    pub fn create(&self, entity: &Entity) -> anyhow::Result<()> {
        debug!(id = %entity.id, kind = %entity.kind, "creating entity");
        self.put(entity)
    }

    /// Get an entity by ID
    pub fn get(&self, id: EntityId) -> anyhow::Result<Option<Entity>> {
        let value = match self.entities.get(Self::key(id))? {
            Some(v) => v,
            None => return Ok(None),
        };
        let entity = bincode::deserialize(&value).context("Failed to deserialize entity")?;
        Ok(Some(entity))
    }

    /// All entities in ID (and thus creation-time) order
    pub fn list(&self) -> anyhow::Result<Vec<Entity>> {
        let mut entities = Vec::new();
        for item in self.entities.iter() {
            let (_, value) = item?;
            entities.push(bincode::deserialize(&value).context("Failed to deserialize entity")?);
        }
        Ok(entities)
    }

    /// Total number of stored entities
    pub fn count(&self) -> usize {
        self.entities.len()
    }

    /// Read back an attachment binary
    pub fn attachment(&self, reference: &AttachmentRef) -> anyhow::Result<Option<Vec<u8>>> {
        let value = self
            .attachments
            .get(u128::from(reference.id).to_be_bytes())?;
        Ok(value.map(|v| v.to_vec()))
    }
}

#[async_trait]
impl PersistBackend for JournalStore {
    async fn persist(
        &self,
        id: EntityId,
        fields: BTreeMap<String, PersistField>,
    ) -> Result<Entity, BackendError> {
        let mut entity = self
            .get(id)
            .map_err(|err| BackendError::Persist(err.to_string()))?
            .ok_or_else(|| BackendError::UnknownEntity(id.to_string()))?;

        apply_fields(&mut entity, fields);
        self.put(&entity)
            .map_err(|err| BackendError::Persist(err.to_string()))?;

        debug!(id = %id, "entity persisted");
        Ok(entity)
    }

    async fn upload_attachment(&self, data: AttachmentData) -> Result<AttachmentRef, BackendError> {
        let reference = AttachmentRef {
            id: Ulid::new(),
            len: data.len(),
        };
        self.attachments
            .insert(u128::from(reference.id).to_be_bytes(), data.0.to_vec())
            .map_err(|err| BackendError::Upload(err.to_string()))?;
        self.db
            .flush()
            .map_err(|err| BackendError::Upload(err.to_string()))?;

        debug!(id = %reference.id, len = reference.len, "attachment stored");
        Ok(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keepsake_core::{EntityKind, FieldValue};
    use tempfile::TempDir;

    fn store() -> (TempDir, JournalStore) {
        let dir = TempDir::new().unwrap();
        let store = JournalStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_create_and_get() {
        let (_dir, store) = store();
        let entity =
            Entity::new(EntityKind::Memory).with_field("title", FieldValue::text("First day"));
        store.create(&entity).unwrap();

        let loaded = store.get(entity.id).unwrap().unwrap();
        assert_eq!(loaded, entity);
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_get_missing_is_none() {
        let (_dir, store) = store();
        assert!(store.get(EntityId::generate()).unwrap().is_none());
    }

    #[test]
    fn test_list_orders_by_id() {
        let (_dir, store) = store();
        let a = Entity::new(EntityKind::Memory);
        let b = Entity::new(EntityKind::Chapter);
        store.create(&a).unwrap();
        store.create(&b).unwrap();

        let ids: Vec<_> = store.list().unwrap().into_iter().map(|e| e.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        assert_eq!(ids.len(), 2);
    }

    #[tokio::test]
    async fn test_persist_partial_update() {
        let (_dir, store) = store();
        let entity = Entity::new(EntityKind::Memory)
            .with_field("title", FieldValue::text("A"))
            .with_field("body", FieldValue::text("keep me"));
        store.create(&entity).unwrap();

        let mut fields = BTreeMap::new();
        fields.insert("title".to_string(), PersistField::Text("B".into()));
        let confirmed = store.persist(entity.id, fields).await.unwrap();

        assert_eq!(confirmed.field("title"), Some(&FieldValue::text("B")));
        assert_eq!(confirmed.field("body"), Some(&FieldValue::text("keep me")));
        assert_eq!(store.get(entity.id).unwrap().unwrap(), confirmed);
    }

    #[tokio::test]
    async fn test_persist_unknown_entity_fails() {
        let (_dir, store) = store();
        let result = store.persist(EntityId::generate(), BTreeMap::new()).await;
        assert!(matches!(result, Err(BackendError::UnknownEntity(_))));
    }

    #[tokio::test]
    async fn test_upload_roundtrip() {
        let (_dir, store) = store();
        let reference = store
            .upload_attachment(AttachmentData::new(vec![1u8, 2, 3]))
            .await
            .unwrap();
        assert_eq!(reference.len, 3);
        assert_eq!(store.attachment(&reference).unwrap(), Some(vec![1, 2, 3]));
    }
}
