//! Common utilities for controller integration tests

use async_trait::async_trait;
use keepsake_draft::{BackendError, PersistBackend};
use keepsake_core::{
    AttachmentData, AttachmentRef, AttachmentSlot, Entity, EntityId, EntityKind, FieldValue,
    PersistField,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::future::pending;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::time::Duration;
use ulid::Ulid;

/// Scripted in-memory backend for exercising the controller
///
/// Tracks every persist payload, the number of overlapping persist calls
/// observed, and can be configured to fail, delay, or never resolve.
#[derive(Default)]
pub struct ScriptedBackend {
    inner: Mutex<Inner>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[derive(Default)]
struct Inner {
    entities: HashMap<EntityId, Entity>,
    persist_calls: Vec<BTreeMap<String, PersistField>>,
    fail_remaining: usize,
    upload_fail_remaining: usize,
    upload_count: usize,
    persist_delay: Duration,
    never_resolve: bool,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seed the backend with an already-persisted entity
    pub fn insert(&self, entity: Entity) {
        self.inner.lock().entities.insert(entity.id, entity);
    }

    /// Fail the next `n` persist calls
    pub fn fail_times(&self, n: usize) {
        self.inner.lock().fail_remaining = n;
    }

    /// Fail the next `n` attachment uploads
    pub fn fail_uploads(&self, n: usize) {
        self.inner.lock().upload_fail_remaining = n;
    }

    /// Delay every persist call by `d`
    pub fn set_persist_delay(&self, d: Duration) {
        self.inner.lock().persist_delay = d;
    }

    /// Make every persist call hang forever
    pub fn set_never_resolve(&self) {
        self.inner.lock().never_resolve = true;
    }

    /// All persist payloads seen so far
    pub fn persist_calls(&self) -> Vec<BTreeMap<String, PersistField>> {
        self.inner.lock().persist_calls.clone()
    }

    pub fn persist_count(&self) -> usize {
        self.inner.lock().persist_calls.len()
    }

    pub fn upload_count(&self) -> usize {
        self.inner.lock().upload_count
    }

    /// Highest number of overlapping persist calls observed
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Currently stored entity
    pub fn stored(&self, id: EntityId) -> Option<Entity> {
        self.inner.lock().entities.get(&id).cloned()
    }
}

#[async_trait]
impl PersistBackend for ScriptedBackend {
    async fn persist(
        &self,
        id: EntityId,
        fields: BTreeMap<String, PersistField>,
    ) -> Result<Entity, BackendError> {
        let count = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(count, Ordering::SeqCst);

        let (delay, hang) = {
            let mut inner = self.inner.lock();
            inner.persist_calls.push(fields.clone());
            (inner.persist_delay, inner.never_resolve)
        };

        if hang {
            pending::<()>().await;
        }
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }

        let result = {
            let mut inner = self.inner.lock();
            if inner.fail_remaining > 0 {
                inner.fail_remaining -= 1;
                Err(BackendError::Persist("injected persist failure".into()))
            } else {
                let entity = inner
                    .entities
                    .entry(id)
                    .or_insert_with(|| Entity {
                        id,
                        kind: EntityKind::Memory,
                        fields: BTreeMap::new(),
                    });
                for (name, value) in fields {
                    let stored = match value {
                        PersistField::Text(s) => FieldValue::Text(s),
                        PersistField::Date(d) => FieldValue::Date(d),
                        PersistField::Attachment(r) => {
                            FieldValue::Attachment(AttachmentSlot::Unchanged(r))
                        }
                    };
                    entity.fields.insert(name, stored);
                }
                Ok(entity.clone())
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn upload_attachment(&self, data: AttachmentData) -> Result<AttachmentRef, BackendError> {
        let mut inner = self.inner.lock();
        if inner.upload_fail_remaining > 0 {
            inner.upload_fail_remaining -= 1;
            return Err(BackendError::Upload("injected upload failure".into()));
        }
        inner.upload_count += 1;
        Ok(AttachmentRef {
            id: Ulid::new(),
            len: data.len(),
        })
    }
}

/// A seeded memory entity with a title field
pub fn memory_with_title(title: &str) -> Entity {
    Entity::new(EntityKind::Memory).with_field("title", FieldValue::text(title))
}
