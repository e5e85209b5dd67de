//! Persistence backends for Keepsake
//!
//! This crate provides:
//! - Sled-backed journal store (durable, used by the CLI)
//! - In-memory store (tests and scratch sessions)
//!
//! Both implement the `PersistBackend` contract consumed by the draft
//! synchronization controller, plus the direct create/get/list operations
//! the CLI needs outside an edit session.

pub mod journal;
pub mod memory;

// Re-exports
pub use journal::JournalStore;
pub use memory::MemoryStore;

use keepsake_core::{AttachmentSlot, Entity, FieldValue, PersistField};
use std::collections::BTreeMap;

/// Apply a partial persist payload to a stored entity
pub(crate) fn apply_fields(entity: &mut Entity, fields: BTreeMap<String, PersistField>) {
    for (name, value) in fields {
        let stored = match value {
            PersistField::Text(s) => FieldValue::Text(s),
            PersistField::Date(d) => FieldValue::Date(d),
            PersistField::Attachment(r) => FieldValue::Attachment(AttachmentSlot::Unchanged(r)),
        };
        entity.fields.insert(name, stored);
    }
}
