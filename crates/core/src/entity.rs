//! Entity data structures

use bytes::Bytes;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use ulid::Ulid;

/// Stable external identity of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Ulid);

impl EntityId {
    /// Generate a fresh ID
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    /// Parse from the canonical ULID string form
    pub fn parse(s: &str) -> Option<Self> {
        Ulid::from_string(s).ok().map(Self)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Kind of journal entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    /// A single memory on the timeline
    Memory,
    /// A chapter grouping a span of the timeline
    Chapter,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Memory => write!(f, "memory"),
            EntityKind::Chapter => write!(f, "chapter"),
        }
    }
}

/// An editable journal entity: a mapping from field name to value
///
/// A controller owns exactly one baseline (last confirmed persisted) and one
/// draft (current editable) copy of an entity at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Stable external ID
    pub id: EntityId,
    /// Memory or chapter
    pub kind: EntityKind,
    /// Field name -> value
    pub fields: BTreeMap<String, FieldValue>,
}

impl Entity {
    /// Create an empty entity of the given kind
    pub fn new(kind: EntityKind) -> Self {
        Self {
            id: EntityId::generate(),
            kind,
            fields: BTreeMap::new(),
        }
    }

    /// Set a field, returning self for chained construction
    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Get a field value by name
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Field names whose values differ from `other`, in name order
    pub fn diff_fields(&self, other: &Entity) -> Vec<String> {
        let mut changed = Vec::new();
        for (name, value) in &self.fields {
            if other.fields.get(name) != Some(value) {
                changed.push(name.clone());
            }
        }
        for name in other.fields.keys() {
            if !self.fields.contains_key(name) {
                changed.push(name.clone());
            }
        }
        changed.sort();
        changed.dedup();
        changed
    }
}

/// A single editable field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Free text (title, body, place, ...)
    Text(String),
    /// Calendar date (when the memory happened)
    Date(NaiveDate),
    /// Attachment slot (cover photo, audio clip, ...)
    Attachment(AttachmentSlot),
}

impl FieldValue {
    /// Shorthand for a text value
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }
}

/// Tri-state change marker for an attachment slot
///
/// Only meaningful on the draft side; a confirmed baseline always holds
/// `Unchanged`. Equality compares `Replace` by tag only, not binary content:
/// dirtiness tracking cares that a replacement is staged, not what its bytes
/// are.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AttachmentSlot {
    /// Slot untouched; holds the confirmed reference, if any
    Unchanged(Option<AttachmentRef>),
    /// A new binary is staged for upload
    Replace(AttachmentData),
    /// The attachment is to be removed
    Remove,
}

impl PartialEq for AttachmentSlot {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AttachmentSlot::Unchanged(a), AttachmentSlot::Unchanged(b)) => a == b,
            (AttachmentSlot::Replace(_), AttachmentSlot::Replace(_)) => true,
            (AttachmentSlot::Remove, AttachmentSlot::Remove) => true,
            _ => false,
        }
    }
}

/// Reference to an uploaded attachment binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    /// Storage ID assigned by the upload contract
    pub id: Ulid,
    /// Size of the stored binary in bytes
    pub len: u64,
}

/// Raw attachment bytes staged for upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentData(pub Bytes);

impl AttachmentData {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn len(&self) -> u64 {
        self.0.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Wire-side field value for the persist contract
///
/// Raw binaries never cross the persist boundary: `Replace` slots are
/// uploaded first and arrive here as a resolved reference, `Remove` as
/// `Attachment(None)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PersistField {
    Text(String),
    Date(NaiveDate),
    Attachment(Option<AttachmentRef>),
}
