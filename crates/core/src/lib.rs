//! Entity data model for Keepsake
//!
//! This crate provides:
//! - Entity data structures (ULID-based IDs)
//! - Field values (text, dates, attachment slots)
//! - Tri-state attachment change tracking
//! - Save status state machine

pub mod entity;
pub mod status;

// Re-exports
pub use entity::{
    AttachmentData, AttachmentRef, AttachmentSlot, Entity, EntityId, EntityKind, FieldValue,
    PersistField,
};
pub use status::SaveStatus;
