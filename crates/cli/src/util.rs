//! Shared helpers for CLI commands

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use keepsake_core::{AttachmentSlot, Entity, EntityId, FieldValue};
use keepsake_store::JournalStore;

/// Open the journal store configured in the config file
pub fn open_store(config: &crate::config::KeepsakeConfig) -> Result<JournalStore> {
    let path = config.store_path()?;
    std::fs::create_dir_all(&path)
        .with_context(|| format!("Failed to create store directory {}", path.display()))?;
    JournalStore::open(&path)
}

/// Parse an entity ID argument
pub fn parse_id(s: &str) -> Result<EntityId> {
    EntityId::parse(s).with_context(|| format!("Invalid entity ID: {s}"))
}

/// Split a `field=value` argument
pub fn parse_pair(s: &str) -> Result<(String, String)> {
    match s.split_once('=') {
        Some((field, value)) if !field.is_empty() => Ok((field.to_string(), value.to_string())),
        _ => bail!("Expected field=value, got '{s}'"),
    }
}

/// Parse a field value: ISO dates become dates, everything else is text
pub fn parse_field_value(value: &str) -> FieldValue {
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => FieldValue::Date(date),
        Err(_) => FieldValue::text(value),
    }
}

/// One-line rendering of a field value
pub fn format_field_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(s) => s.clone(),
        FieldValue::Date(d) => d.to_string(),
        FieldValue::Attachment(AttachmentSlot::Unchanged(Some(r))) => {
            format!("attachment {} ({} bytes)", r.id, r.len)
        }
        FieldValue::Attachment(AttachmentSlot::Unchanged(None)) => "(no attachment)".to_string(),
        FieldValue::Attachment(AttachmentSlot::Replace(data)) => {
            format!("(staged attachment, {} bytes)", data.len())
        }
        FieldValue::Attachment(AttachmentSlot::Remove) => "(attachment removal staged)".to_string(),
    }
}

/// Title field, or a placeholder
pub fn title_of(entity: &Entity) -> String {
    match entity.field("title") {
        Some(FieldValue::Text(s)) => s.clone(),
        _ => "(untitled)".to_string(),
    }
}
