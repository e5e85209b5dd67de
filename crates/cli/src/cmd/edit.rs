//! Edit an entity through a synchronized session
//!
//! Opens a draft session over the journal store, applies the requested
//! edits, and closes with a bounded flush. The session uses a zero
//! suppression window: CLI edits are always user edits, there is no
//! programmatic form population to filter out.

use crate::{config, util};
use anyhow::{bail, Context, Result};
use keepsake_core::{AttachmentData, AttachmentSlot, FieldValue};
use keepsake_draft::{DraftController, FlushResult, SessionConfig};
use owo_colors::OwoColorize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub async fn run(
    id: &str,
    set: &[String],
    attach: &[String],
    remove_attachment: &[String],
    save: bool,
) -> Result<()> {
    let cfg = config::load()?;
    let store = Arc::new(util::open_store(&cfg)?);

    let id = util::parse_id(id)?;
    let Some(entity) = store.get(id)? else {
        bail!("No entity with ID {id}");
    };

    let session_config = SessionConfig {
        suppression_window: Duration::ZERO,
        ..cfg.session_config()
    };
    debug!(%id, edits = set.len() + attach.len() + remove_attachment.len(), "opening edit session");
    let controller = DraftController::begin_session(store.clone(), entity, session_config);

    for pair in set {
        let (field, value) = util::parse_pair(pair)?;
        controller.edit(field, util::parse_field_value(&value));
    }
    for pair in attach {
        let (field, path) = util::parse_pair(pair)?;
        let bytes = std::fs::read(&path)
            .with_context(|| format!("Failed to read attachment file {path}"))?;
        controller.edit(
            field,
            FieldValue::Attachment(AttachmentSlot::Replace(AttachmentData::new(bytes))),
        );
    }
    for field in remove_attachment {
        controller.edit(field.clone(), FieldValue::Attachment(AttachmentSlot::Remove));
    }

    if save {
        let status = controller.request_manual_save().await;
        println!("Manual save: {status}");
    }

    match controller.request_close(cfg.close_timeout()).await {
        FlushResult::Clean => {
            println!("{} All edits persisted", "✓".green());
            Ok(())
        }
        FlushResult::Failed { message, draft } => {
            eprintln!("{} Save failed: {}", "✗".red(), message);
            eprintln!("Unsaved draft fields:");
            for (name, value) in &draft.fields {
                eprintln!("  {} = {}", name.cyan(), util::format_field_value(value));
            }
            std::process::exit(1);
        }
        FlushResult::TimedOut { .. } => {
            eprintln!(
                "{} Timed out after {:?} waiting for the save to complete",
                "✗".red(),
                cfg.close_timeout()
            );
            std::process::exit(1);
        }
    }
}
