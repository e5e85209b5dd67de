//! Draft store: baseline vs draft snapshots
//!
//! Holds the current editable snapshot of one entity next to the last
//! confirmed persisted baseline and computes dirtiness by structural
//! comparison. The baseline is only ever replaced by a confirmed save
//! outcome; the draft is only ever mutated by edit events.

use keepsake_core::{AttachmentSlot, Entity, FieldValue, PersistField};
use std::collections::BTreeMap;

/// Baseline/draft pair for one entity
#[derive(Debug, Clone)]
pub struct DraftStore {
    /// Last value confirmed persisted
    baseline: Entity,
    /// Current editable value
    draft: Entity,
}

impl DraftStore {
    /// Open a store with baseline = draft = the given entity
    pub fn new(entity: Entity) -> Self {
        Self {
            baseline: entity.clone(),
            draft: entity,
        }
    }

    /// Apply a user edit to the draft
    pub fn edit(&mut self, field: impl Into<String>, value: FieldValue) {
        self.draft.fields.insert(field.into(), value);
    }

    /// Apply a programmatic population write to both draft and baseline
    ///
    /// Used inside the session's suppression window: initial field population
    /// is part of the loaded state, not a user edit, so it must not make the
    /// store dirty.
    pub fn seed(&mut self, field: impl Into<String>, value: FieldValue) {
        let field = field.into();
        self.baseline.fields.insert(field.clone(), value.clone());
        self.draft.fields.insert(field, value);
    }

    /// True iff the draft differs from the baseline
    ///
    /// Field-by-field structural comparison; attachment slots compare by
    /// tri-state tag (see `AttachmentSlot`'s `PartialEq`).
    pub fn is_dirty(&self) -> bool {
        self.draft != self.baseline
    }

    /// Deep copy of the current draft
    ///
    /// The copy is what an in-flight save transmits; later edits mutate the
    /// live draft without touching a payload already handed out.
    pub fn snapshot(&self) -> Entity {
        self.draft.clone()
    }

    /// Read access to the baseline
    pub fn baseline(&self) -> &Entity {
        &self.baseline
    }

    /// Replace the baseline with a confirmed save outcome
    ///
    /// `persisted` is the snapshot that was transmitted, `confirmed` the
    /// entity the backend acknowledged. Draft fields still equal to their
    /// value in `persisted` adopt the confirmed value (this is what
    /// normalizes a staged `Replace` slot into its uploaded reference);
    /// fields edited after the snapshot was captured are kept, so the store
    /// can be dirty again immediately after a commit. Committing a value
    /// equal to the current baseline is a no-op.
    pub fn commit(&mut self, persisted: &Entity, confirmed: Entity) {
        if confirmed == self.baseline {
            return;
        }
        for (name, value) in &confirmed.fields {
            let edited_since = match (self.draft.fields.get(name), persisted.fields.get(name)) {
                (Some(current), Some(sent)) => edited_since_snapshot(current, sent),
                (Some(_), None) => true,
                (None, _) => false,
            };
            if !edited_since {
                self.draft.fields.insert(name.clone(), value.clone());
            }
        }
        self.baseline = confirmed;
    }

    /// Changed fields as a wire payload for the persist contract
    ///
    /// Only fields differing from the baseline are included. `Replace` slots
    /// are mapped through `uploads` (attachment refs resolved by prior
    /// uploads, keyed by field name); callers must upload before building the
    /// payload for any staged replacement.
    pub fn changed_payload(
        snapshot: &Entity,
        baseline: &Entity,
        uploads: &BTreeMap<String, keepsake_core::AttachmentRef>,
    ) -> BTreeMap<String, PersistField> {
        let mut payload = BTreeMap::new();
        for name in snapshot.diff_fields(baseline) {
            let Some(value) = snapshot.fields.get(&name) else {
                continue;
            };
            let wire = match value {
                FieldValue::Text(s) => PersistField::Text(s.clone()),
                FieldValue::Date(d) => PersistField::Date(*d),
                FieldValue::Attachment(slot) => match slot {
                    AttachmentSlot::Unchanged(r) => PersistField::Attachment(r.clone()),
                    AttachmentSlot::Replace(_) => {
                        PersistField::Attachment(uploads.get(&name).cloned())
                    }
                    AttachmentSlot::Remove => PersistField::Attachment(None),
                },
            };
            payload.insert(name, wire);
        }
        payload
    }
}

/// Whether a draft field was edited after the given snapshot value was taken
///
/// Structural comparison, except staged attachment replacements compare by
/// content: tag-only `Replace` equality is the right notion for dirtiness,
/// but at commit time it would mistake a binary re-staged during an
/// in-flight save for the one that was transmitted, and the newer binary
/// would be dropped.
fn edited_since_snapshot(current: &FieldValue, sent: &FieldValue) -> bool {
    match (current, sent) {
        (
            FieldValue::Attachment(AttachmentSlot::Replace(a)),
            FieldValue::Attachment(AttachmentSlot::Replace(b)),
        ) => a.0 != b.0,
        _ => current != sent,
    }
}
