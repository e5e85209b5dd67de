//! Error taxonomy and close-flush outcome

use keepsake_core::Entity;
use thiserror::Error;

/// Failure reported by a persistence backend
///
/// Backends must report failure through this type rather than panicking past
/// the controller boundary.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// Backend rejected the payload or was unreachable
    #[error("persist failed: {0}")]
    Persist(String),
    /// Attachment binary could not be stored
    #[error("attachment upload failed: {0}")]
    Upload(String),
    /// Entity does not exist at the backend
    #[error("unknown entity: {0}")]
    UnknownEntity(String),
}

/// Failure of a single save attempt, as recorded into `SaveStatus::Error`
#[derive(Debug, Clone, Error)]
pub enum SaveError {
    /// The persist contract reported failure
    #[error("persist failed: {0}")]
    PersistFailure(String),
    /// An attachment upload failed; persist was never called
    #[error("attachment upload failed: {0}")]
    AttachmentUploadFailure(String),
    /// The save task was torn down before resolving
    #[error("save task aborted: {0}")]
    Aborted(String),
}

impl From<BackendError> for SaveError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Upload(msg) => SaveError::AttachmentUploadFailure(msg),
            other => SaveError::PersistFailure(other.to_string()),
        }
    }
}

/// Outcome of closing an edit session
///
/// Non-clean variants carry the remaining draft so the caller can warn the
/// user or stash the unsaved fields; the controller never silently discards
/// them.
#[derive(Debug, Clone, PartialEq)]
pub enum FlushResult {
    /// Baseline matches the draft; safe to discard the controller
    Clean,
    /// The final save attempt failed within the bound
    Failed { message: String, draft: Entity },
    /// The bounded wait elapsed with work still outstanding
    TimedOut { draft: Entity },
}

impl FlushResult {
    /// True iff every edit reached the backend before close
    pub fn is_clean(&self) -> bool {
        matches!(self, FlushResult::Clean)
    }

    /// The unsaved draft, if any survived the close
    pub fn unsaved_draft(&self) -> Option<&Entity> {
        match self {
            FlushResult::Clean => None,
            FlushResult::Failed { draft, .. } | FlushResult::TimedOut { draft } => Some(draft),
        }
    }
}
