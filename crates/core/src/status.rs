//! Save status state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Persistence state of one edit session
///
/// Transitions: `clean --edit--> dirty --timer|manual--> saving --ok--> saved`,
/// `saving --err--> error`, `error --edit--> dirty`, `saved --edit--> dirty`.
/// `Saved` and `Clean` are equivalent for dirtiness purposes but distinguished
/// so a caller can render save recency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SaveStatus {
    /// Draft matches the baseline; nothing to do
    Clean,
    /// Draft has unsaved edits
    Dirty,
    /// A persist operation is in flight
    Saving,
    /// Last save confirmed at the given time; draft matches baseline
    Saved(DateTime<Utc>),
    /// Last save attempt failed; draft retained
    Error(String),
}

impl SaveStatus {
    /// True iff the draft is known to match the baseline
    pub fn is_settled(&self) -> bool {
        matches!(self, SaveStatus::Clean | SaveStatus::Saved(_))
    }

    /// True while a persist call is outstanding
    pub fn is_saving(&self) -> bool {
        matches!(self, SaveStatus::Saving)
    }
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveStatus::Clean => write!(f, "clean"),
            SaveStatus::Dirty => write!(f, "dirty"),
            SaveStatus::Saving => write!(f, "saving"),
            SaveStatus::Saved(at) => write!(f, "saved at {}", at.to_rfc3339()),
            SaveStatus::Error(msg) => write!(f, "error: {}", msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settled_states() {
        assert!(SaveStatus::Clean.is_settled());
        assert!(SaveStatus::Saved(Utc::now()).is_settled());
        assert!(!SaveStatus::Dirty.is_settled());
        assert!(!SaveStatus::Saving.is_settled());
        assert!(!SaveStatus::Error("boom".into()).is_settled());
    }
}
