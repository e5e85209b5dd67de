//! Draft synchronization controller for Keepsake edit sessions
//!
//! This crate provides:
//! - Draft store (baseline vs draft snapshots, structural dirtiness)
//! - Debounce timer (single cancellable deadline, rearm-on-edit)
//! - Save sequencing (at most one persist in flight, manual-save queueing)
//! - Session lifecycle (suppression window on open, bounded flush on close)
//!
//! One controller instance owns the draft/baseline pair of exactly one
//! entity. The surrounding form layer talks to it through
//! [`session::DraftController`] and observes [`keepsake_core::SaveStatus`]
//! for feedback; failures never cross the controller boundary as panics.

pub mod backend;
pub mod debounce;
pub mod error;
pub mod session;
pub mod store;

// Re-exports
pub use backend::PersistBackend;
pub use debounce::DebounceTimer;
pub use error::{BackendError, FlushResult, SaveError};
pub use session::{DraftController, SessionConfig};
pub use store::DraftStore;
