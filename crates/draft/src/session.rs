//! Edit-session controller
//!
//! One controller instance per open edit session. The controller runs as a
//! single tokio task owning all mutable session state; the form layer talks
//! to it through a command channel and reads status through a watch channel.
//! Interleaving therefore happens only at the task's await points (command
//! receive, debounce expiry, save-task join), which keeps the ordering and
//! at-most-one-in-flight invariants enforceable without locks.

use crate::backend::PersistBackend;
use crate::debounce::DebounceTimer;
use crate::error::{FlushResult, SaveError};
use crate::store::DraftStore;
use chrono::Utc;
use keepsake_core::{AttachmentSlot, Entity, FieldValue, SaveStatus};
use std::collections::BTreeMap;
use std::future::pending;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration, Instant};
use tracing::{debug, info, warn};

/// Timing configuration for one edit session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Debounce delay after the last edit before an automatic save
    pub debounce_delay: Duration,
    /// Window after session open during which edits seed the baseline
    /// instead of arming the debounce timer
    pub suppression_window: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce_delay: Duration::from_secs(2),
            suppression_window: Duration::from_millis(500),
        }
    }
}

/// Commands accepted by the session task
enum Command {
    Edit {
        field: String,
        value: FieldValue,
    },
    Snapshot {
        reply: oneshot::Sender<Entity>,
    },
    ManualSave {
        reply: oneshot::Sender<SaveStatus>,
    },
    Close {
        bound: Duration,
        reply: oneshot::Sender<FlushResult>,
    },
}

/// Result of one spawned save attempt
struct SaveOutcome {
    generation: u64,
    /// On success: (snapshot that was transmitted, confirmed entity)
    result: Result<(Entity, Entity), SaveError>,
}

enum Event {
    Command(Option<Command>),
    TimerFired,
    SaveResolved(SaveOutcome),
}

/// Handle to a running edit session
///
/// `edit` and `status` are synchronous from the caller's point of view;
/// `request_manual_save` resolves when the flushed save (or the save it was
/// queued behind) completes; `request_close` consumes the handle and flushes
/// with a bounded wait.
pub struct DraftController {
    cmd_tx: mpsc::UnboundedSender<Command>,
    status_rx: watch::Receiver<SaveStatus>,
}

impl DraftController {
    /// Open an edit session: baseline = draft = `entity`
    ///
    /// The suppression window starts immediately; programmatic population of
    /// fields during the window is treated as loaded state, not user edits.
    pub fn begin_session(
        backend: Arc<dyn PersistBackend>,
        entity: Entity,
        config: SessionConfig,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(SaveStatus::Clean);

        let task = SessionTask {
            store: DraftStore::new(entity),
            backend,
            timer: DebounceTimer::new(config.debounce_delay),
            suppress_until: Instant::now() + config.suppression_window,
            generation: 0,
            in_flight: None,
            queued_manual: false,
            save_waiters: Vec::new(),
            status_tx,
            cmd_rx,
        };
        tokio::spawn(task.run());

        Self { cmd_tx, status_rx }
    }

    /// Apply an edit to the draft; never blocks, never fails loudly
    pub fn edit(&self, field: impl Into<String>, value: FieldValue) {
        let _ = self.cmd_tx.send(Command::Edit {
            field: field.into(),
            value,
        });
    }

    /// Current save status (synchronous read)
    pub fn status(&self) -> SaveStatus {
        self.status_rx.borrow().clone()
    }

    /// Watch channel for observers that render save feedback
    pub fn watch_status(&self) -> watch::Receiver<SaveStatus> {
        self.status_rx.clone()
    }

    /// Deep copy of the current draft
    pub async fn snapshot(&self) -> Option<Entity> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx.send(Command::Snapshot { reply: tx }).ok()?;
        rx.await.ok()
    }

    /// Save now: cancels any pending debounce timer and persists the draft,
    /// queueing behind an already in-flight save if there is one
    pub async fn request_manual_save(&self) -> SaveStatus {
        let (tx, rx) = oneshot::channel();
        if self.cmd_tx.send(Command::ManualSave { reply: tx }).is_err() {
            return self.status();
        }
        match rx.await {
            Ok(status) => status,
            Err(_) => self.status(),
        }
    }

    /// Close the session, flushing unsaved work with a bounded wait
    ///
    /// Waits up to `bound` for an in-flight save, then up to `bound` again
    /// for a final flush of anything still dirty. Never hangs indefinitely;
    /// a non-clean result carries the unsaved draft.
    pub async fn request_close(self, bound: Duration) -> FlushResult {
        let (tx, rx) = oneshot::channel();
        if self.cmd_tx.send(Command::Close { bound, reply: tx }).is_err() {
            return self.lost_session_result();
        }
        match rx.await {
            Ok(result) => result,
            Err(_) => self.lost_session_result(),
        }
    }

    /// Fallback when the session task is gone before the close flush could
    /// run. The task replies on every exit path and this handle keeps the
    /// command channel open while waiting, so only a task panic or runtime
    /// teardown lands here.
    fn lost_session_result(&self) -> FlushResult {
        let status = self.status();
        if !status.is_settled() {
            warn!(%status, "session task gone before the close flush; draft state lost");
        }
        FlushResult::Clean
    }
}

struct SessionTask {
    store: DraftStore,
    backend: Arc<dyn PersistBackend>,
    timer: DebounceTimer,
    /// End of the suppression window
    suppress_until: Instant,
    /// Monotonic save counter; outcomes from superseded snapshots are not
    /// committed
    generation: u64,
    in_flight: Option<JoinHandle<SaveOutcome>>,
    /// Manual save requested while a save was in flight; runs immediately
    /// after it resolves
    queued_manual: bool,
    /// Manual-save callers waiting for the next resolution
    save_waiters: Vec<oneshot::Sender<SaveStatus>>,
    status_tx: watch::Sender<SaveStatus>,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
}

impl SessionTask {
    async fn run(mut self) {
        info!(entity = %self.store.baseline().id, "edit session opened");

        loop {
            let event = tokio::select! {
                cmd = self.cmd_rx.recv() => Event::Command(cmd),
                _ = self.timer.fired() => Event::TimerFired,
                outcome = Self::join_save(&mut self.in_flight) => Event::SaveResolved(outcome),
            };

            match event {
                Event::Command(None) => {
                    // All handles dropped without a close request.
                    if self.store.is_dirty() || self.in_flight.is_some() {
                        warn!(
                            entity = %self.store.baseline().id,
                            "session dropped with unsaved work"
                        );
                    }
                    break;
                }
                Event::Command(Some(Command::Edit { field, value })) => {
                    self.handle_edit(field, value);
                }
                Event::Command(Some(Command::Snapshot { reply })) => {
                    let _ = reply.send(self.store.snapshot());
                }
                Event::Command(Some(Command::ManualSave { reply })) => {
                    self.trigger_manual_save(reply);
                }
                Event::Command(Some(Command::Close { bound, reply })) => {
                    let result = self.flush_for_close(bound).await;
                    let _ = reply.send(result);
                    break;
                }
                Event::TimerFired => {
                    self.timer.cancel();
                    self.trigger_auto_save();
                }
                Event::SaveResolved(outcome) => {
                    self.resolve_save(outcome);
                }
            }
        }

        debug!(entity = %self.store.baseline().id, "edit session ended");
    }

    /// Await the in-flight save; pends forever while none is outstanding
    async fn join_save(in_flight: &mut Option<JoinHandle<SaveOutcome>>) -> SaveOutcome {
        match in_flight {
            Some(handle) => {
                let outcome = match (&mut *handle).await {
                    Ok(outcome) => outcome,
                    Err(err) => SaveOutcome {
                        generation: 0,
                        result: Err(SaveError::Aborted(err.to_string())),
                    },
                };
                *in_flight = None;
                outcome
            }
            None => pending().await,
        }
    }

    fn status(&self) -> SaveStatus {
        self.status_tx.borrow().clone()
    }

    fn set_status(&self, status: SaveStatus) {
        self.status_tx.send_replace(status);
    }

    fn handle_edit(&mut self, field: String, value: FieldValue) {
        if Instant::now() < self.suppress_until {
            // Programmatic population: part of the loaded state, must not
            // trigger a network write.
            debug!(%field, "edit inside suppression window, seeding baseline");
            self.store.seed(field, value);
            return;
        }

        self.store.edit(field, value);

        if !self.store.is_dirty() {
            // Edited back to the baseline value.
            self.timer.cancel();
            if self.in_flight.is_none() {
                self.set_status(SaveStatus::Clean);
            }
            return;
        }

        if self.in_flight.is_some() {
            // Picked up when the in-flight save resolves; a pending timer
            // exists only while dirty with no save outstanding.
            return;
        }

        self.set_status(SaveStatus::Dirty);
        self.timer.arm();
    }

    fn trigger_auto_save(&mut self) {
        if self.in_flight.is_some() {
            // Stray trigger; handle_edit never arms the timer while a save
            // is outstanding, but the sequencer must stay safe anyway.
            warn!("auto-save trigger while a save is in flight, ignoring");
            return;
        }
        if !self.store.is_dirty() {
            return;
        }
        self.start_save();
    }

    fn trigger_manual_save(&mut self, reply: oneshot::Sender<SaveStatus>) {
        self.timer.cancel();

        if self.in_flight.is_some() {
            // Queue behind the in-flight save rather than starting a second
            // concurrent persist.
            self.queued_manual = true;
            self.save_waiters.push(reply);
            return;
        }
        if !self.store.is_dirty() {
            let _ = reply.send(self.status());
            return;
        }
        self.save_waiters.push(reply);
        self.start_save();
    }

    fn start_save(&mut self) {
        let snapshot = self.store.snapshot();
        let baseline = self.store.baseline().clone();
        self.generation += 1;
        let generation = self.generation;
        let backend = Arc::clone(&self.backend);

        self.set_status(SaveStatus::Saving);
        debug!(generation, entity = %snapshot.id, "persist started");

        self.in_flight = Some(tokio::spawn(async move {
            let result = run_save(backend, snapshot, baseline).await;
            SaveOutcome { generation, result }
        }));
    }

    fn resolve_save(&mut self, outcome: SaveOutcome) {
        match outcome.result {
            Ok((persisted, confirmed)) => {
                if outcome.generation == self.generation {
                    self.store.commit(&persisted, confirmed);
                } else {
                    // A newer snapshot has been submitted since; last writer
                    // wins at the controller level.
                    debug!(
                        generation = outcome.generation,
                        "discarding result for superseded snapshot"
                    );
                }
                if self.store.is_dirty() {
                    // Edits landed while the save was in flight.
                    self.set_status(SaveStatus::Dirty);
                } else {
                    self.set_status(SaveStatus::Saved(Utc::now()));
                    info!(entity = %self.store.baseline().id, "draft persisted");
                }
            }
            Err(err) => {
                warn!(error = %err, "save attempt failed, draft retained");
                self.set_status(SaveStatus::Error(err.to_string()));
            }
        }
        self.after_save();
    }

    fn after_save(&mut self) {
        if self.queued_manual {
            self.queued_manual = false;
            if self.store.is_dirty() {
                // Waiters resolve with the queued save's outcome instead.
                self.start_save();
                return;
            }
        }

        let status = self.status();
        for waiter in self.save_waiters.drain(..) {
            let _ = waiter.send(status.clone());
        }

        // Rearm for edits that landed while the save was in flight.
        if self.store.is_dirty() && matches!(self.status(), SaveStatus::Dirty) {
            self.timer.arm();
        }
    }

    /// Two-phase bounded flush for close: wait out the in-flight save, then
    /// flush anything still dirty, each phase bounded by `bound`
    async fn flush_for_close(&mut self, bound: Duration) -> FlushResult {
        self.timer.cancel();

        // Phase 1: wait for an in-flight save to resolve.
        if self.in_flight.is_some() {
            match timeout(bound, Self::join_save(&mut self.in_flight)).await {
                Ok(outcome) => self.resolve_save(outcome),
                Err(_) => return self.abandon_in_flight("in-flight save"),
            }
        }

        // Phase 2: final flush of anything still unsaved, a failed or
        // never-started save included. after_save may already have begun a
        // queued manual save.
        if self.store.is_dirty() && self.in_flight.is_none() {
            self.start_save();
        }
        if self.in_flight.is_some() {
            match timeout(bound, Self::join_save(&mut self.in_flight)).await {
                Ok(outcome) => self.resolve_save(outcome),
                Err(_) => return self.abandon_in_flight("final flush"),
            }
        }

        if self.store.is_dirty() {
            let message = match self.status() {
                SaveStatus::Error(message) => message,
                other => format!("unsaved edits remain (status: {other})"),
            };
            FlushResult::Failed {
                message,
                draft: self.store.snapshot(),
            }
        } else {
            FlushResult::Clean
        }
    }

    /// Give up on an in-flight save at close: the persist may still complete
    /// at the backend, but its result is no longer observed
    fn abandon_in_flight(&mut self, phase: &str) -> FlushResult {
        warn!(phase, "close timed out with a save still outstanding");
        if let Some(handle) = self.in_flight.take() {
            drop(handle);
        }
        self.set_status(SaveStatus::Dirty);
        for waiter in self.save_waiters.drain(..) {
            let _ = waiter.send(SaveStatus::Dirty);
        }
        FlushResult::TimedOut {
            draft: self.store.snapshot(),
        }
    }
}

/// Execute one save attempt against the backend
///
/// Uploads staged attachment replacements first; an upload failure aborts
/// the attempt before persist is called. The persist payload carries only
/// the fields that differ from the baseline.
async fn run_save(
    backend: Arc<dyn PersistBackend>,
    snapshot: Entity,
    baseline: Entity,
) -> Result<(Entity, Entity), SaveError> {
    let mut uploads = BTreeMap::new();
    for name in snapshot.diff_fields(&baseline) {
        if let Some(FieldValue::Attachment(AttachmentSlot::Replace(data))) =
            snapshot.fields.get(&name)
        {
            let reference = backend
                .upload_attachment(data.clone())
                .await
                .map_err(|err| SaveError::AttachmentUploadFailure(err.to_string()))?;
            debug!(field = %name, id = %reference.id, "attachment uploaded");
            uploads.insert(name, reference);
        }
    }

    let payload = DraftStore::changed_payload(&snapshot, &baseline, &uploads);
    if payload.is_empty() {
        return Ok((snapshot.clone(), snapshot));
    }

    let confirmed = backend
        .persist(snapshot.id, payload)
        .await
        .map_err(SaveError::from)?;

    Ok((snapshot, confirmed))
}
