//! # Upload Controller
//!
//! One upload widget instance: the preview store, its handles, the sync gate
//! and the batches in flight, behind a single lock.
//!
//! ## Overview
//!
//! The controller reconciles three sources of change:
//! - the user adding and removing files,
//! - upload batches resolving in any order,
//! - the owner pushing a new canonical URL list via [`UploadController::set_value`].
//!
//! Adding files is split in two steps. [`UploadController::enqueue`] runs
//! synchronously: it validates the selection, creates local previews and
//! returns a [`PendingBatch`]. [`PendingBatch::upload`] then calls the
//! transport and commits or rolls back. [`UploadController::add_files`] does
//! both.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_upload::UploadController;
//!
//! let controller = UploadController::builder(transport, handles)
//!     .config(config)
//!     .initial_value(saved_urls)
//!     .on_change(|urls| save_profile_photos(urls))
//!     .build()?;
//!
//! let outcome = controller.add_files(selected_files).await?;
//! for rejection in &outcome.rejected {
//!     println!("{}", rejection.error);
//! }
//! ```
//!
//! ## Locking
//!
//! State lives in a `parking_lot::Mutex` that is never held across an
//! `.await`. The change callback and event bus are invoked after the lock is
//! released, so a callback may call straight back into the controller.

use crate::batch::{Batch, BatchReport, BatchStatus};
use crate::entry::{BatchId, EntryId, LocalEntry, PreviewEntry, PreviewItem};
use crate::error::{BatchUploadError, Result, UploadError, ValidationError};
use crate::gate::{GateDecision, SyncGate, SyncStatus};
use crate::handles::HandleRegistry;
use crate::response::extract_urls;
use crate::store::PreviewStore;
use crate::validation::ValidationGate;
use bridge_traits::{FilePayload, PreviewHandle, PreviewHandleProvider, UploadTransport};
use core_runtime::config::UploadConfig;
use core_runtime::events::{EventBus, RejectedFile, UploadEvent};
use core_runtime::logging::strip_path;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Receives the committed URL list every time it changes.
pub type ChangeCallback = Arc<dyn Fn(Vec<String>) + Send + Sync>;

// ============================================================================
// Outcomes
// ============================================================================

/// A file the controller refused, with the reason shown to the user.
#[derive(Debug, Clone)]
pub struct Rejection {
    pub file: FilePayload,
    pub error: ValidationError,
}

/// Result of [`UploadController::enqueue`].
#[derive(Debug)]
pub struct EnqueueOutcome {
    pub rejected: Vec<Rejection>,
    /// `None` when every file was rejected
    pub batch: Option<PendingBatch>,
}

/// Result of [`UploadController::add_files`].
#[derive(Debug)]
pub struct AddFilesOutcome {
    pub rejected: Vec<Rejection>,
    pub report: Option<BatchReport>,
}

// ============================================================================
// Shared State
// ============================================================================

struct State {
    store: PreviewStore,
    handles: HandleRegistry,
    gate: SyncGate,
    last_error: Option<String>,
    disposed: bool,
}

struct Shared {
    widget_id: String,
    config: UploadConfig,
    validator: ValidationGate,
    transport: Arc<dyn UploadTransport>,
    on_change: Option<ChangeCallback>,
    events: Option<EventBus>,
    state: Mutex<State>,
}

/// Work to do once the lock is released.
#[derive(Default)]
struct Effects {
    emit: Option<Vec<String>>,
    events: Vec<UploadEvent>,
}

impl Shared {
    fn deliver(&self, effects: Effects) {
        if let Some(urls) = effects.emit {
            if let Some(callback) = &self.on_change {
                callback(urls.clone());
            }
            self.publish(UploadEvent::ValueEmitted {
                widget: self.widget_id.clone(),
                urls,
            });
        }

        for event in effects.events {
            self.publish(event);
        }
    }

    fn publish(&self, event: UploadEvent) {
        if let Some(bus) = &self.events {
            bus.emit(event).ok();
        }
    }

    /// Record the committed set as emitted and queue it for the owner.
    fn stage_emission(state: &mut State, effects: &mut Effects) {
        let urls = state.store.committed_urls();
        state.gate.record_emission(&urls);
        effects.emit = Some(urls);
    }

    /// Like [`stage_emission`](Self::stage_emission), but only if the committed
    /// set differs from `before`.
    fn stage_if_changed(state: &mut State, before: &[String], effects: &mut Effects) {
        if state.store.committed_urls() != before {
            Self::stage_emission(state, effects);
        }
    }

    fn finish_upload(&self, state: &mut State, batch_id: BatchId) {
        if let Err(e) = state.gate.finish_upload() {
            warn!(widget = %self.widget_id, batch = %batch_id, "Sync gate out of step: {}", e);
        }
    }

    fn commit(&self, batch: &mut Batch, urls: Vec<String>) -> BatchReport {
        let mut effects = Effects::default();
        let mut report = BatchReport {
            batch_id: batch.id(),
            status: batch.status(),
            committed: Vec::new(),
            dropped: Vec::new(),
            error: None,
        };

        {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            self.finish_upload(state, batch.id());

            if state.disposed {
                debug!(widget = %self.widget_id, batch = %batch.id(), "Dropping response after dispose");
                batch.fail().ok();
                report.status = batch.status();
                report.dropped = batch.entry_ids().to_vec();
                report.error = Some(BatchUploadError::Cancelled);
                return report;
            }

            for (id, url) in batch.entry_ids().iter().zip(urls) {
                if state.store.promote(*id, url, &mut state.handles) {
                    report.committed.push(*id);
                } else {
                    report.dropped.push(*id);
                }
            }

            if let Err(e) = batch.complete() {
                warn!(widget = %self.widget_id, "{}", e);
            }
            report.status = batch.status();

            if report.committed.is_empty() {
                debug!(widget = %self.widget_id, batch = %batch.id(), "All entries removed before upload finished");
                effects.events.push(UploadEvent::ResponseDropped {
                    widget: self.widget_id.clone(),
                    batch_id: batch.id().to_string(),
                });
            } else {
                info!(
                    widget = %self.widget_id,
                    batch = %batch.id(),
                    committed = report.committed.len(),
                    dropped = report.dropped.len(),
                    "Upload batch committed"
                );
                Self::stage_emission(state, &mut effects);
                effects.events.push(UploadEvent::BatchCommitted {
                    widget: self.widget_id.clone(),
                    batch_id: batch.id().to_string(),
                    committed: report.committed.len(),
                    dropped: report.dropped.len(),
                });
            }
        }

        self.deliver(effects);
        report
    }

    fn rollback(&self, batch: &mut Batch, error: BatchUploadError) -> BatchReport {
        let mut effects = Effects::default();
        let mut report = BatchReport {
            batch_id: batch.id(),
            status: batch.status(),
            committed: Vec::new(),
            dropped: Vec::new(),
            error: Some(error.clone()),
        };

        {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            self.finish_upload(state, batch.id());

            if let Err(e) = batch.fail() {
                warn!(widget = %self.widget_id, "{}", e);
            }
            report.status = batch.status();

            if state.disposed {
                debug!(widget = %self.widget_id, batch = %batch.id(), "Dropping failure after dispose");
                report.dropped = batch.entry_ids().to_vec();
                return report;
            }

            let before = state.store.committed_urls();
            let mut rolled_back = 0;
            for id in batch.entry_ids() {
                if state.store.remove(*id, &mut state.handles).is_some() {
                    rolled_back += 1;
                } else {
                    report.dropped.push(*id);
                }
            }

            let message = error.to_string();
            warn!(widget = %self.widget_id, batch = %batch.id(), rolled_back, "{}", message);
            state.last_error = Some(message.clone());

            Self::stage_if_changed(state, &before, &mut effects);
            effects.events.push(UploadEvent::BatchFailed {
                widget: self.widget_id.clone(),
                batch_id: batch.id().to_string(),
                message,
                rolled_back,
            });
        }

        self.deliver(effects);
        report
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if !state.disposed {
            state.disposed = true;
            state.handles.sweep();
        }
    }
}

// ============================================================================
// Pending Batch
// ============================================================================

/// Files accepted by [`UploadController::enqueue`] whose upload has not
/// resolved yet.
///
/// Dropping it without awaiting [`upload`](Self::upload) to completion (never
/// calling it, or cancelling the future) rolls the batch back.
#[must_use = "dropping a pending batch rolls it back"]
pub struct PendingBatch {
    shared: Arc<Shared>,
    batch: Batch,
    files: Vec<FilePayload>,
    settled: bool,
}

impl PendingBatch {
    pub fn id(&self) -> BatchId {
        self.batch.id()
    }

    pub fn entry_ids(&self) -> &[EntryId] {
        self.batch.entry_ids()
    }

    pub fn status(&self) -> BatchStatus {
        self.batch.status()
    }

    /// Send the files to the transport and apply the result.
    pub async fn upload(mut self) -> BatchReport {
        let files = std::mem::take(&mut self.files);
        let expected = files.len();
        if let Err(e) = self.batch.start() {
            warn!(widget = %self.shared.widget_id, "{}", e);
        }

        debug!(
            widget = %self.shared.widget_id,
            batch = %self.batch.id(),
            files = expected,
            "Submitting upload batch"
        );

        let outcome = match self.shared.transport.upload(files).await {
            Ok(body) => extract_urls(
                &body,
                expected,
                &self.shared.config.url_fields,
                &self.shared.config.list_fields,
            ),
            Err(e) => Err(BatchUploadError::Transport(e.to_string())),
        };

        self.settled = true;
        match outcome {
            Ok(urls) => self.shared.commit(&mut self.batch, urls),
            Err(error) => self.shared.rollback(&mut self.batch, error),
        }
    }
}

impl Drop for PendingBatch {
    fn drop(&mut self) {
        if !self.settled {
            self.settled = true;
            self.shared
                .rollback(&mut self.batch, BatchUploadError::Cancelled);
        }
    }
}

impl std::fmt::Debug for PendingBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingBatch")
            .field("widget", &self.shared.widget_id)
            .field("batch", &self.batch)
            .field("files", &self.files.len())
            .finish()
    }
}

// ============================================================================
// Controller
// ============================================================================

#[derive(Clone)]
pub struct UploadController {
    shared: Arc<Shared>,
}

impl UploadController {
    pub fn builder(
        transport: Arc<dyn UploadTransport>,
        handles: Arc<dyn PreviewHandleProvider>,
    ) -> UploadControllerBuilder {
        UploadControllerBuilder::new(transport, handles)
    }

    /// Validate a selection and show accepted files as local previews.
    ///
    /// Rejected files are reported in the outcome and never touch the store.
    /// The surfaced error is reset at the start of every call and afterwards
    /// holds the last rejection message, if any.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::Disposed`] after [`dispose`](Self::dispose).
    pub fn enqueue(&self, files: Vec<FilePayload>) -> Result<EnqueueOutcome> {
        let shared = &self.shared;
        let mut rejected = Vec::new();
        let mut events = Vec::new();

        let batch = {
            let mut guard = shared.state.lock();
            let state = &mut *guard;
            if state.disposed {
                return Err(UploadError::Disposed(shared.widget_id.clone()));
            }
            state.last_error = None;

            let (candidates, invalid) = shared.validator.partition(files, state.store.len());
            rejected.extend(
                invalid
                    .into_iter()
                    .map(|(file, error)| Rejection { file, error }),
            );

            let mut locals: Vec<LocalEntry> = Vec::new();
            let mut accepted_files = Vec::new();
            for file in candidates {
                match state.handles.acquire(&file) {
                    Ok(handle) => {
                        locals.push(LocalEntry {
                            id: EntryId::new(),
                            handle,
                            source: file.clone(),
                        });
                        accepted_files.push(file);
                    }
                    Err(e) => {
                        let error = ValidationError::PreviewUnavailable {
                            file: strip_path(&file.name).to_string(),
                            reason: e.to_string(),
                        };
                        rejected.push(Rejection { file, error });
                    }
                }
            }

            for rejection in &rejected {
                warn!(widget = %shared.widget_id, "{}", rejection.error);
            }
            state.last_error = rejected.last().map(|r| r.error.to_string());
            if !rejected.is_empty() {
                events.push(UploadEvent::FilesRejected {
                    widget: shared.widget_id.clone(),
                    files: rejected
                        .iter()
                        .map(|r| RejectedFile {
                            name: strip_path(&r.file.name).to_string(),
                            message: r.error.to_string(),
                        })
                        .collect(),
                });
            }

            if locals.is_empty() {
                None
            } else {
                let handles: Vec<PreviewHandle> = locals.iter().map(|l| l.handle.clone()).collect();
                let ids: Vec<EntryId> = locals.iter().map(|l| l.id).collect();

                if let Err(e) = state.gate.begin_upload() {
                    release_all(&mut state.handles, &handles);
                    return Err(e);
                }
                if let Err(e) = state.store.append_local(locals) {
                    release_all(&mut state.handles, &handles);
                    state.gate.finish_upload().ok();
                    return Err(e.into());
                }

                let batch = Batch::new(ids);
                debug!(
                    widget = %shared.widget_id,
                    batch = %batch.id(),
                    entries = batch.len(),
                    "Local previews created"
                );
                events.push(UploadEvent::BatchStarted {
                    widget: shared.widget_id.clone(),
                    batch_id: batch.id().to_string(),
                    entry_ids: batch.entry_ids().iter().map(|id| id.to_string()).collect(),
                });
                Some((batch, accepted_files))
            }
        };

        shared.deliver(Effects { emit: None, events });

        Ok(EnqueueOutcome {
            rejected,
            batch: batch.map(|(batch, files)| PendingBatch {
                shared: Arc::clone(shared),
                batch,
                files,
                settled: false,
            }),
        })
    }

    /// Enqueue a selection and upload it.
    #[instrument(skip(self, files), fields(widget = %self.shared.widget_id, files = files.len()))]
    pub async fn add_files(&self, files: Vec<FilePayload>) -> Result<AddFilesOutcome> {
        let outcome = self.enqueue(files)?;
        let report = match outcome.batch {
            Some(batch) => Some(batch.upload().await),
            None => None,
        };

        Ok(AddFilesOutcome {
            rejected: outcome.rejected,
            report,
        })
    }

    /// Remove one entry. Committed entries leave the emitted value; local
    /// entries have their handle released and their upload result ignored.
    ///
    /// Returns `false` if no entry has that id.
    pub fn remove(&self, id: EntryId) -> Result<bool> {
        let mut effects = Effects::default();
        let removed = {
            let mut guard = self.shared.state.lock();
            let state = &mut *guard;
            if state.disposed {
                return Err(UploadError::Disposed(self.shared.widget_id.clone()));
            }

            let before = state.store.committed_urls();
            let removed = state.store.remove(id, &mut state.handles);
            if let Some(entry) = &removed {
                debug!(widget = %self.shared.widget_id, entry = %id, local = entry.is_local(), "Entry removed");
                Shared::stage_if_changed(state, &before, &mut effects);
            }
            removed.is_some()
        };

        self.shared.deliver(effects);
        Ok(removed)
    }

    /// Offer a new canonical value from the owner.
    ///
    /// The store is rebuilt only when no upload is in flight and the value is
    /// not this widget's own last emission. Deferred values are not replayed.
    pub fn set_value(&self, urls: Vec<String>) -> Result<GateDecision> {
        let mut effects = Effects::default();
        let decision = {
            let mut guard = self.shared.state.lock();
            let state = &mut *guard;
            if state.disposed {
                return Err(UploadError::Disposed(self.shared.widget_id.clone()));
            }

            let decision = state.gate.evaluate(&urls);
            debug!(widget = %self.shared.widget_id, ?decision, urls = urls.len(), "External value received");

            if decision == GateDecision::Rebuild {
                state.gate.begin_rebuild()?;
                let entries = rebuild(&self.shared, state, &urls);
                state.gate.finish_rebuild()?;

                Shared::stage_emission(state, &mut effects);
                effects.events.push(UploadEvent::Rebuilt {
                    widget: self.shared.widget_id.clone(),
                    entries,
                });
            }
            decision
        };

        self.shared.deliver(effects);
        Ok(decision)
    }

    /// Tear down: release every remaining handle. Later upload responses are
    /// ignored. Returns the number of handles released; only the first call
    /// releases anything.
    pub fn dispose(&self) -> usize {
        let mut state = self.shared.state.lock();
        if state.disposed {
            return 0;
        }
        state.disposed = true;
        let released = state.handles.sweep();
        info!(widget = %self.shared.widget_id, released, "Upload widget disposed");
        released
    }

    pub fn items(&self) -> Vec<PreviewItem> {
        self.shared.state.lock().store.items()
    }

    pub fn entries(&self) -> Vec<PreviewEntry> {
        self.shared.state.lock().store.entries().to_vec()
    }

    pub fn committed_urls(&self) -> Vec<String> {
        self.shared.state.lock().store.committed_urls()
    }

    pub fn len(&self) -> usize {
        self.shared.state.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn remaining_slots(&self) -> usize {
        self.shared
            .config
            .max_file_count
            .saturating_sub(self.len())
    }

    /// Whether any batch is in flight
    pub fn is_uploading(&self) -> bool {
        self.shared.state.lock().gate.in_flight() > 0
    }

    pub fn is_entry_uploading(&self, id: EntryId) -> bool {
        self.shared
            .state
            .lock()
            .store
            .get(id)
            .is_some_and(PreviewEntry::is_local)
    }

    pub fn last_error(&self) -> Option<String> {
        self.shared.state.lock().last_error.clone()
    }

    pub fn clear_error(&self) {
        self.shared.state.lock().last_error = None;
    }

    pub fn helper_text(&self) -> String {
        self.shared.config.helper_text()
    }

    pub fn config(&self) -> &UploadConfig {
        &self.shared.config
    }

    pub fn status(&self) -> SyncStatus {
        self.shared.state.lock().gate.status()
    }

    pub fn widget_id(&self) -> &str {
        &self.shared.widget_id
    }

    pub fn live_handle_count(&self) -> usize {
        self.shared.state.lock().handles.live_count()
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.state.lock().disposed
    }
}

impl std::fmt::Debug for UploadController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("UploadController")
            .field("widget_id", &self.shared.widget_id)
            .field("entries", &state.store.len())
            .field("status", &state.gate.status())
            .field("disposed", &state.disposed)
            .finish()
    }
}

fn release_all(registry: &mut HandleRegistry, handles: &[PreviewHandle]) {
    for handle in handles {
        registry.release(handle);
    }
}

/// Replace the store with `urls`, truncated to the file limit.
fn rebuild(shared: &Shared, state: &mut State, urls: &[String]) -> usize {
    let limit = shared.config.max_file_count;
    if urls.len() > limit {
        warn!(
            widget = %shared.widget_id,
            received = urls.len(),
            limit,
            "External value exceeds the file limit, extra URLs dropped"
        );
    }
    state.store.rebuild_from(urls, &mut state.handles)
}

// ============================================================================
// Builder
// ============================================================================

pub struct UploadControllerBuilder {
    transport: Arc<dyn UploadTransport>,
    handles: Arc<dyn PreviewHandleProvider>,
    config: UploadConfig,
    initial_value: Vec<String>,
    on_change: Option<ChangeCallback>,
    events: Option<EventBus>,
    widget_id: Option<String>,
}

impl UploadControllerBuilder {
    fn new(transport: Arc<dyn UploadTransport>, handles: Arc<dyn PreviewHandleProvider>) -> Self {
        Self {
            transport,
            handles,
            config: UploadConfig::default(),
            initial_value: Vec::new(),
            on_change: None,
            events: None,
            widget_id: None,
        }
    }

    pub fn config(mut self, config: UploadConfig) -> Self {
        self.config = config;
        self
    }

    /// URLs the widget starts with. Loading them does not call `on_change`,
    /// and offering the same list again through `set_value` is an echo.
    pub fn initial_value(mut self, urls: Vec<String>) -> Self {
        self.initial_value = urls;
        self
    }

    pub fn on_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(Vec<String>) + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(callback));
        self
    }

    pub fn event_bus(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    /// Identifies this widget in logs and events. Defaults to a random UUID.
    pub fn widget_id(mut self, id: impl Into<String>) -> Self {
        self.widget_id = Some(id.into());
        self
    }

    /// # Errors
    ///
    /// Fails if the configuration does not validate.
    pub fn build(self) -> Result<UploadController> {
        self.config.validate()?;

        let shared = Shared {
            widget_id: self
                .widget_id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            validator: ValidationGate::new(&self.config),
            transport: self.transport,
            on_change: self.on_change,
            events: self.events,
            state: Mutex::new(State {
                store: PreviewStore::new(self.config.max_file_count),
                handles: HandleRegistry::new(self.handles),
                gate: SyncGate::new(),
                last_error: None,
                disposed: false,
            }),
            config: self.config,
        };

        {
            let mut guard = shared.state.lock();
            let state = &mut *guard;
            if !self.initial_value.is_empty() {
                rebuild(&shared, state, &self.initial_value);
            }
            let urls = state.store.committed_urls();
            state.gate.record_emission(&urls);
        }

        debug!(widget = %shared.widget_id, "Upload controller created");
        Ok(UploadController {
            shared: Arc::new(shared),
        })
    }
}
