//! # Optimistic Upload Core
//!
//! Keeps a multi-file upload widget consistent while uploads run in the
//! background.
//!
//! ## Overview
//!
//! Selected files appear immediately as local previews. Each selection is sent
//! to the host's transport as one batch; when the batch resolves, its entries
//! are promoted to committed URLs in place or rolled back as a unit. Meanwhile
//! the owner of the value may push a new URL list, which only replaces the
//! previews when that cannot destroy work in progress.
//!
//! ## Components
//!
//! - **Entries** (`entry`): local and committed preview entries, ids
//! - **Handle Registry** (`handles`): live preview handles, released exactly once
//! - **Validation Gate** (`validation`): type, size and count checks
//! - **Preview Store** (`store`): ordered entries, addressed by id
//! - **Batch State Machine** (`batch`): lifecycle of one upload batch
//! - **Response Parsing** (`response`): URLs out of transport responses
//! - **Sync Gate** (`gate`): when an external value may rebuild the store
//! - **Upload Controller** (`controller`): one widget instance tying it together

pub mod batch;
pub mod controller;
pub mod entry;
pub mod error;
pub mod gate;
pub mod handles;
pub mod response;
pub mod store;
pub mod validation;

pub use batch::{Batch, BatchReport, BatchStatus};
pub use controller::{
    AddFilesOutcome, ChangeCallback, EnqueueOutcome, PendingBatch, Rejection, UploadController,
    UploadControllerBuilder,
};
pub use entry::{BatchId, CommittedEntry, EntryId, LocalEntry, PreviewEntry, PreviewItem};
pub use error::{BatchUploadError, Result, StoreError, UploadError, ValidationError};
pub use gate::{GateDecision, SyncGate, SyncStatus};
pub use handles::HandleRegistry;
pub use response::extract_urls;
pub use store::PreviewStore;
pub use validation::{MimePattern, ValidationGate};
