//! # Upload Batches
//!
//! One batch is the set of files accepted from a single selection and sent to
//! the transport in one call. It owns the ids of the entries it created and
//! nothing else; commit and rollback touch only those ids.
//!
//! ## State Machine
//!
//! ```text
//! Pending ──► InFlight ──► Committed
//!    │            │
//!    └────────────┴──────► Failed
//! ```
//!
//! `Committed` and `Failed` are terminal. A batch dropped before it was
//! submitted goes straight from `Pending` to `Failed`.

use crate::entry::{BatchId, EntryId};
use crate::error::{BatchUploadError, Result, UploadError};
use serde::{Deserialize, Serialize};

// ============================================================================
// Batch Status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Entries are visible, transport not called yet
    Pending,
    /// Transport call outstanding
    InFlight,
    /// Every surviving entry was promoted
    Committed,
    /// Entries were rolled back
    Failed,
}

impl BatchStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchStatus::Committed | BatchStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Pending => "pending",
            BatchStatus::InFlight => "in_flight",
            BatchStatus::Committed => "committed",
            BatchStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Batch
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    id: BatchId,
    entry_ids: Vec<EntryId>,
    status: BatchStatus,
}

impl Batch {
    pub fn new(entry_ids: Vec<EntryId>) -> Self {
        Self {
            id: BatchId::new(),
            entry_ids,
            status: BatchStatus::Pending,
        }
    }

    pub fn id(&self) -> BatchId {
        self.id
    }

    /// Entry ids in selection order; result descriptors map onto these 1:1
    pub fn entry_ids(&self) -> &[EntryId] {
        &self.entry_ids
    }

    pub fn len(&self) -> usize {
        self.entry_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entry_ids.is_empty()
    }

    pub fn status(&self) -> BatchStatus {
        self.status
    }

    pub fn start(&mut self) -> Result<()> {
        self.transition(BatchStatus::InFlight)
    }

    pub fn complete(&mut self) -> Result<()> {
        self.transition(BatchStatus::Committed)
    }

    pub fn fail(&mut self) -> Result<()> {
        self.transition(BatchStatus::Failed)
    }

    fn transition(&mut self, to: BatchStatus) -> Result<()> {
        let valid = match (self.status, to) {
            (BatchStatus::Pending, BatchStatus::InFlight) => true,
            (BatchStatus::Pending, BatchStatus::Failed) => true,

            (BatchStatus::InFlight, BatchStatus::Committed) => true,
            (BatchStatus::InFlight, BatchStatus::Failed) => true,

            _ => false,
        };

        if !valid {
            return Err(UploadError::InvalidStateTransition {
                from: self.status.as_str().to_string(),
                to: to.as_str().to_string(),
                reason: format!("batch {} cannot move from {} to {}", self.id, self.status, to),
            });
        }

        self.status = to;
        Ok(())
    }
}

// ============================================================================
// Batch Report
// ============================================================================

/// Outcome of one batch, handed back to whoever drove the upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub batch_id: BatchId,
    pub status: BatchStatus,
    /// Entries promoted to committed
    pub committed: Vec<EntryId>,
    /// Entries removed by the user before the response arrived
    pub dropped: Vec<EntryId>,
    pub error: Option<BatchUploadError>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.status == BatchStatus::Committed
    }
}
