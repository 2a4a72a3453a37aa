//! # External Sync Gate
//!
//! Decides whether an externally supplied URL list may replace the preview
//! store. Rebuilding is destructive: it drops local entries and their handles.
//! It is therefore allowed only while no upload is outstanding, and skipped
//! when the incoming value is just this widget's own last emission coming
//! back.
//!
//! ```text
//!            begin_upload            finish_upload (last)
//!   Idle ───────────────► UploadInFlight ───────────────► Idle
//!    │  ▲                   │  ▲
//!    │  │                   └──┘ begin_upload / finish_upload (others remain)
//!    │  └──────── finish_rebuild ────────┐
//!    └──────────► begin_rebuild ──► Rebuilding
//! ```

use crate::error::{Result, UploadError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Idle,
    UploadInFlight,
    Rebuilding,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Idle => "idle",
            SyncStatus::UploadInFlight => "upload_in_flight",
            SyncStatus::Rebuilding => "rebuilding",
        }
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do with an incoming external value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Replace the store with the value
    Rebuild,
    /// Value equals our own last emission; nothing to do
    Echo,
    /// An upload is outstanding; the value is ignored
    Deferred,
}

/// Canonical comparison key for a URL list.
pub fn signature(urls: &[String]) -> String {
    Value::from(urls.to_vec()).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncGate {
    status: SyncStatus,
    in_flight: usize,
    last_emitted: Option<String>,
}

impl Default for SyncGate {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncGate {
    pub fn new() -> Self {
        Self {
            status: SyncStatus::Idle,
            in_flight: 0,
            last_emitted: None,
        }
    }

    pub fn status(&self) -> SyncStatus {
        self.status
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn begin_upload(&mut self) -> Result<()> {
        self.transition(SyncStatus::UploadInFlight)?;
        self.in_flight += 1;
        Ok(())
    }

    pub fn finish_upload(&mut self) -> Result<()> {
        if self.in_flight == 0 {
            return Err(self.invalid(SyncStatus::Idle, "no upload is in flight"));
        }

        let next = if self.in_flight == 1 {
            SyncStatus::Idle
        } else {
            SyncStatus::UploadInFlight
        };
        self.transition(next)?;
        self.in_flight -= 1;
        Ok(())
    }

    pub fn begin_rebuild(&mut self) -> Result<()> {
        self.transition(SyncStatus::Rebuilding)
    }

    pub fn finish_rebuild(&mut self) -> Result<()> {
        if self.status != SyncStatus::Rebuilding {
            return Err(self.invalid(SyncStatus::Idle, "no rebuild is running"));
        }
        self.transition(SyncStatus::Idle)
    }

    /// Classify an incoming external value without changing state.
    pub fn evaluate(&self, urls: &[String]) -> GateDecision {
        if self.status != SyncStatus::Idle {
            return GateDecision::Deferred;
        }

        match &self.last_emitted {
            Some(last) if *last == signature(urls) => GateDecision::Echo,
            _ => GateDecision::Rebuild,
        }
    }

    /// Remember `urls` as the most recent value handed to the owner.
    pub fn record_emission(&mut self, urls: &[String]) {
        self.last_emitted = Some(signature(urls));
    }

    fn transition(&mut self, to: SyncStatus) -> Result<()> {
        let valid = match (self.status, to) {
            (SyncStatus::Idle, SyncStatus::UploadInFlight) => true,
            (SyncStatus::Idle, SyncStatus::Rebuilding) => true,

            (SyncStatus::UploadInFlight, SyncStatus::UploadInFlight) => true,
            (SyncStatus::UploadInFlight, SyncStatus::Idle) => true,

            (SyncStatus::Rebuilding, SyncStatus::Idle) => true,

            _ => false,
        };

        if !valid {
            let reason = format!("Cannot transition from {} to {}", self.status, to);
            return Err(self.invalid(to, &reason));
        }

        self.status = to;
        Ok(())
    }

    fn invalid(&self, to: SyncStatus, reason: &str) -> UploadError {
        UploadError::InvalidStateTransition {
            from: self.status.as_str().to_string(),
            to: to.as_str().to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_signature_is_order_sensitive() {
        assert_eq!(signature(&urls(&["a", "b"])), r#"["a","b"]"#);
        assert_ne!(signature(&urls(&["a", "b"])), signature(&urls(&["b", "a"])));
        assert_eq!(signature(&[]), "[]");
    }

    #[test]
    fn test_fresh_gate_rebuilds() {
        let gate = SyncGate::new();
        assert_eq!(gate.evaluate(&[]), GateDecision::Rebuild);
        assert_eq!(gate.evaluate(&urls(&["a"])), GateDecision::Rebuild);
    }

    #[test]
    fn test_echo_detection() {
        let mut gate = SyncGate::new();
        gate.record_emission(&urls(&["a", "b"]));

        assert_eq!(gate.evaluate(&urls(&["a", "b"])), GateDecision::Echo);
        assert_eq!(gate.evaluate(&urls(&["a"])), GateDecision::Rebuild);
    }

    #[test]
    fn test_in_flight_defers_everything() {
        let mut gate = SyncGate::new();
        gate.begin_upload().unwrap();
        gate.begin_upload().unwrap();
        assert_eq!(gate.status(), SyncStatus::UploadInFlight);
        assert_eq!(gate.in_flight(), 2);
        assert_eq!(gate.evaluate(&urls(&["x"])), GateDecision::Deferred);

        gate.finish_upload().unwrap();
        assert_eq!(gate.status(), SyncStatus::UploadInFlight);
        assert_eq!(gate.evaluate(&urls(&["x"])), GateDecision::Deferred);

        gate.finish_upload().unwrap();
        assert_eq!(gate.status(), SyncStatus::Idle);
        assert_eq!(gate.evaluate(&urls(&["x"])), GateDecision::Rebuild);
    }

    #[test]
    fn test_finish_without_begin_fails() {
        let mut gate = SyncGate::new();
        assert!(matches!(
            gate.finish_upload(),
            Err(UploadError::InvalidStateTransition { .. })
        ));
        assert!(gate.finish_rebuild().is_err());
    }

    #[test]
    fn test_rebuild_excludes_uploads() {
        let mut gate = SyncGate::new();
        gate.begin_upload().unwrap();
        assert!(gate.begin_rebuild().is_err());
        gate.finish_upload().unwrap();

        gate.begin_rebuild().unwrap();
        assert_eq!(gate.status(), SyncStatus::Rebuilding);
        assert!(gate.begin_upload().is_err());
        gate.finish_rebuild().unwrap();
        assert_eq!(gate.status(), SyncStatus::Idle);
    }
}
