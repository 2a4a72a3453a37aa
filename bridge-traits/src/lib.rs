//! # Host Bridge Traits
//!
//! Capability contracts the upload core needs from its host.
//!
//! ## Overview
//!
//! The core library owns the upload synchronization logic but none of the
//! platform plumbing. Everything that differs per host (how bytes reach the
//! storage backend, how a local preview is addressed, where logs go) is
//! expressed as a trait here and injected at construction time.
//!
//! ## Traits
//!
//! - [`UploadTransport`](upload::UploadTransport) - Submit a batch of files, get the raw response back
//! - [`PreviewHandleProvider`](handle::PreviewHandleProvider) - Create and revoke ephemeral preview handles
//! - [`LoggerSink`](log::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Available |
//! | Web      | TBD                 | 📋 Planned |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform errors into it and keep messages actionable, since
//! upload failures end up in front of the user.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so one capability instance can be
//! shared by every upload widget on a page.

pub mod error;
pub mod handle;
pub mod log;
pub mod upload;

pub use error::BridgeError;

pub use handle::{PreviewHandle, PreviewHandleProvider};
pub use log::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use upload::{FilePayload, UploadTransport};
