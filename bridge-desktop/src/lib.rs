//! # Desktop Bridge Implementations
//!
//! Default implementations of the upload bridge traits for desktop shells
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `UploadTransport` using `reqwest` multipart uploads
//! - `PreviewHandleProvider` using an in-memory handle map
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{MemoryPreviewHandles, ReqwestUploadTransport};
//! use std::sync::Arc;
//!
//! let transport = Arc::new(ReqwestUploadTransport::new("https://api.tripmate.app/uploads")?);
//! let handles = Arc::new(MemoryPreviewHandles::new());
//! // hand both to core_upload::UploadController::builder(...)
//! ```

mod handles;
mod upload;

pub use handles::MemoryPreviewHandles;
pub use upload::{ReqwestUploadTransport, DEFAULT_FILE_FIELD};
