//! # Core Runtime Module
//!
//! Runtime infrastructure shared by the upload core:
//! - Upload widget configuration
//! - Logging and tracing infrastructure
//! - Event bus for upload lifecycle notifications
//!
//! ## Overview
//!
//! Nothing in here knows how uploads are reconciled. This crate only fixes the
//! conventions (limits, log layout, event shapes) that `core-upload` and the
//! host agree on.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
