//! Workspace placeholder crate.
//!
//! Re-exports the upload core and, with the `desktop-shims` feature, the
//! desktop bridge implementations, so a host application can depend on
//! `tripmate-workspace` alone.

pub use bridge_traits;
pub use core_runtime;
pub use core_upload;

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop;
