//! Ephemeral Preview Handles
//!
//! A preview handle is a short-lived local reference to in-memory file data,
//! usable for immediate display before the upload finishes (a `blob:` object
//! URL in a browser, a texture id in a native shell). Handles are never
//! persisted and must be revoked once the preview no longer needs them.

use crate::error::Result;
use crate::upload::FilePayload;

/// Opaque handle string produced by a [`PreviewHandleProvider`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PreviewHandle(String);

impl PreviewHandle {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PreviewHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Factory for ephemeral preview handles.
///
/// The core keeps its own registry on top of this trait and guarantees that
/// each handle it obtained is revoked exactly once. Implementations may still
/// treat an unknown handle in [`revoke`](PreviewHandleProvider::revoke) as a
/// no-op.
pub trait PreviewHandleProvider: Send + Sync {
    /// Create a handle pointing at the payload's bytes
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::HandleUnavailable`](crate::BridgeError::HandleUnavailable)
    /// when the host cannot allocate a handle for this file.
    fn create(&self, file: &FilePayload) -> Result<PreviewHandle>;

    /// Revoke a handle previously returned by `create`
    fn revoke(&self, handle: &PreviewHandle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_display() {
        let handle = PreviewHandle::new("blob:tripmate/1");
        assert_eq!(handle.to_string(), "blob:tripmate/1");
        assert_eq!(handle.as_str(), "blob:tripmate/1");
    }
}
