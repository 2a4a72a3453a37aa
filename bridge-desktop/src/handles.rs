//! In-memory preview handles
//!
//! Desktop shells have no object-URL facility, so handles are synthetic
//! `blob:` strings backed by a map the renderer can resolve.

use bridge_traits::{
    error::Result,
    handle::{PreviewHandle, PreviewHandleProvider},
    upload::FilePayload,
};
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::trace;
use uuid::Uuid;

const HANDLE_SCHEME: &str = "blob:tripmate/";

#[derive(Default)]
pub struct MemoryPreviewHandles {
    live: Mutex<HashMap<PreviewHandle, Bytes>>,
}

impl MemoryPreviewHandles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes behind a live handle, `None` once revoked
    pub fn resolve(&self, handle: &PreviewHandle) -> Option<Bytes> {
        self.live.lock().get(handle).cloned()
    }

    /// Number of handles not yet revoked
    pub fn live_count(&self) -> usize {
        self.live.lock().len()
    }
}

impl PreviewHandleProvider for MemoryPreviewHandles {
    fn create(&self, file: &FilePayload) -> Result<PreviewHandle> {
        let handle = PreviewHandle::new(format!("{}{}", HANDLE_SCHEME, Uuid::new_v4()));
        trace!(handle = %handle, file = %file.name, "Created preview handle");
        self.live.lock().insert(handle.clone(), file.data.clone());
        Ok(handle)
    }

    fn revoke(&self, handle: &PreviewHandle) {
        if self.live.lock().remove(handle).is_some() {
            trace!(handle = %handle, "Revoked preview handle");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_resolve() {
        let handles = MemoryPreviewHandles::new();
        let file = FilePayload::new("a.png", "image/png", vec![1u8, 2, 3]);

        let handle = handles.create(&file).unwrap();
        assert!(handle.as_str().starts_with(HANDLE_SCHEME));
        assert_eq!(handles.resolve(&handle), Some(Bytes::from(vec![1u8, 2, 3])));
        assert_eq!(handles.live_count(), 1);
    }

    #[test]
    fn test_revoke_is_idempotent() {
        let handles = MemoryPreviewHandles::new();
        let file = FilePayload::new("a.png", "image/png", vec![1u8]);
        let handle = handles.create(&file).unwrap();

        handles.revoke(&handle);
        handles.revoke(&handle);

        assert_eq!(handles.resolve(&handle), None);
        assert_eq!(handles.live_count(), 0);
    }

    #[test]
    fn test_handles_are_unique() {
        let handles = MemoryPreviewHandles::new();
        let file = FilePayload::new("a.png", "image/png", vec![1u8]);

        let first = handles.create(&file).unwrap();
        let second = handles.create(&file).unwrap();
        assert_ne!(first, second);
    }
}
