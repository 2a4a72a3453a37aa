//! # Preview Handle Registry
//!
//! Per-widget arena of live preview handles on top of the host's
//! [`PreviewHandleProvider`].
//!
//! Every handle the widget obtains is released exactly once, through one of:
//! promotion of its entry, explicit removal, batch rollback, or the teardown
//! sweep. The registry makes the second release of a handle a no-op, so those
//! paths never need to coordinate with each other.

use bridge_traits::{BridgeError, FilePayload, PreviewHandle, PreviewHandleProvider};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, trace};

pub struct HandleRegistry {
    provider: Arc<dyn PreviewHandleProvider>,
    live: HashSet<PreviewHandle>,
    swept: bool,
}

impl HandleRegistry {
    pub fn new(provider: Arc<dyn PreviewHandleProvider>) -> Self {
        Self {
            provider,
            live: HashSet::new(),
            swept: false,
        }
    }

    /// Create and register a handle for `file`
    ///
    /// # Errors
    ///
    /// Fails if the registry was already swept or the provider cannot create
    /// a handle.
    pub fn acquire(&mut self, file: &FilePayload) -> Result<PreviewHandle, BridgeError> {
        if self.swept {
            return Err(BridgeError::NotAvailable(
                "preview handles are no longer available after teardown".to_string(),
            ));
        }

        let handle = self.provider.create(file)?;
        trace!(handle = %handle, "Acquired preview handle");
        self.live.insert(handle.clone());
        Ok(handle)
    }

    /// Revoke a handle if it is still registered.
    ///
    /// Returns `true` if this call released it, `false` for unknown or
    /// already-released handles.
    pub fn release(&mut self, handle: &PreviewHandle) -> bool {
        if !self.live.remove(handle) {
            return false;
        }
        self.provider.revoke(handle);
        trace!(handle = %handle, "Released preview handle");
        true
    }

    /// Release every handle still registered. Only the first call does work.
    pub fn sweep(&mut self) -> usize {
        if self.swept {
            return 0;
        }
        self.swept = true;

        let released = self.live.len();
        for handle in self.live.drain() {
            self.provider.revoke(&handle);
        }
        debug!(released, "Swept preview handles");
        released
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_swept(&self) -> bool {
        self.swept
    }
}

impl std::fmt::Debug for HandleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleRegistry")
            .field("live", &self.live.len())
            .field("swept", &self.swept)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use mockall::predicate::eq;

    mock! {
        Provider {}

        impl PreviewHandleProvider for Provider {
            fn create(&self, file: &FilePayload) -> bridge_traits::error::Result<PreviewHandle>;
            fn revoke(&self, handle: &PreviewHandle);
        }
    }

    fn file() -> FilePayload {
        FilePayload::new("a.png", "image/png", vec![0u8; 8])
    }

    #[test]
    fn test_release_twice_is_noop() {
        let mut provider = MockProvider::new();
        provider
            .expect_create()
            .returning(|_| Ok(PreviewHandle::new("blob:1")));
        provider
            .expect_revoke()
            .with(eq(PreviewHandle::new("blob:1")))
            .times(1)
            .return_const(());

        let mut registry = HandleRegistry::new(Arc::new(provider));
        let handle = registry.acquire(&file()).unwrap();

        assert!(registry.release(&handle));
        assert!(!registry.release(&handle));
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_release_unknown_handle_is_noop() {
        let mut provider = MockProvider::new();
        provider.expect_revoke().times(0);

        let mut registry = HandleRegistry::new(Arc::new(provider));
        assert!(!registry.release(&PreviewHandle::new("blob:never-issued")));
    }

    #[test]
    fn test_sweep_runs_once() {
        let mut provider = MockProvider::new();
        let mut next = 0;
        provider.expect_create().times(2).returning(move |_| {
            next += 1;
            Ok(PreviewHandle::new(format!("blob:{}", next)))
        });
        provider.expect_revoke().times(2).return_const(());

        let mut registry = HandleRegistry::new(Arc::new(provider));
        registry.acquire(&file()).unwrap();
        registry.acquire(&file()).unwrap();

        assert_eq!(registry.sweep(), 2);
        assert_eq!(registry.sweep(), 0);
        assert!(registry.is_swept());
    }

    #[test]
    fn test_released_handle_not_swept_again() {
        let mut provider = MockProvider::new();
        provider
            .expect_create()
            .returning(|_| Ok(PreviewHandle::new("blob:1")));
        provider.expect_revoke().times(1).return_const(());

        let mut registry = HandleRegistry::new(Arc::new(provider));
        let handle = registry.acquire(&file()).unwrap();
        registry.release(&handle);

        assert_eq!(registry.sweep(), 0);
    }

    #[test]
    fn test_acquire_after_sweep_fails() {
        let mut provider = MockProvider::new();
        provider.expect_create().times(0);

        let mut registry = HandleRegistry::new(Arc::new(provider));
        registry.sweep();
        assert!(registry.acquire(&file()).is_err());
    }

    #[test]
    fn test_provider_failure_registers_nothing() {
        let mut provider = MockProvider::new();
        provider.expect_create().returning(|f| {
            Err(BridgeError::HandleUnavailable {
                file: f.name.clone(),
                reason: "out of memory".to_string(),
            })
        });

        let mut registry = HandleRegistry::new(Arc::new(provider));
        assert!(registry.acquire(&file()).is_err());
        assert_eq!(registry.live_count(), 0);
    }
}
