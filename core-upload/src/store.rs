//! # Local Preview Store
//!
//! Ordered list of preview entries; the single state a widget renders.
//!
//! Positions are assigned once, when entries are appended. Promotion swaps an
//! entry's variant where it stands and removal closes the gap, so relative
//! order never changes. `promote` and `remove` address entries by id: several
//! batches may resolve in any order, and indices do not survive that.

use crate::entry::{CommittedEntry, EntryId, LocalEntry, PreviewEntry, PreviewItem};
use crate::error::StoreError;
use crate::handles::HandleRegistry;

#[derive(Debug)]
pub struct PreviewStore {
    entries: Vec<PreviewEntry>,
    capacity: usize,
}

impl PreviewStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    /// Append freshly validated local entries at the end.
    ///
    /// # Errors
    ///
    /// Refuses the whole append if it would exceed the capacity.
    pub fn append_local(&mut self, entries: Vec<LocalEntry>) -> Result<(), StoreError> {
        let requested = self.entries.len() + entries.len();
        if requested > self.capacity {
            return Err(StoreError::CapacityExceeded {
                capacity: self.capacity,
                requested,
            });
        }

        self.entries
            .extend(entries.into_iter().map(PreviewEntry::Local));
        Ok(())
    }

    /// Turn a local entry into a committed one in place, releasing its handle.
    ///
    /// Returns `false` if the entry is gone (removed while uploading) or is
    /// already committed.
    pub fn promote(&mut self, id: EntryId, url: String, handles: &mut HandleRegistry) -> bool {
        let Some(slot) = self.entries.iter_mut().find(|e| e.id() == id) else {
            return false;
        };

        let PreviewEntry::Local(local) = slot else {
            return false;
        };

        handles.release(&local.handle);
        *slot = PreviewEntry::Committed(CommittedEntry { id, url });
        true
    }

    /// Remove an entry, releasing its handle if it was local.
    pub fn remove(&mut self, id: EntryId, handles: &mut HandleRegistry) -> Option<PreviewEntry> {
        let index = self.position(id)?;
        let entry = self.entries.remove(index);
        if let PreviewEntry::Local(local) = &entry {
            handles.release(&local.handle);
        }
        Some(entry)
    }

    /// Replace everything with committed entries built from `urls`.
    ///
    /// Local entries among the discarded ones have their handles released.
    /// URLs beyond the capacity are dropped. Returns the number of entries now
    /// held.
    pub fn rebuild_from(&mut self, urls: &[String], handles: &mut HandleRegistry) -> usize {
        for entry in self.entries.drain(..) {
            if let PreviewEntry::Local(local) = entry {
                handles.release(&local.handle);
            }
        }

        self.entries = urls
            .iter()
            .take(self.capacity)
            .map(|url| {
                PreviewEntry::Committed(CommittedEntry {
                    id: EntryId::new(),
                    url: url.clone(),
                })
            })
            .collect();
        self.entries.len()
    }

    /// URLs of committed entries, in display order
    pub fn committed_urls(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|e| e.url().map(str::to_string))
            .collect()
    }

    pub fn local_ids(&self) -> Vec<EntryId> {
        self.entries
            .iter()
            .filter(|e| e.is_local())
            .map(PreviewEntry::id)
            .collect()
    }

    pub fn get(&self, id: EntryId) -> Option<&PreviewEntry> {
        self.entries.iter().find(|e| e.id() == id)
    }

    pub fn position(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id() == id)
    }

    pub fn entries(&self) -> &[PreviewEntry] {
        &self.entries
    }

    pub fn items(&self) -> Vec<PreviewItem> {
        self.entries.iter().map(PreviewItem::from).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::{FilePayload, PreviewHandle, PreviewHandleProvider};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Counts revocations per handle
    #[derive(Default)]
    struct CountingProvider {
        next: Mutex<usize>,
        revoked: Mutex<Vec<PreviewHandle>>,
    }

    impl PreviewHandleProvider for CountingProvider {
        fn create(&self, _file: &FilePayload) -> bridge_traits::error::Result<PreviewHandle> {
            let mut next = self.next.lock();
            *next += 1;
            Ok(PreviewHandle::new(format!("blob:{}", next)))
        }

        fn revoke(&self, handle: &PreviewHandle) {
            self.revoked.lock().push(handle.clone());
        }
    }

    fn setup(capacity: usize) -> (PreviewStore, HandleRegistry, Arc<CountingProvider>) {
        let provider = Arc::new(CountingProvider::default());
        let registry = HandleRegistry::new(provider.clone());
        (PreviewStore::new(capacity), registry, provider)
    }

    fn local(handles: &mut HandleRegistry) -> LocalEntry {
        let source = FilePayload::new("a.png", "image/png", vec![1u8]);
        LocalEntry {
            id: EntryId::new(),
            handle: handles.acquire(&source).unwrap(),
            source,
        }
    }

    #[test]
    fn test_append_respects_capacity() {
        let (mut store, mut handles, _) = setup(2);
        let entries = vec![local(&mut handles), local(&mut handles), local(&mut handles)];

        let err = store.append_local(entries).unwrap_err();
        assert_eq!(
            err,
            StoreError::CapacityExceeded {
                capacity: 2,
                requested: 3
            }
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_promote_keeps_position() {
        let (mut store, mut handles, provider) = setup(5);
        let entries = vec![local(&mut handles), local(&mut handles), local(&mut handles)];
        let ids: Vec<_> = entries.iter().map(|e| e.id).collect();
        store.append_local(entries).unwrap();

        assert!(store.promote(ids[1], "https://cdn/b.png".to_string(), &mut handles));

        assert_eq!(store.position(ids[0]), Some(0));
        assert_eq!(store.position(ids[1]), Some(1));
        assert_eq!(store.position(ids[2]), Some(2));
        assert!(store.entries()[0].is_local());
        assert!(!store.entries()[1].is_local());
        assert!(store.entries()[2].is_local());
        assert_eq!(store.committed_urls(), vec!["https://cdn/b.png".to_string()]);
        assert_eq!(provider.revoked.lock().len(), 1);
    }

    #[test]
    fn test_promote_missing_or_committed_is_noop() {
        let (mut store, mut handles, provider) = setup(5);
        let entry = local(&mut handles);
        let id = entry.id;
        store.append_local(vec![entry]).unwrap();

        assert!(store.promote(id, "https://cdn/a.png".to_string(), &mut handles));
        assert!(!store.promote(id, "https://cdn/other.png".to_string(), &mut handles));
        assert!(!store.promote(EntryId::new(), "https://cdn/x.png".to_string(), &mut handles));

        assert_eq!(store.committed_urls(), vec!["https://cdn/a.png".to_string()]);
        assert_eq!(provider.revoked.lock().len(), 1);
    }

    #[test]
    fn test_remove_releases_local_handle() {
        let (mut store, mut handles, provider) = setup(5);
        let entry = local(&mut handles);
        let id = entry.id;
        store.append_local(vec![entry]).unwrap();

        let removed = store.remove(id, &mut handles).unwrap();
        assert!(removed.is_local());
        assert!(store.remove(id, &mut handles).is_none());
        assert_eq!(provider.revoked.lock().len(), 1);
        assert_eq!(handles.live_count(), 0);
    }

    #[test]
    fn test_remove_closes_gap_without_reordering() {
        let (mut store, mut handles, _) = setup(5);
        let entries = vec![local(&mut handles), local(&mut handles), local(&mut handles)];
        let ids: Vec<_> = entries.iter().map(|e| e.id).collect();
        store.append_local(entries).unwrap();

        store.remove(ids[0], &mut handles);

        assert_eq!(store.position(ids[1]), Some(0));
        assert_eq!(store.position(ids[2]), Some(1));
    }

    #[test]
    fn test_rebuild_releases_and_replaces() {
        let (mut store, mut handles, provider) = setup(5);
        store
            .append_local(vec![local(&mut handles), local(&mut handles)])
            .unwrap();

        let urls = vec!["https://cdn/a.png".to_string(), "https://cdn/b.png".to_string()];
        assert_eq!(store.rebuild_from(&urls, &mut handles), 2);

        assert_eq!(store.committed_urls(), urls);
        assert!(store.local_ids().is_empty());
        assert_eq!(provider.revoked.lock().len(), 2);
        assert_eq!(handles.live_count(), 0);
    }

    #[test]
    fn test_rebuild_truncates_to_capacity() {
        let (mut store, mut handles, _) = setup(2);
        let urls: Vec<String> = (0..4).map(|i| format!("https://cdn/{}.png", i)).collect();

        assert_eq!(store.rebuild_from(&urls, &mut handles), 2);
        assert_eq!(store.committed_urls(), urls[..2].to_vec());
    }
}
