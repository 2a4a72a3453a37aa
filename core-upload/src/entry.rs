//! Preview entries
//!
//! An entry is either a local preview of a file that has not reached storage
//! yet, or a committed reference to a stored file. The two shapes are separate
//! variants so a committed entry cannot carry a preview handle.

use bridge_traits::{FilePayload, PreviewHandle};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of one logical item across its Local → Committed transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(Uuid);

impl EntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one upload batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(Uuid);

impl BatchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A file shown from its local bytes while its upload is outstanding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEntry {
    pub id: EntryId,
    pub handle: PreviewHandle,
    pub source: FilePayload,
}

/// A file durably stored and addressed by its remote URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedEntry {
    pub id: EntryId,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewEntry {
    Local(LocalEntry),
    Committed(CommittedEntry),
}

impl PreviewEntry {
    pub fn id(&self) -> EntryId {
        match self {
            PreviewEntry::Local(entry) => entry.id,
            PreviewEntry::Committed(entry) => entry.id,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, PreviewEntry::Local(_))
    }

    /// Remote URL, only for committed entries
    pub fn url(&self) -> Option<&str> {
        match self {
            PreviewEntry::Local(_) => None,
            PreviewEntry::Committed(entry) => Some(&entry.url),
        }
    }

    /// What a renderer should point an `<img>` (or equivalent) at
    pub fn source(&self) -> &str {
        match self {
            PreviewEntry::Local(entry) => entry.handle.as_str(),
            PreviewEntry::Committed(entry) => &entry.url,
        }
    }
}

/// Render-ready projection of an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewItem {
    pub id: EntryId,
    pub source: String,
    /// Drives the per-item progress indicator
    pub uploading: bool,
}

impl From<&PreviewEntry> for PreviewItem {
    fn from(entry: &PreviewEntry) -> Self {
        Self {
            id: entry.id(),
            source: entry.source().to_string(),
            uploading: entry.is_local(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_ids_are_unique() {
        assert_ne!(EntryId::new(), EntryId::new());
        assert_ne!(BatchId::new(), BatchId::new());
    }

    #[test]
    fn test_entry_projection() {
        let local = PreviewEntry::Local(LocalEntry {
            id: EntryId::new(),
            handle: PreviewHandle::new("blob:tripmate/1"),
            source: FilePayload::new("a.png", "image/png", vec![1u8]),
        });
        let committed = PreviewEntry::Committed(CommittedEntry {
            id: EntryId::new(),
            url: "https://cdn/a.png".to_string(),
        });

        let item = PreviewItem::from(&local);
        assert!(item.uploading);
        assert_eq!(item.source, "blob:tripmate/1");
        assert_eq!(local.url(), None);

        let item = PreviewItem::from(&committed);
        assert!(!item.uploading);
        assert_eq!(item.source, "https://cdn/a.png");
        assert_eq!(committed.url(), Some("https://cdn/a.png"));
    }
}
