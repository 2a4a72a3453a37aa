//! Remote Upload Capability
//!
//! The core never talks to storage backends directly. Hosts inject an
//! [`UploadTransport`] that accepts an ordered batch of raw file payloads and
//! resolves to the remote response body. Transport concerns (auth, retries,
//! multipart framing, storage backend) stay on the host side of this trait.

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use crate::error::Result;

/// A raw file selected by the user, as handed to the core by the host.
#[derive(Clone, PartialEq, Eq)]
pub struct FilePayload {
    /// Original file name (display only, never used as an identifier)
    pub name: String,
    /// Declared MIME type, e.g. `image/png`
    pub mime_type: String,
    /// File contents
    pub data: Bytes,
}

impl FilePayload {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Size of the payload in bytes
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

impl std::fmt::Debug for FilePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilePayload")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.data.len())
            .finish()
    }
}

/// Remote upload capability.
///
/// Implementations submit every payload of the batch in a single request and
/// return the decoded response body untouched. The response is expected to
/// describe the stored files in the same order they were submitted, but the
/// shape of each descriptor is not fixed; interpreting it is the caller's job.
///
/// Implementations must not retry on their own behalf unless the host wants
/// that policy; the core awaits the call to its natural resolution.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::upload::{FilePayload, UploadTransport};
///
/// async fn push(transport: &dyn UploadTransport, file: FilePayload) -> Result<()> {
///     let body = transport.upload(vec![file]).await?;
///     println!("remote said {body}");
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// Upload a batch of files in one call.
    ///
    /// # Errors
    ///
    /// Returns an error when the remote rejects the request or the transport
    /// fails. A successful return says nothing about whether the body is
    /// usable.
    async fn upload(&self, files: Vec<FilePayload>) -> Result<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_size() {
        let payload = FilePayload::new("a.png", "image/png", vec![0u8; 2048]);
        assert_eq!(payload.size(), 2048);
    }

    #[test]
    fn test_payload_debug_omits_bytes() {
        let payload = FilePayload::new("a.png", "image/png", vec![7u8; 4]);
        let rendered = format!("{:?}", payload);
        assert!(rendered.contains("a.png"));
        assert!(rendered.contains("size: 4"));
        assert!(!rendered.contains("[7, 7"));
    }
}
