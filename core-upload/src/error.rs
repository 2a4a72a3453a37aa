use bridge_traits::BridgeError;
use core_runtime::config::format_bytes;
use thiserror::Error;

/// Why a candidate file was turned away. Display is the user-facing message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("\"{file}\" is not a supported file type ({mime_type})")]
    UnsupportedType { file: String, mime_type: String },

    #[error(
        "\"{file}\" is {actual} which exceeds the {max} limit",
        actual = format_bytes(*.size),
        max = format_bytes(*.limit)
    )]
    TooLarge { file: String, size: u64, limit: u64 },

    #[error("You can add up to {limit} files; \"{file}\" was not added")]
    TooMany { file: String, limit: usize },

    #[error("Could not prepare a preview for \"{file}\": {reason}")]
    PreviewUnavailable { file: String, reason: String },
}

/// Why a whole batch failed. Display is the user-facing message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchUploadError {
    #[error("Upload failed: {0}")]
    Transport(String),

    #[error("Upload failed: the server response did not list any files")]
    MissingResults,

    #[error("Upload failed: expected {expected} results but the server returned {received}")]
    TooFewResults { expected: usize, received: usize },

    #[error("Upload failed: the server response did not contain any file URLs")]
    NoUsableUrls,

    #[error("Upload failed: no URL for file {index} in the server response")]
    MissingUrl { index: usize },

    #[error("Upload cancelled before it completed")]
    Cancelled,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Preview store holds at most {capacity} entries, {requested} requested")]
    CapacityExceeded { capacity: usize, requested: usize },
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Upload widget {0} has been disposed")]
    Disposed(String),

    #[error("Invalid state transition from {from} to {to}: {reason}")]
    InvalidStateTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, UploadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        let err = ValidationError::TooLarge {
            file: "alps.jpg".to_string(),
            size: 10 * 1024 * 1024,
            limit: 4 * 1024 * 1024,
        };
        assert_eq!(err.to_string(), "\"alps.jpg\" is 10 MB which exceeds the 4 MB limit");

        let err = ValidationError::TooMany {
            file: "c.png".to_string(),
            limit: 2,
        };
        assert_eq!(err.to_string(), "You can add up to 2 files; \"c.png\" was not added");

        let err = ValidationError::UnsupportedType {
            file: "notes.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
        };
        assert!(err.to_string().contains("application/pdf"));
    }

    #[test]
    fn test_batch_messages() {
        let err = BatchUploadError::TooFewResults {
            expected: 3,
            received: 1,
        };
        assert_eq!(
            err.to_string(),
            "Upload failed: expected 3 results but the server returned 1"
        );
        assert_eq!(
            BatchUploadError::Transport("HTTP 502".to_string()).to_string(),
            "Upload failed: HTTP 502"
        );
    }
}
