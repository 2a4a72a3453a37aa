use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Upload rejected by remote (status {status}): {message}")]
    UploadRejected { status: u16, message: String },

    #[error("Preview handle could not be created for {file}: {reason}")]
    HandleUnavailable { file: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
