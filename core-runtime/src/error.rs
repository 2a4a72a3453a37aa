use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid accepted type pattern {pattern:?}: {reason}")]
    InvalidTypePattern { pattern: String, reason: String },

    #[error("Logging error: {0}")]
    Logging(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
