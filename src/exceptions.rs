//! Error types for fcode

use std::fmt;

/// Main error type for fcode operations
#[derive(Debug)]
pub enum FcodeError {
    /// Output destination could not be opened for writing
    OpenOutput(String),

    /// The sink cannot report or change its write position
    UnsupportedSink(String),

    /// The container has already been finalized
    AlreadyFinalized,

    /// IO error
    IoError(std::io::Error),

    /// Generic error with message
    Generic(String),
}

impl fmt::Display for FcodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FcodeError::OpenOutput(msg) => write!(f, "Open output error: {msg}"),
            FcodeError::UnsupportedSink(msg) => write!(f, "Unsupported sink: {msg}"),
            FcodeError::AlreadyFinalized => write!(f, "Container already finalized"),
            FcodeError::IoError(err) => write!(f, "IO error: {err}"),
            FcodeError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for FcodeError {}

impl From<std::io::Error> for FcodeError {
    fn from(err: std::io::Error) -> Self {
        FcodeError::IoError(err)
    }
}

/// Result type for fcode operations
pub type Result<T> = std::result::Result<T, FcodeError>;
