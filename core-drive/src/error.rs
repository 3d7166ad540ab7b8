//! Drive error types

use thiserror::Error;

/// Errors surfaced by the drive catalog and service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriveError {
    /// No file data exists for the requested id
    #[error("File not found: {file_data_id}")]
    NotFound { file_data_id: String },

    /// The file exists but has no fetchable content
    #[error("Content unavailable for file: {file_data_id}")]
    ContentUnavailable { file_data_id: String },

    /// A download could not be completed
    #[error("Download failed: {0}")]
    Download(String),

    /// Transport-level failure reaching remote content
    #[error("Transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, DriveError>;
