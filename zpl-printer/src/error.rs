//! Error types for the label printer library

use std::path::PathBuf;
use thiserror::Error;

/// Printer error types
#[derive(Debug, Error)]
pub enum PrintError {
    /// Template file does not exist
    #[error("Template not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// Placeholder names and values have different lengths
    #[error("Binding length mismatch: {names} placeholder names, {values} values")]
    BindingLengthMismatch { names: usize, values: usize },

    /// Placeholder name is empty
    #[error("Empty placeholder name at position {0}")]
    EmptyPlaceholder(usize),

    /// Encoding label not recognised
    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),

    /// Destination could not be opened
    #[error("Cannot open printer {destination}: {reason}")]
    CannotOpen { destination: String, reason: String },

    /// Spooler refused to start the document
    #[error("Start job failed: {0}")]
    StartJob(String),

    /// Spooler refused to start the page
    #[error("Start page failed: {0}")]
    StartPage(String),

    /// Writing payload bytes failed
    #[error("Write failed: {0}")]
    Write(String),

    /// Spooler accepted fewer bytes than were sent
    #[error("Incomplete write: {written} of {expected} bytes")]
    IncompleteWrite { written: usize, expected: usize },

    /// Closing a page, job or printer handle failed
    #[error("Cleanup failed: {0}")]
    Cleanup(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid printer configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl PrintError {
    /// Whether the error came from the binding input rather than the template or printer
    pub fn is_binding(&self) -> bool {
        matches!(
            self,
            Self::BindingLengthMismatch { .. } | Self::EmptyPlaceholder(_)
        )
    }

    /// Whether the error happened after the destination was opened
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::StartJob(_)
                | Self::StartPage(_)
                | Self::Write(_)
                | Self::IncompleteWrite { .. }
                | Self::Cleanup(_)
        )
    }
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;
