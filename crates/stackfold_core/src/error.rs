//! Error types for template transformations.

use stackfold_yaml::{DocumentError, ErrorKind};
use thiserror::Error;

/// Result type alias for stack operations.
pub type StackResult<T> = Result<T, StackError>;

/// Errors that can occur while flattening or annotating templates.
#[derive(Error, Debug)]
pub enum StackError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    #[error("Unsupported nested resource type: {0}")]
    UnsupportedResource(String),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl StackError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::UnsupportedResource(_) => ErrorKind::Config,
            Self::InvalidTemplate(_) => ErrorKind::Parse,
            Self::Document(e) => e.kind(),
        }
    }
}
