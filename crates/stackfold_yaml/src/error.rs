//! Error types for document loading and tag construction.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Coarse error taxonomy shared by every stackfold crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A tag payload had neither the structured nor the scalar shape.
    Shape,
    /// The input was not a document we can read.
    Parse,
    /// A referenced file does not exist.
    NotFound,
    /// Flattening could not proceed with the given template layout.
    Config,
    /// Any other I/O failure.
    Io,
}

/// Errors that can occur while loading, converting or dumping documents.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Tag !{tag} expects a {expected} payload, found {found}")]
    Shape {
        tag: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Unknown tag: {0}")]
    UnknownTag(String),

    #[error("Unsupported mapping key: {0}")]
    InvalidKey(String),

    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Macro !{tag} failed: {message}")]
    Macro { tag: String, message: String },

    #[error("YAML parsing error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("YAML serialization error: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DocumentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Shape { .. } => ErrorKind::Shape,
            Self::UnknownTag(_) | Self::InvalidKey(_) | Self::Parse(_) | Self::Json(_) => {
                ErrorKind::Parse
            }
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Io { .. } | Self::Serialize(_) => ErrorKind::Io,
            Self::Macro { .. } => ErrorKind::Io,
        }
    }

    /// Wrap an I/O failure on `path`, keeping "not found" distinct.
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path)
        } else {
            Self::Io { path, source }
        }
    }
}
