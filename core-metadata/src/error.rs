use std::path::PathBuf;
use thiserror::Error;

/// A sidecar could not be turned into a complete scan record.
///
/// Any variant aborts the whole record; partial records are never produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Required field '{0}' not found in sidecar")]
    MissingField(String),

    #[error("Required field '{0}' is empty")]
    EmptyField(String),

    #[error("Field '{field}' is not numeric: '{value}'")]
    InvalidNumber { field: String, value: String },

    #[error("Malformed XML document: {0}")]
    MalformedDocument(String),
}

impl ExtractionError {
    /// Name of the offending field, if the error concerns a single field
    pub fn field(&self) -> Option<&str> {
        match self {
            ExtractionError::MissingField(field)
            | ExtractionError::EmptyField(field)
            | ExtractionError::InvalidNumber { field, .. } => Some(field),
            ExtractionError::MalformedDocument(_) => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Image processing error: {0}")]
    ImageError(String),
}

pub type Result<T> = std::result::Result<T, MetadataError>;
