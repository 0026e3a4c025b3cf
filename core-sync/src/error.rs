use bridge_traits::error::BridgeError;
use core_metadata::MetadataError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("No image volumes (*.nii.gz) found under {root}")]
    NoVolumes { root: PathBuf },

    #[error("Expected exactly one sidecar for scan {scan}, found {matches}")]
    AmbiguousSidecar { scan: String, matches: usize },

    #[error("Cannot derive a scan identifier from {0}")]
    InvalidVolumeName(String),

    #[error("Failed to scan directory {path}: {message}")]
    Discovery { path: PathBuf, message: String },

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("Remote catalog error: {0}")]
    Catalog(#[source] BridgeError),

    #[error("Upload failed: {0}")]
    Upload(#[source] BridgeError),
}

impl SyncError {
    /// Short category used in run reports
    pub fn category(&self) -> &'static str {
        match self {
            SyncError::NoVolumes { .. } | SyncError::Discovery { .. } => "discovery",
            SyncError::AmbiguousSidecar { .. } | SyncError::InvalidVolumeName(_) => "input",
            SyncError::Metadata(_) => "extraction",
            SyncError::Catalog(_) => "catalog",
            SyncError::Upload(_) => "upload",
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
