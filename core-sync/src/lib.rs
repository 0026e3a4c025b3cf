//! # Ingestion & Synchronization Module
//!
//! Pushes a local neuroimaging study export into a remote research-data
//! catalog.
//!
//! ## Overview
//!
//! For every image volume this module:
//! - Resolves the XML sidecar describing it
//! - Extracts a `ScanRecord` from the sidecar
//! - Creates the subject → session → scan hierarchy where missing
//! - Uploads the volume and sidecar
//! - Renders preview snapshots with external tools and uploads them
//!
//! ## Components
//!
//! - **Discovery** (`discovery`): Finds volumes and their sidecars on disk
//! - **Hierarchy Synchronizer** (`hierarchy`): Check-then-create for remote entities
//! - **Asset Uploader** (`uploader`): Populates the `NIFTI` resource
//! - **Snapshot Pipeline** (`snapshot`): Renders, uploads and cleans up previews
//! - **Run Report** (`job`): Counters and per-scan failures of one run
//! - **Ingest Coordinator** (`coordinator`): Sequential per-scan driver

pub mod coordinator;
pub mod discovery;
pub mod error;
pub mod hierarchy;
pub mod job;
pub mod snapshot;
pub mod uploader;

pub use coordinator::IngestCoordinator;
pub use discovery::{discover_volumes, find_sidecars, resolve_sidecar};
pub use error::{Result, SyncError};
pub use hierarchy::{
    ensure_exists, scan_spec, session_spec, subject_spec, EntitySpec, HierarchyOutcome,
    HierarchySynchronizer, LevelStatus,
};
pub use job::{IngestRun, RunId, RunStats, ScanFailure};
pub use snapshot::{
    ScratchFiles, SnapshotConfig, SnapshotError, SnapshotOutcome, SnapshotPipeline,
    SNAPSHOT_RESOURCE,
};
pub use uploader::{AssetUploader, UploadOutcome, NIFTI_RESOURCE};
