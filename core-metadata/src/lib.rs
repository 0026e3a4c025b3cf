//! # Scan Metadata Module
//!
//! Reads the XML sidecar that accompanies every image volume and turns it
//! into a [`ScanRecord`].
//!
//! ## Overview
//!
//! This module handles:
//! - Scan identifier derivation from volume file names
//! - Sidecar extraction with fail-fast required fields
//! - Optional clinical scores with an `"Unknown"` sentinel
//! - Thumbnail derivation for rendered snapshots

pub mod error;
pub mod extractor;
pub mod record;
pub mod thumbnail;

pub use error::{ExtractionError, MetadataError, Result};
pub use extractor::{truncate_to_integer, MetadataExtractor};
pub use record::{
    ClinicalScore, ClinicalScores, MatrixSize, ScanIdentifier, ScanParameters, ScanRecord,
    SessionInfo, Sex, SubjectInfo, VoxelSpacing, UNKNOWN, VOLUME_SUFFIX,
};
pub use thumbnail::{bounded_dimensions, write_thumbnail};
