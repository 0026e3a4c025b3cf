//! # Ingest Run Report
//!
//! Summary of one batch run: identity, timing, counters and per-scan
//! failures. Serializable to JSON for `--report`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::IngestRun;
//!
//! let mut run = IngestRun::new("ADNI");
//! run.stats.volumes_discovered = 12;
//! run.finish();
//! println!("{}", serde_json::to_string_pretty(&run)?);
//! ```

use crate::error::SyncError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for an ingest run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Create a new random run ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Counters collected over a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Volumes found under the data root
    pub volumes_discovered: u64,
    /// Scans newly created on the remote
    pub scans_ingested: u64,
    /// Scans that already existed and were left alone
    pub scans_skipped: u64,
    pub subjects_created: u64,
    pub sessions_created: u64,
    pub scans_created: u64,
    /// NIFTI resources populated (volume + sidecar)
    pub resources_uploaded: u64,
    /// SNAPSHOTS resources populated (preview + thumbnail)
    pub snapshots_uploaded: u64,
    /// Snapshot attempts that failed (non-fatal)
    pub snapshots_failed: u64,
    /// Scans aborted by an error
    pub scans_failed: u64,
}

impl RunStats {
    /// Volumes that reached a terminal state
    pub fn total_processed(&self) -> u64 {
        self.scans_ingested + self.scans_skipped + self.scans_failed
    }
}

// ============================================================================
// Failures
// ============================================================================

/// One scan that could not be ingested
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanFailure {
    /// Volume file name
    pub volume: String,
    /// Local scan token, if it could be derived
    pub scan: Option<String>,
    pub subject: Option<String>,
    pub session: Option<String>,
    /// Error category (`extraction`, `input`, `catalog`, `upload`, ...)
    pub category: String,
    pub message: String,
}

impl ScanFailure {
    pub fn new(volume: impl Into<String>, error: &SyncError) -> Self {
        Self {
            volume: volume.into(),
            scan: None,
            subject: None,
            session: None,
            category: error.category().to_string(),
            message: error.to_string(),
        }
    }

    pub fn with_scan(mut self, scan: impl Into<String>) -> Self {
        self.scan = Some(scan.into());
        self
    }

    pub fn with_session(mut self, subject: impl Into<String>, session: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self.session = Some(session.into());
        self
    }
}

// ============================================================================
// Run
// ============================================================================

/// Report of one ingest run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestRun {
    pub id: RunId,
    /// Remote project receiving the data
    pub project: String,
    pub started_at: DateTime<Utc>,
    /// Set by [`IngestRun::finish`]
    pub finished_at: Option<DateTime<Utc>>,
    pub stats: RunStats,
    pub failures: Vec<ScanFailure>,
}

impl IngestRun {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            id: RunId::new(),
            project: project.into(),
            started_at: Utc::now(),
            finished_at: None,
            stats: RunStats::default(),
            failures: Vec::new(),
        }
    }

    pub fn record_failure(&mut self, failure: ScanFailure) {
        self.stats.scans_failed += 1;
        self.failures.push(failure);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// No scan failed
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Wall-clock duration, if finished
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end - self.started_at)
    }
}
