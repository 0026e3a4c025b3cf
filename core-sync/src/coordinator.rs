//! # Ingest Coordinator
//!
//! Drives one batch run over a local study export.
//!
//! ## Workflow
//!
//! 1. Discover every volume under `<input>/ADNI` (sorted); none ⇒ abort
//! 2. For each volume, sequentially:
//!    - derive the scan identifier and resolve its single XML sidecar
//!    - extract the [`ScanRecord`](core_metadata::ScanRecord)
//!    - synchronize subject → session → scan; stop here if the scan existed
//!    - upload volume and sidecar
//!    - render and upload snapshots (failures are logged, never fatal)
//! 3. Record failures with their subject/session/scan context and continue
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::IngestCoordinator;
//!
//! let coordinator = IngestCoordinator::new(catalog, runner, &config);
//! let run = coordinator.run().await?;
//! println!("{} scans ingested", run.stats.scans_ingested);
//! ```

use crate::{
    discovery::{discover_volumes, resolve_sidecar},
    hierarchy::{HierarchyOutcome, HierarchySynchronizer, LevelStatus},
    job::{IngestRun, RunStats, ScanFailure},
    snapshot::{SnapshotConfig, SnapshotOutcome, SnapshotPipeline},
    uploader::{AssetUploader, UploadOutcome},
    Result, SyncError,
};
use bridge_traits::{catalog::RemoteCatalog, process::CommandRunner};
use core_metadata::{MetadataExtractor, ScanIdentifier};
use core_runtime::{config::IngestConfig, logging::strip_path};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, info_span, instrument, warn, Instrument};

/// Identity of the scan being processed, filled in as it becomes known
#[derive(Debug, Default)]
struct ScanContext {
    scan: Option<String>,
    subject: Option<String>,
    session: Option<String>,
}

impl ScanContext {
    fn into_failure(self, volume: &Path, error: &SyncError) -> ScanFailure {
        let mut failure = ScanFailure::new(strip_path(volume), error);
        if let Some(scan) = self.scan {
            failure = failure.with_scan(scan);
        }
        if let (Some(subject), Some(session)) = (self.subject, self.session) {
            failure = failure.with_session(subject, session);
        }
        failure
    }
}

/// Batch driver for one project and one local data root
pub struct IngestCoordinator {
    project: String,
    data_root: PathBuf,
    extractor: MetadataExtractor,
    hierarchy: HierarchySynchronizer,
    uploader: AssetUploader,
    snapshots: SnapshotPipeline,
}

impl IngestCoordinator {
    pub fn new(
        catalog: Arc<dyn RemoteCatalog>,
        runner: Arc<dyn CommandRunner>,
        config: &IngestConfig,
    ) -> Self {
        Self {
            project: config.project.clone(),
            data_root: config.data_root(),
            extractor: MetadataExtractor::new(),
            hierarchy: HierarchySynchronizer::new(Arc::clone(&catalog), config.project.clone()),
            uploader: AssetUploader::new(Arc::clone(&catalog)),
            snapshots: SnapshotPipeline::new(
                catalog,
                runner,
                SnapshotConfig::from_ingest_config(config),
            ),
        }
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Process every volume under the data root.
    ///
    /// # Errors
    ///
    /// Only errors that prevent the run from starting are returned
    /// ([`SyncError::NoVolumes`], [`SyncError::Discovery`]). Per-scan failures
    /// are collected in the returned report.
    #[instrument(skip(self), fields(project = %self.project))]
    pub async fn run(&self) -> Result<IngestRun> {
        let mut run = IngestRun::new(&self.project);

        let data_root = self.data_root.clone();
        let volumes = tokio::task::spawn_blocking(move || discover_volumes(&data_root))
            .await
            .map_err(|e| SyncError::Discovery {
                path: self.data_root.clone(),
                message: e.to_string(),
            })??;

        run.stats.volumes_discovered = volumes.len() as u64;
        info!(run_id = %run.id, volumes = volumes.len(), "Starting ingest run");

        for volume in &volumes {
            let span = info_span!("scan", volume = %strip_path(volume));
            let mut context = ScanContext::default();

            let result = self
                .ingest_volume(volume, &mut run.stats, &mut context)
                .instrument(span)
                .await;

            if let Err(e) = result {
                error!(
                    volume = %strip_path(volume),
                    scan = context.scan.as_deref().unwrap_or("-"),
                    subject = context.subject.as_deref().unwrap_or("-"),
                    session = context.session.as_deref().unwrap_or("-"),
                    category = e.category(),
                    error = %e,
                    "Scan failed"
                );
                run.record_failure(context.into_failure(volume, &e));
            }
        }

        run.finish();
        info!(
            run_id = %run.id,
            processed = run.stats.total_processed(),
            elapsed_ms = run.duration().map_or(0, |d| d.num_milliseconds()),
            ingested = run.stats.scans_ingested,
            skipped = run.stats.scans_skipped,
            failed = run.stats.scans_failed,
            snapshots_failed = run.stats.snapshots_failed,
            "Ingest run finished"
        );
        Ok(run)
    }

    async fn ingest_volume(
        &self,
        volume: &Path,
        stats: &mut RunStats,
        context: &mut ScanContext,
    ) -> Result<()> {
        let scan_id = ScanIdentifier::from_volume_path(volume)
            .ok_or_else(|| SyncError::InvalidVolumeName(strip_path(volume)))?;
        context.scan = Some(scan_id.token().to_string());

        let sidecar = resolve_sidecar(&self.data_root, &scan_id)?;
        let record = self.extractor.extract_from_file(&sidecar, scan_id).await?;
        context.subject = Some(record.subject_id().to_string());
        context.session = Some(record.session_id().to_string());

        let outcome = self.hierarchy.synchronize(&record).await?;
        if outcome.is_skipped() {
            stats.scans_skipped += 1;
            info!(scan = %record.scan_label(), "Scan already ingested, skipping");
            return Ok(());
        }
        count_created(stats, &outcome);

        if self.uploader.upload(&outcome.scan_path, volume, &sidecar).await?
            == UploadOutcome::Uploaded
        {
            stats.resources_uploaded += 1;
        }

        match self.snapshots.run(&record, volume, &outcome.scan_path).await {
            Ok(SnapshotOutcome::Uploaded { .. }) => stats.snapshots_uploaded += 1,
            Ok(SnapshotOutcome::AlreadyPresent) => {}
            Err(e) => {
                stats.snapshots_failed += 1;
                warn!(scan = %record.scan_label(), error = %e, "Snapshot generation failed");
            }
        }

        stats.scans_ingested += 1;
        Ok(())
    }
}

fn count_created(stats: &mut RunStats, outcome: &HierarchyOutcome) {
    if outcome.subject == LevelStatus::Created {
        stats.subjects_created += 1;
    }
    if outcome.session == LevelStatus::Created {
        stats.sessions_created += 1;
    }
    if outcome.scan == LevelStatus::Created {
        stats.scans_created += 1;
    }
}
