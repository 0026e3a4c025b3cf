//! # Snapshot Pipeline
//!
//! Renders a preview montage of a scan with external tools, uploads it to the
//! scan's `SNAPSHOTS` resource together with a thumbnail, and removes every
//! scratch file afterwards.
//!
//! Failures here never abort a scan: the caller receives a
//! [`SnapshotError`], logs it and moves on.

use bridge_traits::catalog::{EntityPath, FileTags, RemoteCatalog};
use bridge_traits::error::BridgeError;
use bridge_traits::process::{CommandRunner, CommandSpec};
use core_metadata::{write_thumbnail, MetadataError, ScanRecord};
use core_runtime::config::IngestConfig;
use core_runtime::logging::strip_path;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Resource collection holding the preview images
pub const SNAPSHOT_RESOURCE: &str = "SNAPSHOTS";

/// Axis order passed to the reorientation tool
const TARGET_ORIENTATION: [&str; 3] = ["LR", "PA", "IS"];

/// Longest stderr excerpt kept in error messages
const MAX_STDERR_EXCERPT: usize = 300;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Snapshot existence check failed: {0}")]
    Check(#[source] BridgeError),

    #[error("`{command}` failed: {reason}")]
    Command { command: String, reason: String },

    #[error("Thumbnail generation failed: {0}")]
    Thumbnail(String),

    #[error("Snapshot upload failed: {0}")]
    Upload(#[source] BridgeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotOutcome {
    /// Preview and thumbnail were uploaded
    Uploaded { thumbnail_width: u32, thumbnail_height: u32 },
    /// The resource already existed; nothing was rendered
    AlreadyPresent,
}

#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    pub scratch_dir: PathBuf,
    pub reorient_command: String,
    pub slicer_command: String,
    pub command_timeout: Duration,
    pub thumbnail_max_dimension: u32,
}

impl SnapshotConfig {
    pub fn from_ingest_config(config: &IngestConfig) -> Self {
        Self {
            scratch_dir: config.scratch_dir.clone(),
            reorient_command: config.tools.reorient_command.clone(),
            slicer_command: config.tools.slicer_command.clone(),
            command_timeout: config.tools.command_timeout,
            thumbnail_max_dimension: config.thumbnail_max_dimension,
        }
    }
}

/// Scratch files of one scan, removed when dropped
#[derive(Debug)]
pub struct ScratchFiles {
    pub reoriented: PathBuf,
    pub montage: PathBuf,
    pub thumbnail: PathBuf,
}

impl ScratchFiles {
    /// Paths for `stem` inside `dir`. Nothing is created on disk.
    pub fn new(dir: &Path, stem: &str) -> Self {
        Self {
            reoriented: dir.join(format!("{}_s.nii.gz", stem)),
            montage: dir.join(format!("{}.png", stem)),
            thumbnail: dir.join(format!("{}_t.png", stem)),
        }
    }

    pub fn paths(&self) -> [&Path; 3] {
        [&self.reoriented, &self.montage, &self.thumbnail]
    }
}

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        for path in self.paths() {
            match std::fs::remove_file(path) {
                Ok(()) => debug!(file = %strip_path(path), "Removed scratch file"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(file = %path.display(), error = %e, "Failed to remove scratch file"),
            }
        }
    }
}

/// Renders and uploads preview images for one scan at a time
pub struct SnapshotPipeline {
    catalog: Arc<dyn RemoteCatalog>,
    runner: Arc<dyn CommandRunner>,
    config: SnapshotConfig,
}

impl SnapshotPipeline {
    pub fn new(
        catalog: Arc<dyn RemoteCatalog>,
        runner: Arc<dyn CommandRunner>,
        config: SnapshotConfig,
    ) -> Self {
        Self {
            catalog,
            runner,
            config,
        }
    }

    /// Produce and upload the preview and thumbnail for `volume`.
    ///
    /// Scratch files are removed on every exit path.
    #[instrument(skip_all, fields(scan = %scan_path.label()))]
    pub async fn run(
        &self,
        record: &ScanRecord,
        volume: &Path,
        scan_path: &EntityPath,
    ) -> Result<SnapshotOutcome, SnapshotError> {
        let resource = scan_path.resource(SNAPSHOT_RESOURCE);

        let exists = self
            .catalog
            .exists(&resource)
            .await
            .map_err(SnapshotError::Check)?;
        if exists {
            debug!("SNAPSHOTS resource already present");
            return Ok(SnapshotOutcome::AlreadyPresent);
        }

        let scratch = ScratchFiles::new(&self.config.scratch_dir, &record.artifact_stem());

        let mut reorient = CommandSpec::new(&self.config.reorient_command).arg(volume);
        for axis in TARGET_ORIENTATION {
            reorient = reorient.arg(axis);
        }
        self.run_tool(reorient.arg(&scratch.reoriented)).await?;

        self.run_tool(
            CommandSpec::new(&self.config.slicer_command)
                .arg(&scratch.reoriented)
                .arg("-a")
                .arg(&scratch.montage),
        )
        .await?;

        self.catalog
            .upload_file(
                &resource,
                &scratch.montage,
                &FileTags::new("PNG").with_content("ORIGINAL"),
            )
            .await
            .map_err(SnapshotError::Upload)?;

        let (thumbnail_width, thumbnail_height) = self.render_thumbnail(&scratch).await?;

        self.catalog
            .upload_file(
                &resource,
                &scratch.thumbnail,
                &FileTags::new("PNG").with_content("THUMBNAIL"),
            )
            .await
            .map_err(SnapshotError::Upload)?;

        info!(
            preview = %strip_path(&scratch.montage),
            thumbnail_width,
            thumbnail_height,
            "Snapshots uploaded"
        );
        Ok(SnapshotOutcome::Uploaded {
            thumbnail_width,
            thumbnail_height,
        })
    }

    async fn run_tool(&self, spec: CommandSpec) -> Result<(), SnapshotError> {
        let spec = spec.timeout(self.config.command_timeout);
        let command = spec.display();

        let output = self
            .runner
            .run(spec)
            .await
            .map_err(|e| SnapshotError::Command {
                command: command.clone(),
                reason: e.to_string(),
            })?;

        if !output.success() {
            let stderr: String = output.stderr.trim().chars().take(MAX_STDERR_EXCERPT).collect();
            let code = output
                .exit_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            return Err(SnapshotError::Command {
                command,
                reason: format!("exit status {}: {}", code, stderr),
            });
        }

        Ok(())
    }

    async fn render_thumbnail(&self, scratch: &ScratchFiles) -> Result<(u32, u32), SnapshotError> {
        let source = scratch.montage.clone();
        let destination = scratch.thumbnail.clone();
        let max_dimension = self.config.thumbnail_max_dimension;

        tokio::task::spawn_blocking(move || write_thumbnail(&source, &destination, max_dimension))
            .await
            .map_err(|e| SnapshotError::Thumbnail(e.to_string()))?
            .map_err(|e: MetadataError| SnapshotError::Thumbnail(e.to_string()))
    }
}
