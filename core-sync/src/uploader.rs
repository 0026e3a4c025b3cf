//! Primary data upload into the scan's `NIFTI` resource

use crate::error::{Result, SyncError};
use bridge_traits::catalog::{EntityPath, FileTags, RemoteCatalog};
use core_runtime::logging::strip_path;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Resource collection holding the volume and its sidecar
pub const NIFTI_RESOURCE: &str = "NIFTI";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadOutcome {
    /// Volume and sidecar were uploaded
    Uploaded,
    /// The resource already existed; nothing was sent
    AlreadyPresent,
}

/// Pushes a scan's volume and sidecar to the remote catalog
pub struct AssetUploader {
    catalog: Arc<dyn RemoteCatalog>,
}

impl AssetUploader {
    pub fn new(catalog: Arc<dyn RemoteCatalog>) -> Self {
        Self { catalog }
    }

    /// Upload `volume` (NII, PROCESSED) then `sidecar` (XML) unless the
    /// `NIFTI` resource already exists.
    ///
    /// # Errors
    ///
    /// [`SyncError::Catalog`] if the existence check fails, and
    /// [`SyncError::Upload`] if either upload fails. A failed sidecar upload
    /// leaves the volume in place.
    #[instrument(skip_all, fields(scan = %scan_path.label()))]
    pub async fn upload(
        &self,
        scan_path: &EntityPath,
        volume: &Path,
        sidecar: &Path,
    ) -> Result<UploadOutcome> {
        let resource = scan_path.resource(NIFTI_RESOURCE);

        let exists = self
            .catalog
            .exists(&resource)
            .await
            .map_err(SyncError::Catalog)?;
        if exists {
            debug!("NIFTI resource already present");
            return Ok(UploadOutcome::AlreadyPresent);
        }

        self.catalog
            .upload_file(&resource, volume, &FileTags::new("NII").with_content("PROCESSED"))
            .await
            .map_err(SyncError::Upload)?;

        self.catalog
            .upload_file(&resource, sidecar, &FileTags::new("XML"))
            .await
            .map_err(SyncError::Upload)?;

        info!(
            volume = %strip_path(volume),
            sidecar = %strip_path(sidecar),
            "Data uploaded"
        );
        Ok(UploadOutcome::Uploaded)
    }
}
