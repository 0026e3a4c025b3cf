//! Local input discovery: image volumes and their XML sidecars

use crate::error::{Result, SyncError};
use core_metadata::{ScanIdentifier, VOLUME_SUFFIX};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// All `*.nii.gz` files below `data_root`, in sorted path order.
///
/// Entries that cannot be read (permission errors, symlink loops) are logged
/// and skipped.
///
/// # Errors
///
/// [`SyncError::NoVolumes`] if the tree is missing or holds no volume.
pub fn discover_volumes(data_root: &Path) -> Result<Vec<PathBuf>> {
    if !data_root.is_dir() {
        return Err(SyncError::NoVolumes {
            root: data_root.to_path_buf(),
        });
    }

    let mut volumes = Vec::new();
    for entry in WalkDir::new(data_root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(
                    path = %e.path().unwrap_or(data_root).display(),
                    error = %e,
                    "Skipping unreadable entry"
                );
                continue;
            }
        };

        if entry.file_type().is_file() && is_volume(entry.path()) {
            volumes.push(entry.into_path());
        }
    }

    if volumes.is_empty() {
        return Err(SyncError::NoVolumes {
            root: data_root.to_path_buf(),
        });
    }

    volumes.sort();
    debug!(count = volumes.len(), "Discovered volumes");
    Ok(volumes)
}

fn is_volume(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map_or(false, |name| name.ends_with(VOLUME_SUFFIX))
}

/// Files directly inside `data_root` whose name ends in `<token>.xml`
pub fn find_sidecars(data_root: &Path, scan_id: &ScanIdentifier) -> Result<Vec<PathBuf>> {
    let suffix = format!("{}.xml", scan_id.token());
    let discovery_error = |e: std::io::Error| SyncError::Discovery {
        path: data_root.to_path_buf(),
        message: e.to_string(),
    };

    let mut matches = Vec::new();
    for entry in std::fs::read_dir(data_root).map_err(discovery_error)? {
        let entry = entry.map_err(discovery_error)?;
        let path = entry.path();
        let matches_token = path
            .file_name()
            .and_then(|name| name.to_str())
            .map_or(false, |name| name.ends_with(&suffix));

        if matches_token && path.is_file() {
            matches.push(path);
        }
    }

    matches.sort();
    Ok(matches)
}

/// The single sidecar for `scan_id`.
///
/// # Errors
///
/// [`SyncError::AmbiguousSidecar`] unless exactly one file matches.
pub fn resolve_sidecar(data_root: &Path, scan_id: &ScanIdentifier) -> Result<PathBuf> {
    let mut matches = find_sidecars(data_root, scan_id)?;
    if matches.len() != 1 {
        return Err(SyncError::AmbiguousSidecar {
            scan: scan_id.token().to_string(),
            matches: matches.len(),
        });
    }
    Ok(matches.remove(0))
}
