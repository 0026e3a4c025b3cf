//! # Hierarchy Synchronizer
//!
//! Ensures the subject → session → scan chain for one [`ScanRecord`] exists
//! on the remote catalog.
//!
//! ## Workflow
//!
//! 1. Scan already exists: stop, nothing else is touched
//! 2. Subject missing: create, then set genotype and gender in one call
//! 3. Session missing: create with core fields, then set custom fields in one call
//! 4. Create the scan with its acquisition parameters
//!
//! Existing entities are never re-created or modified. Catalog failures
//! propagate and leave the hierarchy as far as it got.

use crate::error::{Result, SyncError};
use bridge_traits::catalog::{AttributeMap, EntityPath, RemoteCatalog};
use core_metadata::ScanRecord;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// What happened to one level of the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelStatus {
    /// Entity was missing and has been created
    Created,
    /// Entity was found and left untouched
    AlreadyExisted,
    /// Entity was not examined
    Skipped,
}

/// An entity to ensure: where it lives, what it is created with, and what is
/// set on it right after creation.
///
/// `core_fields` and `attributes` never share a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySpec {
    pub path: EntityPath,
    pub core_fields: AttributeMap,
    pub attributes: AttributeMap,
}

impl EntitySpec {
    pub fn new(path: EntityPath) -> Self {
        Self {
            path,
            core_fields: AttributeMap::new(),
            attributes: AttributeMap::new(),
        }
    }

    fn core(mut self, key: &str, value: impl ToString) -> Self {
        self.core_fields.insert(key.to_string(), value.to_string());
        self
    }

    fn attribute(mut self, key: &str, value: impl ToString) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }
}

/// Check-then-create for a single entity.
///
/// Returns `AlreadyExisted` without further calls if the entity is found.
/// Otherwise creates it with the core fields and, if there are any, sets the
/// attributes in one batched call.
pub async fn ensure_exists(
    catalog: &dyn RemoteCatalog,
    spec: &EntitySpec,
) -> Result<(EntityPath, LevelStatus)> {
    let exists = catalog
        .exists(&spec.path)
        .await
        .map_err(SyncError::Catalog)?;

    if exists {
        debug!(kind = %spec.path.kind(), label = %spec.path.label(), "Entity already exists");
        return Ok((spec.path.clone(), LevelStatus::AlreadyExisted));
    }

    create_entity(catalog, spec).await?;
    Ok((spec.path.clone(), LevelStatus::Created))
}

async fn create_entity(catalog: &dyn RemoteCatalog, spec: &EntitySpec) -> Result<()> {
    catalog
        .create(&spec.path, &spec.core_fields)
        .await
        .map_err(SyncError::Catalog)?;

    if !spec.attributes.is_empty() {
        catalog
            .set_attributes(&spec.path, &spec.attributes)
            .await
            .map_err(SyncError::Catalog)?;
    }

    info!(kind = %spec.path.kind(), label = %spec.path.label(), "Created");
    Ok(())
}

/// Subject: created bare, then genotype and gender
pub fn subject_spec(project: &str, record: &ScanRecord) -> EntitySpec {
    let subject = &record.subject;
    EntitySpec::new(EntityPath::subject(project, record.subject_id()))
        .attribute(
            "xnat:subjectData/fields/field[name=apoe1]/field",
            &subject.apoe_a1,
        )
        .attribute(
            "xnat:subjectData/fields/field[name=apoe2]/field",
            &subject.apoe_a2,
        )
        .attribute(
            "xnat:subjectData/demographics[@xsi:type=xnat:demographicData]/gender",
            subject.sex.as_str(),
        )
}

/// Session: core acquisition fields at creation, custom fields afterwards
pub fn session_spec(project: &str, record: &ScanRecord) -> EntitySpec {
    let session = &record.session;
    let scores = &session.scores;
    let path = EntityPath::subject(project, record.subject_id()).session(record.session_label());

    EntitySpec::new(path)
        .core("xnat:mrSessionData/date", &session.date)
        .core("xnat:mrSessionData/age", &session.age)
        .core("xnat:mrSessionData/acquisition_site", &session.site)
        .core("xnat:mrSessionData/scanner/manufacturer", &session.manufacturer)
        .core(
            "xnat:mrSessionData/scanner",
            format!("{}_{}", session.manufacturer, session.scanner_model),
        )
        .core("xnat:mrSessionData/scanner/model", &session.scanner_model)
        .core("xnat:mrSessionData/modality", &session.modality)
        .core("xnat:mrSessionData/fieldStrength", &session.field_strength)
        .core("xnat:mrSessionData/coil", &session.coil)
        .core("xnat:mrSessionData/session_type", &session.visit_type)
        .attribute(
            "xnat:mrSessionData/fields/field[name=visittype]/field",
            &session.visit_type,
        )
        .attribute(
            "xnat:mrSessionData/fields/field[name=clinicalgroup]/field",
            &session.clinical_group,
        )
        .attribute(
            "xnat:mrSessionData/fields/field[name=mmse]/field",
            scores.mmse.as_str(),
        )
        .attribute(
            "xnat:mrSessionData/fields/field[name=cdr]/field",
            scores.cdr.as_str(),
        )
        .attribute(
            "xnat:mrSessionData/fields/field[name=gds]/field",
            scores.gds.as_str(),
        )
        .attribute(
            "xnat:mrSessionData/fields/field[name=faq]/field",
            scores.faq.as_str(),
        )
        .attribute(
            "xnat:mrSessionData/fields/field[name=npi]/field",
            scores.npi.as_str(),
        )
}

/// Scan: every acquisition parameter at creation
pub fn scan_spec(project: &str, record: &ScanRecord) -> EntitySpec {
    let session = &record.session;
    let scan = &record.scan;
    let path = EntityPath::subject(project, record.subject_id())
        .session(record.session_label())
        .scan(record.scan_label());

    // The remote stores the TE value under `ti` and the TI value under `te`.
    EntitySpec::new(path)
        .core("xnat:mrScanData/type", &scan.weighting)
        .core("xnat:mrScanData/series_description", &scan.series_description)
        .core("xnat:mrScanData/scanner/manufacturer", &session.manufacturer)
        .core("xnat:mrScanData/scanner/model", &session.scanner_model)
        .core("xnat:mrScanData/modality", &session.modality)
        .core("xnat:mrScanData/fieldStrength", &session.field_strength)
        .core("xnat:mrScanData/parameters/tr", &scan.repetition_time)
        .core("xnat:mrScanData/parameters/ti", &scan.echo_time)
        .core("xnat:mrScanData/parameters/te", &scan.inversion_time)
        .core("xnat:mrScanData/parameters/flip", scan.flip_angle)
        .core("xnat:mrScanData/parameters/scanSequence", &scan.pulse_sequence)
        .core("xnat:mrScanData/parameters/voxelRes/units", "mm")
        .core("xnat:mrScanData/parameters/voxelRes/x", &scan.voxel_spacing.x)
        .core("xnat:mrScanData/parameters/voxelRes/y", &scan.voxel_spacing.y)
        .core("xnat:mrScanData/parameters/voxelRes/z", &scan.voxel_spacing.z)
        .core("xnat:mrScanData/parameters/matrix/x", scan.matrix.x)
        .core("xnat:mrScanData/parameters/matrix/y", scan.matrix.y)
        .core("xnat:mrScanData/frames", scan.matrix.z)
        .core("xnat:mrScanData/parameters/acqType", &scan.acquisition_plane)
}

/// Per-level result of synchronizing one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyOutcome {
    pub subject: LevelStatus,
    pub session: LevelStatus,
    pub scan: LevelStatus,
    /// Handle of the scan entity, valid whether or not it was created
    pub scan_path: EntityPath,
}

impl HierarchyOutcome {
    /// The scan was already on the remote; the record needs no further work
    pub fn is_skipped(&self) -> bool {
        self.scan == LevelStatus::AlreadyExisted
    }
}

/// Creates the remote hierarchy for scan records within one project
pub struct HierarchySynchronizer {
    catalog: Arc<dyn RemoteCatalog>,
    project: String,
}

impl HierarchySynchronizer {
    pub fn new(catalog: Arc<dyn RemoteCatalog>, project: impl Into<String>) -> Self {
        Self {
            catalog,
            project: project.into(),
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Ensure subject, session and scan exist for `record`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Catalog`] on the first failed remote call.
    #[instrument(skip(self, record), fields(scan = %record.scan_id))]
    pub async fn synchronize(&self, record: &ScanRecord) -> Result<HierarchyOutcome> {
        let scan = scan_spec(&self.project, record);
        let catalog = self.catalog.as_ref();

        if catalog.exists(&scan.path).await.map_err(SyncError::Catalog)? {
            debug!(label = %scan.path.label(), "Scan already ingested");
            return Ok(HierarchyOutcome {
                subject: LevelStatus::Skipped,
                session: LevelStatus::Skipped,
                scan: LevelStatus::AlreadyExisted,
                scan_path: scan.path,
            });
        }

        let (_, subject) = ensure_exists(catalog, &subject_spec(&self.project, record)).await?;
        let (_, session) = ensure_exists(catalog, &session_spec(&self.project, record)).await?;

        // Absence was established above; no second existence check.
        create_entity(catalog, &scan).await?;

        Ok(HierarchyOutcome {
            subject,
            session,
            scan: LevelStatus::Created,
            scan_path: scan.path,
        })
    }
}
