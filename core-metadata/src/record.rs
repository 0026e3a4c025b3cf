//! Canonical scan record produced from one XML sidecar

use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Suffix of primary image volumes
pub const VOLUME_SUFFIX: &str = ".nii.gz";

/// Local scan token, e.g. `I123`.
///
/// Taken from the last `_`-separated component of a volume file name. The
/// remote scan label is the token without its leading letter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ScanIdentifier(String);

impl ScanIdentifier {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Derive the identifier from a volume path such as
    /// `.../ADNI_002_S_0295_MR_..._S13408_I45108.nii.gz`.
    ///
    /// Returns `None` if the file name does not end in `.nii.gz` or has no
    /// usable trailing token.
    pub fn from_volume_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let stem = name.strip_suffix(VOLUME_SUFFIX)?;
        let token = stem.rsplit('_').next()?;
        if token.chars().count() < 2 {
            return None;
        }
        Some(Self(token.to_string()))
    }

    /// Token as it appears in local file names
    pub fn token(&self) -> &str {
        &self.0
    }

    /// Label of the scan entity on the remote catalog
    pub fn label(&self) -> &str {
        let mut chars = self.0.chars();
        chars.next();
        chars.as_str()
    }
}

impl fmt::Display for ScanIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sentinel stored for clinical scores the sidecar does not declare
pub const UNKNOWN: &str = "Unknown";

/// Subject sex as declared by the sidecar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// `M` maps to male; every other code maps to female.
    // TODO: confirm with the data owners whether codes other than M/F
    // (unknown, other) need their own category.
    pub fn from_code(code: &str) -> Self {
        if code == "M" {
            Sex::Male
        } else {
            Sex::Female
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
        }
    }
}

/// Optional clinical score: either the recorded value or [`UNKNOWN`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ClinicalScore {
    Value(String),
    Unknown,
}

impl ClinicalScore {
    pub fn as_str(&self) -> &str {
        match self {
            ClinicalScore::Value(value) => value,
            ClinicalScore::Unknown => UNKNOWN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClinicalScores {
    pub mmse: ClinicalScore,
    pub cdr: ClinicalScore,
    pub gds: ClinicalScore,
    pub faq: ClinicalScore,
    pub npi: ClinicalScore,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectInfo {
    pub subject_id: String,
    pub apoe_a1: String,
    pub apoe_a2: String,
    pub sex: Sex,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub date: String,
    pub age: String,
    pub site: String,
    pub manufacturer: String,
    pub scanner_model: String,
    pub modality: String,
    pub field_strength: String,
    pub coil: String,
    pub visit_type: String,
    pub clinical_group: String,
    pub scores: ClinicalScores,
}

/// Voxel spacing in millimetres, kept as declared
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoxelSpacing {
    pub x: String,
    pub y: String,
    pub z: String,
}

/// Matrix dimensions, truncated toward zero from the declared values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatrixSize {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanParameters {
    /// Weighting, used as the scan type
    pub weighting: String,
    pub series_description: String,
    pub repetition_time: String,
    /// Value of the `TE` term
    pub echo_time: String,
    /// Value of the `TI` term
    pub inversion_time: String,
    pub flip_angle: i64,
    pub pulse_sequence: String,
    pub voxel_spacing: VoxelSpacing,
    pub matrix: MatrixSize,
    pub acquisition_plane: String,
}

/// Everything the synchronizer needs to know about one scan.
///
/// Built only by [`MetadataExtractor`](crate::extractor::MetadataExtractor);
/// every field is populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanRecord {
    pub scan_id: ScanIdentifier,
    pub subject: SubjectInfo,
    pub session: SessionInfo,
    pub scan: ScanParameters,
}

impl ScanRecord {
    pub fn subject_id(&self) -> &str {
        &self.subject.subject_id
    }

    pub fn session_id(&self) -> &str {
        &self.session.session_id
    }

    /// Session label on the remote catalog: `<subject>_<session>`
    pub fn session_label(&self) -> String {
        format!("{}_{}", self.subject.subject_id, self.session.session_id)
    }

    /// Scan label on the remote catalog
    pub fn scan_label(&self) -> &str {
        self.scan_id.label()
    }

    /// Stem shared by every derived artifact of this scan
    pub fn artifact_stem(&self) -> String {
        format!(
            "{}_{}_{}",
            self.subject.subject_id,
            self.session.session_id,
            self.scan_label()
        )
    }
}
