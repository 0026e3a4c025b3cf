//! # Sidecar Metadata Extractor
//!
//! Turns one XML sidecar into a fully populated [`ScanRecord`].
//!
//! Every field is located by a fixed query over the document: either the
//! first descendant with a given tag name, or the first descendant carrying a
//! given attribute value (`item="APOE A1"`, `term="TR"`, ...). Required fields
//! fail fast: the first one that is missing or empty aborts the record.
//!
//! Clinical scores are optional. Each one is guarded by a presence marker; if
//! the marker is absent the score is recorded as `"Unknown"`.
//!
//! ## Usage
//!
//! ```ignore
//! use core_metadata::{MetadataExtractor, ScanIdentifier};
//!
//! let extractor = MetadataExtractor::new();
//! let record = extractor
//!     .extract_from_file(sidecar_path, ScanIdentifier::new("I123"))
//!     .await?;
//! println!("{}", record.session_label());
//! ```

use crate::error::{ExtractionError, MetadataError, Result};
use crate::record::{
    ClinicalScore, ClinicalScores, MatrixSize, ScanIdentifier, ScanParameters, ScanRecord,
    SessionInfo, Sex, SubjectInfo, VoxelSpacing,
};
use roxmltree::{Document, Node};
use std::fmt;
use std::path::Path;
use tracing::{debug, instrument};

/// How a single field is located in the sidecar
#[derive(Debug, Clone, Copy)]
enum Query {
    /// First descendant element with this tag name
    Tag(&'static str),
    /// First descendant element whose attribute `name` equals `value`
    Attr {
        name: &'static str,
        value: &'static str,
    },
}

impl Query {
    const fn item(value: &'static str) -> Self {
        Query::Attr { name: "item", value }
    }

    const fn term(value: &'static str) -> Self {
        Query::Attr { name: "term", value }
    }

    const fn attribute(value: &'static str) -> Self {
        Query::Attr {
            name: "attribute",
            value,
        }
    }

    fn matches(&self, node: &Node<'_, '_>) -> bool {
        if !node.is_element() {
            return false;
        }
        match self {
            Query::Tag(tag) => node.tag_name().name() == *tag,
            Query::Attr { name, value } => node.attribute(*name) == Some(*value),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Tag(tag) => f.write_str(tag),
            Query::Attr { name, value } => write!(f, "{}='{}'", name, value),
        }
    }
}

// Subject
const SUBJECT_ID: Query = Query::Tag("subjectIdentifier");
const APOE_A1: Query = Query::item("APOE A1");
const APOE_A2: Query = Query::item("APOE A2");
const SUBJECT_SEX: Query = Query::Tag("subjectSex");

// Session
const SESSION_ID: Query = Query::Tag("seriesIdentifier");
const DATE_ACQUIRED: Query = Query::Tag("dateAcquired");
const SUBJECT_AGE: Query = Query::Tag("subjectAge");
const SITE: Query = Query::Tag("siteKey");
const MANUFACTURER: Query = Query::term("Manufacturer");
const SCANNER_MODEL: Query = Query::term("Mfg Model");
const MODALITY: Query = Query::Tag("modality");
const FIELD_STRENGTH: Query = Query::term("Field Strength");
const COIL: Query = Query::term("Coil");
const VISIT_TYPE: Query = Query::Tag("visitIdentifier");
const CLINICAL_GROUP: Query = Query::Tag("researchGroup");

// Scan
const WEIGHTING: Query = Query::term("Weighting");
const SERIES_DESCRIPTION: Query = Query::Tag("processedDataLabel");
const REPETITION_TIME: Query = Query::term("TR");
const ECHO_TIME: Query = Query::term("TE");
const INVERSION_TIME: Query = Query::term("TI");
const FLIP_ANGLE: Query = Query::term("Flip Angle");
const PULSE_SEQUENCE: Query = Query::term("Pulse Sequence");
const SPACING_X: Query = Query::term("Pixel Spacing X");
const SPACING_Y: Query = Query::term("Pixel Spacing Y");
const SLICE_THICKNESS: Query = Query::term("Slice Thickness");
const MATRIX_X: Query = Query::term("Matrix X");
const MATRIX_Y: Query = Query::term("Matrix Y");
const MATRIX_Z: Query = Query::term("Matrix Z");
const ACQUISITION_PLANE: Query = Query::term("Acquisition Plane");

/// Optional clinical scores: (presence marker, value)
const MMSE: (Query, Query) = (Query::attribute("mmse"), Query::attribute("MMSCORE"));
const CDR: (Query, Query) = (Query::attribute("cdr"), Query::attribute("CDGLOBAL"));
const GDS: (Query, Query) = (Query::attribute("gds"), Query::attribute("GDTOTAL"));
const FAQ: (Query, Query) = (Query::attribute("faq"), Query::attribute("FAQTOTAL"));
const NPI: (Query, Query) = (
    Query::attribute("NPISCORE"),
    Query::attribute("NPISCORE"),
);

/// Stateless sidecar reader
#[derive(Debug, Default, Clone)]
pub struct MetadataExtractor;

impl MetadataExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Read and extract a sidecar from disk
    #[instrument(skip(self, path), fields(file = %display_name(path)))]
    pub async fn extract_from_file(
        &self,
        path: &Path,
        scan_id: ScanIdentifier,
    ) -> Result<ScanRecord> {
        let xml = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| MetadataError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let record = self.extract_from_str(&xml, scan_id)?;
        debug!(
            subject = %record.subject_id(),
            session = %record.session_id(),
            "Extracted scan metadata"
        );
        Ok(record)
    }

    /// Extract a record from sidecar text
    pub fn extract_from_str(&self, xml: &str, scan_id: ScanIdentifier) -> Result<ScanRecord> {
        let document = Document::parse(xml)
            .map_err(|e| ExtractionError::MalformedDocument(e.to_string()))?;
        let sidecar = Sidecar {
            root: document.root_element(),
        };

        let subject = SubjectInfo {
            subject_id: sidecar.text(SUBJECT_ID)?,
            apoe_a1: sidecar.text(APOE_A1)?,
            apoe_a2: sidecar.text(APOE_A2)?,
            sex: Sex::from_code(&sidecar.text(SUBJECT_SEX)?),
        };

        let session = SessionInfo {
            session_id: sidecar.text(SESSION_ID)?,
            date: sidecar.text(DATE_ACQUIRED)?,
            age: sidecar.text(SUBJECT_AGE)?,
            site: sidecar.text(SITE)?,
            manufacturer: sidecar.text(MANUFACTURER)?,
            scanner_model: sidecar.text(SCANNER_MODEL)?,
            modality: sidecar.text(MODALITY)?,
            field_strength: sidecar.text(FIELD_STRENGTH)?,
            coil: sidecar.text(COIL)?,
            visit_type: sidecar.text(VISIT_TYPE)?,
            clinical_group: sidecar.text(CLINICAL_GROUP)?,
            scores: ClinicalScores {
                mmse: sidecar.score(MMSE)?,
                cdr: sidecar.score(CDR)?,
                gds: sidecar.score(GDS)?,
                faq: sidecar.score(FAQ)?,
                npi: sidecar.score(NPI)?,
            },
        };

        let scan = ScanParameters {
            weighting: sidecar.text(WEIGHTING)?,
            series_description: sidecar.text(SERIES_DESCRIPTION)?,
            repetition_time: sidecar.text(REPETITION_TIME)?,
            echo_time: sidecar.text(ECHO_TIME)?,
            inversion_time: sidecar.text(INVERSION_TIME)?,
            flip_angle: sidecar.integer(FLIP_ANGLE)?,
            pulse_sequence: sidecar.text(PULSE_SEQUENCE)?,
            voxel_spacing: VoxelSpacing {
                x: sidecar.text(SPACING_X)?,
                y: sidecar.text(SPACING_Y)?,
                z: sidecar.text(SLICE_THICKNESS)?,
            },
            matrix: MatrixSize {
                x: sidecar.integer(MATRIX_X)?,
                y: sidecar.integer(MATRIX_Y)?,
                z: sidecar.integer(MATRIX_Z)?,
            },
            acquisition_plane: sidecar.text(ACQUISITION_PLANE)?,
        };

        Ok(ScanRecord {
            scan_id,
            subject,
            session,
            scan,
        })
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Parsed sidecar document
struct Sidecar<'a, 'input> {
    root: Node<'a, 'input>,
}

impl<'a, 'input> Sidecar<'a, 'input> {
    /// First match in document order, excluding the root element itself
    fn find(&self, query: Query) -> Option<Node<'a, 'input>> {
        self.root
            .descendants()
            .skip(1)
            .find(|node| query.matches(node))
    }

    /// Required text field
    fn text(&self, query: Query) -> std::result::Result<String, ExtractionError> {
        let node = self
            .find(query)
            .ok_or_else(|| ExtractionError::MissingField(query.to_string()))?;

        match node.text().map(str::trim) {
            Some(text) if !text.is_empty() => Ok(text.to_string()),
            _ => Err(ExtractionError::EmptyField(query.to_string())),
        }
    }

    /// Required integer field, parsed as a float and truncated toward zero
    fn integer(&self, query: Query) -> std::result::Result<i64, ExtractionError> {
        let raw = self.text(query)?;
        truncate_to_integer(&raw).ok_or_else(|| ExtractionError::InvalidNumber {
            field: query.to_string(),
            value: raw,
        })
    }

    /// Optional score guarded by a presence marker
    fn score(
        &self,
        (marker, value): (Query, Query),
    ) -> std::result::Result<ClinicalScore, ExtractionError> {
        if self.find(marker).is_none() {
            return Ok(ClinicalScore::Unknown);
        }
        self.text(value).map(ClinicalScore::Value)
    }
}

/// Parse `raw` as `f64` and truncate toward zero.
///
/// Returns `None` for non-numeric or non-finite input.
pub fn truncate_to_integer(raw: &str) -> Option<i64> {
    let value: f64 = raw.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(value.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_to_integer() {
        assert_eq!(truncate_to_integer("11.9"), Some(11));
        assert_eq!(truncate_to_integer("256.7"), Some(256));
        assert_eq!(truncate_to_integer("-3.7"), Some(-3));
        assert_eq!(truncate_to_integer(" 8 "), Some(8));
        assert_eq!(truncate_to_integer("abc"), None);
        assert_eq!(truncate_to_integer("NaN"), None);
        assert_eq!(truncate_to_integer("inf"), None);
    }

    #[test]
    fn test_query_display() {
        assert_eq!(SUBJECT_ID.to_string(), "subjectIdentifier");
        assert_eq!(FLIP_ANGLE.to_string(), "term='Flip Angle'");
    }

    #[test]
    fn test_first_match_in_document_order_wins() {
        let xml = r#"<root><a term="TR">2300</a><b><c term="TR">9999</c></b></root>"#;
        let document = Document::parse(xml).unwrap();
        let sidecar = Sidecar {
            root: document.root_element(),
        };

        assert_eq!(sidecar.text(REPETITION_TIME).unwrap(), "2300");
    }

    #[test]
    fn test_root_element_is_not_matched() {
        let xml = r#"<subjectIdentifier><x/></subjectIdentifier>"#;
        let document = Document::parse(xml).unwrap();
        let sidecar = Sidecar {
            root: document.root_element(),
        };

        assert_eq!(
            sidecar.text(SUBJECT_ID),
            Err(ExtractionError::MissingField("subjectIdentifier".into()))
        );
    }

    #[test]
    fn test_empty_node_is_rejected() {
        let xml = r#"<root><subjectIdentifier>  </subjectIdentifier></root>"#;
        let document = Document::parse(xml).unwrap();
        let sidecar = Sidecar {
            root: document.root_element(),
        };

        assert_eq!(
            sidecar.text(SUBJECT_ID),
            Err(ExtractionError::EmptyField("subjectIdentifier".into()))
        );
    }

    #[test]
    fn test_score_marker_without_value_is_missing() {
        let xml = r#"<root><a attribute="mmse"/></root>"#;
        let document = Document::parse(xml).unwrap();
        let sidecar = Sidecar {
            root: document.root_element(),
        };

        assert_eq!(
            sidecar.score(MMSE),
            Err(ExtractionError::MissingField("attribute='MMSCORE'".into()))
        );
        assert_eq!(sidecar.score(CDR), Ok(ClinicalScore::Unknown));
    }

    #[test]
    fn test_malformed_document() {
        let err = MetadataExtractor::new()
            .extract_from_str("<root>", ScanIdentifier::new("I1"))
            .unwrap_err();
        assert!(matches!(
            err,
            MetadataError::Extraction(ExtractionError::MalformedDocument(_))
        ));
    }
}
