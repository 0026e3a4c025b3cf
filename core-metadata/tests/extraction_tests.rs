//! Integration tests for sidecar extraction
//!
//! Uses the sidecar in tests/fixtures, modified per test where a field needs
//! to be removed or altered.

use core_metadata::{
    ClinicalScore, ExtractionError, MetadataError, MetadataExtractor, ScanIdentifier, Sex,
};
use std::path::PathBuf;
use tempfile::TempDir;

const FIXTURE: &str = "ADNI_002_S_0295_I45108.xml";

/// Helper to get the fixtures directory
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn fixture_xml() -> String {
    std::fs::read_to_string(fixtures_dir().join(FIXTURE)).expect("fixture sidecar")
}

fn scan_id() -> ScanIdentifier {
    ScanIdentifier::new("I45108")
}

#[tokio::test]
async fn test_extract_fixture_file() {
    let extractor = MetadataExtractor::new();
    let record = extractor
        .extract_from_file(&fixtures_dir().join(FIXTURE), scan_id())
        .await
        .unwrap();

    assert_eq!(record.subject_id(), "002_S_0295");
    assert_eq!(record.subject.apoe_a1, "3");
    assert_eq!(record.subject.apoe_a2, "4");
    assert_eq!(record.subject.sex, Sex::Male);

    assert_eq!(record.session_id(), "13408");
    assert_eq!(record.session_label(), "002_S_0295_13408");
    assert_eq!(record.session.date, "2006-04-18");
    assert_eq!(record.session.age, "84.8");
    assert_eq!(record.session.site, "002");
    assert_eq!(record.session.manufacturer, "GE MEDICAL SYSTEMS");
    assert_eq!(record.session.scanner_model, "SIGNA EXCITE");
    assert_eq!(record.session.modality, "MRI");
    assert_eq!(record.session.field_strength, "1.5");
    assert_eq!(record.session.coil, "8HRBRAIN");
    assert_eq!(record.session.visit_type, "ADNI Baseline");
    assert_eq!(record.session.clinical_group, "CN");

    assert_eq!(record.scan_label(), "45108");
    assert_eq!(record.scan.weighting, "T1");
    assert_eq!(
        record.scan.series_description,
        "MPRAGE; GradWarp; B1 Correction; N3; Scaled"
    );
    assert_eq!(record.scan.repetition_time, "2300.0");
    assert_eq!(record.scan.echo_time, "3.0");
    assert_eq!(record.scan.inversion_time, "900.0");
    assert_eq!(record.scan.pulse_sequence, "RM");
    assert_eq!(record.scan.voxel_spacing.x, "0.9375");
    assert_eq!(record.scan.voxel_spacing.z, "1.2");
    assert_eq!(record.scan.acquisition_plane, "SAGITTAL");
}

#[tokio::test]
async fn test_extract_missing_file() {
    let extractor = MetadataExtractor::new();
    let result = extractor
        .extract_from_file(&fixtures_dir().join("nonexistent.xml"), scan_id())
        .await;

    let err = result.unwrap_err();
    assert!(matches!(err, MetadataError::Io { .. }));
    assert!(err.to_string().contains("Failed to read file"));
}

#[tokio::test]
async fn test_extract_corrupted_file() {
    let dir = TempDir::new().unwrap();
    let corrupt_path = dir.path().join("corrupt_I1.xml");
    std::fs::write(&corrupt_path, b"<idaxs><project>").unwrap();

    let result = MetadataExtractor::default()
        .extract_from_file(&corrupt_path, ScanIdentifier::new("I1"))
        .await;

    assert!(matches!(
        result,
        Err(MetadataError::Extraction(ExtractionError::MalformedDocument(_)))
    ));
}

#[test]
fn test_integer_fields_are_truncated() {
    let record = MetadataExtractor::new()
        .extract_from_str(&fixture_xml(), scan_id())
        .unwrap();

    assert_eq!(record.scan.flip_angle, 11);
    assert_eq!(record.scan.matrix.x, 256);
    assert_eq!(record.scan.matrix.y, 256);
    assert_eq!(record.scan.matrix.z, 166);
}

#[test]
fn test_negative_values_truncate_toward_zero() {
    let xml = fixture_xml().replace(
        r#"<protocol term="Flip Angle">11.9</protocol>"#,
        r#"<protocol term="Flip Angle">-3.7</protocol>"#,
    );
    let record = MetadataExtractor::new()
        .extract_from_str(&xml, scan_id())
        .unwrap();

    assert_eq!(record.scan.flip_angle, -3);
}

#[test]
fn test_missing_required_field_names_the_field() {
    let xml = fixture_xml().replace(
        r#"<protocol term="Coil">8HRBRAIN</protocol>"#,
        "",
    );
    let err = MetadataExtractor::new()
        .extract_from_str(&xml, scan_id())
        .unwrap_err();

    match err {
        MetadataError::Extraction(e) => {
            assert_eq!(e, ExtractionError::MissingField("term='Coil'".into()));
            assert_eq!(e.field(), Some("term='Coil'"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_subject_identifier() {
    let xml = fixture_xml().replace("<subjectIdentifier>002_S_0295</subjectIdentifier>", "");
    let err = MetadataExtractor::new()
        .extract_from_str(&xml, scan_id())
        .unwrap_err();

    assert!(err.to_string().contains("subjectIdentifier"));
}

#[test]
fn test_empty_required_field() {
    let xml = fixture_xml().replace("<modality>MRI</modality>", "<modality></modality>");
    let err = MetadataExtractor::new()
        .extract_from_str(&xml, scan_id())
        .unwrap_err();

    assert!(matches!(
        err,
        MetadataError::Extraction(ExtractionError::EmptyField(ref f)) if f == "modality"
    ));
}

#[test]
fn test_non_numeric_integer_field() {
    let xml = fixture_xml().replace(
        r#"<protocol term="Matrix Z">166.0</protocol>"#,
        r#"<protocol term="Matrix Z">n/a</protocol>"#,
    );
    let err = MetadataExtractor::new()
        .extract_from_str(&xml, scan_id())
        .unwrap_err();

    assert!(matches!(
        err,
        MetadataError::Extraction(ExtractionError::InvalidNumber { ref value, .. }) if value == "n/a"
    ));
}

#[test]
fn test_optional_scores_use_sentinel() {
    let record = MetadataExtractor::new()
        .extract_from_str(&fixture_xml(), scan_id())
        .unwrap();
    let scores = &record.session.scores;

    assert_eq!(scores.mmse, ClinicalScore::Value("28".into()));
    assert_eq!(scores.cdr, ClinicalScore::Value("0.0".into()));
    assert_eq!(scores.faq, ClinicalScore::Value("0".into()));
    assert_eq!(scores.gds, ClinicalScore::Unknown);
    assert_eq!(scores.npi.as_str(), "Unknown");
}

#[test]
fn test_npi_marker_doubles_as_value() {
    let xml = fixture_xml().replace(
        "</visit>",
        r#"<assessmentScore attribute="NPISCORE">4</assessmentScore></visit>"#,
    );
    let record = MetadataExtractor::new()
        .extract_from_str(&xml, scan_id())
        .unwrap();

    assert_eq!(record.session.scores.npi.as_str(), "4");
}

#[test]
fn test_sex_other_than_m_is_female() {
    for code in ["F", "U", "X"] {
        let xml = fixture_xml().replace(
            "<subjectSex>M</subjectSex>",
            &format!("<subjectSex>{code}</subjectSex>"),
        );
        let record = MetadataExtractor::new()
            .extract_from_str(&xml, scan_id())
            .unwrap();
        assert_eq!(record.subject.sex, Sex::Female);
        assert_eq!(record.subject.sex.as_str(), "Female");
    }
}

#[test]
fn test_record_serializes_to_json() {
    let record = MetadataExtractor::new()
        .extract_from_str(&fixture_xml(), scan_id())
        .unwrap();
    let json = serde_json::to_value(&record).unwrap();

    assert_eq!(json["scan_id"], "I45108");
    assert_eq!(json["subject"]["subject_id"], "002_S_0295");
    assert_eq!(json["scan"]["matrix"]["x"], 256);
}
