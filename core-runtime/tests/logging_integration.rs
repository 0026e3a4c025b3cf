//! Integration tests for logging system

use core_runtime::logging::{
    init_logging, redact_if_sensitive, strip_path, LogFormat, LogLevel, LoggingConfig,
};
use std::path::Path;

#[test]
fn test_logging_initializes_once() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug);

    assert!(init_logging(config.clone()).is_ok());
    // A global subscriber is already installed for this process
    assert!(init_logging(config).is_err());

    tracing::info!(scan = "I123", "logging works after initialization");
}

#[test]
fn test_invalid_custom_filter_is_rejected() {
    let config = LoggingConfig::default().with_filter("core_sync=notalevel");
    let err = init_logging(config).unwrap_err();
    assert!(err.to_string().contains("Invalid log filter"));
}

#[test]
fn test_credentials_are_redacted() {
    assert_eq!(redact_if_sensitive("password", "my_password"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("api_token", "abc"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("project", "ADNI"), "ADNI");
}

#[test]
fn test_path_stripping() {
    let path = Path::new("/mnt/exports/ADNI/002_S_0295/MPRAGE/2006-04-18/S13408/ADNI_002_S_0295_I45108.nii.gz");
    assert_eq!(strip_path(path), "ADNI_002_S_0295_I45108.nii.gz");
}
