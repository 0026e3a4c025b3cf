//! Error types for the XNAT provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// XNAT provider errors
#[derive(Error, Debug)]
pub enum XnatError {
    /// Credentials rejected by the server (401/403)
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// REST call returned a non-success status
    #[error("XNAT API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Local file could not be read for upload
    #[error("Failed to read local file {path}: {message}")]
    LocalFile { path: String, message: String },

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

/// Result type for XNAT operations
pub type Result<T> = std::result::Result<T, XnatError>;

impl XnatError {
    /// Map a non-success response to an error
    pub(crate) fn from_status(status_code: u16, body: &str) -> Self {
        const MAX_MESSAGE_LEN: usize = 200;

        let mut message: String = body.trim().chars().take(MAX_MESSAGE_LEN).collect();
        if message.is_empty() {
            message = "<empty response body>".to_string();
        }

        match status_code {
            401 | 403 => XnatError::AuthenticationFailed(format!(
                "server responded with status {}",
                status_code
            )),
            _ => XnatError::ApiError {
                status_code,
                message,
            },
        }
    }
}

impl From<XnatError> for BridgeError {
    fn from(error: XnatError) -> Self {
        match error {
            XnatError::AuthenticationFailed(msg) => {
                BridgeError::OperationFailed(format!("Authentication failed: {}", msg))
            }
            XnatError::ApiError {
                status_code,
                message,
            } => BridgeError::OperationFailed(format!(
                "API error (status {}): {}",
                status_code, message
            )),
            XnatError::LocalFile { path, message } => {
                BridgeError::OperationFailed(format!("Failed to read {}: {}", path, message))
            }
            XnatError::BridgeError(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = XnatError::ApiError {
            status_code: 409,
            message: "Conflict".to_string(),
        };

        assert_eq!(error.to_string(), "XNAT API error (status 409): Conflict");
    }

    #[test]
    fn test_from_status() {
        assert!(matches!(
            XnatError::from_status(401, ""),
            XnatError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            XnatError::from_status(403, "denied"),
            XnatError::AuthenticationFailed(_)
        ));

        match XnatError::from_status(500, "") {
            XnatError::ApiError {
                status_code,
                message,
            } => {
                assert_eq!(status_code, 500);
                assert_eq!(message, "<empty response body>");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_long_body_is_truncated() {
        let body = "x".repeat(1000);
        match XnatError::from_status(400, &body) {
            XnatError::ApiError { message, .. } => assert_eq!(message.len(), 200),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_error_conversion() {
        let error = XnatError::AuthenticationFailed("bad password".to_string());
        let bridge_error: BridgeError = error.into();

        assert!(matches!(bridge_error, BridgeError::OperationFailed(_)));

        let bridge_error: BridgeError =
            XnatError::BridgeError(BridgeError::NotAvailable("http".into())).into();
        assert!(matches!(bridge_error, BridgeError::NotAvailable(_)));
    }
}
