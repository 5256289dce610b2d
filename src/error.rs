//! Error types for validation and probing

use std::time::Duration;

/// Request rejected by validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckError {
    #[error("Incomplete proxy details provided")]
    InvalidInput,

    /// Carries the normalized protocol that was rejected
    #[error("Unsupported proxy protocol")]
    UnsupportedProtocol(String),
}

/// Failure of the single outbound probe, before classification
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("failed to build proxy client: {0}")]
    Client(#[source] reqwest::Error),

    #[error(transparent)]
    Request(#[from] reqwest::Error),

    #[error("Request failed with status code {}", .0.as_u16())]
    Status(reqwest::StatusCode),

    #[error("probe did not finish within the {0:?} timeout")]
    Deadline(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_the_wire_text() {
        assert_eq!(
            CheckError::InvalidInput.to_string(),
            "Incomplete proxy details provided"
        );
        assert_eq!(
            CheckError::UnsupportedProtocol("ftp".to_string()).to_string(),
            "Unsupported proxy protocol"
        );
    }

    #[test]
    fn test_probe_error_messages() {
        assert_eq!(
            ProbeError::Status(reqwest::StatusCode::FORBIDDEN).to_string(),
            "Request failed with status code 403"
        );
        assert!(ProbeError::Deadline(Duration::from_secs(15))
            .to_string()
            .contains("timeout"));
    }
}
