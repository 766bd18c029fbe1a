//! Request rejection errors.
//!
//! Guards and callbacks fail with [`FhirError`]; the shared error path turns
//! it into an `OperationOutcome` response in the request's negotiated format.

use http::StatusCode;
use thiserror::Error;

use crate::resources::{IssueSeverity, OperationOutcome, ResourceError};
use crate::wire::UnsupportedFormat;

/// Errors an interaction can fail with.
///
/// Every variant maps to one HTTP status and one issue code, and the
/// response body is always an `OperationOutcome` derived from that mapping.
/// Clients therefore see the same error shape on every path, in whatever
/// format the request negotiated.
#[derive(Debug, Error)]
pub enum FhirError {
    /// The request could not be parsed or failed validation rules (400).
    #[error("{details}")]
    Malformed { details: String },

    /// The request lacks valid credentials (401).
    #[error("{details}")]
    Unauthorized { code: String, details: String },

    /// No resource exists under the requested identifier (404).
    #[error("Unknown {resource_type} resource '{id}'")]
    NotFound { resource_type: String, id: String },

    /// The resource violated server business rules (422).
    #[error("{details}")]
    Unprocessable { code: String, details: String },

    /// Any other standardized outcome, with an explicit status and issue.
    #[error("{details}")]
    General {
        status: StatusCode,
        severity: IssueSeverity,
        code: String,
        details: String,
    },
}

impl FhirError {
    pub fn malformed(details: impl Into<String>) -> Self {
        Self::Malformed {
            details: details.into(),
        }
    }

    pub fn unauthorized(details: impl Into<String>) -> Self {
        Self::unauthorized_with_code("unknown", details)
    }

    pub fn unauthorized_with_code(code: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Unauthorized {
            code: code.into(),
            details: details.into(),
        }
    }

    pub fn not_found(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    pub fn unprocessable(code: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Unprocessable {
            code: code.into(),
            details: details.into(),
        }
    }

    pub fn general(
        status: StatusCode,
        severity: IssueSeverity,
        code: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self::General {
            status,
            severity,
            code: code.into(),
            details: details.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Malformed { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unprocessable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::General { status, .. } => *status,
        }
    }

    pub fn severity(&self) -> IssueSeverity {
        match self {
            Self::General { severity, .. } => *severity,
            _ => IssueSeverity::Error,
        }
    }

    pub fn issue_code(&self) -> &str {
        match self {
            Self::Malformed { .. } => "structure",
            Self::Unauthorized { code, .. } => code,
            Self::NotFound { .. } => "not-found",
            Self::Unprocessable { code, .. } => code,
            Self::General { code, .. } => code,
        }
    }

    /// Build the error payload rendered to the client.
    pub fn to_outcome(&self) -> OperationOutcome {
        OperationOutcome::new(self.severity(), self.issue_code(), self.to_string())
    }
}

impl From<ResourceError> for FhirError {
    fn from(err: ResourceError) -> Self {
        Self::malformed(err.to_string())
    }
}

impl From<UnsupportedFormat> for FhirError {
    fn from(err: UnsupportedFormat) -> Self {
        Self::malformed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_codes() {
        assert_eq!(FhirError::malformed("bad").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            FhirError::unauthorized("no token").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            FhirError::not_found("Patient", "p1").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            FhirError::unprocessable("business-rule", "rejected").status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            FhirError::general(StatusCode::CONFLICT, IssueSeverity::Warning, "conflict", "busy")
                .status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_not_found_details_text() {
        let err = FhirError::not_found("Patient", "X");
        assert_eq!(err.to_string(), "Unknown Patient resource 'X'");
        assert_eq!(err.issue_code(), "not-found");
    }

    #[test]
    fn test_unauthorized_defaults_to_unknown_code() {
        assert_eq!(FhirError::unauthorized("no token").issue_code(), "unknown");
        assert_eq!(
            FhirError::unauthorized_with_code("expired", "stale token").issue_code(),
            "expired"
        );
    }

    #[test]
    fn test_outcome_payload_shape() {
        let outcome = FhirError::not_found("Patient", "X").to_outcome();
        let body = crate::resources::AnyResource::from_typed(&outcome).unwrap();
        assert_eq!(
            body.to_value(),
            json!({
                "resourceType": "OperationOutcome",
                "issue": [{
                    "severity": "error",
                    "code": "not-found",
                    "details": {"text": "Unknown Patient resource 'X'"},
                }],
            })
        );
    }

    #[test]
    fn test_resource_errors_map_to_malformed() {
        let err = FhirError::from(ResourceError::MissingType);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.issue_code(), "structure");
    }

    #[test]
    fn test_format_errors_map_to_malformed() {
        let err = FhirError::from(UnsupportedFormat {
            token: "yaml".to_string(),
        });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_string(),
            "Invalid response format specified for '_format' parameter"
        );
    }
}
