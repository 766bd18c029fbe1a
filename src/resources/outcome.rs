//! The standardized error payload.
//!
//! Every handled failure is rendered as an `OperationOutcome` carrying one
//! or more issues in insertion order, and the payload travels through the
//! same negotiation and composition path as any success body.

use serde::{Deserialize, Serialize};

use super::FhirResource;

/// Issue severity vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Fatal,
    Error,
    Warning,
    Information,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct IssueDetails {
    text: String,
}

/// One issue record: severity, a fixed-vocabulary code, and human text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeIssue {
    severity: IssueSeverity,
    code: String,
    details: IssueDetails,
}

impl OutcomeIssue {
    pub fn new(
        severity: IssueSeverity,
        code: impl Into<String>,
        details_text: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code: code.into(),
            details: IssueDetails {
                text: details_text.into(),
            },
        }
    }

    pub fn severity(&self) -> IssueSeverity {
        self.severity
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn details_text(&self) -> &str {
        &self.details.text
    }
}

/// Ordered collection of issues describing a handled failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationOutcome {
    issue: Vec<OutcomeIssue>,
}

impl OperationOutcome {
    /// Build a single-issue outcome.
    pub fn new(
        severity: IssueSeverity,
        code: impl Into<String>,
        details_text: impl Into<String>,
    ) -> Self {
        Self {
            issue: vec![OutcomeIssue::new(severity, code, details_text)],
        }
    }

    /// Build a single-issue outcome at `error` severity, the common case.
    pub fn error(code: impl Into<String>, details_text: impl Into<String>) -> Self {
        Self::new(IssueSeverity::Error, code, details_text)
    }

    /// Append an issue, preserving insertion order.
    pub fn push(
        &mut self,
        severity: IssueSeverity,
        code: impl Into<String>,
        details_text: impl Into<String>,
    ) {
        self.issue.push(OutcomeIssue::new(severity, code, details_text));
    }

    pub fn issues(&self) -> &[OutcomeIssue] {
        &self.issue
    }
}

impl FhirResource for OperationOutcome {
    const RESOURCE_TYPE: &'static str = "OperationOutcome";

    fn id(&self) -> Option<&str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::AnyResource;
    use serde_json::json;

    #[test]
    fn test_single_issue_shape() {
        let outcome = OperationOutcome::error("not-found", "Unknown Patient resource 'X'");
        let body = AnyResource::from_typed(&outcome).unwrap();
        assert_eq!(
            body.to_value(),
            json!({
                "resourceType": "OperationOutcome",
                "issue": [{
                    "severity": "error",
                    "code": "not-found",
                    "details": {"text": "Unknown Patient resource 'X'"}
                }]
            })
        );
    }

    #[test]
    fn test_issues_keep_insertion_order() {
        let mut outcome = OperationOutcome::error("structure", "first");
        outcome.push(IssueSeverity::Warning, "informational", "second");
        let codes: Vec<_> = outcome.issues().iter().map(OutcomeIssue::code).collect();
        assert_eq!(codes, vec!["structure", "informational"]);
    }
}
