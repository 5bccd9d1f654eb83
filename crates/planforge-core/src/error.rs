//! Error taxonomy for Planforge
//!
//! Five kinds matter to callers: validation failures are permanent for a
//! given input, cycles kill the whole batch, policy violations route to a
//! human, external-service failures may be retried, and duplicate conflicts
//! soft-reject a single area.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Permanent schema noncompliance. The named subject is rejected
    /// immediately; nothing retries this.
    #[error("validation failed for '{subject}': {reason}")]
    Validation { subject: String, reason: String },

    /// Fatal for the whole batch. Carries exactly the unresolved node names.
    #[error("dependency cycle among: {}", .nodes.join(", "))]
    Cycle { nodes: Vec<String> },

    /// Soft: the area routes to a human reviewer, not a failure.
    #[error("policy violation: {0}")]
    PolicyViolation(String),

    /// Transient collaborator failure, surfaced after retries are exhausted.
    #[error("external service '{service}' failed: {message}")]
    ExternalService {
        service: String,
        message: String,
        transient: bool,
    },

    /// Soft rejection of one area; the batch continues.
    #[error("duplicate conflict for '{area}': {reason}")]
    DuplicateConflict { area: String, reason: String },

    #[error("not found: {0}")]
    NotFound(String),

    /// Caller-initiated abort. In-flight work completed and was recorded;
    /// no manifest was emitted.
    #[error("batch cancelled")]
    Cancelled,

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// What the caller should do about an error, without parsing prose.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Recovery {
    Retry,
    FixInput,
    Escalate,
}

impl Error {
    pub fn validation(subject: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            subject: subject.into(),
            reason: reason.into(),
        }
    }

    pub fn external(
        service: impl Into<String>,
        message: impl Into<String>,
        transient: bool,
    ) -> Self {
        Self::ExternalService {
            service: service.into(),
            message: message.into(),
            transient,
        }
    }

    pub fn duplicate(area: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DuplicateConflict {
            area: area.into(),
            reason: reason.into(),
        }
    }

    /// Machine-readable kind tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Cycle { .. } => "cycle",
            Self::PolicyViolation(_) => "policy_violation",
            Self::ExternalService { .. } => "external_service",
            Self::DuplicateConflict { .. } => "duplicate_conflict",
            Self::NotFound(_) => "not_found",
            Self::Cancelled => "cancelled",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
        }
    }

    pub fn recovery(&self) -> Recovery {
        match self {
            Self::ExternalService { transient: true, .. } | Self::Cancelled => Recovery::Retry,
            Self::PolicyViolation(_) => Recovery::Escalate,
            _ => Recovery::FixInput,
        }
    }

    /// Wrap for the coordinator boundary: timestamp, correlation id,
    /// machine-readable kind, and a recovery hint.
    pub fn report(&self, correlation_id: impl Into<String>) -> ErrorReport {
        ErrorReport {
            timestamp: Utc::now(),
            correlation_id: correlation_id.into(),
            kind: self.kind().to_string(),
            message: self.to_string(),
            recovery: self.recovery(),
        }
    }
}

/// Error surfaced at the coordinator boundary.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorReport {
    pub timestamp: DateTime<Utc>,
    pub correlation_id: String,
    pub kind: String,
    pub message: String,
    pub recovery: Recovery,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovery_hints() {
        assert_eq!(
            Error::external("llm", "timeout", true).recovery(),
            Recovery::Retry
        );
        assert_eq!(
            Error::external("llm", "bad auth", false).recovery(),
            Recovery::FixInput
        );
        assert_eq!(
            Error::validation("a", "missing field").recovery(),
            Recovery::FixInput
        );
        assert_eq!(
            Error::PolicyViolation("uncertified".into()).recovery(),
            Recovery::Escalate
        );
    }

    #[test]
    fn cycle_error_names_nodes() {
        let err = Error::Cycle {
            nodes: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.kind(), "cycle");
        assert!(err.to_string().contains("a, b"));
    }

    #[test]
    fn report_carries_kind_and_hint() {
        let report = Error::duplicate("caching", "matches prior work").report("corr-1");
        assert_eq!(report.kind, "duplicate_conflict");
        assert_eq!(report.correlation_id, "corr-1");
        assert_eq!(report.recovery, Recovery::FixInput);
    }
}
