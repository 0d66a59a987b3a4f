//! Common types and utilities shared across Gleaner crates.
//!
//! This crate defines the shared error taxonomy, the tagged result type
//! returned by every pipeline entry point, and observability helpers. It is
//! intentionally lightweight so that all crates can depend on it without
//! introducing heavy transitive costs.
//!
//! # Overview
//!
//! - [`GleanerError`] and [`Result`]: shared error handling inside the pipeline
//! - [`ErrorKind`]: the stable classification carried by failures
//! - [`PipelineResult`]: the `Success`/`Failure` shape handed to callers
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! # Examples
//!
//! Converting an internal result into the caller-facing shape:
//!
//! ```rust
//! use gleaner_common::{ErrorKind, GleanerError, PipelineResult};
//!
//! let failed: gleaner_common::Result<u32> = Err(GleanerError::NoResults);
//! let outcome = PipelineResult::from(failed);
//! assert_eq!(outcome.kind(), Some(ErrorKind::NoResults));
//! assert_eq!(outcome.message(), Some("no results found"));
//! ```
use serde::{Deserialize, Serialize};

pub mod observability;

/// Stable classification of a pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Network,
    Parse,
    NoResults,
    Validation,
    Cancelled,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Network => "network",
            ErrorKind::Parse => "parse",
            ErrorKind::NoResults => "no_results",
            ErrorKind::Validation => "validation",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Error types used across the Gleaner pipeline.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GleanerError {
    /// Configuration was incomplete or invalid (e.g. missing credentials).
    #[error("{0}")]
    Configuration(String),

    /// A fetch failed: DNS, connection, timeout, or a non-2xx status.
    #[error("network error: {0}")]
    Network(String),

    /// Markup or payload was present but unusable.
    #[error("parse error: {0}")]
    Parse(String),

    /// The search provider returned an empty result set.
    #[error("no results found")]
    NoResults,

    /// Caller input was malformed.
    #[error("{0}")]
    Validation(String),

    /// The parent call was cancelled before it completed.
    #[error("operation cancelled")]
    Cancelled,

    /// A fault that should never happen (a panic caught at the boundary).
    #[error("internal error: {0}")]
    Internal(String),
}

impl GleanerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GleanerError::Configuration(_) => ErrorKind::Configuration,
            GleanerError::Network(_) => ErrorKind::Network,
            GleanerError::Parse(_) => ErrorKind::Parse,
            GleanerError::NoResults => ErrorKind::NoResults,
            GleanerError::Validation(_) => ErrorKind::Validation,
            GleanerError::Cancelled => ErrorKind::Cancelled,
            GleanerError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn credentials_missing() -> Self {
        GleanerError::Configuration("credentials not configured".to_string())
    }
}

/// Convenient alias for results that use [`GleanerError`].
pub type Result<T> = std::result::Result<T, GleanerError>;

/// Outcome of a public pipeline operation.
///
/// Serialized adjacently tagged so any payload shape (documents, lists,
/// strings) fits:
///
/// ```
/// use gleaner_common::PipelineResult;
///
/// let ok: PipelineResult<Vec<u8>> = PipelineResult::Success(vec![1, 2]);
/// let json = serde_json::to_value(&ok).unwrap();
/// assert_eq!(json["status"], "success");
/// assert_eq!(json["data"], serde_json::json!([1, 2]));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum PipelineResult<T> {
    Success(T),
    Failure { kind: ErrorKind, message: String },
}

impl<T> PipelineResult<T> {
    pub fn failure(err: &GleanerError) -> Self {
        PipelineResult::Failure {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PipelineResult::Success(_))
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            PipelineResult::Success(_) => None,
            PipelineResult::Failure { kind, .. } => Some(*kind),
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            PipelineResult::Success(_) => None,
            PipelineResult::Failure { message, .. } => Some(message),
        }
    }

    pub fn ok(self) -> Option<T> {
        match self {
            PipelineResult::Success(v) => Some(v),
            PipelineResult::Failure { .. } => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> PipelineResult<U> {
        match self {
            PipelineResult::Success(v) => PipelineResult::Success(f(v)),
            PipelineResult::Failure { kind, message } => PipelineResult::Failure { kind, message },
        }
    }
}

impl<T> From<Result<T>> for PipelineResult<T> {
    fn from(res: Result<T>) -> Self {
        match res {
            Ok(v) => PipelineResult::Success(v),
            Err(e) => PipelineResult::failure(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_message_is_stable() {
        let err = GleanerError::credentials_missing();
        assert_eq!(err.to_string(), "credentials not configured");
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn failure_carries_kind_and_message() {
        let res: PipelineResult<()> =
            Err(GleanerError::Network("HTTP 503 for https://a.example".into())).into();
        assert!(!res.is_success());
        assert_eq!(res.kind(), Some(ErrorKind::Network));
        assert_eq!(
            res.message(),
            Some("network error: HTTP 503 for https://a.example")
        );
    }

    #[test]
    fn map_preserves_failure() {
        let res: PipelineResult<u8> = PipelineResult::failure(&GleanerError::Cancelled);
        let mapped = res.map(|v| v as u32 + 1);
        assert_eq!(mapped.kind(), Some(ErrorKind::Cancelled));
        assert_eq!(mapped.message(), Some("operation cancelled"));
    }

    #[test]
    fn failure_serializes_with_status_tag() {
        let res: PipelineResult<String> = PipelineResult::failure(&GleanerError::NoResults);
        let json = serde_json::to_value(&res).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["data"]["kind"], "no_results");
        assert_eq!(json["data"]["message"], "no results found");
    }
}
