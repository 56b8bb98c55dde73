use std::io;
use std::path::PathBuf;

use assessment_spec::{AssessmentResponse, DocumentIssue};
use thiserror::Error;

/// Failures reported by a persistence collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read or write {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode response record: {0}")]
    Cbor(#[from] serde_cbor::Error),
    #[error("{path} holds the assessment of job '{found}', not '{expected}'")]
    Conflict {
        path: PathBuf,
        expected: String,
        found: String,
    },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("invalid template '{name}': {source}")]
    Template {
        name: &'static str,
        #[source]
        source: Box<handlebars::RenderError>,
    },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("job id must not be empty")]
    MissingJobId,
    #[error("assessment title must not be empty")]
    MissingTitle,
    #[error("assessment has {} structural issue(s)", .0.len())]
    InvalidDocument(Vec<DocumentIssue>),
    #[error("no assessment exists for job '{0}'")]
    AssessmentNotFound(String),
    #[error("failed to load assessment for job '{job_id}': {source}")]
    LoadFailed {
        job_id: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to save assessment for job '{job_id}': {source}")]
    SaveFailed {
        job_id: String,
        #[source]
        source: StoreError,
    },
    /// The session was submitted but the record could not be stored; retry
    /// with [`crate::AssessmentService::record_responses`].
    #[error("failed to record responses {}: {source}", .record.id)]
    SubmitFailed {
        record: Box<AssessmentResponse>,
        #[source]
        source: StoreError,
    },
    #[error("template rendering failed: {0}")]
    Template(#[from] handlebars::RenderError),
}
