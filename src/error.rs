//! Error types for every stage of the pipeline
use std::fmt;

/// The coarse category of a [`PipelineError`], reported alongside the message at the output
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedDocument,
    UnknownDocumentType,
    NoDocTypeFound,
    InvalidDocumentCode,
    MissingField,
    InvalidQuantity,
    EncodingOverflow,
    InvalidCredential,
    SubmissionError,
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("Malformed document: {0}")]
    MalformedDocument(#[from] ParseError),
    #[error("No field map registered for document type '{0}'")]
    UnknownDocumentType(String),
    #[error("Document carries no transaction set identifier (ST01)")]
    NoDocTypeFound,
    #[error("Document type code '{0}' is not numeric")]
    InvalidDocumentCode(String),
    #[error("Document type {doc_type}: required field '{field}' is missing")]
    MissingField { doc_type: String, field: String },
    #[error("Document type {doc_type}: field '{field}' holds a non-numeric quantity {value:?}")]
    InvalidQuantity {
        doc_type: String,
        field: String,
        value: String,
    },
    #[error("Argument '{field}' cannot be encoded: {source}")]
    EncodingOverflow {
        field: String,
        #[source]
        source: EncodingError,
    },
    #[error("Credential rejected: {0}")]
    InvalidCredential(String),
    #[error("Ledger submission for key '{key}' failed: {source}")]
    SubmissionError {
        key: String,
        #[source]
        source: anyhow::Error,
    },
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::MalformedDocument(_) => ErrorKind::MalformedDocument,
            PipelineError::UnknownDocumentType(_) => ErrorKind::UnknownDocumentType,
            PipelineError::NoDocTypeFound => ErrorKind::NoDocTypeFound,
            PipelineError::InvalidDocumentCode(_) => ErrorKind::InvalidDocumentCode,
            PipelineError::MissingField { .. } => ErrorKind::MissingField,
            PipelineError::InvalidQuantity { .. } => ErrorKind::InvalidQuantity,
            PipelineError::EncodingOverflow { .. } => ErrorKind::EncodingOverflow,
            PipelineError::InvalidCredential(_) => ErrorKind::InvalidCredential,
            PipelineError::SubmissionError { .. } => ErrorKind::SubmissionError,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Structural failures while splitting raw bytes into an interchange envelope.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("Document is empty")]
    Empty,
    #[error("Document is not valid UTF-8")]
    NotUtf8,
    #[error("Document does not start with an ISA header")]
    MissingInterchangeHeader,
    #[error("ISA header is truncated, delimiters could not be read")]
    TruncatedHeader,
    #[error("Segment {index} ({tag}) appears outside of a transaction set")]
    SegmentOutsideTransaction { index: usize, tag: String },
    #[error("Segment {index} ({tag}) opens an envelope that is already open")]
    NestedEnvelope { index: usize, tag: String },
    #[error("Segment {index} ({tag}) closes an envelope that was never opened")]
    UnbalancedEnvelope { index: usize, tag: String },
    #[error("Interchange is missing its IEA trailer")]
    UnterminatedInterchange,
    #[error("Segment {index} ({tag}) follows the IEA trailer")]
    TrailingSegment { index: usize, tag: String },
    #[error("Interchange carries no transaction sets")]
    NoTransactions,
}

/// Failures compiling a path expression such as `N1-N401:N101["ST"]`.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum PathError {
    #[error("Path expression is empty")]
    Empty,
    #[error("'{0}' is not a segment element reference (expected e.g. BEG03)")]
    InvalidElement(String),
    #[error("Qualifier in '{0}' must look like REF01[\"IA\"]")]
    InvalidQualifier(String),
    #[error("Qualifier segment {qualifier} does not belong to path '{path}'")]
    QualifierMismatch { path: String, qualifier: String },
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Field '{field}' of document type {doc_type} has an invalid path: {source}")]
    InvalidPath {
        doc_type: String,
        field: String,
        #[source]
        source: PathError,
    },
    #[error("Environment variable {name} is invalid: {reason}")]
    InvalidEnv { name: &'static str, reason: String },
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum EncodingError {
    #[error("'{value}' is {len} bytes, which overflows a {width}-byte slot")]
    Overflow {
        value: String,
        len: usize,
        width: usize,
    },
    #[error("Fixed-width buffer is not valid UTF-8")]
    NotUtf8,
}
