//! Error types for the oak-pdf-lambdas library.
//!
//! Four error types reflect four distinct failure scopes:
//!
//! * [`PipelineError`] — **Fatal**: the invocation cannot produce a result
//!   (missing configuration, source bucket cannot be listed, model reply is
//!   not JSON). Returned as `Err(PipelineError)` from the pipeline entry
//!   points and turned into a `500` response at the handler boundary.
//!
//! * [`DocumentError`] — **Non-fatal**: one PDF could not be fetched, parsed
//!   or have its images uploaded. Stored inside
//!   [`crate::output::DocumentOutcome`] so the run continues with the next
//!   document.
//!
//! * [`AssetError`] — one lesson asset could not be downloaded; recorded
//!   in that asset's result by the importer.
//!
//! * [`StorageError`] — raised by an [`crate::storage::ObjectStore`]; callers
//!   decide which fatal or non-fatal scope it belongs to.

use thiserror::Error;

/// All fatal errors returned by the pipelines.
#[derive(Debug, Error)]
pub enum PipelineError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// One or more required settings are absent. Every missing name is listed.
    #[error("Missing required configuration: {}", .missing.join(", "))]
    MissingConfig { missing: Vec<String> },

    /// Builder validation failed, or a setting has an unusable value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The invocation event is missing fields or has the wrong shape.
    #[error("{0}")]
    InvalidEvent(String),

    // ── Upstream errors ───────────────────────────────────────────────────
    /// The model replied, but not with the JSON shape we asked for.
    #[error("Model reply could not be parsed: {detail}")]
    UpstreamFormat { detail: String },

    /// The inference call itself failed (throttling, access denied, ...).
    #[error("Model invocation failed for '{model_id}': {detail}")]
    InferenceFailed { model_id: String, detail: String },

    /// The lesson catalogue could not be fetched or was malformed.
    #[error("{0}")]
    CatalogueFailed(String),

    // ── Storage errors ────────────────────────────────────────────────────
    /// Enumerating the source bucket failed.
    #[error("Error listing S3 objects in '{bucket}': {detail}")]
    ListingFailed { bucket: String, detail: String },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or ship libpdfium in a layer under /opt/lib."
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// True for errors caused by the caller's input or environment rather
    /// than by a collaborator.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PipelineError::MissingConfig { .. }
                | PipelineError::InvalidConfig(_)
                | PipelineError::InvalidEvent(_)
        )
    }
}

/// A non-fatal error for a single PDF.
///
/// Stored alongside [`crate::output::DocumentOutcome`] when a document fails.
/// The overall run continues with the next document.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum DocumentError {
    /// Downloading the PDF from the source bucket failed.
    #[error("{key}: download failed: {detail}")]
    FetchFailed { key: String, detail: String },

    /// The PDF engine could not open or walk the document.
    #[error("{key}: PDF parsing failed: {detail}")]
    ParseFailed { key: String, detail: String },

    /// An extracted image could not be written to the destination bucket.
    #[error("{key}: upload of '{destination}' failed: {detail}")]
    UploadFailed {
        key: String,
        destination: String,
        detail: String,
    },
}

/// A lesson asset could not be downloaded.
#[derive(Debug, Clone, Error)]
pub enum AssetError {
    /// The lesson API answered with something other than 200.
    #[error("HTTP Error: {status}")]
    Status { status: u16 },

    /// Connection, TLS or body-read failure.
    #[error("{0}")]
    Transport(String),
}

/// Errors raised by object-store implementations.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("listing bucket '{bucket}' failed: {detail}")]
    List { bucket: String, detail: String },

    #[error("reading s3://{bucket}/{key} failed: {detail}")]
    Get {
        bucket: String,
        key: String,
        detail: String,
    },

    #[error("writing s3://{bucket}/{key} failed: {detail}")]
    Put {
        bucket: String,
        key: String,
        detail: String,
    },
}

impl StorageError {
    /// The underlying service message, without the operation prefix.
    pub fn detail(&self) -> &str {
        match self {
            StorageError::List { detail, .. }
            | StorageError::Get { detail, .. }
            | StorageError::Put { detail, .. } => detail,
        }
    }
}

impl From<StorageError> for PipelineError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::List { bucket, detail } => PipelineError::ListingFailed { bucket, detail },
            other => PipelineError::Internal(other.to_string()),
        }
    }
}
