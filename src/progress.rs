//! Progress-callback trait for per-document extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractImagesConfigBuilder::progress_callback`] to receive
//! events as the image/caption extractor walks the source bucket.
//!
//! The Lambda handlers run without a callback; the local CLI forwards the
//! events to a terminal progress bar.
//!
//! # Example
//!
//! ```rust
//! use oak_pdf_lambdas::{ExtractImagesConfig, ExtractionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     captions: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for CountingCallback {
//!     fn on_document_complete(&self, _index: usize, _total: usize, key: &str, records: usize) {
//!         self.captions.fetch_add(records, Ordering::SeqCst);
//!         eprintln!("{key}: {records} captions");
//!     }
//! }
//!
//! let config = ExtractImagesConfig::builder()
//!     .source_bucket("pdf-storage")
//!     .destination_bucket("extracted-images")
//!     .progress_callback(Arc::new(CountingCallback { captions: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the extractor as it processes each PDF.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Documents are processed one at a time, but the
/// trait is `Send + Sync` so the callback can live inside a shared config.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once after the source bucket has been listed.
    ///
    /// # Arguments
    /// * `total_documents` — number of PDF keys that will be processed
    fn on_run_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called before a PDF is downloaded.
    ///
    /// # Arguments
    /// * `index` — 1-indexed position of the document in the run
    /// * `total` — total documents in the run
    /// * `key`   — source object key
    fn on_document_start(&self, index: usize, total: usize, key: &str) {
        let _ = (index, total, key);
    }

    /// Called when every image of a PDF was uploaded.
    ///
    /// # Arguments
    /// * `records` — captioned images emitted for this document
    fn on_document_complete(&self, index: usize, total: usize, key: &str, records: usize) {
        let _ = (index, total, key, records);
    }

    /// Called when a PDF fails; the run continues with the next one.
    fn on_document_error(&self, index: usize, total: usize, key: &str, error: &str) {
        let _ = (index, total, key, error);
    }

    /// Called once after all documents have been attempted.
    ///
    /// # Arguments
    /// * `total_documents` — documents in the run
    /// * `success_count`   — documents processed without error
    fn on_run_complete(&self, total_documents: usize, success_count: usize) {
        let _ = (total_documents, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractImagesConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
