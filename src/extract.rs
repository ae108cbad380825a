//! Image/caption extraction entry point.
//!
//! Walks every PDF in the source bucket one document at a time: fetch,
//! parse on the blocking pool, then upload each image and caption it from
//! the words around it. A document that fails is recorded in its
//! [`DocumentOutcome`] and the run moves on; only listing the bucket (or a
//! panicked parse task) aborts the whole run.

use crate::config::ExtractImagesConfig;
use crate::error::{DocumentError, PipelineError};
use crate::output::{DocumentOutcome, ExtractionOutput, ExtractionStats, ImageCaption};
use crate::pipeline::encode::ImageKind;
use crate::pipeline::layout::{caption_for, ParsedDocument, ParsedPage};
use crate::pipeline::naming::{image_key, is_pdf_key};
use crate::pipeline::parse::DocumentParser;
use crate::storage::{ObjectStore, S3Uri};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Extract, upload and caption every image of every PDF in the source
/// bucket.
///
/// # Returns
/// `Ok(ExtractionOutput)` whenever the bucket could be listed, even if some
/// documents failed (check `output.stats.failed_documents`).
///
/// # Errors
/// Returns `Err(PipelineError)` only for fatal errors:
/// - The source bucket cannot be listed
/// - A parse task panicked
pub async fn extract_images(
    store: &dyn ObjectStore,
    parser: Arc<dyn DocumentParser>,
    config: &ExtractImagesConfig,
) -> Result<ExtractionOutput, PipelineError> {
    let run_start = Instant::now();
    info!(
        "Scanning s3://{} for PDFs → s3://{}/{}",
        config.source_bucket, config.destination_bucket, config.destination_prefix
    );

    // ── Step 1: List the source bucket ───────────────────────────────────
    let keys: Vec<String> = store
        .list_keys(&config.source_bucket)
        .await?
        .into_iter()
        .filter(|key| is_pdf_key(key))
        .collect();
    let total = keys.len();
    info!("Found {} PDF objects", total);

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total);
    }

    // ── Step 2: One document at a time ───────────────────────────────────
    let mut documents = Vec::with_capacity(total);
    for (i, key) in keys.iter().enumerate() {
        let index = i + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_document_start(index, total, key);
        }

        let outcome = process_document(store, &parser, config, key).await?;

        match &outcome.error {
            None => {
                info!(
                    "{}: {} images uploaded, {} captioned, {}ms",
                    key,
                    outcome.images_uploaded,
                    outcome.records.len(),
                    outcome.duration_ms
                );
                if let Some(ref cb) = config.progress_callback {
                    cb.on_document_complete(index, total, key, outcome.records.len());
                }
            }
            Some(e) => {
                warn!(
                    "Error processing {}: {} ({} images uploaded before the failure)",
                    key, e, outcome.images_uploaded
                );
                if let Some(ref cb) = config.progress_callback {
                    cb.on_document_error(index, total, key, &e.to_string());
                }
            }
        }
        documents.push(outcome);
    }

    // ── Step 3: Assemble ─────────────────────────────────────────────────
    let records: Vec<ImageCaption> = documents
        .iter()
        .flat_map(|d| d.records.iter().cloned())
        .collect();

    let failed = documents.iter().filter(|d| !d.is_success()).count();
    let stats = ExtractionStats {
        total_documents: total,
        processed_documents: total - failed,
        failed_documents: failed,
        images_uploaded: documents.iter().map(|d| d.images_uploaded).sum(),
        captions_emitted: records.len(),
        total_duration_ms: run_start.elapsed().as_millis() as u64,
    };

    info!(
        "Extraction complete: {}/{} documents, {} images, {} captions, {}ms",
        stats.processed_documents,
        stats.total_documents,
        stats.images_uploaded,
        stats.captions_emitted,
        stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(total, stats.processed_documents);
    }

    Ok(ExtractionOutput {
        records,
        documents,
        stats,
    })
}

/// Fetch, parse, upload and caption one PDF.
///
/// Document-scoped failures end up in `outcome.error`; the outer `Err` is
/// reserved for a parse task that never returned.
async fn process_document(
    store: &dyn ObjectStore,
    parser: &Arc<dyn DocumentParser>,
    config: &ExtractImagesConfig,
    key: &str,
) -> Result<DocumentOutcome, PipelineError> {
    let start = Instant::now();
    let mut outcome = DocumentOutcome {
        key: key.to_string(),
        records: Vec::new(),
        images_uploaded: 0,
        pages: 0,
        duration_ms: 0,
        error: None,
    };

    let ParsedDocument { pages, failure } =
        fetch_and_parse(store, parser, &config.source_bucket, key).await?;

    // Pages read before a parse failure are still uploaded and captioned.
    let uploaded = upload_and_caption(store, config, key, pages, &mut outcome).await;

    outcome.error = uploaded.err().or(failure);
    outcome.duration_ms = start.elapsed().as_millis() as u64;
    Ok(outcome)
}

async fn fetch_and_parse(
    store: &dyn ObjectStore,
    parser: &Arc<dyn DocumentParser>,
    bucket: &str,
    key: &str,
) -> Result<ParsedDocument, PipelineError> {
    let bytes = match store.get_object(bucket, key).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return Ok(ParsedDocument::failed(DocumentError::FetchFailed {
                key: key.to_string(),
                detail: e.detail().to_string(),
            }))
        }
    };
    debug!("{}: downloaded {} bytes", key, bytes.len());

    let parser = Arc::clone(parser);
    let owned_key = key.to_string();
    tokio::task::spawn_blocking(move || parser.parse(&owned_key, bytes))
        .await
        .map_err(|e| PipelineError::Internal(format!("Parse task for '{}' panicked: {}", key, e)))
}

/// Upload every image in page order and record the captioned ones.
///
/// Stops at the first failed upload; records already pushed stay in
/// `outcome` because their images are in the bucket.
async fn upload_and_caption(
    store: &dyn ObjectStore,
    config: &ExtractImagesConfig,
    key: &str,
    pages: Vec<ParsedPage>,
    outcome: &mut DocumentOutcome,
) -> Result<(), DocumentError> {
    for (p, page) in pages.into_iter().enumerate() {
        outcome.pages += 1;
        let ParsedPage { images, words } = page;

        for (i, image) in images.into_iter().enumerate() {
            let destination = image_key(&config.destination_prefix, key, p + 1, i + 1, &image.filetype);
            let content_type = ImageKind::content_type_for_extension(&image.filetype.to_ascii_lowercase());

            store
                .put_object(&config.destination_bucket, &destination, image.content, Some(content_type))
                .await
                .map_err(|e| DocumentError::UploadFailed {
                    key: key.to_string(),
                    destination: destination.clone(),
                    detail: e.detail().to_string(),
                })?;
            outcome.images_uploaded += 1;

            let caption = caption_for(&image.bbox, &words);
            let image_ref = S3Uri::new(config.destination_bucket.as_str(), destination).to_string();
            if caption.is_empty() {
                debug!("{}: no caption found", image_ref);
                continue;
            }

            debug!("{}: caption '{}'", image_ref, caption);
            outcome.records.push(ImageCaption { image_ref, caption });
        }
    }
    Ok(())
}
