//! Lesson asset import entry point.
//!
//! Copies every asset PDF listed by the lesson API into the bucket the
//! image extractor scans, as `{lessonSlug}/{type}.pdf`.
//!
//! ## Concurrency
//!
//! Lessons run `lesson_concurrency` at a time and each lesson's assets run
//! `asset_concurrency` at a time, so at most their product of transfers is
//! in flight. `buffered` keeps results in catalogue order.

use crate::config::ImportConfig;
use crate::error::PipelineError;
use crate::output::{AssetResult, CatalogueEntry, ImportOutput, Lesson, LessonAsset, LessonResult};
use crate::pipeline::lessons::AssetSource;
use crate::pipeline::naming::asset_key;
use crate::storage::ObjectStore;
use futures::stream::{self, StreamExt};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Success message of an import run.
pub const IMPORT_COMPLETE_MESSAGE: &str = "Processing complete";
/// Failure message of an import run.
pub const IMPORT_FAILED_MESSAGE: &str = "Error processing lessons";

/// Content type of every imported asset.
const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Fetch the lesson catalogue and copy every asset into the bucket.
///
/// # Errors
/// Only a failed catalogue request or a body that is not a JSON array is
/// fatal. A malformed lesson becomes a [`LessonResult::Failed`] and asset
/// failures are reported in the matching [`AssetResult`].
pub async fn import_lessons(
    source: &dyn AssetSource,
    store: &dyn ObjectStore,
    config: &ImportConfig,
) -> Result<ImportOutput, PipelineError> {
    let start = Instant::now();
    let entries = source.list_lessons().await?;
    info!("Processing {} lessons", entries.len());

    let results: Vec<LessonResult> = stream::iter(entries.iter())
        .map(|entry| import_entry(source, store, config, entry))
        .buffered(config.lesson_concurrency.max(1))
        .collect()
        .await;

    let (uploaded, failed) = results
        .iter()
        .flat_map(|l| l.results().iter())
        .fold((0usize, 0usize), |(ok, err), r| {
            if r.is_success() {
                (ok + 1, err)
            } else {
                (ok, err + 1)
            }
        });
    info!(
        "Import complete: {} assets uploaded, {} failed, {}ms",
        uploaded,
        failed,
        start.elapsed().as_millis()
    );

    Ok(ImportOutput {
        message: IMPORT_COMPLETE_MESSAGE.to_string(),
        results,
    })
}

async fn import_entry(
    source: &dyn AssetSource,
    store: &dyn ObjectStore,
    config: &ImportConfig,
    entry: &CatalogueEntry,
) -> LessonResult {
    match entry {
        CatalogueEntry::Lesson(lesson) => import_lesson(source, store, config, lesson).await,
        CatalogueEntry::Invalid { lesson_slug, error } => {
            warn!(
                "Error processing lesson: {}: {}",
                lesson_slug.as_deref().unwrap_or("<no slug>"),
                error
            );
            LessonResult::Failed {
                lesson_slug: lesson_slug.clone(),
                error: error.clone(),
            }
        }
    }
}

async fn import_lesson(
    source: &dyn AssetSource,
    store: &dyn ObjectStore,
    config: &ImportConfig,
    lesson: &Lesson,
) -> LessonResult {
    debug!("Processing lesson: {}", lesson.lesson_slug);

    let results = stream::iter(lesson.assets.iter())
        .map(|asset| import_asset(source, store, &config.bucket, &lesson.lesson_slug, asset))
        .buffered(config.asset_concurrency.max(1))
        .collect()
        .await;

    LessonResult::Processed {
        lesson_slug: lesson.lesson_slug.clone(),
        lesson_title: lesson.lesson_title.clone(),
        results,
    }
}

async fn import_asset(
    source: &dyn AssetSource,
    store: &dyn ObjectStore,
    bucket: &str,
    lesson_slug: &str,
    asset: &LessonAsset,
) -> AssetResult {
    debug!("Processing asset: {} for lesson: {}", asset.asset_type, lesson_slug);
    let filename = asset_key(lesson_slug, &asset.asset_type);

    let bytes = match source.fetch_pdf(&asset.url).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Error processing asset {}: {}", asset.url, e);
            return AssetResult::failed(e.to_string(), asset.clone());
        }
    };

    if let Err(e) = store
        .put_object(bucket, &filename, bytes, Some(PDF_CONTENT_TYPE))
        .await
    {
        warn!("Error processing asset {}: {}", asset.url, e);
        return AssetResult::failed(e.detail().to_string(), asset.clone());
    }

    info!("Uploaded {} to s3://{}", filename, bucket);
    AssetResult::uploaded(filename, asset.asset_type.clone())
}
