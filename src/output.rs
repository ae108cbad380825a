//! Result types produced by the pipelines.
//!
//! Everything here is `Serialize` so handlers can hand it straight to
//! `serde_json` when building the response body.

use crate::error::DocumentError;
use serde::{Deserialize, Serialize};

// ── Image/caption extractor ──────────────────────────────────────────────

/// One uploaded image paired with the text found around it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageCaption {
    /// Fully qualified location, `s3://{bucket}/{key}`.
    #[serde(rename = "image-ref")]
    pub image_ref: String,

    /// Space-joined nearby words, trimmed. Never empty.
    pub caption: String,
}

/// Tagged result for one source PDF.
///
/// A failed document keeps the records emitted before the failure: the
/// matching images are already in the destination bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOutcome {
    /// Source object key.
    pub key: String,

    /// Captioned images emitted for this document.
    pub records: Vec<ImageCaption>,

    /// Images written to the destination bucket, captioned or not.
    pub images_uploaded: usize,

    /// Pages walked before finishing or failing.
    pub pages: usize,

    /// Wall-clock time spent on this document.
    pub duration_ms: u64,

    /// `Some` when the document failed part-way or entirely.
    pub error: Option<DocumentError>,
}

impl DocumentOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate counters for one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// PDF keys found in the source bucket.
    pub total_documents: usize,
    pub processed_documents: usize,
    pub failed_documents: usize,
    pub images_uploaded: usize,
    pub captions_emitted: usize,
    pub total_duration_ms: u64,
}

/// Everything an extraction run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// Records across all documents, in document/page/image order.
    pub records: Vec<ImageCaption>,

    /// One outcome per PDF key, in listing order.
    pub documents: Vec<DocumentOutcome>,

    pub stats: ExtractionStats,
}

// ── Question extractor ───────────────────────────────────────────────────

/// Keys the quiz prompt asks the model to return.
pub const QUIZ_FIELDS: [&str; 9] = [
    "lesson_name",
    "original_question",
    "original_answer_options",
    "original_correct_answer",
    "original_imageDescription",
    "new_question",
    "new_answer_options",
    "new_correct_answer",
    "new_imageDescription",
];

/// The quiz object exactly as the model returned it.
///
/// Values are not checked: answers may be numbers or `null`, options may be
/// a list of numbers or `"N/A"`, and keys beyond [`QUIZ_FIELDS`] are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuizExtraction(serde_json::Map<String, serde_json::Value>);

impl QuizExtraction {
    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.0.get(field)
    }

    pub fn lesson_name(&self) -> Option<&str> {
        self.get("lesson_name").and_then(serde_json::Value::as_str)
    }

    /// Prompted keys the reply left out.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        QUIZ_FIELDS
            .iter()
            .copied()
            .filter(|field| !self.0.contains_key(*field))
            .collect()
    }
}

// ── Lesson asset importer ────────────────────────────────────────────────

/// One asset listed by the lesson API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonAsset {
    #[serde(rename = "type")]
    pub asset_type: String,
    pub url: String,
}

/// One lesson listed by the lesson API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub lesson_slug: String,
    #[serde(default)]
    pub lesson_title: Option<String>,
    pub assets: Vec<LessonAsset>,
}

/// One element of the catalogue array, decoded on its own so a malformed
/// lesson does not sink the others.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogueEntry {
    Lesson(Lesson),
    Invalid {
        /// The element's `lessonSlug`, when it has a string one.
        lesson_slug: Option<String>,
        error: String,
    },
}

impl CatalogueEntry {
    pub fn from_value(value: serde_json::Value) -> Self {
        let lesson_slug = value
            .get("lessonSlug")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);
        match serde_json::from_value(value) {
            Ok(lesson) => CatalogueEntry::Lesson(lesson),
            Err(e) => CatalogueEntry::Invalid {
                lesson_slug,
                error: e.to_string(),
            },
        }
    }
}

impl From<Lesson> for CatalogueEntry {
    fn from(lesson: Lesson) -> Self {
        CatalogueEntry::Lesson(lesson)
    }
}

/// Result of copying one asset into the bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssetResult {
    Uploaded {
        success: bool,
        filename: String,
        #[serde(rename = "type")]
        asset_type: String,
    },
    Failed {
        success: bool,
        error: String,
        asset: LessonAsset,
    },
}

impl AssetResult {
    pub fn uploaded(filename: String, asset_type: String) -> Self {
        AssetResult::Uploaded {
            success: true,
            filename,
            asset_type,
        }
    }

    pub fn failed(error: String, asset: LessonAsset) -> Self {
        AssetResult::Failed {
            success: false,
            error,
            asset,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AssetResult::Uploaded { .. })
    }
}

/// Per-lesson summary in the importer's response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LessonResult {
    #[serde(rename_all = "camelCase")]
    Processed {
        lesson_slug: String,
        lesson_title: Option<String>,
        results: Vec<AssetResult>,
    },
    /// The catalogue element could not be read as a lesson.
    #[serde(rename_all = "camelCase")]
    Failed {
        #[serde(skip_serializing_if = "Option::is_none")]
        lesson_slug: Option<String>,
        error: String,
    },
}

impl LessonResult {
    pub fn lesson_slug(&self) -> Option<&str> {
        match self {
            LessonResult::Processed { lesson_slug, .. } => Some(lesson_slug),
            LessonResult::Failed { lesson_slug, .. } => lesson_slug.as_deref(),
        }
    }

    /// Asset results; empty for a failed lesson.
    pub fn results(&self) -> &[AssetResult] {
        match self {
            LessonResult::Processed { results, .. } => results,
            LessonResult::Failed { .. } => &[],
        }
    }
}

/// Success body of the importer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutput {
    pub message: String,
    pub results: Vec<LessonResult>,
}
