//! # oak-pdf-lambdas
//!
//! AWS Lambda handlers for turning Oak lesson PDFs into quiz material.
//!
//! ## Pipelines
//!
//! ```text
//! lesson API ──▶ import-lessons ──▶ source bucket ──▶ extract-images ──▶ destination bucket
//!                                        │                (pdfium)         + [{image-ref, caption}]
//!                                        │
//!                                        └──────────▶ describe-quiz ──▶ Bedrock (Nova)
//!                                                                        + nine-field quiz JSON
//! ```
//!
//! 1. **describe-quiz** ([`describe_quiz`]) sends one quiz PDF to a Bedrock
//!    model, which picks a question, solves it, describes its image and
//!    writes a similar new question.
//! 2. **extract-images** ([`extract_images`]) walks every PDF in a bucket,
//!    uploads each embedded image and captions it with the words printed
//!    within 50 units of it.
//! 3. **import-lessons** ([`import_lessons`]) copies every lesson asset PDF
//!    from the lesson API into the source bucket.
//!
//! Each pipeline takes its collaborators as trait objects
//! ([`ObjectStore`], [`DocumentParser`], [`InferenceClient`],
//! [`AssetSource`]) so tests can run them without AWS or pdfium.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use oak_pdf_lambdas::{extract_images, ExtractImagesConfig, PdfiumParser, S3ObjectStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractImagesConfig::builder()
//!         .source_bucket("pdf-storage")
//!         .destination_bucket("extracted-images")
//!         .build()?;
//!     let store = S3ObjectStore::shared().await;
//!     let parser = Arc::new(PdfiumParser::bind()?);
//!
//!     let output = extract_images(&store, parser, &config).await?;
//!     for record in &output.records {
//!         println!("{} → {}", record.image_ref, record.caption);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `lambda` | on      | The three Lambda binaries (lambda_runtime + JSON tracing) |
//! | `cli`    | on      | The `oak-pdf` binary (clap + anyhow + indicatif) |
//!
//! Disable both when using only the library:
//! ```toml
//! oak-pdf-lambdas = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod handler;
pub mod import;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod quiz;
pub mod storage;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ExtractImagesConfig, ExtractImagesConfigBuilder, ImportConfig, ImportConfigBuilder, QuizConfig,
    QuizConfigBuilder,
};
pub use error::{AssetError, DocumentError, PipelineError, StorageError};
pub use extract::extract_images;
pub use handler::{handle_describe_quiz, handle_extract_images, handle_import_lessons, LambdaResponse};
pub use import::import_lessons;
pub use output::{
    AssetResult, CatalogueEntry, DocumentOutcome, ExtractionOutput, ExtractionStats, ImageCaption,
    ImportOutput, Lesson, LessonAsset, LessonResult, QuizExtraction,
};
pub use pipeline::inference::{BedrockInferenceClient, InferenceClient};
pub use pipeline::layout::{BoundingBox, PageImage, ParsedDocument, ParsedPage, Word};
pub use pipeline::lessons::{parse_catalogue, AssetSource, OakApiClient};
pub use pipeline::parse::{DocumentParser, PdfiumParser};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use quiz::{describe_quiz, QuizRequest};
pub use storage::{MemoryObjectStore, ObjectStore, S3ObjectStore, S3Uri};
