//! In-memory fakes shared by the integration tests. No network, no pdfium.

#![allow(dead_code)]

use async_trait::async_trait;
use oak_pdf_lambdas::{
    AssetError, AssetSource, BoundingBox, CatalogueEntry, DocumentError, DocumentParser,
    InferenceClient, Lesson, MemoryObjectStore, ObjectStore, PageImage, ParsedDocument, ParsedPage,
    PipelineError, StorageError, Word,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

// ── Object store ─────────────────────────────────────────────────────────────

/// [`MemoryObjectStore`] that counts calls and can be told to fail.
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemoryObjectStore,
    pub lists: AtomicUsize,
    pub gets: AtomicUsize,
    pub puts: AtomicUsize,
    pub fail_listing: bool,
    /// Uploads whose key contains this fragment fail with AccessDenied.
    pub fail_put_containing: Option<String>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_calls(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
            + self.gets.load(Ordering::SeqCst)
            + self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for CountingStore {
    async fn list_keys(&self, bucket: &str) -> Result<Vec<String>, StorageError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing {
            return Err(StorageError::List {
                bucket: bucket.to_string(),
                detail: "AccessDenied: Access Denied".to_string(),
            });
        }
        self.inner.list_keys(bucket).await
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get_object(bucket, key).await
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<(), StorageError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if let Some(fragment) = &self.fail_put_containing {
            if key.contains(fragment.as_str()) {
                return Err(StorageError::Put {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                    detail: "AccessDenied: Access Denied".to_string(),
                });
            }
        }
        self.inner.put_object(bucket, key, body, content_type).await
    }
}

// ── Document parser ──────────────────────────────────────────────────────────

/// Parser that looks the PDF bytes up in a table. Unknown bytes fail to parse.
#[derive(Default)]
pub struct FakeParser {
    documents: HashMap<Vec<u8>, ParsedDocument>,
    pub calls: AtomicUsize,
}

impl FakeParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, bytes: &[u8], pages: Vec<ParsedPage>) -> Self {
        self.documents
            .insert(bytes.to_vec(), ParsedDocument::complete(pages));
        self
    }

    /// `pages` parse, then the next page fails with `detail`.
    pub fn with_failing_page(mut self, bytes: &[u8], pages: Vec<ParsedPage>, detail: &str) -> Self {
        let failed_page = pages.len() + 1;
        self.documents.insert(
            bytes.to_vec(),
            ParsedDocument {
                pages,
                failure: Some(DocumentError::ParseFailed {
                    key: String::new(),
                    detail: format!("page {failed_page}: {detail}"),
                }),
            },
        );
        self
    }
}

impl DocumentParser for FakeParser {
    fn parse(&self, key: &str, pdf: Vec<u8>) -> ParsedDocument {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let Some(document) = self.documents.get(&pdf) else {
            return ParsedDocument::failed(DocumentError::ParseFailed {
                key: key.to_string(),
                detail: "PdfiumLibraryInternalError(FormatError)".to_string(),
            });
        };

        let mut document = document.clone();
        if let Some(DocumentError::ParseFailed { key: failed_key, .. }) = &mut document.failure {
            *failed_key = key.to_string();
        }
        document
    }
}

pub fn bbox(left: f32, top: f32, right: f32, bottom: f32) -> BoundingBox {
    BoundingBox::new(left, top, right, bottom)
}

pub fn png(left: f32, top: f32, right: f32, bottom: f32, content: &[u8]) -> PageImage {
    PageImage {
        filetype: "png".to_string(),
        content: content.to_vec(),
        bbox: bbox(left, top, right, bottom),
    }
}

pub fn word(text: &str, left: f32, top: f32, right: f32, bottom: f32) -> Word {
    Word::new(text, bbox(left, top, right, bottom))
}

// ── Inference client ─────────────────────────────────────────────────────────

/// Returns a canned reply and remembers every request body.
pub struct FakeInference {
    reply: Result<Vec<u8>, String>,
    pub requests: Mutex<Vec<(String, serde_json::Value)>>,
}

impl FakeInference {
    /// Reply whose `output.message.content[0].text` is `text`.
    pub fn replying_text(text: &str) -> Self {
        let body = serde_json::json!({
            "output": { "message": { "role": "assistant", "content": [{ "text": text }] } },
            "stopReason": "end_turn",
            "usage": { "inputTokens": 1200, "outputTokens": 250 }
        });
        Self {
            reply: Ok(body.to_string().into_bytes()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(detail: &str) -> Self {
        Self {
            reply: Err(detail.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> serde_json::Value {
        self.requests.lock().unwrap().last().unwrap().1.clone()
    }
}

#[async_trait]
impl InferenceClient for FakeInference {
    async fn invoke(&self, model_id: &str, body: Vec<u8>) -> Result<Vec<u8>, PipelineError> {
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        self.requests
            .lock()
            .unwrap()
            .push((model_id.to_string(), value));
        self.reply
            .clone()
            .map_err(|detail| PipelineError::InferenceFailed {
                model_id: model_id.to_string(),
                detail,
            })
    }
}

// ── Asset source ─────────────────────────────────────────────────────────────

pub fn catalogue_of(lessons: Vec<Lesson>) -> Vec<CatalogueEntry> {
    lessons.into_iter().map(CatalogueEntry::from).collect()
}

/// Lesson catalogue and asset bytes served from memory.
#[derive(Default)]
pub struct FakeAssetSource {
    pub catalogue: Vec<CatalogueEntry>,
    pub catalogue_error: Option<String>,
    /// url → bytes; a missing url answers 404.
    pub assets: HashMap<String, Vec<u8>>,
    pub fetches: AtomicUsize,
}

#[async_trait]
impl AssetSource for FakeAssetSource {
    async fn list_lessons(&self) -> Result<Vec<CatalogueEntry>, PipelineError> {
        if let Some(error) = &self.catalogue_error {
            return Err(PipelineError::CatalogueFailed(error.clone()));
        }
        Ok(self.catalogue.clone())
    }

    async fn fetch_pdf(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.assets
            .get(url)
            .cloned()
            .ok_or(AssetError::Status { status: 404 })
    }
}
