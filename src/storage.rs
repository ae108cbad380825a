//! Object storage: the [`ObjectStore`] seam, its S3 implementation and an
//! in-memory implementation.
//!
//! Pipelines only ever talk to `dyn ObjectStore`, so the Lambda handlers
//! pass an [`S3ObjectStore`] wrapping the process-wide client while tests
//! pass a [`MemoryObjectStore`].

use crate::error::{PipelineError, StorageError};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;
use tokio::sync::OnceCell;
use tracing::debug;

/// Keyed blob storage, as used by the pipelines.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Every key in `bucket`, across all listing pages, in listing order.
    async fn list_keys(&self, bucket: &str) -> Result<Vec<String>, StorageError>;

    /// Full content of one object.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Create or overwrite one object.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<(), StorageError>;
}

// ── S3 locations ─────────────────────────────────────────────────────────

/// A parsed `s3://bucket/key` location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Uri {
    pub bucket: String,
    pub key: String,
}

impl S3Uri {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Split a location into bucket and key.
    ///
    /// The `s3://` scheme is optional. The first path segment is the bucket
    /// and the rest, slashes included, is the key. An empty bucket is
    /// rejected; an empty key is allowed.
    pub fn parse(uri: &str) -> Result<Self, PipelineError> {
        let rest = uri.strip_prefix("s3://").unwrap_or(uri);
        let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return Err(PipelineError::InvalidEvent(format!(
                "'{uri}' is not an S3 location (expected s3://bucket/key)"
            )));
        }
        Ok(Self::new(bucket, key))
    }
}

impl fmt::Display for S3Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

// ── S3 ───────────────────────────────────────────────────────────────────

static SHARED_S3_CLIENT: OnceCell<aws_sdk_s3::Client> = OnceCell::const_new();

/// The process-wide S3 client, created from the default credential chain on
/// first use and reused by every later invocation.
pub async fn shared_s3_client() -> &'static aws_sdk_s3::Client {
    SHARED_S3_CLIENT
        .get_or_init(|| async {
            let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
            debug!(region = ?sdk_config.region(), "S3 client initialised");
            aws_sdk_s3::Client::new(&sdk_config)
        })
        .await
}

/// [`ObjectStore`] backed by Amazon S3.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    /// Wrap the process-wide client.
    pub async fn shared() -> Self {
        Self::new(shared_s3_client().await.clone())
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list_keys(&self, bucket: &str) -> Result<Vec<String>, StorageError> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .into_paginator()
            .send();

        let mut keys = Vec::new();
        let mut page_count = 0usize;
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| StorageError::List {
                bucket: bucket.to_string(),
                detail: DisplayErrorContext(&e).to_string(),
            })?;
            page_count += 1;
            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );
        }

        debug!(bucket, pages = page_count, keys = keys.len(), "Listed bucket");
        Ok(keys)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let get_err = |detail: String| StorageError::Get {
            bucket: bucket.to_string(),
            key: key.to_string(),
            detail,
        };

        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| get_err(DisplayErrorContext(&e).to_string()))?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| get_err(e.to_string()))?
            .into_bytes();

        Ok(bytes.to_vec())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<(), StorageError> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .set_content_type(content_type.map(str::to_string))
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StorageError::Put {
                bucket: bucket.to_string(),
                key: key.to_string(),
                detail: DisplayErrorContext(&e).to_string(),
            })?;

        debug!(bucket, key, bytes = size, "Uploaded object");
        Ok(())
    }
}

// ── In-memory ────────────────────────────────────────────────────────────

/// A stored object in a [`MemoryObjectStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

/// [`ObjectStore`] keeping everything in a map. Listing is in key order,
/// like S3. Buckets must be created before they can be listed.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    buckets: Mutex<BTreeMap<String, BTreeMap<String, StoredObject>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `bucket` exist, empty if it did not before.
    pub fn create_bucket(&self, bucket: &str) {
        self.lock().entry(bucket.to_string()).or_default();
    }

    /// Store an object, creating its bucket on demand.
    pub fn insert(&self, bucket: &str, key: &str, body: impl Into<Vec<u8>>) {
        self.lock().entry(bucket.to_string()).or_default().insert(
            key.to_string(),
            StoredObject {
                body: body.into(),
                content_type: None,
            },
        );
    }

    /// Look up a stored object.
    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.lock().get(bucket).and_then(|b| b.get(key)).cloned()
    }

    /// Keys currently in `bucket`, in order.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.lock()
            .get(bucket)
            .map(|b| b.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, BTreeMap<String, StoredObject>>> {
        // A poisoned map is still structurally valid; keep serving it.
        self.buckets.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn list_keys(&self, bucket: &str) -> Result<Vec<String>, StorageError> {
        self.lock()
            .get(bucket)
            .map(|b| b.keys().cloned().collect())
            .ok_or_else(|| StorageError::List {
                bucket: bucket.to_string(),
                detail: "NoSuchBucket: The specified bucket does not exist".to_string(),
            })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        self.object(bucket, key)
            .map(|o| o.body)
            .ok_or_else(|| StorageError::Get {
                bucket: bucket.to_string(),
                key: key.to_string(),
                detail: "NoSuchKey: The specified key does not exist".to_string(),
            })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<(), StorageError> {
        self.lock().entry(bucket.to_string()).or_default().insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.map(str::to_string),
            },
        );
        Ok(())
    }
}
