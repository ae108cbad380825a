//! Configuration types for the three pipelines.
//!
//! Each pipeline takes one explicit configuration struct, built either
//! through its builder or from environment variables. Handlers read the
//! environment per invocation and pass the resulting `Result` into the
//! pipeline, so a missing setting is reported as a normal error response
//! before any bucket is touched.
//!
//! `from_lookup` variants take a closure instead of reading the process
//! environment, which keeps the validation testable.

use crate::error::PipelineError;
use crate::progress::ProgressCallback;
use std::fmt;

/// Source bucket holding the PDFs to scan.
pub const ENV_SOURCE_BUCKET: &str = "SOURCE_S3_BUCKET";
/// Destination bucket for extracted images.
pub const ENV_DESTINATION_BUCKET: &str = "DESTINATION_S3_BUCKET";
/// Key prefix for extracted images.
pub const ENV_DESTINATION_PREFIX: &str = "DESTINATION_S3_PREFIX";
/// Bedrock model identifier override.
pub const ENV_MODEL_ID: &str = "BEDROCK_MODEL_ID";
/// Bedrock region override.
pub const ENV_REGION: &str = "BEDROCK_REGION";
/// Lesson catalogue endpoint.
pub const ENV_OAK_API_URL: &str = "OAK_API_URL";
/// Bearer token for the lesson API.
pub const ENV_OAK_API_KEY: &str = "OAK_API_KEY";
/// Bucket receiving imported lesson PDFs.
pub const ENV_IMPORT_BUCKET: &str = "S3_BUCKET_NAME";

/// Default key prefix for extracted images.
pub const DEFAULT_DESTINATION_PREFIX: &str = "extracted_images/";
/// Default Bedrock model.
pub const DEFAULT_MODEL_ID: &str = "us.amazon.nova-lite-v1:0";
/// Default Bedrock region.
pub const DEFAULT_REGION: &str = "us-east-1";

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

// ── Image/caption extractor ──────────────────────────────────────────────

/// Configuration for the image/caption extractor.
///
/// Built via [`ExtractImagesConfig::builder()`] or
/// [`ExtractImagesConfig::from_env()`].
#[derive(Clone)]
pub struct ExtractImagesConfig {
    /// Bucket listed for `.pdf` objects.
    pub source_bucket: String,

    /// Bucket receiving every extracted image.
    pub destination_bucket: String,

    /// Prepended verbatim to every image key. Default: `extracted_images/`.
    pub destination_prefix: String,

    /// Optional per-document progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for ExtractImagesConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractImagesConfig")
            .field("source_bucket", &self.source_bucket)
            .field("destination_bucket", &self.destination_bucket)
            .field("destination_prefix", &self.destination_prefix)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractImagesConfig {
    /// Create a new builder for `ExtractImagesConfig`.
    pub fn builder() -> ExtractImagesConfigBuilder {
        ExtractImagesConfigBuilder {
            source_bucket: None,
            destination_bucket: None,
            destination_prefix: DEFAULT_DESTINATION_PREFIX.to_string(),
            progress_callback: None,
        }
    }

    /// Read `SOURCE_S3_BUCKET`, `DESTINATION_S3_BUCKET` and
    /// `DESTINATION_S3_PREFIX` from the process environment.
    pub fn from_env() -> Result<Self, PipelineError> {
        Self::from_lookup(env_lookup)
    }

    /// Like [`Self::from_env`], resolving names through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();
        if let Some(source) = lookup(ENV_SOURCE_BUCKET) {
            builder = builder.source_bucket(source);
        }
        if let Some(destination) = lookup(ENV_DESTINATION_BUCKET) {
            builder = builder.destination_bucket(destination);
        }
        if let Some(prefix) = lookup(ENV_DESTINATION_PREFIX) {
            builder = builder.destination_prefix(prefix);
        }
        builder.build()
    }
}

/// Builder for [`ExtractImagesConfig`].
pub struct ExtractImagesConfigBuilder {
    source_bucket: Option<String>,
    destination_bucket: Option<String>,
    destination_prefix: String,
    progress_callback: Option<ProgressCallback>,
}

impl ExtractImagesConfigBuilder {
    pub fn source_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.source_bucket = Some(bucket.into());
        self
    }

    pub fn destination_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.destination_bucket = Some(bucket.into());
        self
    }

    /// An empty prefix is allowed and writes images to the bucket root.
    pub fn destination_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.destination_prefix = prefix.into();
        self
    }

    pub fn progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// Every missing bucket is collected before failing, so one error names
    /// all of them.
    pub fn build(self) -> Result<ExtractImagesConfig, PipelineError> {
        let mut missing = Vec::new();
        let source = non_empty(self.source_bucket);
        let destination = non_empty(self.destination_bucket);
        if source.is_none() {
            missing.push(ENV_SOURCE_BUCKET.to_string());
        }
        if destination.is_none() {
            missing.push(ENV_DESTINATION_BUCKET.to_string());
        }
        match (source, destination) {
            (Some(source_bucket), Some(destination_bucket)) => Ok(ExtractImagesConfig {
                source_bucket,
                destination_bucket,
                destination_prefix: self.destination_prefix,
                progress_callback: self.progress_callback,
            }),
            _ => Err(PipelineError::MissingConfig { missing }),
        }
    }
}

// ── Question extractor ───────────────────────────────────────────────────

/// Configuration for the question extractor's Bedrock call.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizConfig {
    /// Bedrock model or inference-profile id. Default: `us.amazon.nova-lite-v1:0`.
    pub model_id: String,

    /// Region the Bedrock runtime client is created in. Default: `us-east-1`.
    pub region: String,

    /// Maximum tokens the model may generate. Default: 3000.
    pub max_tokens: u32,

    /// Nucleus sampling cut-off. Default: 0.1.
    pub top_p: f32,

    /// Top-k sampling cut-off. Default: 20.
    pub top_k: u32,

    /// Sampling temperature. Default: 0.3.
    pub temperature: f32,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            region: DEFAULT_REGION.to_string(),
            max_tokens: 3000,
            top_p: 0.1,
            top_k: 20,
            temperature: 0.3,
        }
    }
}

impl QuizConfig {
    /// Create a new builder for `QuizConfig`.
    pub fn builder() -> QuizConfigBuilder {
        QuizConfigBuilder {
            config: Self::default(),
        }
    }

    /// Defaults, overridden by `BEDROCK_MODEL_ID` and `BEDROCK_REGION`.
    pub fn from_env() -> Result<Self, PipelineError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();
        if let Some(model) = non_empty(lookup(ENV_MODEL_ID)) {
            builder = builder.model_id(model);
        }
        if let Some(region) = non_empty(lookup(ENV_REGION)) {
            builder = builder.region(region);
        }
        builder.build()
    }
}

/// Builder for [`QuizConfig`].
#[derive(Debug)]
pub struct QuizConfigBuilder {
    config: QuizConfig,
}

impl QuizConfigBuilder {
    pub fn model_id(mut self, id: impl Into<String>) -> Self {
        self.config.model_id = id.into();
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.config.region = region.into();
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn top_p(mut self, p: f32) -> Self {
        self.config.top_p = p.clamp(0.0, 1.0);
        self
    }

    pub fn top_k(mut self, k: u32) -> Self {
        self.config.top_k = k;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 1.0);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<QuizConfig, PipelineError> {
        let c = &self.config;
        if c.model_id.trim().is_empty() {
            return Err(PipelineError::InvalidConfig("model id must not be empty".into()));
        }
        if c.region.trim().is_empty() {
            return Err(PipelineError::InvalidConfig("region must not be empty".into()));
        }
        if c.max_tokens == 0 {
            return Err(PipelineError::InvalidConfig("max tokens must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

// ── Lesson asset importer ────────────────────────────────────────────────

/// Configuration for the lesson asset importer.
#[derive(Clone)]
pub struct ImportConfig {
    /// Lesson catalogue endpoint returning a JSON array of lessons.
    pub api_url: String,

    /// Bearer token sent with every lesson API request.
    pub api_key: String,

    /// Bucket that receives `{lessonSlug}/{type}.pdf`.
    pub bucket: String,

    /// Assets of one lesson downloaded/uploaded at once. Default: 5.
    ///
    /// Higher values quickly exhaust the S3 client's connection pool when
    /// many lessons run side by side.
    pub asset_concurrency: usize,

    /// Lessons processed at once. Default: 4.
    pub lesson_concurrency: usize,

    /// Per-request HTTP timeout in seconds. Default: 60.
    pub http_timeout_secs: u64,
}

impl fmt::Debug for ImportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("asset_concurrency", &self.asset_concurrency)
            .field("lesson_concurrency", &self.lesson_concurrency)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .finish()
    }
}

impl ImportConfig {
    /// Create a new builder for `ImportConfig`.
    pub fn builder() -> ImportConfigBuilder {
        ImportConfigBuilder {
            api_url: None,
            api_key: None,
            bucket: None,
            asset_concurrency: 5,
            lesson_concurrency: 4,
            http_timeout_secs: 60,
        }
    }

    /// Read `OAK_API_URL`, `OAK_API_KEY` and `S3_BUCKET_NAME`.
    pub fn from_env() -> Result<Self, PipelineError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();
        if let Some(url) = lookup(ENV_OAK_API_URL) {
            builder = builder.api_url(url);
        }
        if let Some(key) = lookup(ENV_OAK_API_KEY) {
            builder = builder.api_key(key);
        }
        if let Some(bucket) = lookup(ENV_IMPORT_BUCKET) {
            builder = builder.bucket(bucket);
        }
        builder.build()
    }
}

/// Builder for [`ImportConfig`].
#[derive(Debug)]
pub struct ImportConfigBuilder {
    api_url: Option<String>,
    api_key: Option<String>,
    bucket: Option<String>,
    asset_concurrency: usize,
    lesson_concurrency: usize,
    http_timeout_secs: u64,
}

impl ImportConfigBuilder {
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    pub fn asset_concurrency(mut self, n: usize) -> Self {
        self.asset_concurrency = n.max(1);
        self
    }

    pub fn lesson_concurrency(mut self, n: usize) -> Self {
        self.lesson_concurrency = n.max(1);
        self
    }

    pub fn http_timeout_secs(mut self, secs: u64) -> Self {
        self.http_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ImportConfig, PipelineError> {
        let api_url = non_empty(self.api_url);
        let api_key = non_empty(self.api_key);
        let bucket = non_empty(self.bucket);

        let mut missing = Vec::new();
        if api_url.is_none() {
            missing.push(ENV_OAK_API_URL.to_string());
        }
        if api_key.is_none() {
            missing.push(ENV_OAK_API_KEY.to_string());
        }
        if bucket.is_none() {
            missing.push(ENV_IMPORT_BUCKET.to_string());
        }

        match (api_url, api_key, bucket) {
            (Some(api_url), Some(api_key), Some(bucket)) => {
                if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
                    return Err(PipelineError::InvalidConfig(format!(
                        "{ENV_OAK_API_URL} must be an HTTP/HTTPS URL, got '{api_url}'"
                    )));
                }
                Ok(ImportConfig {
                    api_url,
                    api_key,
                    bucket,
                    asset_concurrency: self.asset_concurrency,
                    lesson_concurrency: self.lesson_concurrency,
                    http_timeout_secs: self.http_timeout_secs,
                })
            }
            _ => Err(PipelineError::MissingConfig { missing }),
        }
    }
}
