//! Invocation boundary: run one pipeline and wrap the outcome in the
//! `{statusCode, body}` envelope API Gateway expects.
//!
//! Every fatal [`PipelineError`] stops here and becomes a `500` whose body
//! is `{"error": message}` (the importer uses its own failure shape). The
//! configuration is passed in as a `Result` so a missing setting is reported
//! before any collaborator is called.

use crate::config::{ExtractImagesConfig, ImportConfig, QuizConfig};
use crate::error::PipelineError;
use crate::extract::extract_images;
use crate::import::{import_lessons, IMPORT_FAILED_MESSAGE};
use crate::pipeline::inference::InferenceClient;
use crate::pipeline::lessons::AssetSource;
use crate::pipeline::parse::DocumentParser;
use crate::quiz::{describe_quiz, QuizRequest};
use crate::storage::ObjectStore;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, warn};

/// Proxy-style response: `body` is itself a JSON document, carried as a
/// string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LambdaResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl LambdaResponse {
    /// `200` with `payload` serialised as the body.
    pub fn ok<T: Serialize>(payload: &T) -> Self {
        match serde_json::to_string(payload) {
            Ok(body) => Self {
                status_code: 200,
                body,
            },
            Err(e) => Self::error(&PipelineError::Internal(format!(
                "Response serialisation failed: {e}"
            ))),
        }
    }

    /// `500` with `{"error": message}`.
    pub fn error(err: &PipelineError) -> Self {
        Self::with_json(500, json!({ "error": err.to_string() }))
    }

    fn with_json(status_code: u16, body: serde_json::Value) -> Self {
        Self {
            status_code,
            body: body.to_string(),
        }
    }

    /// Parse the body back into JSON.
    pub fn body_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// Question extractor: event → nine-field quiz object.
pub async fn handle_describe_quiz(
    event: serde_json::Value,
    client: &dyn InferenceClient,
    config: Result<QuizConfig, PipelineError>,
) -> LambdaResponse {
    let result = async {
        let config = config?;
        let request = QuizRequest::from_event(event)?;
        describe_quiz(&request, client, &config).await
    }
    .await;

    match result {
        Ok(quiz) => LambdaResponse::ok(&quiz),
        Err(e) => {
            log_failure("Error", &e);
            LambdaResponse::error(&e)
        }
    }
}

/// Image/caption extractor: the event is ignored.
///
/// `bind_parser` runs only once the configuration is known to be complete.
pub async fn handle_extract_images<P>(
    store: &dyn ObjectStore,
    bind_parser: P,
    config: Result<ExtractImagesConfig, PipelineError>,
) -> LambdaResponse
where
    P: FnOnce() -> Result<Arc<dyn DocumentParser>, PipelineError> + Send,
{
    let result = async {
        let config = config?;
        let parser = bind_parser()?;
        extract_images(store, parser, &config).await
    }
    .await;

    match result {
        Ok(output) => LambdaResponse::ok(&output.records),
        Err(e) => {
            log_failure("Error", &e);
            LambdaResponse::error(&e)
        }
    }
}

/// Lesson asset importer: the event is ignored.
pub async fn handle_import_lessons<S>(
    store: &dyn ObjectStore,
    connect_source: S,
    config: Result<ImportConfig, PipelineError>,
) -> LambdaResponse
where
    S: FnOnce(&ImportConfig) -> Result<Box<dyn AssetSource>, PipelineError> + Send,
{
    let result = async {
        let config = config?;
        let source = connect_source(&config)?;
        import_lessons(source.as_ref(), store, &config).await
    }
    .await;

    match result {
        Ok(output) => LambdaResponse::ok(&output),
        Err(e) => {
            log_failure("Error in lambda handler", &e);
            LambdaResponse::with_json(
                500,
                json!({ "message": IMPORT_FAILED_MESSAGE, "error": e.to_string() }),
            )
        }
    }
}

/// Bad input is the caller's problem, so it is logged one level lower.
fn log_failure(context: &str, e: &PipelineError) {
    if e.is_configuration() {
        warn!("{}: {}", context, e);
    } else {
        error!("{}: {}", context, e);
    }
}

/// Install the JSON log subscriber used inside Lambda.
///
/// `RUST_LOG` wins over the `info` default. Timestamps are left to the
/// platform, which stamps every line it captures.
#[cfg(feature = "lambda")]
pub fn init_lambda_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A subscriber may already be installed.
    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .try_init();
}
