//! Quiz description entry point: one PDF in S3, one model call, one
//! nine-field JSON object out.

use crate::config::QuizConfig;
use crate::error::PipelineError;
use crate::output::QuizExtraction;
use crate::pipeline::inference::{build_quiz_request, parse_quiz_reply, InferenceClient};
use crate::storage::S3Uri;
use serde::Deserialize;
use std::time::Instant;
use tracing::{debug, info};

/// Reported when either location field is absent or empty.
pub const MISSING_LOCATION_MESSAGE: &str =
    "Both 's3_uri' and 'bucket_owner' must be provided in the event.";

/// Invocation event for the question extractor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuizRequest {
    /// `s3://bucket/key` of the quiz PDF.
    #[serde(default)]
    pub s3_uri: Option<String>,

    /// Account id owning the bucket.
    #[serde(default)]
    pub bucket_owner: Option<String>,

    /// 1-based index of the question to pick. Values below 2 pick the first.
    #[serde(default = "first_question")]
    pub question_number: i64,
}

fn first_question() -> i64 {
    1
}

impl QuizRequest {
    pub fn new(s3_uri: impl Into<String>, bucket_owner: impl Into<String>, question_number: i64) -> Self {
        Self {
            s3_uri: Some(s3_uri.into()),
            bucket_owner: Some(bucket_owner.into()),
            question_number,
        }
    }

    /// Decode a raw invocation event. Unknown fields are ignored.
    pub fn from_event(event: serde_json::Value) -> Result<Self, PipelineError> {
        serde_json::from_value(event)
            .map_err(|e| PipelineError::InvalidEvent(format!("Malformed event: {e}")))
    }

    fn location(&self) -> Result<(&str, &str), PipelineError> {
        fn present(v: &Option<String>) -> Option<&str> {
            v.as_deref().filter(|s| !s.is_empty())
        }
        match (present(&self.s3_uri), present(&self.bucket_owner)) {
            (Some(uri), Some(owner)) => Ok((uri, owner)),
            _ => Err(PipelineError::InvalidEvent(MISSING_LOCATION_MESSAGE.to_string())),
        }
    }
}

/// Ask the model to pick one question from the PDF, solve and describe it,
/// and write a similar new one.
///
/// # Errors
/// - [`PipelineError::InvalidEvent`] when the location is incomplete
/// - [`PipelineError::InferenceFailed`] when the model call fails
/// - [`PipelineError::UpstreamFormat`] when the reply is not the expected JSON
pub async fn describe_quiz(
    request: &QuizRequest,
    client: &dyn InferenceClient,
    config: &QuizConfig,
) -> Result<QuizExtraction, PipelineError> {
    let start = Instant::now();
    let (s3_uri, bucket_owner) = request.location()?;
    let location = S3Uri::parse(s3_uri)?;
    info!(
        "Describing question {} of {} with {}",
        request.question_number, location, config.model_id
    );

    let body = build_quiz_request(
        s3_uri,
        bucket_owner,
        &location.key,
        request.question_number,
        config,
    );
    let body = serde_json::to_vec(&body)
        .map_err(|e| PipelineError::Internal(format!("Request serialisation failed: {e}")))?;
    debug!("Request body: {} bytes", body.len());

    let reply = client.invoke(&config.model_id, body).await?;
    let quiz = parse_quiz_reply(&reply)?;

    info!(
        "Described '{}' in {}ms",
        quiz.lesson_name().unwrap_or("unnamed lesson"),
        start.elapsed().as_millis()
    );
    Ok(quiz)
}
