//! Model interaction: build the Nova request for one quiz document and read
//! the reply.
//!
//! This module only knows the wire shape of the `messages-v1` schema. The
//! wording of the request lives in [`crate::prompts`] so it can change
//! without touching the serde types here.
//!
//! The Bedrock SDK applies its standard retry policy to throttling and
//! transient service errors; nothing here retries on top of it, and a reply
//! that does not parse is never retried.

use crate::config::QuizConfig;
use crate::error::PipelineError;
use crate::output::QuizExtraction;
use crate::pipeline::postprocess::clean_reply;
use crate::prompts::{quiz_instruction, QUIZ_SYSTEM_PROMPT};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_bedrockruntime::config::Region;
use aws_sdk_bedrockruntime::error::DisplayErrorContext;
use aws_sdk_bedrockruntime::primitives::Blob;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Schema version understood by the Nova models.
pub const NOVA_SCHEMA_VERSION: &str = "messages-v1";

/// Sends one serialised request body to a model and returns the raw reply.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn invoke(&self, model_id: &str, body: Vec<u8>) -> Result<Vec<u8>, PipelineError>;
}

// ── Bedrock ──────────────────────────────────────────────────────────────

static BEDROCK_CLIENTS: Lazy<Mutex<HashMap<String, aws_sdk_bedrockruntime::Client>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// [`InferenceClient`] backed by the Bedrock runtime `InvokeModel` API.
#[derive(Debug, Clone)]
pub struct BedrockInferenceClient {
    client: aws_sdk_bedrockruntime::Client,
}

impl BedrockInferenceClient {
    pub fn new(client: aws_sdk_bedrockruntime::Client) -> Self {
        Self { client }
    }

    /// Client for `region`, created on first use and reused afterwards.
    pub async fn shared(region: &str) -> Self {
        let mut clients = BEDROCK_CLIENTS.lock().await;
        if let Some(client) = clients.get(region) {
            return Self::new(client.clone());
        }

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        let client = aws_sdk_bedrockruntime::Client::new(&sdk_config);
        debug!(region, "Bedrock runtime client initialised");
        clients.insert(region.to_string(), client.clone());
        Self::new(client)
    }
}

#[async_trait]
impl InferenceClient for BedrockInferenceClient {
    async fn invoke(&self, model_id: &str, body: Vec<u8>) -> Result<Vec<u8>, PipelineError> {
        let output = self
            .client
            .invoke_model()
            .model_id(model_id)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(body))
            .send()
            .await
            .map_err(|e| PipelineError::InferenceFailed {
                model_id: model_id.to_string(),
                detail: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(output.body.into_inner())
    }
}

// ── Request ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NovaRequest {
    pub schema_version: String,
    pub messages: Vec<NovaMessage>,
    pub system: Vec<TextBlock>,
    pub inference_config: InferenceConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextBlock {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NovaMessage {
    pub role: String,
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ContentBlock {
    Document { document: DocumentBlock },
    Text { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentBlock {
    pub format: String,
    pub name: String,
    pub source: DocumentSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSource {
    pub s3_location: S3Location,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Location {
    pub uri: String,
    pub bucket_owner: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceConfig {
    pub max_tokens: u32,
    pub top_p: f32,
    pub top_k: u32,
    pub temperature: f32,
}

/// Build the request asking the model to pick question `question_number`
/// from the PDF at `s3_uri` and describe it.
///
/// `document_name` is the object key; the model sees it as the file name.
pub fn build_quiz_request(
    s3_uri: &str,
    bucket_owner: &str,
    document_name: &str,
    question_number: i64,
    config: &QuizConfig,
) -> NovaRequest {
    let document = ContentBlock::Document {
        document: DocumentBlock {
            format: "pdf".to_string(),
            name: document_name.to_string(),
            source: DocumentSource {
                s3_location: S3Location {
                    uri: s3_uri.to_string(),
                    bucket_owner: bucket_owner.to_string(),
                },
            },
        },
    };

    NovaRequest {
        schema_version: NOVA_SCHEMA_VERSION.to_string(),
        messages: vec![NovaMessage {
            role: "user".to_string(),
            content: vec![
                document,
                ContentBlock::Text {
                    text: quiz_instruction(question_number),
                },
            ],
        }],
        system: vec![TextBlock {
            text: QUIZ_SYSTEM_PROMPT.to_string(),
        }],
        inference_config: InferenceConfig {
            max_tokens: config.max_tokens,
            top_p: config.top_p,
            top_k: config.top_k,
            temperature: config.temperature,
        },
    }
}

// ── Reply ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct NovaResponse {
    output: Option<NovaOutput>,
    usage: Option<NovaUsage>,
    #[serde(rename = "stopReason")]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NovaOutput {
    message: Option<NovaReplyMessage>,
}

#[derive(Debug, Deserialize)]
struct NovaReplyMessage {
    #[serde(default)]
    content: Vec<ReplyBlock>,
}

#[derive(Debug, Deserialize)]
struct ReplyBlock {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NovaUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

/// Pull `output.message.content[0].text` out of a raw reply body.
pub fn reply_text(body: &[u8]) -> Result<String, PipelineError> {
    let response: NovaResponse =
        serde_json::from_slice(body).map_err(|e| PipelineError::UpstreamFormat {
            detail: format!("reply body is not JSON: {e}"),
        })?;

    if let Some(usage) = &response.usage {
        debug!(
            "Model usage: {} input tokens, {} output tokens, stop reason {:?}",
            usage.input_tokens, usage.output_tokens, response.stop_reason
        );
    }

    response
        .output
        .and_then(|o| o.message)
        .and_then(|m| m.content.into_iter().next())
        .and_then(|block| block.text)
        .ok_or_else(|| PipelineError::UpstreamFormat {
            detail: "reply has no output.message.content[0].text".to_string(),
        })
}

/// Parse the model's text into the quiz object.
///
/// Only the envelope is checked: the text must be a JSON object. Its values
/// are passed through untouched.
pub fn parse_quiz_reply(body: &[u8]) -> Result<QuizExtraction, PipelineError> {
    let text = reply_text(body)?;
    debug!("Raw model text: {}", text);

    let cleaned = clean_reply(&text);
    let quiz: QuizExtraction =
        serde_json::from_str(&cleaned).map_err(|e| PipelineError::UpstreamFormat {
            detail: e.to_string(),
        })?;

    let missing = quiz.missing_fields();
    if !missing.is_empty() {
        warn!("Model reply is missing {}", missing.join(", "));
    }
    Ok(quiz)
}
