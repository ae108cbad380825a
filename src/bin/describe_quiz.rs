//! Lambda entry point for the question extractor.
//!
//! Event: `{"s3_uri": "...", "bucket_owner": "...", "question_number": 1}`.

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use oak_pdf_lambdas::config::DEFAULT_REGION;
use oak_pdf_lambdas::handler::init_lambda_tracing;
use oak_pdf_lambdas::{handle_describe_quiz, BedrockInferenceClient, LambdaResponse, QuizConfig};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_lambda_tracing();

    run(service_fn(|event: LambdaEvent<Value>| async move {
        let config = QuizConfig::from_env();
        let region = config
            .as_ref()
            .map(|c| c.region.clone())
            .unwrap_or_else(|_| DEFAULT_REGION.to_string());
        let client = BedrockInferenceClient::shared(&region).await;

        Ok::<LambdaResponse, Error>(handle_describe_quiz(event.payload, &client, config).await)
    }))
    .await
}
