//! Lambda entry point for the image/caption extractor. The event is ignored.

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use oak_pdf_lambdas::handler::init_lambda_tracing;
use oak_pdf_lambdas::{
    handle_extract_images, DocumentParser, ExtractImagesConfig, LambdaResponse, PdfiumParser,
    S3ObjectStore,
};
use serde_json::Value;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_lambda_tracing();

    run(service_fn(|_event: LambdaEvent<Value>| async move {
        let config = ExtractImagesConfig::from_env();
        let store = S3ObjectStore::shared().await;
        let bind_parser =
            || PdfiumParser::bind().map(|parser| Arc::new(parser) as Arc<dyn DocumentParser>);

        Ok::<LambdaResponse, Error>(handle_extract_images(&store, bind_parser, config).await)
    }))
    .await
}
