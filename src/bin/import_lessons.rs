//! Lambda entry point for the lesson asset importer. The event is ignored.

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use oak_pdf_lambdas::handler::init_lambda_tracing;
use oak_pdf_lambdas::{
    handle_import_lessons, AssetSource, ImportConfig, LambdaResponse, OakApiClient, S3ObjectStore,
};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_lambda_tracing();

    run(service_fn(|_event: LambdaEvent<Value>| async move {
        let config = ImportConfig::from_env();
        let store = S3ObjectStore::shared().await;
        let connect = |config: &ImportConfig| {
            OakApiClient::new(config).map(|client| Box::new(client) as Box<dyn AssetSource>)
        };

        Ok::<LambdaResponse, Error>(handle_import_lessons(&store, connect, config).await)
    }))
    .await
}
