//! Integration tests for the lesson asset importer, driven through the
//! Lambda handler with a fake lesson API and an in-memory bucket.

mod common;

use common::{catalogue_of, CountingStore, FakeAssetSource};
use oak_pdf_lambdas::{
    handle_import_lessons, import_lessons, parse_catalogue, AssetSource, ImportConfig, Lesson,
    LessonAsset, PipelineError,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::Ordering;

const BUCKET: &str = "pdf-storage";

fn config() -> ImportConfig {
    ImportConfig::builder()
        .api_url("https://open-api.example.org/api/v0/lessons")
        .api_key("test-key")
        .bucket(BUCKET)
        .build()
        .unwrap()
}

fn asset(asset_type: &str, url: &str) -> LessonAsset {
    LessonAsset {
        asset_type: asset_type.to_string(),
        url: url.to_string(),
    }
}

fn catalogue() -> Vec<Lesson> {
    vec![
        Lesson {
            lesson_slug: "perimeter-of-rectangles".to_string(),
            lesson_title: Some("Perimeter of rectangles".to_string()),
            assets: vec![
                asset("exitQuiz", "https://assets.example.org/1"),
                asset("worksheet", "https://assets.example.org/2"),
            ],
        },
        Lesson {
            lesson_slug: "area-of-squares".to_string(),
            lesson_title: None,
            assets: vec![asset("exitQuiz", "https://assets.example.org/missing")],
        },
    ]
}

fn source() -> FakeAssetSource {
    FakeAssetSource {
        catalogue: catalogue_of(catalogue()),
        assets: HashMap::from([
            ("https://assets.example.org/1".to_string(), b"%PDF-exit".to_vec()),
            ("https://assets.example.org/2".to_string(), b"%PDF-sheet".to_vec()),
        ]),
        ..FakeAssetSource::default()
    }
}

fn connect(
    source: FakeAssetSource,
) -> impl FnOnce(&ImportConfig) -> Result<Box<dyn AssetSource>, PipelineError> + Send {
    move |_config: &ImportConfig| Ok(Box::new(source) as Box<dyn AssetSource>)
}

#[tokio::test]
async fn assets_are_copied_under_lesson_slug() {
    let store = CountingStore::new();

    let output = import_lessons(&source(), &store, &config()).await.unwrap();

    assert_eq!(output.message, "Processing complete");
    let exit = store
        .inner
        .object(BUCKET, "perimeter-of-rectangles/exitQuiz.pdf")
        .unwrap();
    assert_eq!(exit.body, b"%PDF-exit");
    assert_eq!(exit.content_type.as_deref(), Some("application/pdf"));
    assert!(store
        .inner
        .object(BUCKET, "perimeter-of-rectangles/worksheet.pdf")
        .is_some());
    assert_eq!(store.puts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn response_body_matches_importer_shape() {
    let store = CountingStore::new();

    let response = handle_import_lessons(&store, connect(source()), Ok(config())).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(
        response.body_json().unwrap(),
        json!({
            "message": "Processing complete",
            "results": [
                {
                    "lessonSlug": "perimeter-of-rectangles",
                    "lessonTitle": "Perimeter of rectangles",
                    "results": [
                        { "success": true, "filename": "perimeter-of-rectangles/exitQuiz.pdf", "type": "exitQuiz" },
                        { "success": true, "filename": "perimeter-of-rectangles/worksheet.pdf", "type": "worksheet" }
                    ]
                },
                {
                    "lessonSlug": "area-of-squares",
                    "lessonTitle": null,
                    "results": [
                        {
                            "success": false,
                            "error": "HTTP Error: 404",
                            "asset": { "type": "exitQuiz", "url": "https://assets.example.org/missing" }
                        }
                    ]
                }
            ]
        })
    );
}

#[tokio::test]
async fn upload_failure_is_reported_per_asset() {
    let store = CountingStore {
        fail_put_containing: Some("worksheet".to_string()),
        ..CountingStore::new()
    };

    let output = import_lessons(&source(), &store, &config()).await.unwrap();

    let first = output.results[0].results();
    assert!(first[0].is_success());
    assert!(!first[1].is_success());
    let value = serde_json::to_value(&first[1]).unwrap();
    assert!(value["error"].as_str().unwrap().contains("AccessDenied"));
}

#[tokio::test]
async fn catalogue_failure_is_500_with_message() {
    let store = CountingStore::new();
    let source = FakeAssetSource {
        catalogue_error: Some("Invalid response from Oak API".to_string()),
        ..FakeAssetSource::default()
    };

    let response = handle_import_lessons(&store, connect(source), Ok(config())).await;

    assert_eq!(response.status_code, 500);
    assert_eq!(
        response.body_json().unwrap(),
        json!({ "message": "Error processing lessons", "error": "Invalid response from Oak API" })
    );
    assert_eq!(store.total_calls(), 0);
}

#[tokio::test]
async fn missing_configuration_never_contacts_the_api() {
    let store = CountingStore::new();
    let source = source();

    let response =
        handle_import_lessons(&store, connect(source), ImportConfig::from_lookup(|_| None)).await;

    assert_eq!(response.status_code, 500);
    let error = response.body_json().unwrap()["error"].as_str().unwrap().to_string();
    assert!(error.contains("OAK_API_URL"), "got: {error}");
    assert!(error.contains("S3_BUCKET_NAME"), "got: {error}");
    assert_eq!(store.total_calls(), 0);
}

#[tokio::test]
async fn single_asset_concurrency_keeps_order() {
    let store = CountingStore::new();
    let config = ImportConfig::builder()
        .api_url("https://open-api.example.org/api/v0/lessons")
        .api_key("test-key")
        .bucket(BUCKET)
        .asset_concurrency(1)
        .lesson_concurrency(1)
        .build()
        .unwrap();
    let source = source();

    let output = import_lessons(&source, &store, &config).await.unwrap();

    let slugs: Vec<&str> = output.results.iter().filter_map(|l| l.lesson_slug()).collect();
    assert_eq!(slugs, vec!["perimeter-of-rectangles", "area-of-squares"]);
    assert_eq!(source.fetches.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn malformed_lesson_is_reported_and_others_continue() {
    let store = CountingStore::new();
    let body = br#"[
        { "lessonTitle": "Slugless lesson", "assets": [{ "type": "exitQuiz", "url": "https://assets.example.org/1" }] },
        { "lessonSlug": "no-assets-listed" },
        {
            "lessonSlug": "perimeter-of-rectangles",
            "lessonTitle": "Perimeter of rectangles",
            "assets": [{ "type": "exitQuiz", "url": "https://assets.example.org/1" }]
        }
    ]"#;
    let source = FakeAssetSource {
        catalogue: parse_catalogue(body).unwrap(),
        ..source()
    };

    let response = handle_import_lessons(&store, connect(source), Ok(config())).await;

    assert_eq!(response.status_code, 200);
    let body = response.body_json().unwrap();
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert!(results[0].get("lessonSlug").is_none());
    assert!(results[0]["error"].as_str().unwrap().contains("lessonSlug"));
    assert_eq!(results[1]["lessonSlug"], json!("no-assets-listed"));
    assert!(results[1]["error"].as_str().unwrap().contains("assets"));
    assert_eq!(results[2]["results"][0]["success"], json!(true));
    assert_eq!(store.puts.load(Ordering::SeqCst), 1);
}
