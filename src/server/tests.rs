//! Tests for the HTTP entry point

use super::*;
use crate::core::config::{AppConfig, WalkConfig};
use crate::dispatch::{Dispatcher, ObserverSet, TracingObserver};
use crate::strategy::{PdfEngine, PdfEngineError, PdfSecurity};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use image::DynamicImage;
use std::path::Path;
use tempfile::TempDir;
use tower::ServiceExt;

struct NoPdf;

impl PdfEngine for NoPdf {
    fn probe(&self, _path: &Path) -> Result<PdfSecurity, PdfEngineError> {
        Err(PdfEngineError::Unavailable("test".to_string()))
    }

    fn render_first_page(&self, _path: &Path, _dpi: f32) -> Result<DynamicImage, PdfEngineError> {
        Err(PdfEngineError::Unavailable("test".to_string()))
    }

    fn extract_text(&self, _path: &Path) -> Result<String, PdfEngineError> {
        Err(PdfEngineError::Unavailable("test".to_string()))
    }
}

fn test_server() -> ThumbnailServer {
    let config = AppConfig::default();
    let metrics = Arc::new(DispatchMetrics::new());
    let observer = ObserverSet::new()
        .with(Arc::new(TracingObserver))
        .with(metrics.clone());
    let dispatcher = Dispatcher::from_config(&config, Arc::new(NoPdf), Arc::new(observer));
    let walker = TreeWalker::new(Arc::new(dispatcher), 2, WalkConfig::default());
    ThumbnailServer::new(config.server, ServerState::new(walker, metrics))
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn generate_request(query: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/api/thumbnail/generate{}", query))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let response = test_server()
        .build_router()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_missing_path_param_is_bad_request() {
    let response = test_server()
        .build_router()
        .oneshot(generate_request(""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, PATH_DOES_NOT_EXIST);
}

#[tokio::test]
async fn test_nonexistent_path_is_bad_request() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing");
    let server = test_server();

    let response = server
        .build_router()
        .oneshot(generate_request(&format!("?path={}", missing.display())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, PATH_DOES_NOT_EXIST);
    // the core never ran
    assert_eq!(server.state().metrics.total(), 0);
}

#[tokio::test]
async fn test_generate_walks_directory() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("rows.csv"), "k,v\na,1\nb,2\n").unwrap();
    std::fs::write(dir.path().join("raw.bin"), [0u8, 0x91, 0x33]).unwrap();
    let server = test_server();

    let response = server
        .build_router()
        .oneshot(generate_request(&format!("?path={}", dir.path().display())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: GenerateResponse = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body.message, GENERATED_MESSAGE);
    assert_eq!(body.summary.files, 2);
    assert_eq!(body.summary.success, 1);
    assert_eq!(body.summary.fallback, 1);

    assert!(dir.path().join("thumb_rows.csv.jpg").is_file());
    assert!(dir.path().join("thumb_raw.bin.jpg").is_file());
    assert_eq!(server.state().metrics.total(), 2);
}

#[tokio::test]
async fn test_stats_reports_metrics() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("raw.bin"), [0u8, 0x91, 0x33]).unwrap();
    let server = test_server();
    let router = server.build_router();

    router
        .clone()
        .oneshot(generate_request(&format!("?path={}", dir.path().display())))
        .await
        .unwrap();

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/thumbnail/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let snapshot: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(snapshot["total"], 1);
    assert_eq!(snapshot["fallback"], 1);
}

#[tokio::test]
async fn test_generate_requires_post() {
    let response = test_server()
        .build_router()
        .oneshot(
            Request::builder()
                .uri("/api/thumbnail/generate?path=/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[test]
fn test_error_classification() {
    assert!(ServerError::MissingPath.is_bad_request());
    assert!(ServerError::PathNotFound {
        path: "/x".to_string()
    }
    .is_bad_request());
    assert!(!ServerError::Internal {
        reason: "boom".to_string()
    }
    .is_bad_request());
}
