//! Configuration API Integration Tests

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use bytes::Bytes;
use ccm::{
    api::{ApiServer, HealthStatus},
    metrics::Metrics,
    store::{ConfigStore, MemoryStore, StoreError, StoreResult},
    ConfigMap, ConfigTree,
};
use std::sync::Arc;
use tower::ServiceExt;

/// Store whose session has gone away
struct PartitionedStore;

#[async_trait]
impl ConfigStore for PartitionedStore {
    async fn exists(&self, _path: &str) -> StoreResult<bool> {
        Err(StoreError::Unavailable("connection loss".to_string()))
    }

    async fn list_children(&self, path: &str) -> StoreResult<Vec<String>> {
        Err(StoreError::NoNode(path.to_string()))
    }

    async fn read(&self, path: &str) -> StoreResult<Bytes> {
        Err(StoreError::NoNode(path.to_string()))
    }

    async fn create_or_update(&self, _path: &str, _payload: Bytes, _parents: bool) -> StoreResult<()> {
        Err(StoreError::Unavailable("connection loss".to_string()))
    }
}

fn create_test_router(store: Arc<dyn ConfigStore>) -> (Router, Arc<Metrics>) {
    let metrics = Arc::new(Metrics::new().unwrap());
    let server = ApiServer::new(
        "127.0.0.1:8080".parse().unwrap(),
        ConfigTree::new(store),
        metrics.clone(),
    );
    (server.create_test_router(), metrics)
}

async fn send(app: &Router, method: Method, uri: &str, body: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_empty_environment_returns_empty_object() {
    let (app, _) = create_test_router(Arc::new(MemoryStore::new()));

    let (status, body) = send(&app, Method::GET, "/config/billing/prod", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "{}");
}

#[tokio::test]
async fn test_environment_listing_after_puts() {
    let (app, metrics) = create_test_router(Arc::new(MemoryStore::new()));

    let (status, body) = send(&app, Method::PUT, "/config/billing/prod/timeout", "30s").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Configuration updated successfully");
    send(&app, Method::PUT, "/config/billing/prod/retries", "3").await;

    let (status, body) = send(&app, Method::GET, "/config/billing/prod", "").await;
    assert_eq!(status, StatusCode::OK);
    let config: ConfigMap = serde_json::from_str(&body).unwrap();
    assert_eq!(config.len(), 2);
    assert_eq!(config["timeout"], "30s");
    assert_eq!(config["retries"], "3");

    assert_eq!(metrics.request_count("upsert_key", "ok"), 2);
    assert_eq!(metrics.request_count("read_environment", "ok"), 1);
}

#[tokio::test]
async fn test_value_is_returned_raw() {
    let (app, _) = create_test_router(Arc::new(MemoryStore::new()));
    let value = "{\"nested\": \"json stays opaque\"}";

    send(&app, Method::PUT, "/config/myapp/dev/app.endpoint.url", value).await;
    let (status, body) = send(&app, Method::GET, "/config/myapp/dev/app.endpoint.url", "").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, value);
}

#[tokio::test]
async fn test_missing_key_reports_not_found() {
    let (app, metrics) = create_test_router(Arc::new(MemoryStore::new()));

    let (status, body) = send(&app, Method::GET, "/config/billing/staging/timeout", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Key not found");
    assert_eq!(metrics.request_count("read_key", "not_found"), 1);
}

#[tokio::test]
async fn test_store_errors_are_server_errors() {
    let (app, metrics) = create_test_router(Arc::new(PartitionedStore));

    let (status, _) = send(&app, Method::GET, "/config/billing/prod", "").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, _) = send(&app, Method::PUT, "/config/billing/prod/timeout", "30s").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, _) = send(&app, Method::GET, "/config/billing/prod/timeout", "").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    assert_eq!(metrics.request_count("upsert_key", "store_error"), 1);
}

#[tokio::test]
async fn test_health_reflects_store_reachability() {
    let (healthy, _) = create_test_router(Arc::new(MemoryStore::new()));
    let (status, body) = send(&healthy, Method::GET, "/health", "").await;
    assert_eq!(status, StatusCode::OK);
    let health: HealthStatus = serde_json::from_str(&body).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.checks["store"].status, "healthy");

    let (partitioned, _) = create_test_router(Arc::new(PartitionedStore));
    let (status, body) = send(&partitioned, Method::GET, "/health", "").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let health: HealthStatus = serde_json::from_str(&body).unwrap();
    assert_eq!(health.status, "unhealthy");
}

#[tokio::test]
async fn test_metrics_endpoint_exports_request_counts() {
    let (app, _) = create_test_router(Arc::new(MemoryStore::new()));
    send(&app, Method::GET, "/config/billing/prod/missing", "").await;

    let (status, body) = send(&app, Method::GET, "/metrics", "").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("ccm_requests_total{operation=\"read_key\",outcome=\"not_found\"} 1"));
}

#[tokio::test]
async fn test_unsupported_method_is_rejected() {
    let (app, _) = create_test_router(Arc::new(MemoryStore::new()));
    let (status, _) = send(&app, Method::DELETE, "/config/billing/prod/timeout", "").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
