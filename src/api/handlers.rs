//! Configuration API Handlers

use super::types::*;
use crate::error::CcmResult;
use crate::metrics::Metrics;
use crate::tree::{ConfigMap, ConfigTree};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Instant, SystemTime};
use tracing::info;

/// Shared application state for handlers
#[derive(Clone)]
pub struct AppState {
    pub tree: ConfigTree,
    pub metrics: Arc<Metrics>,
    pub start_time: SystemTime,
}

impl AppState {
    pub fn new(tree: ConfigTree, metrics: Arc<Metrics>) -> Self {
        Self {
            tree,
            metrics,
            start_time: SystemTime::now(),
        }
    }

    fn record<T>(&self, operation: &str, result: &CcmResult<T>, started: Instant) {
        let outcome = match result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        self.metrics.observe(operation, outcome, started.elapsed());
    }
}

/// `GET /config/{project}/{environment}`
pub async fn get_environment(
    State(state): State<AppState>,
    Path((project, environment)): Path<(String, String)>,
) -> CcmResult<Json<ConfigMap>> {
    let started = Instant::now();
    let result = state.tree.read_environment(&project, &environment).await;
    state.record("read_environment", &result, started);
    result.map(Json)
}

/// `GET /config/{project}/{environment}/{key}`
pub async fn get_value(
    State(state): State<AppState>,
    Path((project, environment, key)): Path<(String, String, String)>,
) -> CcmResult<String> {
    let started = Instant::now();
    let result = state.tree.read_key(&project, &environment, &key).await;
    state.record("read_key", &result, started);
    result
}

/// `PUT /config/{project}/{environment}/{key}` with the raw value as body
pub async fn put_value(
    State(state): State<AppState>,
    Path((project, environment, key)): Path<(String, String, String)>,
    body: Bytes,
) -> CcmResult<&'static str> {
    let started = Instant::now();
    let result = state.tree.upsert_key(&project, &environment, &key, body).await;
    state.record("upsert_key", &result, started);
    result?;

    info!(%project, %environment, %key, "Configuration updated via API");
    Ok(UPDATE_CONFIRMATION)
}

/// Health check handler
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let started = Instant::now();
    let store_check = match state.tree.ping().await {
        Ok(root_present) => CheckResult {
            status: "healthy".to_string(),
            message: Some(if root_present {
                format!("/{} present", state.tree.root())
            } else {
                format!("/{} not created yet", state.tree.root())
            }),
            duration_ms: started.elapsed().as_millis() as u64,
        },
        Err(e) => CheckResult {
            status: "unhealthy".to_string(),
            message: Some(e.to_string()),
            duration_ms: started.elapsed().as_millis() as u64,
        },
    };

    let healthy = store_check.status == "healthy";
    let mut checks = HashMap::new();
    checks.insert("store".to_string(), store_check);

    let health = HealthStatus {
        status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: SystemTime::now()
            .duration_since(state.start_time)
            .unwrap_or_default()
            .as_secs(),
        checks,
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(health))
}

/// Prometheus scrape endpoint
pub async fn export_metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.export_prometheus(),
    )
}
