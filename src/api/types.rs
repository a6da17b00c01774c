//! Configuration API Types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Confirmation body returned by a successful upsert
pub const UPDATE_CONFIRMATION: &str = "Configuration updated successfully";

/// Health check result
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub checks: HashMap<String, CheckResult>,
}

/// Individual health check result
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckResult {
    pub status: String,
    pub message: Option<String>,
    pub duration_ms: u64,
}
