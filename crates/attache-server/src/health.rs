//! Health checks
//!
//! Reports whether the file data store root is usable and which apps are
//! registered.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use attache_core::config::AppConfig;
use attache_store::AppRegistry;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::{debug, warn};

/// Health check status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Individual component health
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Overall health report
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: Vec<ComponentHealth>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl HealthReport {
    pub fn http_status(&self) -> StatusCode {
        match self.status {
            HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Shared server state
pub struct AppState {
    pub config: AppConfig,
    pub registry: Arc<AppRegistry>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: AppConfig, registry: Arc<AppRegistry>) -> Self {
        Self {
            config,
            registry,
            started_at: Instant::now(),
        }
    }

    pub fn report(&self) -> HealthReport {
        let components = vec![
            check_root(&self.config.datastore.root_path),
            check_apps(&self.registry),
        ];
        let status = components
            .iter()
            .map(|c| c.status)
            .max_by_key(|s| match s {
                HealthStatus::Healthy => 0,
                HealthStatus::Degraded => 1,
                HealthStatus::Unhealthy => 2,
            })
            .unwrap_or(HealthStatus::Healthy);

        HealthReport {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.started_at.elapsed().as_secs(),
            components,
            timestamp: chrono::Utc::now(),
        }
    }
}

/// A missing root is created on first write, so it only degrades health
fn check_root(root: &Path) -> ComponentHealth {
    let details = Some(serde_json::json!({ "root_path": root.display().to_string() }));

    let (status, message) = match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() && !meta.permissions().readonly() => {
            (HealthStatus::Healthy, None)
        }
        Ok(meta) if meta.is_dir() => (
            HealthStatus::Unhealthy,
            Some("root directory is read-only".to_string()),
        ),
        Ok(_) => (
            HealthStatus::Unhealthy,
            Some("root path is not a directory".to_string()),
        ),
        Err(e) => (
            HealthStatus::Degraded,
            Some(format!("root directory not created yet: {}", e)),
        ),
    };

    if status != HealthStatus::Healthy {
        warn!(root = %root.display(), ?status, "Data store root check failed");
    }

    ComponentHealth {
        name: "datastore".to_string(),
        status,
        message,
        details,
    }
}

fn check_apps(registry: &AppRegistry) -> ComponentHealth {
    let names = registry.names();
    let status = if names.is_empty() {
        HealthStatus::Unhealthy
    } else {
        HealthStatus::Healthy
    };

    ComponentHealth {
        name: "apps".to_string(),
        status,
        message: names.is_empty().then(|| "no apps registered".to_string()),
        details: Some(serde_json::json!({ "names": names })),
    }
}

/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthReport>) {
    let report = state.report();
    debug!(status = ?report.status, "Health check");
    (report.http_status(), Json(report))
}
