use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use crate::app::errors;
use crate::app::health::{HealthChecker, HealthReport};
use crate::app::services::AppServices;

pub async fn service_info(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    Json(services.info())
}

pub async fn health(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    run_checks(&services, HealthChecker::health).await
}

pub async fn readiness(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    run_checks(&services, HealthChecker::readiness).await
}

pub async fn liveness(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    report_response(services.health.liveness())
}

/// Host probes scan processes and disks, so they run on the blocking pool.
async fn run_checks(
    services: &AppServices,
    check: fn(&HealthChecker) -> HealthReport,
) -> axum::response::Response {
    let checker = services.health.clone();
    match tokio::task::spawn_blocking(move || check(&checker)).await {
        Ok(report) => report_response(report),
        Err(e) => {
            tracing::error!(error = %e, "health check task failed");
            errors::json_error(StatusCode::SERVICE_UNAVAILABLE, "health_check_failed", e.to_string())
        }
    }
}

fn report_response(report: HealthReport) -> axum::response::Response {
    if !report.is_healthy() {
        tracing::warn!(error = ?report.error, "health check failed");
    }
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report)).into_response()
}
