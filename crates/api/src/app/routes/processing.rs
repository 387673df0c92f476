use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use meridian_infra::jobs::ProcessRequest;

use crate::app::errors;
use crate::app::services::Jobs;

pub fn router() -> Router {
    Router::new()
        .route("/batch", post(submit_batch))
        .route("/jobs", get(list_jobs))
        .route("/jobs/:id", get(get_job))
        .route("/stats", get(get_stats))
}

pub async fn submit_batch(
    Extension(jobs): Extension<Jobs>,
    body: Result<Json<ProcessRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match jobs.submit(request) {
        Ok(receipt) => (StatusCode::ACCEPTED, Json(receipt)).into_response(),
        Err(e) => errors::submit_error_to_response(e),
    }
}

pub async fn list_jobs(Extension(jobs): Extension<Jobs>) -> axum::response::Response {
    match jobs.jobs() {
        Ok(list) => Json(list).into_response(),
        Err(e) => errors::job_store_error_to_response(e),
    }
}

pub async fn get_job(
    Extension(jobs): Extension<Jobs>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match jobs.job(&id) {
        Ok(Some(job)) => Json(job).into_response(),
        Ok(None) => errors::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("Job with ID {id} not found"),
        ),
        Err(e) => errors::job_store_error_to_response(e),
    }
}

pub async fn get_stats(Extension(jobs): Extension<Jobs>) -> axum::response::Response {
    match jobs.stats() {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => errors::job_store_error_to_response(e),
    }
}
