//! HTTP application wiring (Axum routers + service wiring).
//!
//! - `services.rs`: service construction and shared state
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: response and query DTOs
//! - `errors.rs`: consistent error responses
//! - `health.rs`: health indicators

use std::sync::Arc;

use axum::{Extension, Router};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use meridian_infra::config::AppConfig;
use meridian_infra::jobs::{InMemoryJobStore, JobTracker};
use meridian_infra::services::{ProductService, UserService};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod health;
pub mod routes;
pub mod services;

/// Router of service-a (user management).
pub fn build_users_app(config: &AppConfig) -> Router {
    let services = Arc::new(services::AppServices::from_config(config));
    let users: services::Users = UserService::seeded();

    let router = routes::users_router()
        .layer(Extension(users))
        .layer(Extension(services));
    with_middleware(router, config)
}

/// Router of service-b (product catalog and batch processing).
pub fn build_catalog_app(config: &AppConfig) -> Router {
    let services = Arc::new(services::AppServices::from_config(config));
    let products: services::Products = ProductService::seeded();
    let jobs: services::Jobs =
        JobTracker::new(InMemoryJobStore::arc(), config.processing.clone());

    let router = routes::catalog_router()
        .layer(Extension(products))
        .layer(Extension(jobs))
        .layer(Extension(services));
    with_middleware(router, config)
}

fn with_middleware(router: Router, config: &AppConfig) -> Router {
    let mut router = router
        .layer(axum::middleware::from_fn(middleware::correlation_id))
        .layer(TraceLayer::new_for_http().make_span_with(middleware::make_request_span))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuidV7))
        .layer(middleware::cors_layer(&config.cors_origins));

    for (name, value) in middleware::security_headers() {
        router = router.layer(SetResponseHeaderLayer::if_not_present(name, value));
    }
    router
}
