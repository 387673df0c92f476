use axum::{Router, routing::get};

pub mod processing;
pub mod products;
pub mod system;
pub mod users;

/// Global route prefix of both services.
pub const API_PREFIX: &str = "/api/v1";

fn system_router() -> Router {
    Router::new()
        .route(API_PREFIX, get(system::service_info))
        .route(&format!("{API_PREFIX}/"), get(system::service_info))
        .route(&format!("{API_PREFIX}/health"), get(system::health))
        .route(&format!("{API_PREFIX}/health/ready"), get(system::readiness))
        .route(&format!("{API_PREFIX}/health/live"), get(system::liveness))
}

/// All endpoints of service-a.
pub fn users_router() -> Router {
    system_router().nest(&format!("{API_PREFIX}/users"), users::router())
}

/// All endpoints of service-b.
pub fn catalog_router() -> Router {
    system_router()
        .nest(&format!("{API_PREFIX}/products"), products::router())
        .nest(&format!("{API_PREFIX}/processing"), processing::router())
}
