use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use meridian_users::{CreateUser, UpdateUser};

use crate::app::dto::MessageResponse;
use crate::app::errors;
use crate::app::services::Users;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
}

pub async fn create_user(
    Extension(users): Extension<Users>,
    body: Result<Json<CreateUser>, JsonRejection>,
) -> axum::response::Response {
    let Json(cmd) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match users.create(cmd) {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_users(Extension(users): Extension<Users>) -> impl IntoResponse {
    Json(users.find_all())
}

pub async fn get_user(
    Extension(users): Extension<Users>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match users.find_one(&id) {
        Ok(user) => Json(user).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_user(
    Extension(users): Extension<Users>,
    Path(id): Path<String>,
    body: Result<Json<UpdateUser>, JsonRejection>,
) -> axum::response::Response {
    let Json(patch) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match users.update(&id, patch) {
        Ok(user) => Json(user).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_user(
    Extension(users): Extension<Users>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match users.remove(&id) {
        Ok(_) => Json(MessageResponse {
            message: format!("User with ID {id} deleted successfully"),
        })
        .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
