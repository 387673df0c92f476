use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use meridian_products::{CreateProduct, UpdateProduct};

use crate::app::dto::{MessageResponse, ProductQuery};
use crate::app::errors;
use crate::app::services::Products;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/category/:category", get(products_by_category))
        .route("/:id", get(get_product).put(update_product).delete(delete_product))
}

pub async fn create_product(
    Extension(products): Extension<Products>,
    body: Result<Json<CreateProduct>, JsonRejection>,
) -> axum::response::Response {
    let Json(cmd) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match products.create(cmd) {
        Ok(product) => (StatusCode::CREATED, Json(product)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_products(
    Extension(products): Extension<Products>,
    Query(query): Query<ProductQuery>,
) -> impl IntoResponse {
    let category = query.category.as_deref().filter(|c| !c.trim().is_empty());
    Json(products.find_all(category))
}

pub async fn products_by_category(
    Extension(products): Extension<Products>,
    Path(category): Path<String>,
) -> impl IntoResponse {
    Json(products.find_by_category(&category))
}

pub async fn get_product(
    Extension(products): Extension<Products>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match products.find_one(&id) {
        Ok(product) => Json(product).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(products): Extension<Products>,
    Path(id): Path<String>,
    body: Result<Json<UpdateProduct>, JsonRejection>,
) -> axum::response::Response {
    let Json(patch) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match products.update(&id, patch) {
        Ok(product) => Json(product).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(products): Extension<Products>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match products.remove(&id) {
        Ok(_) => Json(MessageResponse {
            message: format!("Product with ID {id} deleted successfully"),
        })
        .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
