use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};

use crate::{
    error::{AppError, AppResult},
    models::{Category, Product},
    response::ApiResponse,
    routes::params::ProductQuery,
    services::product_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/{category}/{id}", get(get_product))
}

pub fn parse_category(raw: &str) -> AppResult<Category> {
    raw.parse().map_err(AppError::BadRequest)
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(ProductQuery),
    responses(
        (status = 200, description = "List products", body = ApiResponse<Vec<Product>>),
        (status = 400, description = "Unknown category")
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<Vec<Product>>>> {
    let resp = product_service::list_products(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/{category}/{id}",
    params(
        ("category" = String, Path, description = "Product category"),
        ("id" = String, Path, description = "Product id")
    ),
    responses(
        (status = 200, description = "Get product", body = ApiResponse<Product>),
        (status = 404, description = "Not found")
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path((category, id)): Path<(String, String)>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let category = parse_category(&category)?;
    let resp = product_service::get_product(&state, category, &id).await?;
    Ok(Json(resp))
}
