use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, patch, post, put},
};

use crate::{
    dto::{
        orders::ReviewOrderRequest,
        products::{CreateProductRequest, UpdateProductRequest},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{CustomerSummary, Order, Product},
    response::ApiResponse,
    routes::{params::OrderListQuery, products::parse_category, profile::content_type},
    services::{admin_service, product_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", post(create_product))
        .route(
            "/products/{category}/{id}",
            put(update_product).delete(delete_product),
        )
        .route("/products/{category}/{id}/image", put(set_product_image))
        .route("/customers", get(list_customers))
        .route("/customers/{uid}/orders", get(list_customer_orders))
        .route("/customers/{uid}/orders/{id}", get(get_customer_order))
        .route("/customers/{uid}/orders/{id}/status", patch(review_order))
}

#[utoipa::path(
    post,
    path = "/api/admin/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ApiResponse<Product>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Product>>)> {
    let resp = product_service::create_product(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/admin/products/{category}/{id}",
    params(
        ("category" = String, Path, description = "Current category"),
        ("id" = String, Path, description = "Product id")
    ),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated, moved if the category changed", body = ApiResponse<Product>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path((category, id)): Path<(String, String)>,
    Json(payload): Json<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let category = parse_category(&category)?;
    let resp = product_service::update_product(&state, &user, category, &id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/products/{category}/{id}",
    params(
        ("category" = String, Path, description = "Product category"),
        ("id" = String, Path, description = "Product id")
    ),
    responses(
        (status = 200, description = "Product and image deleted", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path((category, id)): Path<(String, String)>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let category = parse_category(&category)?;
    let resp = product_service::delete_product(&state, &user, category, &id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/products/{category}/{id}/image",
    params(
        ("category" = String, Path, description = "Product category"),
        ("id" = String, Path, description = "Product id")
    ),
    request_body(content = Vec<u8>, content_type = "image/*", description = "Raw image bytes"),
    responses(
        (status = 200, description = "Image uploaded and linked", body = ApiResponse<Product>),
        (status = 400, description = "Empty body or not an image"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn set_product_image(
    State(state): State<AppState>,
    user: AuthUser,
    Path((category, id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<ApiResponse<Product>>> {
    let category = parse_category(&category)?;
    let resp = product_service::set_product_image(
        &state,
        &user,
        category,
        &id,
        body.to_vec(),
        content_type(&headers),
    )
    .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/customers",
    responses(
        (status = 200, description = "Customers with order counts", body = ApiResponse<Vec<CustomerSummary>>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<CustomerSummary>>>> {
    let resp = admin_service::list_customers(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/customers/{uid}/orders",
    params(
        ("uid" = String, Path, description = "Customer uid"),
        OrderListQuery
    ),
    responses(
        (status = 200, description = "Orders of one customer", body = ApiResponse<Vec<Order>>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_customer_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Path(uid): Path<String>,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<Vec<Order>>>> {
    let resp = admin_service::list_customer_orders(&state, &user, &uid, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/customers/{uid}/orders/{id}",
    params(
        ("uid" = String, Path, description = "Customer uid"),
        ("id" = String, Path, description = "Order id")
    ),
    responses(
        (status = 200, description = "Order detail", body = ApiResponse<Order>),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_customer_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path((uid, id)): Path<(String, String)>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = admin_service::get_customer_order(&state, &user, &uid, &id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/customers/{uid}/orders/{id}/status",
    params(
        ("uid" = String, Path, description = "Customer uid"),
        ("id" = String, Path, description = "Order id")
    ),
    request_body = ReviewOrderRequest,
    responses(
        (status = 200, description = "Order accepted or rejected", body = ApiResponse<Order>),
        (status = 400, description = "Not pending, or status is Pending"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn review_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path((uid, id)): Path<(String, String)>,
    Json(payload): Json<ReviewOrderRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = admin_service::review_order(&state, &user, &uid, &id, payload).await?;
    Ok(Json(resp))
}
