use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, post},
};

use crate::{
    dto::cart::{AddToCartRequest, CartView, SelectionRequest, TotalResponse, UpdateQuantityRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::CartEntry,
    response::{ApiResponse, Meta},
    services::{cart_service::CartManager, product_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(cart_list).post(add_to_cart))
        .route("/total", post(cart_total))
        .route("/{key}", patch(update_quantity).delete(remove_from_cart))
        .route("/{key}/increment", post(increment))
        .route("/{key}/decrement", post(decrement))
}

fn view(cart: &CartManager) -> AppResult<CartView> {
    let keys: Vec<&str> = cart.entries().iter().map(|e| e.key.as_str()).collect();
    Ok(CartView {
        total: cart.total_for(&keys)?,
        items: cart.entries().to_vec(),
    })
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Reload the cart from the store", body = ApiResponse<CartView>),
        (status = 502, description = "Cart sync failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn cart_list(user: AuthUser) -> AppResult<Json<ApiResponse<CartView>>> {
    let mut ws = user.session.workspace().await;
    ws.cart.load().await?;
    let data = view(&ws.cart)?;
    let total = data.items.len() as i64;
    Ok(Json(ApiResponse::success("OK", data, Some(Meta::new(1, total, total)))))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Add a product or increase its quantity", body = ApiResponse<CartEntry>),
        (status = 400, description = "Quantity below 1"),
        (status = 404, description = "Product not found"),
        (status = 502, description = "Cart sync failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartEntry>>> {
    let product =
        product_service::find_product(state.store.as_ref(), payload.category, &payload.product_id).await?;
    let mut ws = user.session.workspace().await;
    let entry = ws.cart.add_or_increment(&product, payload.quantity).await?;
    Ok(Json(ApiResponse::success("Added to cart", entry, Some(Meta::empty()))))
}

#[utoipa::path(
    post,
    path = "/api/cart/total",
    request_body = SelectionRequest,
    responses(
        (status = 200, description = "Total of the selected entries", body = ApiResponse<TotalResponse>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn cart_total(
    user: AuthUser,
    Json(payload): Json<SelectionRequest>,
) -> AppResult<Json<ApiResponse<TotalResponse>>> {
    let ws = user.session.workspace().await;
    let total = ws.cart.total_for(&payload.keys)?;
    let data = TotalResponse {
        keys: payload.keys,
        total,
    };
    Ok(Json(ApiResponse::success("OK", data, None)))
}

#[utoipa::path(
    patch,
    path = "/api/cart/{key}",
    params(("key" = String, Path, description = "Cart entry key")),
    request_body = UpdateQuantityRequest,
    responses(
        (status = 200, description = "Set the quantity", body = ApiResponse<CartEntry>),
        (status = 400, description = "Quantity below 1"),
        (status = 404, description = "Not in cart")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn update_quantity(
    user: AuthUser,
    Path(key): Path<String>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> AppResult<Json<ApiResponse<CartEntry>>> {
    let mut ws = user.session.workspace().await;
    let entry = ws.cart.set_quantity(&key, payload.quantity).await?;
    Ok(Json(ApiResponse::success("Updated", entry, None)))
}

#[utoipa::path(
    post,
    path = "/api/cart/{key}/increment",
    params(("key" = String, Path, description = "Cart entry key")),
    responses((status = 200, description = "Quantity plus one", body = ApiResponse<CartEntry>)),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn increment(
    user: AuthUser,
    Path(key): Path<String>,
) -> AppResult<Json<ApiResponse<CartEntry>>> {
    let mut ws = user.session.workspace().await;
    let entry = ws.cart.increment(&key).await?;
    Ok(Json(ApiResponse::success("Updated", entry, None)))
}

#[utoipa::path(
    post,
    path = "/api/cart/{key}/decrement",
    params(("key" = String, Path, description = "Cart entry key")),
    responses((status = 200, description = "Quantity minus one, never below 1", body = ApiResponse<CartEntry>)),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn decrement(
    user: AuthUser,
    Path(key): Path<String>,
) -> AppResult<Json<ApiResponse<CartEntry>>> {
    let mut ws = user.session.workspace().await;
    let entry = ws.cart.decrement(&key).await?;
    Ok(Json(ApiResponse::success("Updated", entry, None)))
}

#[utoipa::path(
    delete,
    path = "/api/cart/{key}",
    params(("key" = String, Path, description = "Cart entry key")),
    responses(
        (status = 200, description = "Remove from cart; unknown keys succeed", body = ApiResponse<CartView>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    user: AuthUser,
    Path(key): Path<String>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let mut ws = user.session.workspace().await;
    ws.cart.remove(&key).await?;
    Ok(Json(ApiResponse::success("Removed", view(&ws.cart)?, None)))
}
