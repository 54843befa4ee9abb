use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, put},
};

use crate::{
    dto::addresses::AddressInput,
    error::AppResult,
    middleware::auth::AuthUser,
    models::Address,
    response::{ApiResponse, Meta},
    services::address_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_addresses).post(add_address))
        .route("/default", delete(clear_default))
        .route("/{id}", put(update_address).delete(delete_address))
        .route("/{id}/default", put(set_default))
}

fn listed(message: &str, addresses: Vec<Address>) -> ApiResponse<Vec<Address>> {
    let total = addresses.len() as i64;
    ApiResponse::success(message, addresses, Some(Meta::new(1, total, total)))
}

#[utoipa::path(
    get,
    path = "/api/addresses",
    responses((status = 200, description = "Addresses of the current user", body = ApiResponse<Vec<Address>>)),
    security(("bearer_auth" = [])),
    tag = "Addresses"
)]
pub async fn list_addresses(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<Address>>>> {
    let addresses = address_service::list_addresses(state.store.as_ref(), &user.uid).await?;
    Ok(Json(listed("Addresses", addresses)))
}

#[utoipa::path(
    post,
    path = "/api/addresses",
    request_body = AddressInput,
    responses(
        (status = 201, description = "Address added; the first one becomes default", body = ApiResponse<Address>),
        (status = 400, description = "Missing field")
    ),
    security(("bearer_auth" = [])),
    tag = "Addresses"
)]
pub async fn add_address(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddressInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Address>>)> {
    let address = address_service::add_address(state.store.as_ref(), &user.uid, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Alamat berhasil ditambahkan", address, None)),
    ))
}

#[utoipa::path(
    put,
    path = "/api/addresses/{id}",
    params(("id" = String, Path, description = "Address id")),
    request_body = AddressInput,
    responses(
        (status = 200, description = "Address updated", body = ApiResponse<Address>),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Addresses"
)]
pub async fn update_address(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<AddressInput>,
) -> AppResult<Json<ApiResponse<Address>>> {
    let address = address_service::update_address(state.store.as_ref(), &user.uid, &id, payload).await?;
    Ok(Json(ApiResponse::success("Updated", address, None)))
}

#[utoipa::path(
    delete,
    path = "/api/addresses/{id}",
    params(("id" = String, Path, description = "Address id")),
    responses((status = 200, description = "Remaining addresses", body = ApiResponse<Vec<Address>>)),
    security(("bearer_auth" = [])),
    tag = "Addresses"
)]
pub async fn delete_address(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Vec<Address>>>> {
    let remaining = address_service::delete_address(state.store.as_ref(), &user.uid, &id).await?;
    Ok(Json(listed("Deleted", remaining)))
}

#[utoipa::path(
    put,
    path = "/api/addresses/{id}/default",
    params(("id" = String, Path, description = "Address id")),
    responses(
        (status = 200, description = "Exactly this address is default", body = ApiResponse<Vec<Address>>),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Addresses"
)]
pub async fn set_default(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Vec<Address>>>> {
    let addresses = address_service::set_default(state.store.as_ref(), &user.uid, &id).await?;
    Ok(Json(listed("Default address updated", addresses)))
}

#[utoipa::path(
    delete,
    path = "/api/addresses/default",
    responses((status = 200, description = "No address is default", body = ApiResponse<Vec<Address>>)),
    security(("bearer_auth" = [])),
    tag = "Addresses"
)]
pub async fn clear_default(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<Address>>>> {
    let addresses = address_service::clear_default(state.store.as_ref(), &user.uid).await?;
    Ok(Json(listed("Default address cleared", addresses)))
}
