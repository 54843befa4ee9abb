use axum::{
    Json, Router,
    extract::State,
    routing::{post, put},
};

use crate::{
    dto::orders::{SelectPaymentRequest, StartCheckoutRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    services::checkout_service::{CheckoutDraft, CheckoutFlow, CheckoutReceipt},
    session::Workspace,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(start_checkout).get(current_checkout).delete(cancel_checkout))
        .route("/payment", put(select_payment))
        .route("/submit", post(submit_checkout))
}

#[utoipa::path(
    post,
    path = "/api/checkout",
    request_body = StartCheckoutRequest,
    responses(
        (status = 200, description = "Checkout validated, awaiting payment selection", body = ApiResponse<CheckoutDraft>),
        (status = 409, description = "Blocked: incomplete profile, missing address or nothing selected")
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn start_checkout(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<StartCheckoutRequest>,
) -> AppResult<Json<ApiResponse<CheckoutDraft>>> {
    let mut ws = user.session.workspace().await;
    let Workspace { cart, checkout } = &mut *ws;

    let flow = checkout.insert(CheckoutFlow::new(user.uid.clone(), payload.keys));
    flow.validate(state.store.as_ref(), cart).await?;

    Ok(Json(ApiResponse::success("Checkout", flow.draft(cart)?, Some(Meta::empty()))))
}

#[utoipa::path(
    get,
    path = "/api/checkout",
    responses(
        (status = 200, description = "Checkout in progress", body = ApiResponse<CheckoutDraft>),
        (status = 404, description = "No checkout in progress")
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn current_checkout(user: AuthUser) -> AppResult<Json<ApiResponse<CheckoutDraft>>> {
    let ws = user.session.workspace().await;
    let flow = ws.checkout.as_ref().ok_or(AppError::NotFound)?;
    Ok(Json(ApiResponse::success("Checkout", flow.draft(&ws.cart)?, None)))
}

#[utoipa::path(
    delete,
    path = "/api/checkout",
    responses((status = 200, description = "Checkout abandoned", body = ApiResponse<serde_json::Value>)),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn cancel_checkout(user: AuthUser) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let mut ws = user.session.workspace().await;
    let cancelled = ws.checkout.take().is_some();
    Ok(Json(ApiResponse::success(
        "Checkout cancelled",
        serde_json::json!({ "cancelled": cancelled }),
        None,
    )))
}

#[utoipa::path(
    put,
    path = "/api/checkout/payment",
    request_body = SelectPaymentRequest,
    responses(
        (status = 200, description = "Payment method chosen", body = ApiResponse<CheckoutDraft>),
        (status = 400, description = "Checkout not validated yet")
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn select_payment(
    user: AuthUser,
    Json(payload): Json<SelectPaymentRequest>,
) -> AppResult<Json<ApiResponse<CheckoutDraft>>> {
    let mut ws = user.session.workspace().await;
    let Workspace { cart, checkout } = &mut *ws;
    let flow = checkout.as_mut().ok_or(AppError::NotFound)?;
    flow.select_payment(payload.payment_method)?;
    Ok(Json(ApiResponse::success("Checkout", flow.draft(cart)?, None)))
}

#[utoipa::path(
    post,
    path = "/api/checkout/submit",
    responses(
        (status = 200, description = "Order placed; continue at the order list", body = ApiResponse<CheckoutReceipt>),
        (status = 409, description = "Blocked; the body says whether to fix profile, address or retry")
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn submit_checkout(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CheckoutReceipt>>> {
    let mut ws = user.session.workspace().await;
    let Workspace { cart, checkout } = &mut *ws;
    let flow = checkout.as_mut().ok_or(AppError::NotFound)?;

    let receipt = flow.submit(state.store.as_ref(), cart).await?;
    *checkout = None;

    Ok(Json(ApiResponse::success("Order placed", receipt, Some(Meta::empty()))))
}
