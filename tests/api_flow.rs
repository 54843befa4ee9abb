use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use clothy_api::{
    config::AppConfig, routes::create_app, services::auth_service::ensure_admin_account,
    state::AppState, store::MemoryStore,
};

fn seeded_state() -> AppState {
    let store = MemoryStore::with_root(json!({
        "products": {
            "Dress": { "d1": { "id": "d1", "name": "Dress Batik", "price": "100000", "category": "Dress" } },
            "Jaket": { "j1": { "id": "j1", "name": "Jaket Denim", "price": "250000", "category": "Jaket" } }
        }
    }));
    AppState::in_memory(AppConfig::with_secret("test-secret"), store)
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&json).unwrap())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn register_and_login(app: &Router, email: &str) -> String {
    let (status, _) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": "sari", "email": email, "password": "rahasia", "confirmPassword": "rahasia" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    login(app, email, "rahasia").await
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn customer_checkout_then_admin_review() {
    let state = seeded_state();
    let app = create_app(state.clone());

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": "x", "email": "x@clothy.id", "password": "rahasia", "confirmPassword": "beda123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let token = register_and_login(&app, "sari@clothy.id").await;
    let token = Some(token.as_str());

    let (status, body) = send(&app, "GET", "/api/products?category=Dress", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let add = json!({ "category": "Dress", "productId": "d1", "quantity": 2 });
    let (status, body) = send(&app, "POST", "/api/cart", token, Some(add)).await;
    assert_eq!(status, StatusCode::OK);
    let key = body["data"]["key"].as_str().unwrap().to_string();
    let (_, body) = send(&app, "POST", "/api/cart", token, Some(json!({ "category": "Dress", "productId": "d1" }))).await;
    assert_eq!(body["data"]["key"], json!(key));
    assert_eq!(body["data"]["quantity"], json!(3));

    let (status, _) = send(&app, "PATCH", &format!("/api/cart/{key}"), token, Some(json!({ "quantity": 0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let selection = json!({ "keys": [key] });
    let (status, body) = send(&app, "POST", "/api/checkout", token, Some(selection.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["data"]["error"], json!("incomplete-profile"));
    assert_eq!(body["data"]["action"], json!("profile"));

    let profile = json!({ "name": "Sari Dewi", "username": "sari", "numberPhone": "081234" });
    let (status, _) = send(&app, "PUT", "/api/profile", token, Some(profile)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "POST", "/api/checkout", token, Some(selection.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["data"]["error"], json!("missing-address"));
    assert_eq!(body["data"]["action"], json!("address"));

    let address = json!({
        "provinsi": "DKI Jakarta", "kabupaten": "Jakarta Selatan", "kecamatan": "Tebet",
        "kelurahan": "Manggarai", "detail": "Jl. Sahardjo 10", "kodepos": "12850"
    });
    let (status, body) = send(&app, "POST", "/api/addresses", token, Some(address)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["isDefault"], json!(true));

    let (status, body) = send(&app, "POST", "/api/checkout", token, Some(selection)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["state"]["state"], json!("awaiting-payment-selection"));
    assert_eq!(body["data"]["paymentMethod"], json!("Transfer"));

    let (status, _) = send(&app, "PUT", "/api/checkout/payment", token, Some(json!({ "paymentMethod": "COD" }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "POST", "/api/checkout/submit", token, None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["order"]["total"], json!("300000"));
    assert_eq!(body["data"]["order"]["paymentMethod"], json!("COD"));
    assert_eq!(body["data"]["navigation"], json!("reset-to-orders"));
    let order_id = body["data"]["order"]["id"].as_str().unwrap().to_string();

    let (_, body) = send(&app, "GET", "/api/cart", token, None).await;
    assert!(body["data"]["items"].as_array().unwrap().is_empty());

    let (_, body) = send(&app, "GET", "/api/orders?status=Pending", token, None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "GET", "/api/admin/customers", token, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    ensure_admin_account(&state, "admin@clothy.id", "admin123").await.unwrap();
    let admin = login(&app, "admin@clothy.id", "admin123").await;
    let admin = Some(admin.as_str());

    let (status, body) = send(&app, "GET", "/api/admin/customers", admin, None).await;
    assert_eq!(status, StatusCode::OK);
    let customers = body["data"].as_array().unwrap();
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0]["hasPendingOrders"], json!(true));
    let uid = customers[0]["uid"].as_str().unwrap().to_string();

    let review = format!("/api/admin/customers/{uid}/orders/{order_id}/status");
    let (status, body) = send(&app, "PATCH", &review, admin, Some(json!({ "status": "Diterima" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("Diterima"));
    let (status, _) = send(&app, "PATCH", &review, admin, Some(json!({ "status": "Ditolak" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/api/auth/logout", token, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", "/api/cart", token, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_manages_catalog_and_images() {
    let state = seeded_state();
    let app = create_app(state.clone());
    ensure_admin_account(&state, "admin@clothy.id", "admin123").await.unwrap();
    let admin = login(&app, "admin@clothy.id", "admin123").await;
    let admin = Some(admin.as_str());

    let (status, body) = send(
        &app,
        "POST",
        "/api/admin/products",
        admin,
        Some(json!({ "name": "Hoodie Hitam", "price": "199000", "description": "Fleece", "category": "Hoodie" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "POST",
        "/api/admin/products",
        admin,
        Some(json!({ "name": "Minus", "price": "-1", "category": "Hoodie" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/admin/products/Hoodie/{id}"),
        admin,
        Some(json!({ "category": "Jaket", "price": 210000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["category"], json!("Jaket"));
    let (status, _) = send(&app, "GET", &format!("/api/products/Hoodie/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "GET", &format!("/api/products/Jaket/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);

    let upload = Request::builder()
        .method("PUT")
        .uri(format!("/api/admin/products/Jaket/{id}/image"))
        .header(header::AUTHORIZATION, admin.unwrap())
        .header(header::CONTENT_TYPE, "image/png")
        .body(Body::from(vec![0x89, b'P', b'N', b'G']))
        .unwrap();
    let response = app.clone().oneshot(upload).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let url = body["data"]["image"].as_str().unwrap().to_string();
    assert!(url.ends_with(&format!("/blobs/product_images/{id}")));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/blobs/product_images/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");

    let (status, _) = send(&app, "DELETE", &format!("/api/admin/products/Jaket/{id}"), admin, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", &format!("/blobs/product_images/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn requests_without_session_are_rejected() {
    let app = create_app(seeded_state());
    let (status, _) = send(&app, "GET", "/api/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, "GET", "/api/cart", Some("Bearer not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, body) = send(&app, "GET", "/nowhere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["data"]["path"], json!("/nowhere"));
}
