use axum::extract::State;
use clothy_api::{
    config::AppConfig, routes::health::health_check, state::AppState, store::MemoryStore,
};

#[tokio::test]
async fn health_check_returns_ok() {
    let state = AppState::in_memory(AppConfig::with_secret("test-secret"), MemoryStore::new());
    let response = health_check(State(state)).await;
    assert_eq!(response.0.message, "Health check");

    let data = response.0.data.expect("health data");
    assert_eq!(data.status, "ok");
    assert_eq!(data.store, "ok");
    assert_eq!(data.sessions, 0);
}
