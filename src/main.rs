use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clothy_api::{
    config::AppConfig,
    routes::create_app,
    services::auth_service::ensure_admin_account,
    state::AppState,
    store::MemoryStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,clothy_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let store = load_store(&config).await?;
    let state = AppState::in_memory(config.clone(), store);

    if let Some(admin) = &config.admin {
        let uid = ensure_admin_account(&state, &admin.email, &admin.password)
            .await
            .map_err(|e| anyhow::anyhow!("admin bootstrap failed: {e}"))?;
        tracing::info!(uid = %uid, email = %admin.email, "admin account bootstrapped");
    }

    spawn_session_reaper(&state);

    let app = create_app(state);

    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));
    tracing::info!("listening on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}

async fn load_store(config: &AppConfig) -> anyhow::Result<MemoryStore> {
    let Some(path) = &config.store_seed_path else {
        return Ok(MemoryStore::new());
    };
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| anyhow::anyhow!("reading {}: {e}", path.display()))?;
    let root: serde_json::Value = serde_json::from_str(&raw)?;
    tracing::info!(path = %path.display(), "store seeded");
    Ok(MemoryStore::with_root(root))
}

fn spawn_session_reaper(state: &AppState) {
    let sessions = Arc::downgrade(&state.sessions);
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            tick.tick().await;
            let Some(sessions) = sessions.upgrade() else {
                break;
            };
            let purged = sessions.purge_expired().await;
            if purged > 0 {
                tracing::info!(purged, "expired sessions purged");
            }
        }
    });
}
