use std::sync::Arc;

use crate::{
    auth::{AuthService, MemoryAuth},
    config::AppConfig,
    session::SessionRegistry,
    store::{BlobStore, DocumentStore, MemoryBlobStore, MemoryStore},
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub auth: Arc<dyn AuthService>,
    pub sessions: Arc<SessionRegistry>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Wires the backends together and starts listening for auth events so
    /// sign-outs tear down live sessions. Must run inside a tokio runtime.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        auth: Arc<dyn AuthService>,
    ) -> Self {
        let sessions = Arc::new(SessionRegistry::new(chrono::Duration::hours(
            config.session_ttl_hours,
        )));
        SessionRegistry::listen(&sessions, auth.events());
        Self {
            store,
            blobs,
            auth,
            sessions,
            config: Arc::new(config),
        }
    }

    pub fn in_memory(config: AppConfig, store: MemoryStore) -> Self {
        let blobs = MemoryBlobStore::new(config.blob_public_url.clone());
        Self::new(config, Arc::new(store), Arc::new(blobs), Arc::new(MemoryAuth::new()))
    }
}
