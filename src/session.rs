//! Per-login context: who is signed in, their cart mirror and the
//! checkout in progress.
//!
//! A session owns a background task that keeps its cart equal to the
//! latest remote snapshot. The task only holds a [`Weak`] reference, so a
//! session that has been torn down is never written to.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex as StdMutex, Weak};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, MutexGuard, RwLock, broadcast};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    auth::{AuthEvent, Identity},
    error::{AppError, AppResult},
    models::{CartEntry, Role},
    services::{cart_service::CartManager, checkout_service::CheckoutFlow},
    store::{DocumentStore, paths},
};

pub struct Workspace {
    pub cart: CartManager,
    pub checkout: Option<CheckoutFlow>,
}

pub struct Session {
    pub id: String,
    pub uid: String,
    pub email: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
    store: Arc<dyn DocumentStore>,
    workspace: Mutex<Workspace>,
    sync: StdMutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("uid", &self.uid)
            .field("role", &self.role)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    pub async fn workspace(&self) -> MutexGuard<'_, Workspace> {
        self.workspace.lock().await
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    pub fn is_syncing(&self) -> bool {
        self.sync
            .lock()
            .map(|slot| slot.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Stop the cart subscription. Safe to call more than once.
    pub fn teardown(&self) {
        if let Ok(mut slot) = self.sync.lock()
            && let Some(handle) = slot.take()
        {
            handle.abort();
        }
    }

    async fn spawn_cart_sync(session: &Arc<Session>) -> AppResult<()> {
        let path = paths::cart(&session.uid);
        let mut watch = session
            .store
            .subscribe(&path)
            .await
            .map_err(AppError::CartSync)?
            .typed::<Vec<CartEntry>>();
        let weak: Weak<Session> = Arc::downgrade(session);

        let handle = tokio::spawn(async move {
            while let Some(snapshot) = watch.next().await {
                let Some(session) = weak.upgrade() else {
                    break;
                };
                match snapshot {
                    Ok(entries) => session.workspace().await.cart.replace_entries(entries),
                    Err(err) => {
                        tracing::warn!(uid = %session.uid, error = %err, "cart snapshot rejected");
                    }
                }
            }
        });

        if let Ok(mut slot) = session.sync.lock() {
            *slot = Some(handle);
        }
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}

pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Load the user's cart and start mirroring it.
    pub async fn start(
        &self,
        store: Arc<dyn DocumentStore>,
        identity: &Identity,
        role: Role,
    ) -> AppResult<Arc<Session>> {
        let mut cart = CartManager::new(store.clone(), identity.uid.clone());
        cart.load().await?;

        let session = Arc::new(Session {
            id: Uuid::new_v4().simple().to_string(),
            uid: identity.uid.clone(),
            email: identity.email.clone(),
            role,
            expires_at: Utc::now() + self.ttl,
            store,
            workspace: Mutex::new(Workspace {
                cart,
                checkout: None,
            }),
            sync: StdMutex::new(None),
        });
        Session::spawn_cart_sync(&session).await?;

        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        tracing::info!(uid = %session.uid, sid = %session.id, role = role.as_str(), "session started");
        Ok(session)
    }

    /// Live session by id; an expired one is torn down and not returned.
    pub async fn get(&self, sid: &str) -> Option<Arc<Session>> {
        let session = self.sessions.read().await.get(sid).cloned()?;
        if session.is_expired() {
            self.end(sid).await;
            return None;
        }
        Some(session)
    }

    pub async fn end(&self, sid: &str) -> Option<Arc<Session>> {
        let session = self.sessions.write().await.remove(sid)?;
        session.teardown();
        tracing::info!(uid = %session.uid, sid = %session.id, "session ended");
        Some(session)
    }

    /// End every session of `uid`.
    pub async fn end_user(&self, uid: &str) -> usize {
        let ended: Vec<Arc<Session>> = {
            let mut sessions = self.sessions.write().await;
            let sids: Vec<String> = sessions
                .values()
                .filter(|s| s.uid == uid)
                .map(|s| s.id.clone())
                .collect();
            sids.iter().filter_map(|sid| sessions.remove(sid)).collect()
        };
        for session in &ended {
            session.teardown();
        }
        if !ended.is_empty() {
            tracing::info!(uid = %uid, count = ended.len(), "user sessions ended");
        }
        ended.len()
    }

    pub async fn purge_expired(&self) -> usize {
        let expired: Vec<Arc<Session>> = {
            let mut sessions = self.sessions.write().await;
            let sids: Vec<String> = sessions
                .values()
                .filter(|s| s.is_expired())
                .map(|s| s.id.clone())
                .collect();
            sids.iter().filter_map(|sid| sessions.remove(sid)).collect()
        };
        for session in &expired {
            session.teardown();
        }
        expired.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// React to auth-state changes until the registry or the auth
    /// service goes away.
    pub fn listen(registry: &Arc<Self>, mut events: broadcast::Receiver<AuthEvent>) -> JoinHandle<()> {
        let weak = Arc::downgrade(registry);
        tokio::spawn(async move {
            loop {
                let event = match events.recv().await {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "auth events lagged");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                let Some(registry) = weak.upgrade() else {
                    break;
                };
                match event {
                    AuthEvent::SignedOut { uid } => {
                        registry.end_user(&uid).await;
                    }
                    AuthEvent::SignedIn(identity) => {
                        tracing::debug!(uid = %identity.uid, "auth state: signed in");
                    }
                }
            }
        })
    }
}
