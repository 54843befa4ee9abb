//! Contract for the remote authentication service plus an in-process
//! implementation used for local runs and tests.

use std::collections::HashMap;

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use async_trait::async_trait;
use password_hash::rand_core::OsRng;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{RwLock, broadcast};
use utoipa::ToSchema;
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email is already taken")]
    EmailTaken,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Password should be at least 6 characters")]
    WeakPassword,

    #[error("Unknown user")]
    UnknownUser,

    #[error("auth service unavailable: {0}")]
    Unavailable(String),
}

impl AuthError {
    pub fn is_credential_error(&self) -> bool {
        matches!(self, AuthError::InvalidCredentials | AuthError::UnknownUser)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Identity {
    pub uid: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Identity),
    SignedOut { uid: String },
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    async fn sign_out(&self, uid: &str) -> Result<(), AuthError>;

    async fn update_password(&self, uid: &str, new_password: &str) -> Result<(), AuthError>;

    /// Fires on every sign-in and sign-out.
    fn events(&self) -> broadcast::Receiver<AuthEvent>;
}

struct Account {
    uid: String,
    email: String,
    password_hash: String,
}

pub struct MemoryAuth {
    accounts: RwLock<HashMap<String, Account>>,
    events: broadcast::Sender<AuthEvent>,
}

impl Default for MemoryAuth {
    fn default() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            accounts: RwLock::new(HashMap::new()),
            events,
        }
    }
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    fn hash(password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AuthError::Unavailable(e.to_string()))
    }

    fn emit(&self, event: AuthEvent) {
        // no receivers is fine
        let _ = self.events.send(event);
    }
}

fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(AuthError::InvalidEmail),
    }
}

#[async_trait]
impl AuthService for MemoryAuth {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }
        let password_hash = Self::hash(password)?;

        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&email) {
            return Err(AuthError::EmailTaken);
        }
        let uid = Uuid::new_v4().simple().to_string();
        accounts.insert(
            email.clone(),
            Account {
                uid: uid.clone(),
                email: email.clone(),
                password_hash,
            },
        );
        Ok(Identity { uid, email })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = normalize_email(email).map_err(|_| AuthError::InvalidCredentials)?;
        let identity = {
            let accounts = self.accounts.read().await;
            let account = accounts.get(&email).ok_or(AuthError::InvalidCredentials)?;
            let parsed = PasswordHash::new(&account.password_hash)
                .map_err(|e| AuthError::Unavailable(e.to_string()))?;
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .map_err(|_| AuthError::InvalidCredentials)?;
            Identity {
                uid: account.uid.clone(),
                email: account.email.clone(),
            }
        };
        self.emit(AuthEvent::SignedIn(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self, uid: &str) -> Result<(), AuthError> {
        self.emit(AuthEvent::SignedOut {
            uid: uid.to_string(),
        });
        Ok(())
    }

    async fn update_password(&self, uid: &str, new_password: &str) -> Result<(), AuthError> {
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }
        let password_hash = Self::hash(new_password)?;
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .values_mut()
            .find(|a| a.uid == uid)
            .ok_or(AuthError::UnknownUser)?;
        account.password_hash = password_hash;
        Ok(())
    }

    fn events(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sign_up_then_sign_in() {
        let auth = MemoryAuth::new();
        let mut events = auth.events();
        let created = auth.sign_up("Sari@Example.com", "rahasia1").await.unwrap();
        assert_eq!(created.email, "sari@example.com");

        let signed_in = auth.sign_in("sari@example.com", "rahasia1").await.unwrap();
        assert_eq!(signed_in, created);
        assert_eq!(events.recv().await.unwrap(), AuthEvent::SignedIn(created));

        assert!(matches!(
            auth.sign_in("sari@example.com", "salah").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn rejects_duplicates_and_weak_passwords() {
        let auth = MemoryAuth::new();
        auth.sign_up("a@b.co", "123456").await.unwrap();
        assert!(matches!(auth.sign_up("a@b.co", "abcdef").await, Err(AuthError::EmailTaken)));
        assert!(matches!(auth.sign_up("c@d.co", "123").await, Err(AuthError::WeakPassword)));
        assert!(matches!(auth.sign_up("nope", "123456").await, Err(AuthError::InvalidEmail)));
    }

    #[tokio::test]
    async fn update_password_replaces_credentials() {
        let auth = MemoryAuth::new();
        let id = auth.sign_up("a@b.co", "123456").await.unwrap();
        auth.update_password(&id.uid, "abcdefg").await.unwrap();
        assert!(auth.sign_in("a@b.co", "123456").await.is_err());
        assert!(auth.sign_in("a@b.co", "abcdefg").await.is_ok());
    }
}
