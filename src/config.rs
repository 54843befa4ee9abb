use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub blob_public_url: String,
    /// JSON document tree loaded into the store at start.
    pub store_seed_path: Option<PathBuf>,
    pub admin: Option<AdminCredentials>,
    pub max_upload_bytes: usize,
}

const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let session_ttl_hours = env::var("SESSION_TTL_HOURS")
            .ok()
            .and_then(|h| h.parse::<i64>().ok())
            .filter(|h| *h > 0)
            .unwrap_or(24);
        let blob_public_url = env::var("BLOB_PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://{host}:{port}/blobs"));
        let store_seed_path = env::var("STORE_SEED_PATH").ok().map(PathBuf::from);
        let admin = match (env::var("ADMIN_EMAIL"), env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) => Some(AdminCredentials { email, password }),
            _ => None,
        };
        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|b| b.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        Ok(Self {
            host,
            port,
            jwt_secret,
            session_ttl_hours,
            blob_public_url,
            store_seed_path,
            admin,
            max_upload_bytes,
        })
    }

    /// Defaults for a local, in-process instance.
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            jwt_secret: jwt_secret.into(),
            session_ttl_hours: 24,
            blob_public_url: "http://127.0.0.1:3000/blobs".to_string(),
            store_seed_path: None,
            admin: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}
