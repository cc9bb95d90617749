use std::path::PathBuf;

use serde::Deserialize;

/// Default keepalive port when `PORT` is unset.
const DEFAULT_PORT: u16 = 3000;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection string (Supabase exposes one per project)
    pub database_url: String,

    /// Maximum number of PostgreSQL connections in the pool (default: 5)
    pub db_max_connections: u32,

    /// Port the keepalive HTTP server binds to (default: 3000)
    pub port: u16,

    /// Inline Firebase service-account JSON
    pub firebase_credentials: Option<String>,

    /// Service-account JSON file, consulted when the inline value is absent
    pub firebase_credentials_file: PathBuf,

    /// FCM API base URL, overridable for tests
    pub fcm_base_url: String,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            database_url: lookup("DATABASE_URL")
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
            db_max_connections: lookup("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a valid u32"))?,
            port: match lookup("PORT") {
                Some(port) => port
                    .parse()
                    .map_err(|_| anyhow::anyhow!("PORT must be a valid u16"))?,
                None => DEFAULT_PORT,
            },
            firebase_credentials: lookup("FIREBASE_CREDENTIALS").filter(|v| !v.trim().is_empty()),
            firebase_credentials_file: lookup("FIREBASE_CREDENTIALS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("firebase-key.json")),
            fcm_base_url: lookup("FCM_BASE_URL")
                .unwrap_or_else(|| "https://fcm.googleapis.com".to_string()),
        })
    }
}
