use thiserror::Error;

/// Common error types used across the application.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Credentials error: {0}")]
    Credentials(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Push error: {0}")]
    Push(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
