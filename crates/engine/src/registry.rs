//! Device registry — maps a user to the push tokens of their devices.

use async_trait::async_trait;
use sqlx::PgPool;

use pushbridge_common::error::AppError;
use pushbridge_common::types::DeviceToken;

/// Read-only source of registered devices.
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// All devices owned by `user_id`, tokens unfiltered.
    async fn devices_for_user(&self, user_id: &str) -> Result<Vec<DeviceToken>, AppError>;
}

/// Registry backed by the `dispositivos` table.
#[derive(Clone)]
pub struct PgDeviceRegistry {
    pool: PgPool,
}

impl PgDeviceRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceRegistry for PgDeviceRegistry {
    async fn devices_for_user(&self, user_id: &str) -> Result<Vec<DeviceToken>, AppError> {
        // Cast so the lookup works whether `usuario_id` is text or uuid.
        let devices: Vec<DeviceToken> = sqlx::query_as(
            r#"
            SELECT usuario_id::text AS usuario_id, fcm_token
            FROM dispositivos
            WHERE usuario_id::text = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(devices)
    }
}
