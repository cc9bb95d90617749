//! Change feed — row-change events delivered from PostgreSQL.
//!
//! An `AFTER INSERT` trigger on `pending_notifications` publishes a small
//! JSON `ChangeEvent` (row `id` and `user_id` only) through `pg_notify`.
//! `PgChangeFeed` holds a dedicated `LISTEN` connection on that channel and
//! reads each full row back by id before handing the event on. `sqlx`
//! reconnects the listener transparently if it drops (notifications published
//! while disconnected are lost).

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgListener;

use pushbridge_common::error::AppError;
use pushbridge_common::types::{ChangeEvent, FEED_CHANNEL, PENDING_TABLE};

/// A source of change events, consumed one at a time in delivery order.
#[async_trait]
pub trait ChangeFeed: Send {
    /// Wait for the next event. `Ok(None)` means the feed has ended.
    async fn next_event(&mut self) -> Result<Option<ChangeEvent>, AppError>;
}

/// `LISTEN`/`NOTIFY` subscription on the pending-notifications channel.
pub struct PgChangeFeed {
    listener: PgListener,
    pool: PgPool,
}

impl PgChangeFeed {
    /// Open a listening connection with the pool's settings and subscribe.
    pub async fn connect(pool: &PgPool) -> Result<Self, AppError> {
        let mut listener = PgListener::connect_with(pool).await?;
        listener.listen(FEED_CHANNEL).await?;

        tracing::info!(channel = FEED_CHANNEL, "Subscribed to change feed");
        Ok(Self {
            listener,
            pool: pool.clone(),
        })
    }

    pub fn channel(&self) -> &str {
        FEED_CHANNEL
    }

    /// Full row snapshot for a pending notification, if it still exists.
    async fn load_row(&self, id: &Value) -> Result<Option<Value>, AppError> {
        let id = match id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        let row: Option<Value> = sqlx::query_scalar(
            "SELECT to_jsonb(p) FROM pending_notifications p WHERE p.id::text = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Replace the trigger's key-only record with the stored row. On failure
    /// the envelope is kept so the event is still dispatched.
    async fn hydrate(&self, event: &mut ChangeEvent) {
        if event.table != PENDING_TABLE {
            return;
        }
        let Some(id) = event.record.get("id").cloned() else {
            return;
        };

        match self.load_row(&id).await {
            Ok(Some(row)) => event.record = row,
            Ok(None) => {
                tracing::debug!(id = %id, "Pending row no longer present, using envelope");
            }
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "Failed to load pending row, using envelope");
            }
        }
    }
}

#[async_trait]
impl ChangeFeed for PgChangeFeed {
    async fn next_event(&mut self) -> Result<Option<ChangeEvent>, AppError> {
        loop {
            let notification = self.listener.recv().await?;

            match serde_json::from_str::<ChangeEvent>(notification.payload()) {
                Ok(mut event) => {
                    self.hydrate(&mut event).await;
                    return Ok(Some(event));
                }
                Err(e) => {
                    tracing::warn!(
                        channel = FEED_CHANNEL,
                        error = %e,
                        "Ignoring malformed change-feed payload"
                    );
                }
            }
        }
    }
}
