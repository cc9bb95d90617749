//! End-to-end tests: row inserted in Postgres → trigger → LISTEN → dispatch.
//!
//! These tests require a running PostgreSQL database and the `DATABASE_URL`
//! environment variable to be set. Run with:
//!
//! ```bash
//! DATABASE_URL="postgresql://..." cargo test -p pushbridge-listener --test integration -- --ignored --nocapture
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use pushbridge_common::error::AppError;
use pushbridge_common::types::{BatchResponse, MulticastMessage};
use pushbridge_engine::dispatcher::NotificationDispatcher;
use pushbridge_engine::registry::PgDeviceRegistry;
use pushbridge_listener::feed::{ChangeFeed, PgChangeFeed};
use pushbridge_listener::listener::ChangeListener;
use pushbridge_notifier::PushSender;

#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<MulticastMessage>>,
}

impl RecordingSender {
    fn calls(&self) -> Vec<MulticastMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushSender for RecordingSender {
    async fn send_multicast(&self, message: &MulticastMessage) -> Result<BatchResponse, AppError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(BatchResponse {
            success_count: message.tokens.len(),
            failure_count: 0,
            responses: Vec::new(),
        })
    }
}

/// Run migrations and clear both tables.
async fn setup(pool: &PgPool) {
    sqlx::migrate!("../../migrations").run(pool).await.unwrap();

    sqlx::query("DELETE FROM dispositivos")
        .execute(pool)
        .await
        .unwrap();
    sqlx::query("DELETE FROM pending_notifications")
        .execute(pool)
        .await
        .unwrap();
}

async fn register_device(pool: &PgPool, user_id: &str, token: Option<&str>) {
    sqlx::query("INSERT INTO dispositivos (usuario_id, fcm_token) VALUES ($1, $2)")
        .bind(user_id)
        .bind(token)
        .execute(pool)
        .await
        .unwrap();
}

async fn insert_pending(pool: &PgPool, user_id: &str, mensaje: &str) {
    sqlx::query("INSERT INTO pending_notifications (user_id, mensaje) VALUES ($1, $2)")
        .bind(user_id)
        .bind(mensaje)
        .execute(pool)
        .await
        .unwrap();
}

/// Start `ChangeListener::run` on its own task, subscribed before returning.
async fn spawn_listener(
    pool: &PgPool,
    sender: Arc<RecordingSender>,
) -> tokio::task::JoinHandle<anyhow::Result<()>> {
    let dispatcher =
        NotificationDispatcher::new(Arc::new(PgDeviceRegistry::new(pool.clone())), sender);
    let listener = ChangeListener::new(dispatcher);
    let feed = PgChangeFeed::connect(pool).await.unwrap();

    tokio::spawn(async move { listener.run(feed).await })
}

/// Wait until at least `count` multicasts were recorded, then a little longer
/// so a duplicate dispatch would also be seen.
async fn wait_for_calls(sender: &RecordingSender, count: usize) -> Vec<MulticastMessage> {
    tokio::time::timeout(Duration::from_secs(5), async {
        while sender.calls().len() < count {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await
    .expect("timed out waiting for dispatch");

    tokio::time::sleep(Duration::from_millis(300)).await;
    sender.calls()
}

#[sqlx::test]
#[ignore] // Requires DATABASE_URL — run explicitly with --ignored
async fn test_insert_trigger_publishes_change_event(pool: PgPool) {
    setup(&pool).await;
    let mut feed = PgChangeFeed::connect(&pool).await.unwrap();

    insert_pending(&pool, "u1", "Hola").await;

    let event = tokio::time::timeout(Duration::from_secs(5), feed.next_event())
        .await
        .expect("timed out waiting for notification")
        .unwrap()
        .unwrap();

    assert_eq!(event.event_type, "INSERT");
    assert_eq!(event.schema, "public");
    assert_eq!(event.table, "pending_notifications");
    assert_eq!(event.record["user_id"], "u1");
    // Loaded back from the table; the trigger only carries the key.
    assert_eq!(event.record["mensaje"], "Hola");
}

#[sqlx::test]
#[ignore]
async fn test_inserted_row_is_dispatched_to_registered_tokens(pool: PgPool) {
    setup(&pool).await;
    for token in [Some("tokA"), Some("tokB"), None] {
        register_device(&pool, "u1", token).await;
    }

    let sender = Arc::new(RecordingSender::default());
    let handle = spawn_listener(&pool, sender.clone()).await;

    insert_pending(&pool, "u1", "Hola").await;

    let sent = wait_for_calls(&sender, 1).await;
    handle.abort();

    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].notification.title, "Nuevo Mensaje");
    assert_eq!(sent[0].notification.body, "Hola");
    let mut tokens = sent[0].tokens.clone();
    tokens.sort();
    assert_eq!(tokens, vec!["tokA".to_string(), "tokB".to_string()]);
}

#[sqlx::test]
#[ignore]
async fn test_message_larger_than_notify_limit_is_dispatched(pool: PgPool) {
    setup(&pool).await;
    register_device(&pool, "u9", Some("tokL")).await;

    let sender = Arc::new(RecordingSender::default());
    let handle = spawn_listener(&pool, sender.clone()).await;

    // pg_notify rejects payloads of 8000 bytes or more; the insert must
    // still succeed and the full message must reach the device.
    let long_message = "x".repeat(9000);
    insert_pending(&pool, "u9", &long_message).await;

    let sent = wait_for_calls(&sender, 1).await;
    handle.abort();

    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].tokens, vec!["tokL".to_string()]);
    assert_eq!(sent[0].notification.body.len(), 9000);
}
