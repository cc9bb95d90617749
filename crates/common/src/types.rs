use serde::{Deserialize, Serialize};

/// Title shown on every push notification.
pub const NOTIFICATION_TITLE: &str = "Nuevo Mensaje";

/// Body used when the pending row carries no message text.
pub const DEFAULT_BODY: &str = "Nueva notificación";

/// Table the upstream writer inserts pending notifications into.
pub const PENDING_TABLE: &str = "pending_notifications";

/// `NOTIFY` channel the insert trigger publishes on.
pub const FEED_CHANNEL: &str = "pending_notifications";

/// A row inserted into `pending_notifications` by an upstream writer.
///
/// Only the columns this bridge needs are decoded; anything else in the row
/// snapshot is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingNotification {
    pub user_id: String,
    #[serde(default)]
    pub mensaje: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl PendingNotification {
    /// Notification body: the first non-empty of `mensaje` and `message`, or
    /// the placeholder.
    pub fn body(&self) -> &str {
        [self.mensaje.as_deref(), self.message.as_deref()]
            .into_iter()
            .flatten()
            .find(|msg| !msg.is_empty())
            .unwrap_or(DEFAULT_BODY)
    }
}

/// A registered device from the `dispositivos` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeviceToken {
    pub usuario_id: String,
    pub fcm_token: Option<String>,
}

/// Title and body of a push notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

/// One notification addressed to many device tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MulticastMessage {
    pub notification: Notification,
    pub tokens: Vec<String>,
}

impl MulticastMessage {
    /// Build the payload for a pending row and its already-filtered tokens.
    pub fn for_record(record: &PendingNotification, tokens: Vec<String>) -> Self {
        Self {
            notification: Notification {
                title: NOTIFICATION_TITLE.to_string(),
                body: record.body().to_string(),
            },
            tokens,
        }
    }
}

/// Outcome of delivering to a single token within a multicast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResponse {
    pub token: String,
    /// Provider message name on success (e.g. `projects/p/messages/123`)
    pub message_id: Option<String>,
    pub error: Option<String>,
}

impl SendResponse {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregated per-token results of a multicast send.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub success_count: usize,
    pub failure_count: usize,
    pub responses: Vec<SendResponse>,
}

impl BatchResponse {
    pub fn from_responses(responses: Vec<SendResponse>) -> Self {
        let success_count = responses.iter().filter(|r| r.success()).count();
        Self {
            success_count,
            failure_count: responses.len() - success_count,
            responses,
        }
    }
}

/// Envelope published by the change-feed trigger for each row change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub schema: String,
    pub table: String,
    /// New row: key columns as published, full snapshot once loaded back
    pub record: serde_json::Value,
}

impl ChangeEvent {
    pub fn is_insert_into(&self, table: &str) -> bool {
        self.event_type.eq_ignore_ascii_case("INSERT") && self.table == table
    }
}
