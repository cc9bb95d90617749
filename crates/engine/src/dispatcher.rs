//! Notification dispatcher.
//!
//! For each pending-notification row:
//! 1. Look up the user's devices in the registry
//! 2. Drop devices without a usable token
//! 3. Build one multicast message (fixed title, row message or placeholder body)
//! 4. Hand it to the push sender exactly once
//!
//! Every failure ends the dispatch and is logged; nothing is returned to the
//! caller as an error and nothing is retried.

use std::sync::Arc;

use pushbridge_common::types::{DeviceToken, MulticastMessage, PendingNotification};
use pushbridge_notifier::PushSender;

use crate::registry::DeviceRegistry;

/// How a single dispatch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The multicast was submitted; counts are the provider's per-token results.
    Sent {
        success_count: usize,
        failure_count: usize,
    },
    /// The registry lookup failed; treated as "nobody to notify".
    LookupFailed,
    /// The user has no registered devices.
    NoDevices,
    /// The user's devices carry no usable token.
    NoTokens,
    /// The push sender returned an error.
    SendFailed,
}

/// Stateless query → filter → build → send pipeline.
#[derive(Clone)]
pub struct NotificationDispatcher {
    registry: Arc<dyn DeviceRegistry>,
    sender: Arc<dyn PushSender>,
}

impl NotificationDispatcher {
    pub fn new(registry: Arc<dyn DeviceRegistry>, sender: Arc<dyn PushSender>) -> Self {
        Self { registry, sender }
    }

    /// Dispatch one pending notification. Never fails.
    pub async fn dispatch(&self, record: &PendingNotification) -> DispatchOutcome {
        let devices = match self.registry.devices_for_user(&record.user_id).await {
            Ok(devices) => devices,
            Err(e) => {
                tracing::debug!(user_id = %record.user_id, error = %e, "Device lookup failed, skipping");
                return DispatchOutcome::LookupFailed;
            }
        };

        if devices.is_empty() {
            tracing::debug!(user_id = %record.user_id, "No devices registered");
            return DispatchOutcome::NoDevices;
        }

        let tokens = Self::filter_tokens(devices);
        if tokens.is_empty() {
            tracing::debug!(user_id = %record.user_id, "No usable device tokens");
            return DispatchOutcome::NoTokens;
        }

        let message = MulticastMessage::for_record(record, tokens);

        match self.sender.send_multicast(&message).await {
            Ok(batch) => {
                tracing::info!(
                    user_id = %record.user_id,
                    tokens = message.tokens.len(),
                    success_count = batch.success_count,
                    failure_count = batch.failure_count,
                    "Notification sent"
                );
                DispatchOutcome::Sent {
                    success_count: batch.success_count,
                    failure_count: batch.failure_count,
                }
            }
            Err(e) => {
                tracing::error!(user_id = %record.user_id, error = %e, "Failed to send notification");
                DispatchOutcome::SendFailed
            }
        }
    }

    /// Keep non-empty tokens, in registry order.
    pub fn filter_tokens(devices: Vec<DeviceToken>) -> Vec<String> {
        devices
            .into_iter()
            .filter_map(|d| d.fcm_token)
            .filter(|t| !t.is_empty())
            .collect()
    }
}
