//! Push-notification delivery through Firebase Cloud Messaging.

pub mod auth;
pub mod credentials;
pub mod fcm;

use async_trait::async_trait;

use pushbridge_common::config::AppConfig;
use pushbridge_common::error::AppError;
use pushbridge_common::types::{BatchResponse, MulticastMessage};

use crate::credentials::CredentialSource;
use crate::fcm::FcmClient;

/// A provider able to deliver one notification to many device tokens.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send_multicast(&self, message: &MulticastMessage) -> Result<BatchResponse, AppError>;
}

/// Messaging capability as resolved at startup.
///
/// Missing or broken credentials do not stop the process: the bridge keeps
/// listening and each send fails on its own.
pub enum Messaging {
    Ready(FcmClient),
    Unavailable(String),
}

impl Messaging {
    /// Resolve credentials from configuration and build the FCM client.
    pub fn initialize(config: &AppConfig) -> Self {
        let sources = CredentialSource::from_config(config);

        match credentials::resolve(&sources)
            .and_then(|account| FcmClient::new(account, &config.fcm_base_url))
        {
            Ok(client) => {
                tracing::info!(project_id = %client.project_id(), "Firebase messaging initialized");
                Messaging::Ready(client)
            }
            Err(e) => {
                tracing::error!(error = %e, "Firebase credentials unavailable; push delivery disabled");
                Messaging::Unavailable(e.to_string())
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Messaging::Ready(_))
    }
}

#[async_trait]
impl PushSender for Messaging {
    async fn send_multicast(&self, message: &MulticastMessage) -> Result<BatchResponse, AppError> {
        match self {
            Messaging::Ready(client) => client.send_multicast(message).await,
            Messaging::Unavailable(reason) => Err(AppError::Push(format!(
                "messaging not initialized: {}",
                reason
            ))),
        }
    }
}
