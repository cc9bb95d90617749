//! Firebase Cloud Messaging HTTP v1 client.
//!
//! FCM v1 has no batch endpoint, so a multicast is fanned out as one
//! `messages:send` request per token, issued concurrently, and the per-token
//! results are folded into a `BatchResponse`.

use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use serde_json::json;

use pushbridge_common::error::AppError;
use pushbridge_common::types::{BatchResponse, MulticastMessage, Notification, SendResponse};

use crate::PushSender;
use crate::auth::TokenProvider;
use crate::credentials::ServiceAccount;

/// FCM rejects multicasts addressed to more tokens than this.
pub const MAX_MULTICAST_TOKENS: usize = 500;

#[derive(Debug, Deserialize)]
struct SendSuccess {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SendFailure {
    error: FcmErrorBody,
}

#[derive(Debug, Deserialize)]
struct FcmErrorBody {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// FCM client bound to one Firebase project.
pub struct FcmClient {
    http: reqwest::Client,
    send_url: String,
    project_id: String,
    tokens: TokenProvider,
}

impl FcmClient {
    pub fn new(account: ServiceAccount, base_url: &str) -> Result<Self, AppError> {
        let http = reqwest::Client::new();
        let tokens = TokenProvider::new(http.clone(), &account)?;
        let send_url = format!(
            "{}/v1/projects/{}/messages:send",
            base_url.trim_end_matches('/'),
            account.project_id
        );

        Ok(Self {
            http,
            send_url,
            project_id: account.project_id,
            tokens,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Deliver one notification to one token. Failures are reported in the
    /// returned `SendResponse`, never raised.
    async fn send_one(
        &self,
        access_token: &str,
        token: &str,
        notification: &Notification,
    ) -> SendResponse {
        let body = json!({
            "message": {
                "token": token,
                "notification": {
                    "title": notification.title,
                    "body": notification.body,
                }
            }
        });

        let result = self
            .http
            .post(&self.send_url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await;

        let response = match result {
            Ok(r) => r,
            Err(e) => return failed(token, e.to_string()),
        };

        let status = response.status();
        if status.is_success() {
            match response.json::<SendSuccess>().await {
                Ok(ok) => SendResponse {
                    token: token.to_string(),
                    message_id: Some(ok.name),
                    error: None,
                },
                Err(e) => failed(token, format!("malformed FCM response: {}", e)),
            }
        } else {
            let text = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<SendFailure>(&text)
                .ok()
                .and_then(|f| f.error.status.or(f.error.message))
                .unwrap_or_else(|| format!("HTTP {}", status));
            tracing::debug!(token, %status, reason = %reason, "FCM rejected message");
            failed(token, reason)
        }
    }
}

fn failed(token: &str, error: String) -> SendResponse {
    SendResponse {
        token: token.to_string(),
        message_id: None,
        error: Some(error),
    }
}

#[async_trait]
impl PushSender for FcmClient {
    async fn send_multicast(&self, message: &MulticastMessage) -> Result<BatchResponse, AppError> {
        if message.tokens.is_empty() {
            return Err(AppError::Push("multicast requires at least one token".to_string()));
        }
        if message.tokens.len() > MAX_MULTICAST_TOKENS {
            return Err(AppError::Push(format!(
                "multicast supports at most {} tokens, got {}",
                MAX_MULTICAST_TOKENS,
                message.tokens.len()
            )));
        }

        let access_token = self.tokens.access_token().await?;

        let sends = message
            .tokens
            .iter()
            .map(|token| self.send_one(&access_token, token, &message.notification));
        let responses = join_all(sends).await;

        Ok(BatchResponse::from_responses(responses))
    }
}
