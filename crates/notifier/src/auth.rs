//! OAuth2 access tokens for the FCM HTTP v1 API.
//!
//! A short-lived RS256 assertion signed with the service-account key is
//! exchanged at the account's `token_uri` for a bearer token. Tokens are
//! cached and reused until shortly before they expire.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use pushbridge_common::error::AppError;

use crate::credentials::ServiceAccount;

const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for each signed assertion (Google caps it at one hour).
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Refresh this long before the cached token expires.
const REFRESH_MARGIN_SECS: i64 = 60;

/// JWT claims for the service-account assertion.
#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Mints and caches OAuth2 access tokens for one service account.
pub struct TokenProvider {
    http: reqwest::Client,
    client_email: String,
    token_uri: String,
    key: EncodingKey,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    /// Fails if the account's private key is not a valid RSA PEM.
    pub fn new(http: reqwest::Client, account: &ServiceAccount) -> Result<Self, AppError> {
        let key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())
            .map_err(|e| AppError::Credentials(format!("invalid private key: {}", e)))?;

        Ok(Self {
            http,
            client_email: account.client_email.clone(),
            token_uri: account.token_uri.clone(),
            key,
            cached: Mutex::new(None),
        })
    }

    /// Return a valid access token, refreshing it if needed.
    pub async fn access_token(&self) -> Result<String, AppError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref()
            && token.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > Utc::now()
        {
            return Ok(token.access_token.clone());
        }

        let fresh = self.fetch().await?;
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }

    /// Sign an assertion for the current instant.
    pub fn sign_assertion(&self, now: DateTime<Utc>) -> Result<String, AppError> {
        let claims = AssertionClaims {
            iss: self.client_email.clone(),
            scope: FCM_SCOPE.to_string(),
            aud: self.token_uri.clone(),
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| AppError::Auth(format!("failed to sign assertion: {}", e)))
    }

    async fn fetch(&self) -> Result<CachedToken, AppError> {
        let now = Utc::now();
        let assertion = self.sign_assertion(now)?;

        let response = self
            .http
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Auth(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response.json().await?;
        tracing::debug!(expires_in = token.expires_in, "Fetched FCM access token");

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        })
    }
}
