use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub const VERIFY_CLIENT_PATH: &str = "/auth/verify-client";
pub const VERIFY_TOKEN_PATH: &str = "/auth/verify-token";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Auth service unreachable: {0}")]
    Transport(String),

    #[error("Auth service did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Auth service sent an unreadable response: {0}")]
    InvalidResponse(String),
}

/// `x-client-id` / `x-client-secret` as sent by the caller. Absent headers
/// are left out of the payload.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientCredentials {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

/// Raw `authorization` header value.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenCredentials {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

/// Envelope returned by the auth service. Only `status` is interpreted; the
/// raw document is kept so a rejection can be handed back untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthResult {
    raw: Value,
}

#[derive(Deserialize)]
struct Envelope {
    status: Option<String>,
}

impl AuthResult {
    pub fn from_value(raw: Value) -> Self {
        Self { raw }
    }

    pub fn success() -> Self {
        Self::from_value(serde_json::json!({ "status": "success" }))
    }

    pub fn is_success(&self) -> bool {
        Envelope::deserialize(&self.raw)
            .ok()
            .and_then(|e| e.status)
            .is_some_and(|s| s == "success")
    }

    pub fn data(&self) -> Option<&Value> {
        self.raw.get("data")
    }

    pub fn into_value(self) -> Value {
        self.raw
    }
}

/// External service that validates client identity and bearer tokens.
#[async_trait]
pub trait AuthVerifier: Send + Sync {
    async fn verify_client(&self, credentials: &ClientCredentials)
    -> Result<AuthResult, AuthError>;

    async fn verify_token(&self, credentials: &TokenCredentials) -> Result<AuthResult, AuthError>;
}

/// JSON-over-HTTP client for the auth service.
pub struct HttpAuthVerifier {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpAuthVerifier {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    async fn post<T: Serialize + ?Sized + Sync>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<AuthResult, AuthError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        // Rejections may come with a non-2xx status; the body is the envelope either way
        let raw: Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                AuthError::Timeout(self.timeout)
            } else {
                AuthError::InvalidResponse(format!("{} returned {}: {}", url, status, e))
            }
        })?;

        if !raw.is_object() {
            return Err(AuthError::InvalidResponse(format!(
                "{} returned a non-object body",
                url
            )));
        }

        tracing::debug!("Auth service {} answered {}", path, status);
        Ok(AuthResult::from_value(raw))
    }

    fn classify(&self, e: reqwest::Error) -> AuthError {
        if e.is_timeout() {
            AuthError::Timeout(self.timeout)
        } else {
            AuthError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl AuthVerifier for HttpAuthVerifier {
    async fn verify_client(
        &self,
        credentials: &ClientCredentials,
    ) -> Result<AuthResult, AuthError> {
        self.post(VERIFY_CLIENT_PATH, credentials).await
    }

    async fn verify_token(&self, credentials: &TokenCredentials) -> Result<AuthResult, AuthError> {
        self.post(VERIFY_TOKEN_PATH, credentials).await
    }
}
