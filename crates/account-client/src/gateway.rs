//! MTProto gateway REST client.
//!
//! The gateway keeps the actual MTProto connections; this client drives its
//! per-session endpoints and maps structured error bodies onto
//! [`AccountError`].

use crate::error::AccountError;
use crate::types::*;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Gateway client; one instance serves every session.
#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
}

impl GatewayClient {
    /// Create a new gateway client.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AccountError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Check if the gateway is reachable.
    pub async fn health_check(&self) -> bool {
        self.client
            .get(format!("{}/v1/health", self.base_url))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

#[async_trait]
impl AccountConnector for GatewayClient {
    #[instrument(skip(self))]
    async fn connect(&self, session_ref: &str) -> Result<Box<dyn AccountSession>, AccountError> {
        let response = self
            .client
            .post(format!(
                "{}/v1/sessions/{}/connect",
                self.base_url, session_ref
            ))
            .send()
            .await?;

        check_response(response).await?;
        debug!(session_ref = %session_ref, "Gateway session connected");

        Ok(Box::new(GatewaySession {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            session_ref: session_ref.to_string(),
        }))
    }
}

/// One connected gateway session.
pub struct GatewaySession {
    client: Client,
    base_url: String,
    session_ref: String,
}

impl GatewaySession {
    fn url(&self, suffix: &str) -> String {
        format!(
            "{}/v1/sessions/{}{}",
            self.base_url, self.session_ref, suffix
        )
    }
}

#[async_trait]
impl AccountSession for GatewaySession {
    async fn is_authorized(&self) -> Result<bool, AccountError> {
        let response = self.client.get(self.url("")).send().await?;
        let response = check_response(response).await?;

        let status: SessionStatus = response.json().await?;
        Ok(status.authorized)
    }

    #[instrument(skip(self))]
    async fn request_code(&self, phone_number: &str) -> Result<CodeToken, AccountError> {
        let response = self
            .client
            .post(self.url("/code"))
            .json(&CodeRequest { phone_number })
            .send()
            .await?;
        let response = check_response(response).await?;

        let body: CodeResponse = response.json().await?;
        debug!("Code requested");
        Ok(CodeToken::new(body.code_token))
    }

    #[instrument(skip(self, code, token))]
    async fn sign_in_with_code(
        &self,
        phone_number: &str,
        code: &str,
        token: &CodeToken,
    ) -> Result<AccountIdentity, AccountError> {
        let response = self
            .client
            .post(self.url("/sign-in"))
            .json(&SignInRequest {
                phone_number,
                code,
                code_token: &token.0,
            })
            .send()
            .await?;
        let response = check_response(response).await?;

        Ok(response.json().await?)
    }

    #[instrument(skip(self, password))]
    async fn sign_in_with_password(
        &self,
        password: &str,
    ) -> Result<AccountIdentity, AccountError> {
        let response = self
            .client
            .post(self.url("/password"))
            .json(&PasswordRequest { password })
            .send()
            .await?;
        let response = check_response(response).await?;

        Ok(response.json().await?)
    }

    async fn disconnect(&self) -> Result<(), AccountError> {
        let response = self.client.post(self.url("/disconnect")).send().await?;
        check_response(response).await?;
        debug!(session_ref = %self.session_ref, "Gateway session disconnected");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct CodeRequest<'a> {
    phone_number: &'a str,
}

#[derive(Debug, Serialize)]
struct SignInRequest<'a> {
    phone_number: &'a str,
    code: &'a str,
    code_token: &'a str,
}

#[derive(Debug, Serialize)]
struct PasswordRequest<'a> {
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct SessionStatus {
    authorized: bool,
}

#[derive(Debug, Deserialize)]
struct CodeResponse {
    code_token: String,
}

/// Structured error body the gateway responds with on failure.
#[derive(Debug, Deserialize)]
struct GatewayErrorBody {
    error: String,
    message: Option<String>,
    retry_after: Option<u64>,
}

/// Map a non-success response onto the error taxonomy.
async fn check_response(response: Response) -> Result<Response, AccountError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    warn!(status = %status, body = %text, "Gateway call failed");

    if let Ok(body) = serde_json::from_str::<GatewayErrorBody>(&text) {
        return Err(match body.error.as_str() {
            "invalid_phone_number" => AccountError::InvalidPhoneNumber,
            "rate_limited" => AccountError::RateLimited {
                seconds: body.retry_after.unwrap_or(0),
            },
            "code_invalid" => AccountError::CodeInvalid,
            "code_expired" => AccountError::CodeExpired,
            "password_required" => AccountError::TwoFactorRequired,
            "password_invalid" => AccountError::PasswordInvalid,
            _ => AccountError::Api(body.message.unwrap_or(body.error)),
        });
    }

    Err(AccountError::Api(format!("{status} - {text}")))
}
