//! Account login types and capability traits.

use crate::error::AccountError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Server-issued token correlating a requested code with the sign-in call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeToken(pub String);

impl CodeToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

/// The account identity returned by a completed sign-in.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountIdentity {
    pub account_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

/// Factory for live account sessions.
///
/// `session_ref` is an opaque, deterministic identifier; connecting with the
/// same reference resumes the same server-side session state.
#[async_trait]
pub trait AccountConnector: Send + Sync {
    async fn connect(&self, session_ref: &str) -> Result<Box<dyn AccountSession>, AccountError>;
}

/// One live connection to the remote account network.
#[async_trait]
pub trait AccountSession: Send + Sync {
    /// Whether the session already holds a completed authorization.
    async fn is_authorized(&self) -> Result<bool, AccountError>;

    /// Ask the network to deliver a one-time code to `phone_number`.
    async fn request_code(&self, phone_number: &str) -> Result<CodeToken, AccountError>;

    /// Complete sign-in with the delivered code.
    ///
    /// Fails with [`AccountError::TwoFactorRequired`] when the account has a
    /// second factor enabled; the session stays usable for the password step.
    async fn sign_in_with_code(
        &self,
        phone_number: &str,
        code: &str,
        token: &CodeToken,
    ) -> Result<AccountIdentity, AccountError>;

    /// Complete sign-in with the two-factor password.
    async fn sign_in_with_password(
        &self,
        password: &str,
    ) -> Result<AccountIdentity, AccountError>;

    /// Release the connection. Best-effort; errors are the caller's to log.
    async fn disconnect(&self) -> Result<(), AccountError>;
}
