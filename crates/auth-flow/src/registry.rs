//! Pending-authentication registry.
//!
//! Correlates each in-flight login with the user that started it: the live
//! account session, the code-correlation token and the session reference to
//! persist on success. At most one entry exists per user; entries are never
//! persisted and do not survive a restart.

use crate::error::AuthFlowError;
use account_client::{AccountConnector, AccountError, AccountSession, CodeToken};
use account_store::{AccountStore, PhoneStatus};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Deterministic session reference for a (user, phone) pair.
///
/// The same pair always maps to the same storage slot; distinct pairs do not
/// collide.
pub fn session_ref(user_id: i64, phone_number: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{user_id}:{phone_number}").as_bytes());
    hex::encode(hasher.finalize())
}

/// Outcome of starting a login.
#[derive(Debug, PartialEq, Eq)]
pub enum BeginOutcome {
    /// A code was sent; a pending entry now exists for the user.
    CodeSent,
    /// The stored session is already authorized; no code needed.
    AlreadyAuthorized,
}

/// Why a code submission may be retried in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    CodeInvalid,
    CodeExpired,
}

/// Outcome of submitting a verification code.
#[derive(Debug, PartialEq, Eq)]
pub enum CodeOutcome {
    /// Signed in; session persisted, pending entry removed.
    Success,
    /// The account needs its password; the pending entry stays live.
    TwoFactorRequired,
    /// Bad code; the pending entry stays live for another attempt.
    Retryable(RetryReason),
    /// Unexpected provider failure. Entry kept; the caller decides whether
    /// to abandon. The detail is for logs only.
    Failed(String),
}

/// Outcome of submitting the two-factor password. The pending entry is
/// removed either way; there is no password retry loop.
#[derive(Debug, PartialEq, Eq)]
pub enum TwoFactorOutcome {
    Success,
    Failed(String),
}

struct PendingAuthentication {
    phone_number: String,
    session: Box<dyn AccountSession>,
    code_token: CodeToken,
    session_ref: String,
    expires_at: Instant,
}

/// In-memory registry of in-flight logins, keyed by user id.
#[derive(Clone)]
pub struct PendingAuthRegistry {
    entries: Arc<Mutex<HashMap<i64, PendingAuthentication>>>,
    connector: Arc<dyn AccountConnector>,
    store: AccountStore,
    ttl: Duration,
}

impl PendingAuthRegistry {
    /// Create a new registry and spawn its cleanup task.
    pub fn new(connector: Arc<dyn AccountConnector>, store: AccountStore, ttl: Duration) -> Self {
        let registry = Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            connector,
            store,
            ttl,
        };

        // Spawn cleanup task
        let cleanup_registry = registry.clone();
        tokio::spawn(async move {
            cleanup_registry.cleanup_loop().await;
        });

        info!("Pending-auth registry initialized (ttl={:?})", ttl);

        registry
    }

    async fn cleanup_loop(&self) {
        let cleanup_interval = Duration::from_secs(60);

        loop {
            tokio::time::sleep(cleanup_interval).await;
            let removed = self.sweep().await;
            if removed > 0 {
                debug!("Cleaned up {} expired pending authentications", removed);
            }
        }
    }

    /// Drop expired entries and disconnect their sessions.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<PendingAuthentication> = {
            let mut entries = self.entries.lock().await;
            let ids: Vec<i64> = entries
                .iter()
                .filter(|(_, e)| e.expires_at <= now)
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter().filter_map(|id| entries.remove(&id)).collect()
        };

        let count = expired.len();
        for entry in expired {
            disconnect_quietly(&*entry.session).await;
        }
        count
    }

    /// Whether a user has an in-flight login.
    pub async fn has_pending(&self, user_id: i64) -> bool {
        self.entries.lock().await.contains_key(&user_id)
    }

    /// Number of in-flight logins.
    pub async fn pending_count(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Start a login: connect, short-circuit if already authorized, request
    /// a one-time code and register the pending entry.
    ///
    /// A prior entry for the same user is replaced; its connection is
    /// disconnected first rather than silently dropped.
    pub async fn begin(
        &self,
        user_id: i64,
        phone_number: &str,
    ) -> Result<BeginOutcome, AuthFlowError> {
        let session_ref = session_ref(user_id, phone_number);

        let session = self
            .connector
            .connect(&session_ref)
            .await
            .map_err(|e| AuthFlowError::Provider(e.to_string()))?;

        match session.is_authorized().await {
            Ok(true) => {
                disconnect_quietly(&*session).await;
                info!(user_id, "Session already authorized");
                return Ok(BeginOutcome::AlreadyAuthorized);
            }
            Ok(false) => {}
            Err(e) => {
                disconnect_quietly(&*session).await;
                return Err(AuthFlowError::Provider(e.to_string()));
            }
        }

        let code_token = match session.request_code(phone_number).await {
            Ok(token) => token,
            Err(e) => {
                disconnect_quietly(&*session).await;
                return Err(match e {
                    AccountError::InvalidPhoneNumber => {
                        self.mark_failed(user_id, phone_number).await;
                        AuthFlowError::InvalidPhoneFormat
                    }
                    AccountError::RateLimited { seconds } => {
                        AuthFlowError::RateLimited(Duration::from_secs(seconds))
                    }
                    other => {
                        self.mark_failed(user_id, phone_number).await;
                        AuthFlowError::Provider(other.to_string())
                    }
                });
            }
        };

        let entry = PendingAuthentication {
            phone_number: phone_number.to_string(),
            session,
            code_token,
            session_ref,
            expires_at: Instant::now() + self.ttl,
        };

        let replaced = self.entries.lock().await.insert(user_id, entry);
        if let Some(old) = replaced {
            warn!(user_id, "Replacing pending authentication");
            disconnect_quietly(&*old.session).await;
        }

        info!(user_id, "Code sent");
        Ok(BeginOutcome::CodeSent)
    }

    /// Submit the verification code for a user's in-flight login.
    pub async fn submit_code(
        &self,
        user_id: i64,
        code: &str,
    ) -> Result<CodeOutcome, AuthFlowError> {
        let entry = self
            .entries
            .lock()
            .await
            .remove(&user_id)
            .ok_or(AuthFlowError::NoPendingAuthentication)?;

        let result = entry
            .session
            .sign_in_with_code(&entry.phone_number, code, &entry.code_token)
            .await;

        match result {
            Ok(_identity) => {
                self.persist_success(user_id, &entry).await?;
                disconnect_quietly(&*entry.session).await;
                info!(user_id, "Authentication successful");
                Ok(CodeOutcome::Success)
            }
            Err(AccountError::TwoFactorRequired) => {
                // Connection stays open, awaiting the password.
                self.keep(user_id, entry).await;
                Ok(CodeOutcome::TwoFactorRequired)
            }
            Err(AccountError::CodeInvalid) => {
                self.keep(user_id, entry).await;
                Ok(CodeOutcome::Retryable(RetryReason::CodeInvalid))
            }
            Err(AccountError::CodeExpired) => {
                self.keep(user_id, entry).await;
                Ok(CodeOutcome::Retryable(RetryReason::CodeExpired))
            }
            Err(other) => {
                let detail = other.to_string();
                self.keep(user_id, entry).await;
                Ok(CodeOutcome::Failed(detail))
            }
        }
    }

    /// Submit the two-factor password. The entry is removed whatever the
    /// outcome.
    pub async fn submit_two_factor(
        &self,
        user_id: i64,
        password: &str,
    ) -> Result<TwoFactorOutcome, AuthFlowError> {
        let entry = self
            .entries
            .lock()
            .await
            .remove(&user_id)
            .ok_or(AuthFlowError::NoPendingAuthentication)?;

        let result = entry.session.sign_in_with_password(password).await;

        match result {
            Ok(_identity) => {
                self.persist_success(user_id, &entry).await?;
                disconnect_quietly(&*entry.session).await;
                info!(user_id, "Two-factor authentication successful");
                Ok(TwoFactorOutcome::Success)
            }
            Err(e) => {
                disconnect_quietly(&*entry.session).await;
                self.mark_failed(user_id, &entry.phone_number).await;
                Ok(TwoFactorOutcome::Failed(e.to_string()))
            }
        }
    }

    /// Drop a user's in-flight login and close its connection.
    pub async fn abandon(&self, user_id: i64) -> bool {
        let entry = self.entries.lock().await.remove(&user_id);
        match entry {
            Some(entry) => {
                disconnect_quietly(&*entry.session).await;
                true
            }
            None => false,
        }
    }

    /// Re-insert a kept entry with a refreshed TTL.
    async fn keep(&self, user_id: i64, mut entry: PendingAuthentication) {
        entry.expires_at = Instant::now() + self.ttl;
        self.entries.lock().await.insert(user_id, entry);
    }

    async fn persist_success(
        &self,
        user_id: i64,
        entry: &PendingAuthentication,
    ) -> Result<(), AuthFlowError> {
        self.store
            .upsert_session(user_id, &entry.phone_number, &entry.session_ref)
            .await?;

        if let Some(record_id) = self
            .store
            .latest_phone_record_id(user_id, &entry.phone_number)
            .await?
        {
            self.store
                .update_phone_status(record_id, PhoneStatus::Authenticated, true)
                .await?;
        }

        Ok(())
    }

    /// Best-effort terminal-failure mark on the newest matching record.
    async fn mark_failed(&self, user_id: i64, phone_number: &str) {
        let record_id = match self.store.latest_phone_record_id(user_id, phone_number).await {
            Ok(Some(id)) => id,
            Ok(None) => return,
            Err(e) => {
                warn!(user_id, "Failed to look up phone record: {}", e);
                return;
            }
        };

        if let Err(e) = self
            .store
            .update_phone_status(record_id, PhoneStatus::Failed, false)
            .await
        {
            warn!(user_id, "Failed to mark phone record failed: {}", e);
        }
    }
}

async fn disconnect_quietly(session: &dyn AccountSession) {
    if let Err(e) = session.disconnect().await {
        warn!("Disconnect failed: {}", e);
    }
}
