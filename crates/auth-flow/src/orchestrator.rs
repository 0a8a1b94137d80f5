//! Authentication orchestrator.
//!
//! Binds the conversation state machine to the pending-auth registry: each
//! text input is interpreted per the user's current state, dispatched to the
//! matching registry operation, and the outcome mapped onto the next state
//! and a user-facing reply. Replies are coarse and enumerated; provider
//! detail goes to the log, never into chat.

use crate::error::AuthFlowError;
use crate::registry::{BeginOutcome, CodeOutcome, PendingAuthRegistry, RetryReason, TwoFactorOutcome};
use crate::state::{is_plausible_phone_number, ConversationState, ConversationTracker};
use account_store::AccountStore;
use tracing::{error, warn};

const PHONE_PROMPT: &str = "📱 Please send your phone number in international format.\n\
    Example: +15551234567\n\n\
    Make sure to include the country code!";

const INVALID_PHONE_FORMAT: &str = "❌ Invalid phone number format.\n\
    Please use international format: +15551234567";

const CODE_SENT: &str = "📨 Verification code sent.\n\n\
    Please enter the verification code you received:";

const ALREADY_AUTHENTICATED: &str = "✅ This number is already authenticated!";

const PROVIDER_INVALID_PHONE: &str = "❌ Invalid phone number.";

const CODE_INVALID: &str = "❌ Invalid verification code. Please try again:";

const CODE_EXPIRED: &str = "❌ Verification code expired. Please try again:";

const TWO_FACTOR_PROMPT: &str = "🔐 Two-factor authentication is enabled.\n\
    Please enter your 2FA password:";

const AUTH_SUCCESS: &str = "✅ Authentication successful!";

const TWO_FACTOR_SUCCESS: &str = "✅ 2FA authentication successful!";

const TWO_FACTOR_FAILED: &str = "❌ Invalid 2FA password. Authentication cancelled.";

const NO_PENDING: &str = "❌ No login in progress. Please start over from the menu.";

const GENERIC_FAILURE: &str = "❌ Something went wrong. Please try again later.";

/// Reply produced by one orchestration step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowReply {
    pub text: String,
    /// Whether the reply should restore the main menu keyboard.
    pub main_menu: bool,
}

impl FlowReply {
    fn prompt(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            main_menu: false,
        }
    }

    fn menu(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            main_menu: true,
        }
    }
}

/// Sequences phone → code → two-factor for every user.
#[derive(Clone)]
pub struct AuthOrchestrator {
    registry: PendingAuthRegistry,
    states: ConversationTracker,
    store: AccountStore,
}

impl AuthOrchestrator {
    pub fn new(
        registry: PendingAuthRegistry,
        states: ConversationTracker,
        store: AccountStore,
    ) -> Self {
        Self {
            registry,
            states,
            store,
        }
    }

    /// The tracker, for state-sensitive routing by the dispatcher.
    pub fn states(&self) -> &ConversationTracker {
        &self.states
    }

    /// Enter the phone-number flow (menu command from `Idle`).
    pub async fn start_phone_flow(&self, user_id: i64) -> FlowReply {
        self.states
            .set(user_id, ConversationState::AwaitingPhone)
            .await;
        FlowReply::prompt(PHONE_PROMPT)
    }

    /// Abort whatever flow is active and return to `Idle`.
    pub async fn reset(&self, user_id: i64) {
        self.registry.abandon(user_id).await;
        self.states.clear(user_id).await;
    }

    /// Interpret free text per the user's current state.
    ///
    /// `None` means the text asked for nothing: the user is `Idle` and the
    /// input matched no flow.
    pub async fn handle_text(&self, user_id: i64, text: &str) -> Option<FlowReply> {
        match self.states.get(user_id).await {
            ConversationState::Idle => None,
            ConversationState::AwaitingPhone => Some(self.handle_phone(user_id, text).await),
            ConversationState::AwaitingCode => Some(self.handle_code(user_id, text).await),
            ConversationState::AwaitingTwoFactor => {
                Some(self.handle_two_factor(user_id, text).await)
            }
        }
    }

    async fn handle_phone(&self, user_id: i64, phone_number: &str) -> FlowReply {
        if !is_plausible_phone_number(phone_number) {
            // Re-prompt; the user stays in AwaitingPhone.
            return FlowReply::prompt(INVALID_PHONE_FORMAT);
        }

        if let Err(e) = self.store.insert_phone_number(user_id, phone_number).await {
            error!(user_id, "Failed to record phone number: {}", e);
            return self.abort(user_id).await;
        }

        match self.registry.begin(user_id, phone_number).await {
            Ok(BeginOutcome::CodeSent) => {
                self.states
                    .set(user_id, ConversationState::AwaitingCode)
                    .await;
                FlowReply::prompt(CODE_SENT)
            }
            Ok(BeginOutcome::AlreadyAuthorized) => {
                self.states.clear(user_id).await;
                FlowReply::menu(ALREADY_AUTHENTICATED)
            }
            Err(AuthFlowError::InvalidPhoneFormat) => {
                self.states.clear(user_id).await;
                FlowReply::menu(PROVIDER_INVALID_PHONE)
            }
            Err(AuthFlowError::RateLimited(wait)) => {
                self.states.clear(user_id).await;
                FlowReply::menu(format!(
                    "❌ Too many attempts. Wait {} seconds before retrying.",
                    wait.as_secs()
                ))
            }
            Err(e) => {
                error!(user_id, "Code request failed: {}", e);
                self.abort(user_id).await
            }
        }
    }

    async fn handle_code(&self, user_id: i64, code: &str) -> FlowReply {
        match self.registry.submit_code(user_id, code).await {
            Ok(CodeOutcome::Success) => {
                self.states.clear(user_id).await;
                FlowReply::menu(AUTH_SUCCESS)
            }
            Ok(CodeOutcome::TwoFactorRequired) => {
                self.states
                    .set(user_id, ConversationState::AwaitingTwoFactor)
                    .await;
                FlowReply::prompt(TWO_FACTOR_PROMPT)
            }
            Ok(CodeOutcome::Retryable(RetryReason::CodeInvalid)) => {
                // Stay in AwaitingCode for another attempt.
                FlowReply::prompt(CODE_INVALID)
            }
            Ok(CodeOutcome::Retryable(RetryReason::CodeExpired)) => {
                FlowReply::prompt(CODE_EXPIRED)
            }
            Ok(CodeOutcome::Failed(detail)) => {
                error!(user_id, "Sign-in failed: {}", detail);
                self.abort(user_id).await
            }
            Err(AuthFlowError::NoPendingAuthentication) => {
                self.states.clear(user_id).await;
                FlowReply::menu(NO_PENDING)
            }
            Err(e) => {
                error!(user_id, "Sign-in failed: {}", e);
                self.abort(user_id).await
            }
        }
    }

    async fn handle_two_factor(&self, user_id: i64, password: &str) -> FlowReply {
        let result = self.registry.submit_two_factor(user_id, password).await;

        // Success or failure, the flow is over.
        self.states.clear(user_id).await;

        match result {
            Ok(TwoFactorOutcome::Success) => FlowReply::menu(TWO_FACTOR_SUCCESS),
            Ok(TwoFactorOutcome::Failed(detail)) => {
                warn!(user_id, "Two-factor sign-in failed: {}", detail);
                FlowReply::menu(TWO_FACTOR_FAILED)
            }
            Err(AuthFlowError::NoPendingAuthentication) => FlowReply::menu(NO_PENDING),
            Err(e) => {
                error!(user_id, "Two-factor sign-in failed: {}", e);
                FlowReply::menu(GENERIC_FAILURE)
            }
        }
    }

    /// Abandon the flow and fall back to the generic failure reply.
    async fn abort(&self, user_id: i64) -> FlowReply {
        self.registry.abandon(user_id).await;
        self.states.clear(user_id).await;
        FlowReply::menu(GENERIC_FAILURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use account_client::{AccountError, AccountIdentity, MockConnector};
    use account_store::PhoneStatus;
    use std::sync::Arc;
    use std::time::Duration;

    const PHONE: &str = "+15551234567";

    async fn test_orchestrator(connector: &MockConnector) -> (AuthOrchestrator, AccountStore) {
        let store = AccountStore::open_in_memory().await.unwrap();
        // Seed the owning user so phone_numbers FK references resolve, mirroring
        // the dispatcher's per-message upsert in the real flow.
        store
            .upsert_user(&account_store::NewUser {
                id: 1,
                username: Some("alice".into()),
                first_name: Some("Alice".into()),
                last_name: None,
            })
            .await
            .unwrap();
        let registry = PendingAuthRegistry::new(
            Arc::new(connector.clone()),
            store.clone(),
            Duration::from_secs(3600),
        );
        let states = ConversationTracker::new(Duration::from_secs(3600));
        (
            AuthOrchestrator::new(registry, states, store.clone()),
            store,
        )
    }

    fn identity() -> AccountIdentity {
        AccountIdentity {
            account_id: 77,
            username: None,
            first_name: None,
        }
    }

    #[tokio::test]
    async fn test_idle_free_text_is_ignored() {
        let connector = MockConnector::new();
        let (orchestrator, _store) = test_orchestrator(&connector).await;

        assert!(orchestrator.handle_text(1, "hello there").await.is_none());
    }

    #[tokio::test]
    async fn test_invalid_phone_stays_in_awaiting_phone() {
        let connector = MockConnector::new();
        let (orchestrator, _store) = test_orchestrator(&connector).await;

        orchestrator.start_phone_flow(1).await;

        for bad in ["15551234567", "+1555", "not a number"] {
            let reply = orchestrator.handle_text(1, bad).await.unwrap();
            assert!(reply.text.contains("Invalid phone number format"));
            assert_eq!(
                orchestrator.states().get(1).await,
                ConversationState::AwaitingPhone
            );
        }
    }

    // Scenario A: valid phone in AwaitingPhone issues a code.
    #[tokio::test]
    async fn test_scenario_a_phone_to_code() {
        let connector = MockConnector::new();
        let (orchestrator, store) = test_orchestrator(&connector).await;

        orchestrator.start_phone_flow(1).await;
        let reply = orchestrator.handle_text(1, PHONE).await.unwrap();

        assert!(reply.text.to_lowercase().contains("verification code"));
        assert_eq!(
            orchestrator.states().get(1).await,
            ConversationState::AwaitingCode
        );
        // The submission was recorded
        assert_eq!(store.list_phone_numbers(1).await.unwrap().len(), 1);
    }

    // Scenario B: correct code completes the flow.
    #[tokio::test]
    async fn test_scenario_b_code_success() {
        let connector = MockConnector::new();
        connector.push_sign_in_result(Ok(identity()));
        let (orchestrator, store) = test_orchestrator(&connector).await;

        orchestrator.start_phone_flow(1).await;
        orchestrator.handle_text(1, PHONE).await.unwrap();
        let reply = orchestrator.handle_text(1, "12345").await.unwrap();

        assert!(reply.text.contains("successful"));
        assert!(reply.main_menu);
        assert_eq!(orchestrator.states().get(1).await, ConversationState::Idle);

        let record = &store.list_phone_numbers(1).await.unwrap()[0];
        assert!(record.is_authenticated);
        assert_eq!(record.status, PhoneStatus::Authenticated);
    }

    // Scenario C: second factor required keeps the pending entry.
    #[tokio::test]
    async fn test_scenario_c_two_factor_transition() {
        let connector = MockConnector::new();
        connector.push_sign_in_result(Err(AccountError::TwoFactorRequired));
        let (orchestrator, _store) = test_orchestrator(&connector).await;

        orchestrator.start_phone_flow(1).await;
        orchestrator.handle_text(1, PHONE).await.unwrap();
        let reply = orchestrator.handle_text(1, "12345").await.unwrap();

        assert!(reply.text.contains("2FA password"));
        assert_eq!(
            orchestrator.states().get(1).await,
            ConversationState::AwaitingTwoFactor
        );
        // The open connection stayed for the password step
        assert_eq!(connector.disconnect_count(), 0);
    }

    // Scenario D: wrong password ends the flow.
    #[tokio::test]
    async fn test_scenario_d_two_factor_failure() {
        let connector = MockConnector::new();
        connector.push_sign_in_result(Err(AccountError::TwoFactorRequired));
        connector.push_password_result(Err(AccountError::PasswordInvalid));
        let (orchestrator, store) = test_orchestrator(&connector).await;

        orchestrator.start_phone_flow(1).await;
        orchestrator.handle_text(1, PHONE).await.unwrap();
        orchestrator.handle_text(1, "12345").await.unwrap();
        let reply = orchestrator.handle_text(1, "wrong-password").await.unwrap();

        assert!(reply.text.contains("Invalid 2FA password"));
        assert!(reply.main_menu);
        assert_eq!(orchestrator.states().get(1).await, ConversationState::Idle);

        let record = &store.list_phone_numbers(1).await.unwrap()[0];
        assert!(!record.is_authenticated);
    }

    #[tokio::test]
    async fn test_invalid_code_reprompts_in_place() {
        let connector = MockConnector::new();
        connector.push_sign_in_result(Err(AccountError::CodeInvalid));
        let (orchestrator, _store) = test_orchestrator(&connector).await;

        orchestrator.start_phone_flow(1).await;
        orchestrator.handle_text(1, PHONE).await.unwrap();
        let reply = orchestrator.handle_text(1, "00000").await.unwrap();

        assert!(reply.text.contains("Invalid verification code"));
        assert_eq!(
            orchestrator.states().get(1).await,
            ConversationState::AwaitingCode
        );
    }

    #[tokio::test]
    async fn test_rate_limit_surfaces_wait_and_aborts() {
        let connector = MockConnector::new();
        connector.push_code_result(Err(AccountError::RateLimited { seconds: 90 }));
        let (orchestrator, _store) = test_orchestrator(&connector).await;

        orchestrator.start_phone_flow(1).await;
        let reply = orchestrator.handle_text(1, PHONE).await.unwrap();

        assert!(reply.text.contains("90 seconds"));
        assert!(reply.main_menu);
        assert_eq!(orchestrator.states().get(1).await, ConversationState::Idle);
    }

    #[tokio::test]
    async fn test_already_authenticated_short_circuits() {
        let connector = MockConnector::new();
        connector.set_authorized(true);
        let (orchestrator, _store) = test_orchestrator(&connector).await;

        orchestrator.start_phone_flow(1).await;
        let reply = orchestrator.handle_text(1, PHONE).await.unwrap();

        assert!(reply.text.contains("already authenticated"));
        assert_eq!(orchestrator.states().get(1).await, ConversationState::Idle);
    }

    #[tokio::test]
    async fn test_provider_failure_never_leaks_detail() {
        let connector = MockConnector::new();
        connector.push_sign_in_result(Err(AccountError::Api(
            "PHONE_CODE_HASH a1b2c3 mismatch at dc4".into(),
        )));
        let (orchestrator, _store) = test_orchestrator(&connector).await;

        orchestrator.start_phone_flow(1).await;
        orchestrator.handle_text(1, PHONE).await.unwrap();
        let reply = orchestrator.handle_text(1, "12345").await.unwrap();

        assert!(!reply.text.contains("PHONE_CODE_HASH"));
        assert!(!reply.text.contains("dc4"));
        assert_eq!(orchestrator.states().get(1).await, ConversationState::Idle);
    }

    #[tokio::test]
    async fn test_restart_mid_flow_replaces_pending() {
        let connector = MockConnector::new();
        let (orchestrator, _store) = test_orchestrator(&connector).await;

        orchestrator.start_phone_flow(1).await;
        orchestrator.handle_text(1, PHONE).await.unwrap();

        // User re-enters the menu and submits a different number
        orchestrator.start_phone_flow(1).await;
        orchestrator.handle_text(1, "+15557654321").await.unwrap();

        // Old connection closed, exactly one pending login left
        assert_eq!(connector.disconnect_count(), 1);
        assert_eq!(
            orchestrator.states().get(1).await,
            ConversationState::AwaitingCode
        );
    }
}
