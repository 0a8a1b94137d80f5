//! Scripted mock connector for tests.
//!
//! Outcomes are queued per operation; when a queue is empty the happy path
//! is returned. Calls are recorded for verification.

use crate::error::AccountError;
use crate::types::*;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One recorded capability call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Connect(String),
    IsAuthorized,
    RequestCode(String),
    SignInWithCode { phone_number: String, code: String },
    SignInWithPassword,
    Disconnect,
}

#[derive(Default)]
struct Inner {
    authorized: Mutex<bool>,
    connect_errors: Mutex<VecDeque<AccountError>>,
    code_results: Mutex<VecDeque<Result<CodeToken, AccountError>>>,
    sign_in_results: Mutex<VecDeque<Result<AccountIdentity, AccountError>>>,
    password_results: Mutex<VecDeque<Result<AccountIdentity, AccountError>>>,
    calls: Mutex<Vec<MockCall>>,
}

/// Scripted mock implementation of [`AccountConnector`].
///
/// Clones share state, so a test can keep one handle for assertions while
/// the code under test owns another.
#[derive(Clone, Default)]
pub struct MockConnector {
    inner: Arc<Inner>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every connected session report this authorization state.
    pub fn set_authorized(&self, authorized: bool) {
        *self.inner.authorized.lock().unwrap() = authorized;
    }

    /// Queue an error for the next `connect` call.
    pub fn push_connect_error(&self, error: AccountError) {
        self.inner.connect_errors.lock().unwrap().push_back(error);
    }

    /// Queue the next `request_code` outcome.
    pub fn push_code_result(&self, result: Result<CodeToken, AccountError>) {
        self.inner.code_results.lock().unwrap().push_back(result);
    }

    /// Queue the next `sign_in_with_code` outcome.
    pub fn push_sign_in_result(&self, result: Result<AccountIdentity, AccountError>) {
        self.inner.sign_in_results.lock().unwrap().push_back(result);
    }

    /// Queue the next `sign_in_with_password` outcome.
    pub fn push_password_result(&self, result: Result<AccountIdentity, AccountError>) {
        self.inner.password_results.lock().unwrap().push_back(result);
    }

    /// Every capability call made so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.inner.calls.lock().unwrap().clone()
    }

    /// Number of sessions disconnected so far.
    pub fn disconnect_count(&self) -> usize {
        self.inner
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == MockCall::Disconnect)
            .count()
    }

    fn record(&self, call: MockCall) {
        self.inner.calls.lock().unwrap().push(call);
    }
}

fn default_identity() -> AccountIdentity {
    AccountIdentity {
        account_id: 1000,
        username: Some("mock".into()),
        first_name: Some("Mock".into()),
    }
}

#[async_trait]
impl AccountConnector for MockConnector {
    async fn connect(&self, session_ref: &str) -> Result<Box<dyn AccountSession>, AccountError> {
        self.record(MockCall::Connect(session_ref.to_string()));

        if let Some(err) = self.inner.connect_errors.lock().unwrap().pop_front() {
            return Err(err);
        }

        Ok(Box::new(MockSession {
            connector: self.clone(),
        }))
    }
}

struct MockSession {
    connector: MockConnector,
}

#[async_trait]
impl AccountSession for MockSession {
    async fn is_authorized(&self) -> Result<bool, AccountError> {
        self.connector.record(MockCall::IsAuthorized);
        Ok(*self.connector.inner.authorized.lock().unwrap())
    }

    async fn request_code(&self, phone_number: &str) -> Result<CodeToken, AccountError> {
        self.connector
            .record(MockCall::RequestCode(phone_number.to_string()));

        self.connector
            .inner
            .code_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(CodeToken::new("mock-token")))
    }

    async fn sign_in_with_code(
        &self,
        phone_number: &str,
        code: &str,
        _token: &CodeToken,
    ) -> Result<AccountIdentity, AccountError> {
        self.connector.record(MockCall::SignInWithCode {
            phone_number: phone_number.to_string(),
            code: code.to_string(),
        });

        self.connector
            .inner
            .sign_in_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(default_identity()))
    }

    async fn sign_in_with_password(
        &self,
        _password: &str,
    ) -> Result<AccountIdentity, AccountError> {
        self.connector.record(MockCall::SignInWithPassword);

        self.connector
            .inner
            .password_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(default_identity()))
    }

    async fn disconnect(&self) -> Result<(), AccountError> {
        self.connector.record(MockCall::Disconnect);
        Ok(())
    }
}
