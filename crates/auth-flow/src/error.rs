//! Authentication flow errors.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthFlowError {
    /// The provider rejected the phone number outright.
    #[error("Invalid phone number")]
    InvalidPhoneFormat,

    /// Too many attempts; the user must wait before retrying.
    #[error("Rate limited for {0:?}")]
    RateLimited(Duration),

    /// Unexpected provider failure. The detail is for logs, not for chat.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Input arrived with no matching in-flight login.
    #[error("No pending authentication")]
    NoPendingAuthentication,

    #[error("Store error: {0}")]
    Store(#[from] account_store::StoreError),
}
