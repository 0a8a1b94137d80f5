//! Application error types.

use thiserror::Error;

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Telegram error: {0}")]
    Telegram(#[from] telegram_client::TelegramError),

    #[error("Account error: {0}")]
    Account(#[from] account_client::AccountError),

    #[error("Store error: {0}")]
    Store(#[from] account_store::StoreError),

    #[error("Auth flow error: {0}")]
    AuthFlow(#[from] auth_flow::AuthFlowError),
}

/// Result type alias for application errors.
pub type AppResult<T> = Result<T, AppError>;
