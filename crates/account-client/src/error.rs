//! Account client errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Invalid phone number")]
    InvalidPhoneNumber,

    #[error("Rate limited, retry in {seconds}s")]
    RateLimited { seconds: u64 },

    #[error("Invalid verification code")]
    CodeInvalid,

    #[error("Verification code expired")]
    CodeExpired,

    #[error("Two-factor password required")]
    TwoFactorRequired,

    #[error("Invalid two-factor password")]
    PasswordInvalid,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gateway error: {0}")]
    Api(String),
}
