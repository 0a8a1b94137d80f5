//! Telegram Bot API transport.
//!
//! Thin client over the HTTP Bot API: long polling via `getUpdates`,
//! outbound `sendMessage` / `editMessageText` / `answerCallbackQuery`,
//! and reply/inline keyboard markup.

mod client;
mod error;
mod receiver;
mod types;

pub use client::TelegramClient;
pub use error::TelegramError;
pub use receiver::UpdateReceiver;
pub use types::*;
