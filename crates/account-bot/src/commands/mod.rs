//! Bot command handlers.

mod add_number;
mod auth;
mod help;
mod my_numbers;
mod start;

pub use add_number::AddNumberHandler;
pub use auth::AuthFlowHandler;
pub use help::HelpHandler;
pub use my_numbers::MyNumbersHandler;
pub use start::StartHandler;

use crate::error::AppResult;
use async_trait::async_trait;
use telegram_client::{ChatMessage, ReplyMarkup};

/// A reply to send back to the chat.
#[derive(Debug)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<ReplyMarkup>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(text: impl Into<String>, keyboard: ReplyMarkup) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}

/// Command handler trait.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Command name (e.g., "start", "help").
    fn name(&self) -> &str;

    /// Command trigger (e.g., "/start" or a menu button label).
    fn trigger(&self) -> Option<&str> {
        None
    }

    /// Whether this is the default handler for non-command messages.
    fn is_default(&self) -> bool {
        false
    }

    /// Check if this handler matches the message.
    fn matches(&self, message: &ChatMessage) -> bool {
        if let Some(trigger) = self.trigger() {
            message.text.starts_with(trigger)
        } else {
            self.is_default() && !message.text.starts_with('/')
        }
    }

    /// Execute the command. `None` means nothing should be sent.
    async fn execute(&self, message: &ChatMessage) -> AppResult<Option<Reply>>;
}
