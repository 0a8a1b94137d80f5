//! Help command - displays usage instructions.

use crate::commands::{CommandHandler, Reply};
use crate::error::AppResult;
use crate::keyboards::BTN_HELP;
use async_trait::async_trait;
use telegram_client::ChatMessage;

pub struct HelpHandler;

impl HelpHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HelpHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandHandler for HelpHandler {
    fn name(&self) -> &str {
        "help"
    }

    fn matches(&self, message: &ChatMessage) -> bool {
        message.text.starts_with("/help") || message.text == BTN_HELP
    }

    async fn execute(&self, _message: &ChatMessage) -> AppResult<Option<Reply>> {
        Ok(Some(Reply::text(
            "🔐 <b>Account Manager Help</b>\n\n\
            <b>How to use:</b>\n\
            1. Press '➕ Add Number' to add a new phone number\n\
            2. Enter the number in international format (+15551234567)\n\
            3. Wait for the verification code\n\
            4. Enter the received code\n\
            5. If the account has 2FA enabled, enter its password\n\
            6. The session is saved for reuse\n\n\
            <b>Features:</b>\n\
            • Multiple phone numbers per user\n\
            • Saved sessions, no repeated logins\n\
            • 2FA support\n\n\
            <b>Security notes:</b>\n\
            • Never share your verification codes\n\
            • Use strong 2FA passwords",
        )))
    }
}
