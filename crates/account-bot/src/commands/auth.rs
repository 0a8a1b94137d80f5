//! Default handler - routes free text into the authentication flow.

use crate::commands::{CommandHandler, Reply};
use crate::error::AppResult;
use crate::keyboards;
use async_trait::async_trait;
use auth_flow::{is_plausible_phone_number, AuthOrchestrator, ConversationState};
use telegram_client::{ChatMessage, TelegramClient};

const SENDING_CODE: &str = "⏳ Sending verification code...";

pub struct AuthFlowHandler {
    orchestrator: AuthOrchestrator,
    telegram: TelegramClient,
}

impl AuthFlowHandler {
    pub fn new(orchestrator: AuthOrchestrator, telegram: TelegramClient) -> Self {
        Self {
            orchestrator,
            telegram,
        }
    }
}

#[async_trait]
impl CommandHandler for AuthFlowHandler {
    fn name(&self) -> &str {
        "auth-flow"
    }

    fn is_default(&self) -> bool {
        true
    }

    async fn execute(&self, message: &ChatMessage) -> AppResult<Option<Reply>> {
        let user_id = message.user.id;

        // A phone submission triggers a slow network call; let the user know
        // before starting it.
        if self.orchestrator.states().get(user_id).await == ConversationState::AwaitingPhone
            && is_plausible_phone_number(&message.text)
        {
            self.telegram
                .send_message(message.chat_id, SENDING_CODE, None)
                .await?;
        }

        let Some(reply) = self.orchestrator.handle_text(user_id, &message.text).await else {
            return Ok(None);
        };

        Ok(Some(if reply.main_menu {
            Reply::with_keyboard(reply.text, keyboards::main_menu())
        } else {
            Reply::text(reply.text)
        }))
    }
}
