//! Start command - greets the user and shows the main menu.

use crate::commands::{CommandHandler, Reply};
use crate::error::AppResult;
use crate::keyboards;
use async_trait::async_trait;
use auth_flow::AuthOrchestrator;
use telegram_client::ChatMessage;

pub struct StartHandler {
    orchestrator: AuthOrchestrator,
}

impl StartHandler {
    pub fn new(orchestrator: AuthOrchestrator) -> Self {
        Self { orchestrator }
    }
}

#[async_trait]
impl CommandHandler for StartHandler {
    fn name(&self) -> &str {
        "start"
    }

    fn trigger(&self) -> Option<&str> {
        Some("/start")
    }

    async fn execute(&self, message: &ChatMessage) -> AppResult<Option<Reply>> {
        // /start aborts whatever flow was in progress.
        self.orchestrator.reset(message.user.id).await;

        let name = message.user.first_name.as_deref().unwrap_or("User");
        let welcome = format!(
            "🔐 Welcome to Account Manager, {name}!\n\n\
            This bot helps you manage multiple messaging accounts safely.\n\n\
            Available commands:\n\
            • Add Number - Add new phone number\n\
            • My Numbers - View your numbers\n\
            • Help - Get assistance\n\n\
            Choose an option from the menu below:"
        );

        Ok(Some(Reply::with_keyboard(welcome, keyboards::main_menu())))
    }
}
