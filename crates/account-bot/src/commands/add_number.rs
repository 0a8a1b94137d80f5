//! Add Number command - enters the phone registration flow.

use crate::commands::{CommandHandler, Reply};
use crate::error::AppResult;
use crate::keyboards::BTN_ADD_NUMBER;
use async_trait::async_trait;
use auth_flow::AuthOrchestrator;
use telegram_client::ChatMessage;

pub struct AddNumberHandler {
    orchestrator: AuthOrchestrator,
}

impl AddNumberHandler {
    pub fn new(orchestrator: AuthOrchestrator) -> Self {
        Self { orchestrator }
    }
}

#[async_trait]
impl CommandHandler for AddNumberHandler {
    fn name(&self) -> &str {
        "add-number"
    }

    fn trigger(&self) -> Option<&str> {
        Some(BTN_ADD_NUMBER)
    }

    async fn execute(&self, message: &ChatMessage) -> AppResult<Option<Reply>> {
        let reply = self.orchestrator.start_phone_flow(message.user.id).await;
        Ok(Some(Reply::text(reply.text)))
    }
}
