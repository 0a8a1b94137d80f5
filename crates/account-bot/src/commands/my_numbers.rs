//! My Numbers command - lists the user's registered numbers.

use crate::commands::{CommandHandler, Reply};
use crate::error::AppResult;
use crate::keyboards::{self, BTN_MY_NUMBERS};
use account_store::AccountStore;
use async_trait::async_trait;
use telegram_client::ChatMessage;

pub struct MyNumbersHandler {
    store: AccountStore,
}

impl MyNumbersHandler {
    pub fn new(store: AccountStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CommandHandler for MyNumbersHandler {
    fn name(&self) -> &str {
        "my-numbers"
    }

    fn trigger(&self) -> Option<&str> {
        Some(BTN_MY_NUMBERS)
    }

    async fn execute(&self, message: &ChatMessage) -> AppResult<Option<Reply>> {
        let records = self.store.list_phone_numbers(message.user.id).await?;

        Ok(Some(Reply::with_keyboard(
            "📱 Your registered numbers:",
            keyboards::numbers_keyboard(&records),
        )))
    }
}
