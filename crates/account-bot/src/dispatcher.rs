//! Update dispatcher.
//!
//! Routes each polled update to the matching command handler or callback
//! action. Only private chats are processed; everything else is silently
//! dropped. Handler failures are logged and answered with a generic
//! message so one bad update never stops the loop.

use crate::commands::CommandHandler;
use crate::error::AppResult;
use crate::keyboards::{self, CB_BACK_MAIN, CB_BACK_NUMBERS, CB_NUMBER_PREFIX};
use account_store::{AccountStore, NewUser};
use telegram_client::{CallbackQuery, ChatMessage, Message, TelegramClient, Update};
use tracing::{debug, error};

pub struct Dispatcher {
    telegram: TelegramClient,
    store: AccountStore,
    handlers: Vec<Box<dyn CommandHandler>>,
}

impl Dispatcher {
    pub fn new(
        telegram: TelegramClient,
        store: AccountStore,
        handlers: Vec<Box<dyn CommandHandler>>,
    ) -> Self {
        Self {
            telegram,
            store,
            handlers,
        }
    }

    /// Process one update.
    pub async fn handle_update(&self, update: &Update) -> AppResult<()> {
        if let Some(message) = &update.message {
            self.handle_message(message).await?;
        } else if let Some(query) = &update.callback_query {
            self.handle_callback(query).await?;
        }
        Ok(())
    }

    async fn handle_message(&self, message: &Message) -> AppResult<()> {
        // Non-private chats and non-text messages are dropped here.
        let Some(msg) = ChatMessage::from_message(message) else {
            return Ok(());
        };

        self.store
            .upsert_user(&NewUser {
                id: msg.user.id,
                username: msg.user.username.clone(),
                first_name: msg.user.first_name.clone(),
                last_name: msg.user.last_name.clone(),
            })
            .await?;

        let Some(handler) = self.handlers.iter().find(|h| h.matches(&msg)) else {
            return Ok(());
        };

        debug!(user_id = msg.user.id, handler = handler.name(), "Dispatching");

        match handler.execute(&msg).await {
            Ok(Some(reply)) => {
                self.telegram
                    .send_message(msg.chat_id, &reply.text, reply.keyboard)
                    .await?;
            }
            Ok(None) => {}
            Err(e) => {
                error!("Handler {} error: {}", handler.name(), e);
                let _ = self
                    .telegram
                    .send_message(msg.chat_id, "Sorry, something went wrong.", None)
                    .await;
            }
        }

        Ok(())
    }

    async fn handle_callback(&self, query: &CallbackQuery) -> AppResult<()> {
        self.telegram.answer_callback(&query.id, "").await?;

        let Some(message) = &query.message else {
            return Ok(());
        };
        if !message.chat.is_private() {
            return Ok(());
        }
        let Some(data) = query.data.as_deref() else {
            return Ok(());
        };

        let chat_id = message.chat.id;
        let message_id = message.message_id;

        match data {
            CB_BACK_MAIN => {
                self.telegram
                    .edit_message(chat_id, message_id, "🔐 Main Menu", None)
                    .await?;
            }
            CB_BACK_NUMBERS => {
                let records = self.store.list_phone_numbers(query.from.id).await?;
                self.telegram
                    .edit_message(
                        chat_id,
                        message_id,
                        "📱 Your registered numbers:",
                        Some(keyboards::numbers_keyboard(&records)),
                    )
                    .await?;
            }
            _ => {
                if let Some(id) = data.strip_prefix(CB_NUMBER_PREFIX) {
                    self.show_number_details(query.from.id, chat_id, message_id, id)
                        .await?;
                }
            }
        }

        Ok(())
    }

    async fn show_number_details(
        &self,
        user_id: i64,
        chat_id: i64,
        message_id: i64,
        id: &str,
    ) -> AppResult<()> {
        let Ok(record_id) = id.parse::<i64>() else {
            return Ok(());
        };

        let record = self.store.get_phone_number(record_id).await?;
        // Only the record's owner gets to see it.
        let Some(record) = record.filter(|r| r.user_id == user_id) else {
            return Ok(());
        };

        let last_login = record
            .last_login
            .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "never".into());

        let text = format!(
            "📱 <b>{}</b>\n\n\
            Status: {} {}\n\
            Added: {}\n\
            Last login: {}",
            record.phone_number,
            record.status_emoji(),
            record.status.as_str(),
            record.added_at.format("%Y-%m-%d %H:%M UTC"),
            last_login,
        );

        self.telegram
            .edit_message(
                chat_id,
                message_id,
                &text,
                Some(telegram_client::ReplyMarkup::inline(vec![vec![(
                    "🔙 Back".into(),
                    CB_BACK_NUMBERS.into(),
                )]])),
            )
            .await?;

        Ok(())
    }
}
