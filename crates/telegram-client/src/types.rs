//! Bot API types.

use serde::{Deserialize, Serialize};

/// A single update from `getUpdates`.
///
/// Exactly one of the optional payloads is set per update.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

/// An incoming chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<TgUser>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    /// "private", "group", "supergroup" or "channel".
    #[serde(rename = "type")]
    pub kind: String,
}

impl Chat {
    pub fn is_private(&self) -> bool {
        self.kind == "private"
    }
}

/// The Telegram account that sent a message or pressed a button.
#[derive(Debug, Clone, Deserialize)]
pub struct TgUser {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// An inline keyboard button press.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: TgUser,
    /// The message the pressed keyboard was attached to.
    pub message: Option<Message>,
    /// Opaque payload set when the keyboard was built.
    pub data: Option<String>,
}

/// Parsed text message from a private chat, ready for bot processing.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub user: TgUser,
    pub chat_id: i64,
    pub text: String,
}

impl ChatMessage {
    /// Extract a bot-processable message from an incoming one.
    ///
    /// Returns `None` for non-private chats, non-text messages, and
    /// messages without a sender.
    pub fn from_message(msg: &Message) -> Option<Self> {
        if !msg.chat.is_private() {
            return None;
        }
        let user = msg.from.clone()?;
        let text = msg.text.clone()?;

        Some(Self {
            user,
            chat_id: msg.chat.id,
            text,
        })
    }
}

/// Keyboard attached to an outgoing message.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    Keyboard(ReplyKeyboardMarkup),
    Inline(InlineKeyboardMarkup),
}

impl ReplyMarkup {
    /// Reply keyboard from rows of plain button labels.
    pub fn keyboard(rows: Vec<Vec<&str>>) -> Self {
        Self::Keyboard(ReplyKeyboardMarkup {
            keyboard: rows
                .into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|text| KeyboardButton { text: text.into() })
                        .collect()
                })
                .collect(),
            resize_keyboard: true,
        })
    }

    /// Inline keyboard from rows of (label, callback payload) pairs.
    pub fn inline(rows: Vec<Vec<(String, String)>>) -> Self {
        Self::Inline(InlineKeyboardMarkup {
            inline_keyboard: rows
                .into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|(text, callback_data)| InlineKeyboardButton {
                            text,
                            callback_data,
                        })
                        .collect()
                })
                .collect(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplyKeyboardMarkup {
    pub keyboard: Vec<Vec<KeyboardButton>>,
    pub resize_keyboard: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyboardButton {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

/// `sendMessage` request body.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest {
    pub chat_id: i64,
    pub text: String,
    pub parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

/// `editMessageText` request body.
#[derive(Debug, Clone, Serialize)]
pub struct EditMessageRequest {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: String,
    pub parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

/// `answerCallbackQuery` request body.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerCallbackRequest {
    pub callback_query_id: String,
    pub text: String,
}

/// `getUpdates` request body.
#[derive(Debug, Clone, Serialize)]
pub struct GetUpdatesRequest {
    pub offset: i64,
    /// Long-poll wait in whole seconds.
    pub timeout: u64,
    pub allowed_updates: Vec<&'static str>,
}

/// Envelope every Bot API call responds with.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}
