//! Shared test harness: a dispatcher wired to a mock Telegram server and a
//! scripted account connector.

use account_bot::commands::*;
use account_bot::dispatcher::Dispatcher;
use account_client::MockConnector;
use account_store::{AccountStore, NewUser};
use auth_flow::{AuthOrchestrator, ConversationTracker, PendingAuthRegistry};
use std::sync::Arc;
use std::time::Duration;
use telegram_client::{TelegramClient, Update};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "test-token";

pub struct TestBot {
    pub server: MockServer,
    pub dispatcher: Dispatcher,
    pub connector: MockConnector,
    pub store: AccountStore,
}

/// Mount accepting mocks for every outbound Bot API method.
async fn mount_telegram_api(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "result": {
                "message_id": 1,
                "chat": {"id": 0, "type": "private"}
            }
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/editMessageText")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "result": true
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/answerCallbackQuery")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "result": true
        })))
        .mount(server)
        .await;
}

pub async fn test_bot() -> TestBot {
    let server = MockServer::start().await;
    mount_telegram_api(&server).await;

    let telegram = TelegramClient::new(server.uri(), TOKEN).unwrap();
    let store = AccountStore::open_in_memory().await.unwrap();
    let connector = MockConnector::new();

    let registry = PendingAuthRegistry::new(
        Arc::new(connector.clone()),
        store.clone(),
        Duration::from_secs(3600),
    );
    let states = ConversationTracker::new(Duration::from_secs(3600));
    let orchestrator = AuthOrchestrator::new(registry, states, store.clone());

    let handlers: Vec<Box<dyn CommandHandler>> = vec![
        Box::new(StartHandler::new(orchestrator.clone())),
        Box::new(HelpHandler::new()),
        Box::new(AddNumberHandler::new(orchestrator.clone())),
        Box::new(MyNumbersHandler::new(store.clone())),
        Box::new(AuthFlowHandler::new(orchestrator.clone(), telegram.clone())),
    ];

    let dispatcher = Dispatcher::new(telegram, store.clone(), handlers);

    TestBot {
        server,
        dispatcher,
        connector,
        store,
    }
}

/// Seed a user record so store writes that reference it satisfy the FK.
/// Mirrors the `upsert_user` the dispatcher performs for every inbound message.
pub async fn seed_user(bot: &TestBot, user_id: i64) {
    bot.store
        .upsert_user(&NewUser {
            id: user_id,
            username: Some("alice".into()),
            first_name: Some("Alice".into()),
            last_name: None,
        })
        .await
        .unwrap();
}

/// A private-chat text update from `user_id`.
pub fn text_update(update_id: i64, user_id: i64, text: &str) -> Update {
    serde_json::from_value(serde_json::json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id,
            "from": {"id": user_id, "first_name": "Alice", "username": "alice"},
            "chat": {"id": user_id, "type": "private"},
            "text": text
        }
    }))
    .unwrap()
}

/// The same text update, but from a group chat.
pub fn group_text_update(update_id: i64, user_id: i64, text: &str) -> Update {
    serde_json::from_value(serde_json::json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id,
            "from": {"id": user_id, "first_name": "Alice"},
            "chat": {"id": -100, "type": "group"},
            "text": text
        }
    }))
    .unwrap()
}

/// An inline keyboard press from `user_id`.
pub fn callback_update(update_id: i64, user_id: i64, data: &str) -> Update {
    serde_json::from_value(serde_json::json!({
        "update_id": update_id,
        "callback_query": {
            "id": format!("cb-{update_id}"),
            "from": {"id": user_id, "first_name": "Alice"},
            "message": {
                "message_id": 99,
                "chat": {"id": user_id, "type": "private"}
            },
            "data": data
        }
    }))
    .unwrap()
}

/// Texts of every sendMessage call made so far, in order.
pub async fn sent_texts(server: &MockServer) -> Vec<String> {
    requests_to(server, "sendMessage")
        .await
        .into_iter()
        .map(|body| body["text"].as_str().unwrap_or_default().to_string())
        .collect()
}

/// Bodies of every call to the given Bot API method, in order.
pub async fn requests_to(server: &MockServer, api_method: &str) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|req| req.url.path().ends_with(api_method))
        .map(|req| serde_json::from_slice(&req.body).unwrap())
        .collect()
}
