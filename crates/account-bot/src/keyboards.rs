//! Keyboard layouts.

use account_store::PhoneNumberRecord;
use telegram_client::ReplyMarkup;

pub const BTN_ADD_NUMBER: &str = "➕ Add Number";
pub const BTN_MY_NUMBERS: &str = "📱 My Numbers";
pub const BTN_HELP: &str = "ℹ️ Help";

pub const CB_BACK_MAIN: &str = "back_main";
pub const CB_BACK_NUMBERS: &str = "back_numbers";
pub const CB_NUMBER_PREFIX: &str = "number_";

/// Main menu reply keyboard.
pub fn main_menu() -> ReplyMarkup {
    ReplyMarkup::keyboard(vec![
        vec![BTN_ADD_NUMBER],
        vec![BTN_MY_NUMBERS],
        vec![BTN_HELP],
    ])
}

/// Inline keyboard listing a user's phone records, newest first.
pub fn numbers_keyboard(records: &[PhoneNumberRecord]) -> ReplyMarkup {
    if records.is_empty() {
        return ReplyMarkup::inline(vec![vec![("No numbers added".into(), "none".into())]]);
    }

    let mut rows: Vec<Vec<(String, String)>> = records
        .iter()
        .map(|record| {
            vec![(
                format!(
                    "{} {} ({})",
                    record.status_emoji(),
                    record.phone_number,
                    record.status.as_str()
                ),
                format!("{}{}", CB_NUMBER_PREFIX, record.id),
            )]
        })
        .collect();

    rows.push(vec![("🔙 Back".into(), CB_BACK_MAIN.into())]);
    ReplyMarkup::inline(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use account_store::PhoneStatus;
    use chrono::Utc;

    fn record(id: i64, authenticated: bool) -> PhoneNumberRecord {
        PhoneNumberRecord {
            id,
            user_id: 1,
            phone_number: "+15551234567".into(),
            is_authenticated: authenticated,
            status: if authenticated {
                PhoneStatus::Authenticated
            } else {
                PhoneStatus::Pending
            },
            added_at: Utc::now(),
            last_login: None,
        }
    }

    #[test]
    fn test_numbers_keyboard_labels_and_payloads() {
        let markup = numbers_keyboard(&[record(3, true), record(2, false)]);
        let json = serde_json::to_string(&markup).unwrap();

        assert!(json.contains("✅ +15551234567 (authenticated)"));
        assert!(json.contains("⏳ +15551234567 (pending)"));
        assert!(json.contains("\"callback_data\":\"number_3\""));
        assert!(json.contains("\"callback_data\":\"back_main\""));
    }

    #[test]
    fn test_empty_numbers_keyboard() {
        let markup = numbers_keyboard(&[]);
        let json = serde_json::to_string(&markup).unwrap();

        assert!(json.contains("No numbers added"));
    }
}
