//! Persisted record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User fields upserted on every interaction.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Authentication status of a phone-number record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PhoneStatus {
    /// Submitted, login not completed
    Pending,
    /// Login handshake completed
    Authenticated,
    /// Login failed terminally
    Failed,
}

impl PhoneStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Authenticated => "authenticated",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "authenticated" => Some(Self::Authenticated),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// A phone number submitted by a user.
///
/// Duplicate submissions create duplicate rows; records are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneNumberRecord {
    pub id: i64,
    pub user_id: i64,
    pub phone_number: String,
    pub is_authenticated: bool,
    pub status: PhoneStatus,
    pub added_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl PhoneNumberRecord {
    /// Status marker for keyboard labels.
    pub fn status_emoji(&self) -> &'static str {
        if self.is_authenticated {
            "✅"
        } else {
            "⏳"
        }
    }
}
