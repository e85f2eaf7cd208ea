use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Local user account, keyed by the provider's user id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "diesel", derive(diesel::Queryable))]
pub struct User {
    pub id: Uuid,
    pub uid: String, // provider (Facebook) user id
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// One day's journal text. Matches database column order exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "diesel", derive(diesel::Queryable))]
pub struct Entry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: String, // YYYY-MM-DD
    pub body: String,
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    /// An empty, not yet persisted entry for the given day.
    pub fn blank(user_id: Uuid, date: &str) -> Self {
        Entry {
            id: Uuid::new_v4(),
            user_id,
            date: date.to_string(),
            body: String::new(),
            updated_at: Utc::now(),
        }
    }
}

/// Number of characters in an entry body, counting CRLF as one.
pub fn char_count(body: &str) -> usize {
    body.replace("\r\n", "\n").chars().count()
}

/// API response for a single entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: String,
    pub body: String,
    pub char_count: usize,
    pub editable: bool,
    pub saved: bool,
    pub updated_at: DateTime<Utc>,
}

impl EntryResponse {
    pub fn new(entry: Entry, editable: bool, saved: bool) -> Self {
        EntryResponse {
            char_count: char_count(&entry.body),
            id: entry.id,
            user_id: entry.user_id,
            date: entry.date,
            body: entry.body,
            editable,
            saved,
            updated_at: entry.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveEntryRequest {
    pub body: String,
}

/// Calendar-day marker for the month view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateEntry {
    pub date: String,
    pub has_entry: bool,
    pub is_future: bool,
}

/// Month calendar around a reference date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryDatesResponse {
    pub entry_dates: Vec<DateEntry>,
    pub today: String,
    pub previous_month: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_month: Option<String>,
}

// Auth types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInitResponse {
    pub auth_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUserResponse {
    pub id: Uuid,
    pub name: String,
}

impl From<User> for AuthUserResponse {
    fn from(user: User) -> Self {
        AuthUserResponse {
            id: user.id,
            name: user.name,
        }
    }
}
