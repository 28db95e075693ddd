use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Durable user record as stored in the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub telegram_id: i64,
    pub telegram_user_name: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language_code: Option<String>,
    pub balance: f64,
    pub vip_level: i64,
    pub is_active: bool,
    pub is_newcomer: bool,
    pub created_at: DateTime<Utc>,
}

/// Identity hint extracted from an inbound Telegram update, used for
/// lookup-or-create and for synthesizing fallback sessions.
#[derive(Debug, Clone, Default)]
pub struct UserProfile {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language_code: Option<String>,
}
