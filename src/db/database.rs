use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::models::{UserProfile, UserRow};

const CONNECT_ATTEMPTS: usize = 3;
const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(2);

const USER_COLUMNS: &str = "id, telegram_id, telegram_user_name, username, first_name, \
     last_name, language_code, balance, vip_level, is_active, is_newcomer, created_at";

/// Handle over the relational user store. Every operation is a single
/// autocommit statement; the pool is the only shared resource.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connects with a bounded retry loop, then ensures the schema exists.
    /// A final failure is returned to the caller, which runs without a store.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let mut last_error = None;
        for attempt in 1..=CONNECT_ATTEMPTS {
            match SqlitePoolOptions::new()
                .max_connections(max_connections)
                .connect(database_url)
                .await
            {
                Ok(pool) => {
                    let db = Database { pool };
                    db.ensure_schema().await?;
                    info!("Database connected successfully");
                    return Ok(db);
                }
                Err(err) => {
                    warn!(
                        "Database connection failed (attempt {attempt}/{CONNECT_ATTEMPTS}): {err}"
                    );
                    last_error = Some(err);
                    if attempt < CONNECT_ATTEMPTS {
                        tokio::time::sleep(CONNECT_RETRY_DELAY).await;
                    }
                }
            }
        }
        Err(last_error.expect("at least one connect attempt").into())
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (\
                id INTEGER PRIMARY KEY AUTOINCREMENT,\
                telegram_id INTEGER NOT NULL UNIQUE,\
                telegram_user_name TEXT,\
                username TEXT,\
                first_name TEXT,\
                last_name TEXT,\
                language_code TEXT,\
                balance REAL NOT NULL DEFAULT 0.0,\
                vip_level INTEGER NOT NULL DEFAULT 0,\
                is_active INTEGER NOT NULL DEFAULT 1,\
                is_newcomer INTEGER NOT NULL DEFAULT 1,\
                created_at TEXT NOT NULL\
            );",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_telegram_id ON users(telegram_id);",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_user_by_telegram_id(&self, telegram_id: i64) -> Result<Option<UserRow>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE telegram_id = ?");
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(telegram_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn create_user(
        &self,
        profile: &UserProfile,
        default_language: &str,
    ) -> Result<UserRow> {
        let language = profile
            .language_code
            .clone()
            .unwrap_or_else(|| default_language.to_string());

        let query = format!(
            "INSERT INTO users (\
                telegram_id, telegram_user_name, username, first_name, last_name, \
                language_code, balance, vip_level, is_active, is_newcomer, created_at\
            ) VALUES (?, ?, ?, ?, ?, ?, 0.0, 0, 1, 1, ?) \
            RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(profile.telegram_id)
            .bind(profile.username.as_deref())
            .bind(profile.username.as_deref())
            .bind(profile.first_name.as_deref())
            .bind(profile.last_name.as_deref())
            .bind(language)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        info!("Created new user: {}", profile.telegram_id);
        Ok(row)
    }

    /// Applies a delta to the stored balance and returns the new value, or
    /// `None` when the user row does not exist.
    pub async fn update_balance(&self, telegram_id: i64, delta: f64) -> Result<Option<f64>> {
        let balance = sqlx::query_scalar::<_, f64>(
            "UPDATE users SET balance = balance + ? WHERE telegram_id = ? RETURNING balance",
        )
        .bind(delta)
        .bind(telegram_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(balance) = balance {
            info!("Updated balance for user {telegram_id}: {balance}");
        }
        Ok(balance)
    }

    pub async fn update_language(&self, telegram_id: i64, language_code: &str) -> Result<()> {
        sqlx::query("UPDATE users SET language_code = ? WHERE telegram_id = ?")
            .bind(language_code)
            .bind(telegram_id)
            .execute(&self.pool)
            .await?;
        info!("Updated language for user {telegram_id}: {language_code}");
        Ok(())
    }

    pub async fn update_vip_level(&self, telegram_id: i64, vip_level: i64) -> Result<()> {
        sqlx::query("UPDATE users SET vip_level = ? WHERE telegram_id = ?")
            .bind(vip_level)
            .bind(telegram_id)
            .execute(&self.pool)
            .await?;
        info!("Updated VIP level for user {telegram_id}: {vip_level}");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_db() -> Database {
        Database::connect("sqlite::memory:", 1)
            .await
            .expect("in-memory database")
    }

    fn profile(telegram_id: i64) -> UserProfile {
        UserProfile {
            telegram_id,
            username: Some("tester".to_string()),
            first_name: Some("Test".to_string()),
            last_name: None,
            language_code: None,
        }
    }

    #[tokio::test]
    async fn create_then_lookup_round_trips() {
        let db = memory_db().await;
        assert!(db.get_user_by_telegram_id(42).await.unwrap().is_none());

        let created = db.create_user(&profile(42), "ru").await.unwrap();
        assert_eq!(created.telegram_id, 42);
        assert_eq!(created.language_code.as_deref(), Some("ru"));
        assert_eq!(created.balance, 0.0);
        assert_eq!(created.vip_level, 0);
        assert!(created.is_newcomer);

        let fetched = db.get_user_by_telegram_id(42).await.unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
    }

    #[tokio::test]
    async fn balance_updates_are_deltas() {
        let db = memory_db().await;
        db.create_user(&profile(7), "ru").await.unwrap();

        assert_eq!(db.update_balance(7, 10.5).await.unwrap(), Some(10.5));
        assert_eq!(db.update_balance(7, -3.0).await.unwrap(), Some(7.5));
        assert_eq!(db.update_balance(999, 1.0).await.unwrap(), None);
    }

    #[tokio::test]
    async fn language_and_vip_level_persist() {
        let db = memory_db().await;
        db.create_user(&profile(9), "ru").await.unwrap();

        db.update_language(9, "en").await.unwrap();
        db.update_vip_level(9, 2).await.unwrap();

        let row = db.get_user_by_telegram_id(9).await.unwrap().unwrap();
        assert_eq!(row.language_code.as_deref(), Some("en"));
        assert_eq!(row.vip_level, 2);
    }
}
