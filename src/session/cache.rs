use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, Utc};
use parking_lot::Mutex;
use tracing::warn;

use crate::config::CONFIG;
use crate::db::models::{UserProfile, UserRow};
use crate::db::Database;
use crate::modes::Mode;
use crate::session::history::{ChatEntry, ConversationHistory};
use crate::session::quota::{QuotaDecision, QuotaPolicy, Tier};

type TodaySource = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Per-user runtime state. Only language, balance and VIP level round-trip
/// through the store; everything else lives and dies with the process.
#[derive(Debug, Clone)]
pub struct Session {
    pub telegram_id: i64,
    pub db_id: Option<i64>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub mode: Option<Mode>,
    pub language: String,
    pub registered_at: DateTime<Utc>,
    pub daily_requests: i64,
    pub last_request_date: NaiveDate,
    pub tier: Tier,
    pub balance: f64,
    pub vip_level: i64,
    pub is_newcomer: bool,
    pub history: ConversationHistory,
    pub is_fallback: bool,
}

impl Session {
    fn from_row(
        row: UserRow,
        history_cap: usize,
        today: NaiveDate,
        default_language: &str,
    ) -> Self {
        Session {
            telegram_id: row.telegram_id,
            db_id: Some(row.id),
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            mode: None,
            language: row
                .language_code
                .unwrap_or_else(|| default_language.to_string()),
            registered_at: row.created_at,
            daily_requests: 0,
            last_request_date: today,
            tier: Tier::from_vip_level(row.vip_level),
            balance: row.balance,
            vip_level: row.vip_level,
            is_newcomer: row.is_newcomer,
            history: ConversationHistory::new(history_cap),
            is_fallback: false,
        }
    }

    /// Session synthesized when the store is unavailable. Never written back.
    fn fallback(
        profile: &UserProfile,
        history_cap: usize,
        today: NaiveDate,
        default_language: &str,
    ) -> Self {
        Session {
            telegram_id: profile.telegram_id,
            db_id: None,
            username: profile.username.clone(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            mode: None,
            language: profile
                .language_code
                .clone()
                .unwrap_or_else(|| default_language.to_string()),
            registered_at: Utc::now(),
            daily_requests: 0,
            last_request_date: today,
            tier: Tier::Free,
            balance: 0.0,
            vip_level: 0,
            is_newcomer: true,
            history: ConversationHistory::new(history_cap),
            is_fallback: true,
        }
    }
}

/// In-memory session registry reconciled against the user store. Exactly one
/// session exists per Telegram id for the process lifetime; store failures
/// degrade to in-memory mutation and are never surfaced to the user.
///
/// All quota and history mutations for one user happen under a single lock,
/// so check-then-increment stays atomic under concurrent update delivery.
#[derive(Clone)]
pub struct SessionCache {
    sessions: Arc<Mutex<HashMap<i64, Session>>>,
    db: Option<Database>,
    quota: QuotaPolicy,
    history_cap: usize,
    default_language: String,
    today: TodaySource,
}

impl SessionCache {
    pub fn new(db: Option<Database>) -> Self {
        Self::with_settings(
            db,
            QuotaPolicy::from_config(),
            CONFIG.history_cap,
            CONFIG.default_language.clone(),
            Arc::new(|| Local::now().date_naive()),
        )
    }

    pub fn with_settings(
        db: Option<Database>,
        quota: QuotaPolicy,
        history_cap: usize,
        default_language: String,
        today: TodaySource,
    ) -> Self {
        SessionCache {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            db,
            quota,
            history_cap,
            default_language,
            today,
        }
    }

    fn apply_rollover(session: &mut Session, today: NaiveDate) {
        if session.last_request_date != today {
            session.daily_requests = 0;
            session.last_request_date = today;
        }
    }

    /// Runs `f` on the cached session after re-applying the daily-rollover
    /// invariant. Returns `None` for unknown users.
    fn with_session<T>(&self, telegram_id: i64, f: impl FnOnce(&mut Session) -> T) -> Option<T> {
        let mut sessions = self.sessions.lock();
        let session = sessions.get_mut(&telegram_id)?;
        Self::apply_rollover(session, (self.today)());
        Some(f(session))
    }

    /// Cached session, or lookup-or-create against the store, or a fallback
    /// session when the store cannot serve the request.
    pub async fn get_session(&self, profile: &UserProfile) -> Session {
        if let Some(existing) = self.with_session(profile.telegram_id, |session| session.clone()) {
            return existing;
        }

        let today = (self.today)();
        let built = match &self.db {
            Some(db) => match db.get_user_by_telegram_id(profile.telegram_id).await {
                Ok(Some(row)) => {
                    Session::from_row(row, self.history_cap, today, &self.default_language)
                }
                Ok(None) => match db.create_user(profile, &self.default_language).await {
                    Ok(row) => {
                        Session::from_row(row, self.history_cap, today, &self.default_language)
                    }
                    Err(err) => {
                        warn!(
                            "Failed to create user {}, using fallback session: {err}",
                            profile.telegram_id
                        );
                        Session::fallback(profile, self.history_cap, today, &self.default_language)
                    }
                },
                Err(err) => {
                    warn!(
                        "User store unavailable for {}, using fallback session: {err}",
                        profile.telegram_id
                    );
                    Session::fallback(profile, self.history_cap, today, &self.default_language)
                }
            },
            None => Session::fallback(profile, self.history_cap, today, &self.default_language),
        };

        let mut sessions = self.sessions.lock();
        // Keep the first inserted session if a concurrent event won the race.
        let session = sessions.entry(profile.telegram_id).or_insert(built);
        Self::apply_rollover(session, (self.today)());
        session.clone()
    }

    pub fn snapshot(&self, telegram_id: i64) -> Option<Session> {
        self.with_session(telegram_id, |session| session.clone())
    }

    pub fn update_mode(&self, telegram_id: i64, mode: Mode) {
        self.with_session(telegram_id, |session| session.mode = Some(mode));
    }

    pub async fn update_language(&self, telegram_id: i64, language: &str) {
        let persist = self
            .with_session(telegram_id, |session| {
                session.language = language.to_string();
                !session.is_fallback
            })
            .unwrap_or(false);

        if !persist {
            return;
        }
        if let Some(db) = &self.db {
            if let Err(err) = db.update_language(telegram_id, language).await {
                warn!("Failed to persist language for {telegram_id}: {err}");
            }
        }
    }

    /// Atomic admit-and-increment against the daily ceiling. The counter is
    /// only advanced when the request is admitted.
    pub fn try_consume_quota(&self, telegram_id: i64) -> Option<QuotaDecision> {
        let quota = self.quota;
        self.with_session(telegram_id, |session| {
            let decision = quota.admit(session.daily_requests, session.tier);
            if decision.allowed {
                session.daily_requests += 1;
            }
            decision
        })
    }

    pub fn daily_limit(&self, tier: Tier) -> i64 {
        self.quota.daily_limit(tier)
    }

    pub fn append_history(&self, telegram_id: i64, entry: ChatEntry) {
        self.with_session(telegram_id, |session| session.history.push(entry));
    }

    pub fn history_window(&self, telegram_id: i64, n: usize) -> Vec<ChatEntry> {
        self.with_session(telegram_id, |session| session.history.window(n))
            .unwrap_or_default()
    }

    pub fn clear_history(&self, telegram_id: i64) {
        self.with_session(telegram_id, |session| session.history.clear());
    }

    /// Re-reads balance, VIP level and tier from the store, leaving every
    /// other session field untouched. No-op for fallback sessions.
    pub async fn refresh_balance(&self, telegram_id: i64) {
        let is_fallback = self
            .with_session(telegram_id, |session| session.is_fallback)
            .unwrap_or(true);
        if is_fallback {
            return;
        }
        let Some(db) = &self.db else {
            return;
        };

        match db.get_user_by_telegram_id(telegram_id).await {
            Ok(Some(row)) => {
                self.with_session(telegram_id, |session| {
                    session.balance = row.balance;
                    session.vip_level = row.vip_level;
                    session.tier = Tier::from_vip_level(row.vip_level);
                });
            }
            Ok(None) => {}
            Err(err) => warn!("Failed to refresh balance for {telegram_id}: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::history::ChatRole;

    fn test_policy() -> QuotaPolicy {
        QuotaPolicy {
            free_daily_limit: 25,
            premium_daily_limit: 1000,
        }
    }

    fn profile(telegram_id: i64) -> UserProfile {
        UserProfile {
            telegram_id,
            username: Some("tester".to_string()),
            first_name: Some("Test".to_string()),
            last_name: None,
            language_code: Some("ru".to_string()),
        }
    }

    fn cache_with_clock(db: Option<Database>, date: Arc<Mutex<NaiveDate>>) -> SessionCache {
        let clock = Arc::clone(&date);
        SessionCache::with_settings(
            db,
            test_policy(),
            50,
            "ru".to_string(),
            Arc::new(move || *clock.lock()),
        )
    }

    fn fixed_date(year: i32, month: u32, day: u32) -> Arc<Mutex<NaiveDate>> {
        Arc::new(Mutex::new(
            NaiveDate::from_ymd_opt(year, month, day).unwrap(),
        ))
    }

    async fn memory_db() -> Database {
        Database::connect("sqlite::memory:", 1)
            .await
            .expect("in-memory database")
    }

    #[tokio::test]
    async fn new_user_without_store_gets_fallback_session() {
        let cache = cache_with_clock(None, fixed_date(2024, 5, 1));
        let session = cache.get_session(&profile(1)).await;

        assert!(session.is_fallback);
        assert!(session.mode.is_none());
        assert_eq!(session.tier, Tier::Free);
        assert_eq!(session.daily_requests, 0);
        assert!(session.db_id.is_none());
    }

    #[tokio::test]
    async fn new_user_with_store_is_persisted() {
        let db = memory_db().await;
        let cache = cache_with_clock(Some(db.clone()), fixed_date(2024, 5, 1));

        let session = cache.get_session(&profile(2)).await;
        assert!(!session.is_fallback);
        assert!(session.db_id.is_some());

        let row = db.get_user_by_telegram_id(2).await.unwrap().unwrap();
        assert_eq!(Some(row.id), session.db_id);
    }

    #[tokio::test]
    async fn one_session_per_user_for_the_process_lifetime() {
        let cache = cache_with_clock(None, fixed_date(2024, 5, 1));
        cache.get_session(&profile(3)).await;
        cache.update_mode(3, Mode::ChatText);

        let again = cache.get_session(&profile(3)).await;
        assert_eq!(again.mode, Some(Mode::ChatText));
    }

    #[tokio::test]
    async fn daily_counter_resets_when_the_date_rolls() {
        let date = fixed_date(2024, 5, 1);
        let cache = cache_with_clock(None, Arc::clone(&date));
        cache.get_session(&profile(4)).await;

        for _ in 0..3 {
            assert!(cache.try_consume_quota(4).unwrap().allowed);
        }
        assert_eq!(cache.snapshot(4).unwrap().daily_requests, 3);

        *date.lock() = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let session = cache.snapshot(4).unwrap();
        assert_eq!(session.daily_requests, 0);
        assert_eq!(
            session.last_request_date,
            NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
        );
    }

    #[tokio::test]
    async fn free_tier_is_denied_after_the_ceiling_and_admitted_next_day() {
        let date = fixed_date(2024, 5, 1);
        let cache = cache_with_clock(None, Arc::clone(&date));
        cache.get_session(&profile(5)).await;

        for _ in 0..25 {
            assert!(cache.try_consume_quota(5).unwrap().allowed);
        }
        let denied = cache.try_consume_quota(5).unwrap();
        assert!(!denied.allowed);
        assert_eq!(denied.limit, 25);
        assert_eq!(cache.snapshot(5).unwrap().daily_requests, 25);

        *date.lock() = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let admitted = cache.try_consume_quota(5).unwrap();
        assert!(admitted.allowed);
        assert_eq!(cache.snapshot(5).unwrap().daily_requests, 1);
    }

    #[tokio::test]
    async fn history_is_capped_through_the_cache() {
        let cache = cache_with_clock(None, fixed_date(2024, 5, 1));
        cache.get_session(&profile(6)).await;

        for i in 0..60 {
            cache.append_history(6, ChatEntry::user(format!("m{i}")));
        }
        let session = cache.snapshot(6).unwrap();
        assert_eq!(session.history.len(), 50);
        assert_eq!(session.history.last().unwrap().content, "m59");

        let window = cache.history_window(6, 10);
        assert_eq!(window.len(), 10);
        assert_eq!(window[0].content, "m50");
        assert_eq!(window[0].role, ChatRole::User);

        cache.clear_history(6);
        assert!(cache.snapshot(6).unwrap().history.is_empty());
    }

    #[tokio::test]
    async fn language_change_round_trips_through_the_store() {
        let db = memory_db().await;
        let cache = cache_with_clock(Some(db.clone()), fixed_date(2024, 5, 1));
        cache.get_session(&profile(7)).await;

        cache.update_language(7, "en").await;
        assert_eq!(cache.snapshot(7).unwrap().language, "en");

        let row = db.get_user_by_telegram_id(7).await.unwrap().unwrap();
        assert_eq!(row.language_code.as_deref(), Some("en"));
    }

    #[tokio::test]
    async fn fallback_sessions_never_write_back() {
        let cache = cache_with_clock(None, fixed_date(2024, 5, 1));
        cache.get_session(&profile(8)).await;
        // would panic on a store call if one were attempted
        cache.update_language(8, "en").await;
        cache.refresh_balance(8).await;
        assert_eq!(cache.snapshot(8).unwrap().language, "en");
    }

    #[tokio::test]
    async fn refresh_overwrites_only_economic_fields() {
        let db = memory_db().await;
        let cache = cache_with_clock(Some(db.clone()), fixed_date(2024, 5, 1));
        cache.get_session(&profile(9)).await;
        cache.update_mode(9, Mode::ImageEdit);
        assert_eq!(cache.snapshot(9).unwrap().tier, Tier::Free);

        db.update_balance(9, 299.0).await.unwrap();
        db.update_vip_level(9, 1).await.unwrap();
        cache.refresh_balance(9).await;

        let session = cache.snapshot(9).unwrap();
        assert_eq!(session.balance, 299.0);
        assert_eq!(session.vip_level, 1);
        assert_eq!(session.tier, Tier::Premium);
        assert_eq!(session.mode, Some(Mode::ImageEdit));
    }
}
