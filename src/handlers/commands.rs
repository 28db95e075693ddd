use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::db::UserProfile;
use crate::handlers::{keyboards, user_profile_from};
use crate::session::Session;
use crate::state::AppState;
use crate::texts;

pub async fn start_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    let Some(profile) = user_profile_from(&message) else {
        return Ok(());
    };
    let session = state.sessions.get_session(&profile).await;

    bot.send_message(message.chat.id, texts::welcome(&session.language))
        .reply_markup(keyboards::main_menu())
        .await?;
    Ok(())
}

pub async fn menu_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    let Some(profile) = user_profile_from(&message) else {
        return Ok(());
    };
    let session = state.sessions.get_session(&profile).await;

    bot.send_message(message.chat.id, texts::menu(&session.language))
        .reply_markup(keyboards::main_menu())
        .await?;
    Ok(())
}

fn profile_text(session: &Session, daily_limit: i64) -> String {
    let tier = session.tier.as_str();
    let registered = session.registered_at.format("%d.%m.%Y");
    if texts::is_english(&session.language) {
        format!(
            "<b>👤 Profile {id}</b>\n\n\
             📅 Registration date: {registered}\n\
             🔑 Key: {tier}\n\
             🧪 {tier} requests today: {used}/{limit}\n\
             💰 Balance: {balance:.1} 🔋\n\
             🎟️ Subscription: {tier}\n\
             📅 Expiry date: never\n\
             🆔 Unique ID: {id}",
            id = session.telegram_id,
            used = session.daily_requests,
            limit = daily_limit,
            balance = session.balance,
        )
    } else {
        format!(
            "<b>👤 Профиль {id}</b>\n\n\
             📅 Дата регистрации: {registered}\n\
             🔑 Ключ: {tier}\n\
             🧪 {tier} запросов сегодня: {used}/{limit}\n\
             💰 Баланс: {balance:.1} 🔋\n\
             🎟️ Подписка: {tier}\n\
             📅 Дата окончания: никогда\n\
             🆔 Уникальный ID: {id}",
            id = session.telegram_id,
            used = session.daily_requests,
            limit = daily_limit,
            balance = session.balance,
        )
    }
}

/// Profile display re-reads economic fields from the store first and never
/// consumes quota; the counter shown is the post-rollover value.
pub async fn send_profile(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    profile: &UserProfile,
) -> Result<()> {
    state.sessions.refresh_balance(profile.telegram_id).await;
    let session = state.sessions.get_session(profile).await;
    let limit = state.sessions.daily_limit(session.tier);

    bot.send_message(chat_id, profile_text(&session, limit))
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboards::profile_actions())
        .await?;
    Ok(())
}

pub async fn profile_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    let Some(profile) = user_profile_from(&message) else {
        return Ok(());
    };
    send_profile(&bot, &state, message.chat.id, &profile).await
}

pub async fn info_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    let Some(profile) = user_profile_from(&message) else {
        return Ok(());
    };
    let session = state.sessions.get_session(&profile).await;

    bot.send_message(message.chat.id, texts::info(&session.language))
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

pub async fn new_dialogue_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    let Some(profile) = user_profile_from(&message) else {
        return Ok(());
    };
    let session = state.sessions.get_session(&profile).await;
    state.sessions.clear_history(profile.telegram_id);

    bot.send_message(message.chat.id, texts::new_dialogue(&session.language))
        .await?;
    Ok(())
}

pub async fn help_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    let Some(profile) = user_profile_from(&message) else {
        return Ok(());
    };
    let session = state.sessions.get_session(&profile).await;

    bot.send_message(message.chat.id, texts::help(&session.language))
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

pub async fn language_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    let Some(profile) = user_profile_from(&message) else {
        return Ok(());
    };
    let session = state.sessions.get_session(&profile).await;

    bot.send_message(message.chat.id, texts::select_language(&session.language))
        .reply_markup(keyboards::language_selection())
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ConversationHistory, Tier};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn session() -> Session {
        Session {
            telegram_id: 42,
            db_id: Some(1),
            username: Some("tester".to_string()),
            first_name: Some("Test".to_string()),
            last_name: None,
            mode: None,
            language: "ru".to_string(),
            registered_at: Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap(),
            daily_requests: 7,
            last_request_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            tier: Tier::Free,
            balance: 12.34,
            vip_level: 0,
            is_newcomer: false,
            history: ConversationHistory::new(50),
            is_fallback: false,
        }
    }

    #[test]
    fn profile_text_shows_counter_against_limit() {
        let text = profile_text(&session(), 25);
        assert!(text.contains("7/25"));
        assert!(text.contains("FREE"));
        assert!(text.contains("09.03.2024"));
        // balance is rendered with one decimal place
        assert!(text.contains("12.3 🔋"));
    }

    #[test]
    fn profile_text_localizes_to_english() {
        let mut session = session();
        session.language = "en".to_string();
        session.tier = Tier::Premium;
        let text = profile_text(&session, 1000);
        assert!(text.contains("Profile 42"));
        assert!(text.contains("PREMIUM requests today: 7/1000"));
    }
}
