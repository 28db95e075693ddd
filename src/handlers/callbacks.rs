use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::debug;

use crate::db::UserProfile;
use crate::handlers::keyboards::{
    self, CB_BUY_SUBSCRIPTION, CB_DESIGN_MODE, CB_PREMIUM_SERVICES, CB_PROFILE, CB_SELECT_LANGUAGE,
    CB_SELECT_MODE, CB_TEXT_MODE, LANG_CALLBACK_PREFIX,
};
use crate::handlers::{commands, dispatch};
use crate::modes::{Mode, MODE_CALLBACK_PREFIX};
use crate::state::AppState;
use crate::texts;

fn profile_from_query(query: &CallbackQuery) -> Option<UserProfile> {
    let user = &query.from;
    let telegram_id = i64::try_from(user.id.0).ok()?;
    Some(UserProfile {
        telegram_id,
        username: user.username.clone(),
        first_name: Some(user.first_name.clone()),
        last_name: user.last_name.clone(),
        language_code: user.language_code.clone(),
    })
}

pub async fn handle_callback_query(bot: Bot, state: AppState, query: CallbackQuery) -> Result<()> {
    // Always acknowledge so the button stops spinning
    bot.answer_callback_query(query.id.clone()).await?;

    let Some(data) = query.data.as_deref() else {
        return Ok(());
    };
    let Some(chat_id) = query.message.as_ref().map(|message| message.chat().id) else {
        return Ok(());
    };
    let Some(profile) = profile_from_query(&query) else {
        return Ok(());
    };

    let session = state.sessions.get_session(&profile).await;
    let language = session.language.clone();
    debug!("User {} pressed: {data}", profile.telegram_id);

    match data {
        CB_SELECT_MODE => {
            dispatch::show_mode_selection(&bot, chat_id, &language).await?;
        }
        CB_BUY_SUBSCRIPTION => {
            bot.send_message(chat_id, texts::subscription_options(&language))
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::subscription_options())
                .await?;
        }
        CB_PROFILE => {
            commands::send_profile(&bot, &state, chat_id, &profile).await?;
        }
        CB_TEXT_MODE => {
            dispatch::send_text_mode_status(&bot, chat_id, &language, session.mode).await?;
        }
        CB_DESIGN_MODE => {
            dispatch::send_design_mode_status(&bot, chat_id, &language, session.mode).await?;
        }
        CB_PREMIUM_SERVICES => {
            dispatch::send_premium_services(&bot, chat_id, &language).await?;
        }
        CB_SELECT_LANGUAGE => {
            bot.send_message(chat_id, texts::select_language(&language))
                .reply_markup(keyboards::language_selection())
                .await?;
        }
        _ => {
            if let Some(key) = data.strip_prefix(MODE_CALLBACK_PREFIX) {
                set_mode(&bot, &state, chat_id, profile.telegram_id, &language, key).await?;
            } else if let Some(lang) = data.strip_prefix(LANG_CALLBACK_PREFIX) {
                state
                    .sessions
                    .update_language(profile.telegram_id, lang)
                    .await;
                bot.send_message(chat_id, texts::language_set(lang)).await?;
            } else {
                // payment buttons are display-only for now
                debug!("Unhandled callback data: {data}");
            }
        }
    }
    Ok(())
}

async fn set_mode(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    telegram_id: i64,
    language: &str,
    key: &str,
) -> Result<()> {
    let Some(mode) = Mode::from_callback_key(key) else {
        bot.send_message(chat_id, texts::mode_not_found(language))
            .await?;
        return Ok(());
    };

    state.sessions.update_mode(telegram_id, mode);

    let mut text = texts::mode_selected(language, mode.label());
    match mode {
        Mode::ImageEdit => text.push_str(texts::edit_mode_hint(language)),
        Mode::ImageAnalysis => text.push_str(texts::analysis_mode_hint(language)),
        _ => {}
    }

    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}
