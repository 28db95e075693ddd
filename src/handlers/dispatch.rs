use anyhow::{anyhow, Result};
use base64::{engine::general_purpose, Engine as _};
use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode};
use tracing::{debug, error, warn};
use url::Url;

use crate::config::CONFIG;
use crate::db::UserProfile;
use crate::error::ProviderError;
use crate::handlers::{commands, keyboards, user_profile_from};
use crate::jobs::{await_completion, JobOutcome};
use crate::llm::{openai, openrouter, video, ProviderReply};
use crate::modes::Mode;
use crate::session::ChatEntry;
use crate::state::AppState;
use crate::texts;
use crate::utils::http::get_http_client;

pub async fn show_mode_selection(bot: &Bot, chat_id: ChatId, language: &str) -> Result<()> {
    bot.send_message(chat_id, texts::select_mode(language))
        .reply_markup(keyboards::mode_selection())
        .await?;
    Ok(())
}

async fn require_mode(
    bot: &Bot,
    chat_id: ChatId,
    language: &str,
    mode: Option<Mode>,
) -> Result<Option<Mode>> {
    if mode.is_none() {
        bot.send_message(chat_id, texts::no_mode_selected(language))
            .await?;
        show_mode_selection(bot, chat_id, language).await?;
    }
    Ok(mode)
}

pub async fn send_text_mode_status(
    bot: &Bot,
    chat_id: ChatId,
    language: &str,
    mode: Option<Mode>,
) -> Result<()> {
    if let Some(mode) = require_mode(bot, chat_id, language, mode).await? {
        bot.send_message(chat_id, texts::text_mode_ready(language, mode.label()))
            .await?;
    }
    Ok(())
}

pub async fn send_design_mode_status(
    bot: &Bot,
    chat_id: ChatId,
    language: &str,
    mode: Option<Mode>,
) -> Result<()> {
    if let Some(mode) = require_mode(bot, chat_id, language, mode).await? {
        bot.send_message(chat_id, texts::design_mode_ready(language, mode.label()))
            .await?;
    }
    Ok(())
}

pub async fn send_premium_services(bot: &Bot, chat_id: ChatId, language: &str) -> Result<()> {
    bot.send_message(chat_id, texts::premium_services(language))
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboards::premium_actions())
        .await?;
    Ok(())
}

/// Routes a plain text message: reply-keyboard shortcuts first, then the
/// mode-driven AI conversation.
pub async fn handle_text(bot: Bot, state: AppState, message: Message, text: String) -> Result<()> {
    let Some(profile) = user_profile_from(&message) else {
        return Ok(());
    };
    let chat_id = message.chat.id;
    let session = state.sessions.get_session(&profile).await;

    match text.as_str() {
        keyboards::BTN_PROFILE => {
            commands::send_profile(&bot, &state, chat_id, &profile).await?;
        }
        keyboards::BTN_TEXT => {
            send_text_mode_status(&bot, chat_id, &session.language, session.mode).await?;
        }
        keyboards::BTN_DESIGN => {
            send_design_mode_status(&bot, chat_id, &session.language, session.mode).await?;
        }
        keyboards::BTN_SELECT_MODE => {
            show_mode_selection(&bot, chat_id, &session.language).await?;
        }
        keyboards::BTN_PREMIUM => {
            send_premium_services(&bot, chat_id, &session.language).await?;
        }
        _ => {
            ai_conversation(&bot, &state, chat_id, &profile, &text).await?;
        }
    }
    Ok(())
}

async fn ai_conversation(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    profile: &UserProfile,
    text: &str,
) -> Result<()> {
    let session = state.sessions.get_session(profile).await;
    let language = session.language.clone();

    let Some(mode) = require_mode(bot, chat_id, &language, session.mode).await? else {
        return Ok(());
    };

    // The edit mode works from photo captions only
    if mode == Mode::ImageEdit {
        bot.send_message(chat_id, texts::kie_needs_image(&language))
            .parse_mode(ParseMode::Html)
            .await?;
        return Ok(());
    }

    let Some(decision) = state.sessions.try_consume_quota(profile.telegram_id) else {
        return Ok(());
    };
    if !decision.allowed {
        bot.send_message(
            chat_id,
            texts::daily_limit_reached(&language, decision.limit),
        )
        .await?;
        return Ok(());
    }

    state
        .sessions
        .append_history(profile.telegram_id, ChatEntry::user(text));

    match mode {
        Mode::ChatText => {
            let window = state
                .sessions
                .history_window(profile.telegram_id, CONFIG.history_window);
            match openai::chat_completion(&window).await {
                Ok(reply) if !reply.is_empty() => {
                    state
                        .sessions
                        .append_history(profile.telegram_id, ChatEntry::assistant(reply.clone()));
                    bot.send_message(chat_id, reply).await?;
                }
                Ok(_) => {
                    bot.send_message(chat_id, texts::no_response(&language))
                        .await?;
                }
                Err(err) => {
                    error!("Chat completion failed for {}: {err}", profile.telegram_id);
                    bot.send_message(chat_id, texts::chat_provider_error(&language))
                        .await?;
                }
            }
        }
        Mode::ImageAnalysis => {
            let summary = match openrouter::image_model_reply(text, &[]).await {
                Ok(reply) => deliver_provider_reply(bot, chat_id, &language, reply).await?,
                Err(err) => {
                    // degrade to the canned reply rather than surfacing the error
                    if !matches!(err, ProviderError::Unavailable(_)) {
                        warn!("OpenRouter request failed for {}: {err}", profile.telegram_id);
                    }
                    let quick = texts::nano_quick_reply(&language, text);
                    bot.send_message(chat_id, &quick).await?;
                    quick
                }
            };
            state
                .sessions
                .append_history(profile.telegram_id, ChatEntry::assistant(summary));
        }
        Mode::VideoGen => {
            let reply = video::simulated_video_reply(&language, text);
            state
                .sessions
                .append_history(profile.telegram_id, ChatEntry::assistant(reply.clone()));
            bot.send_message(chat_id, reply).await?;
        }
        Mode::ImageEdit => unreachable!("handled above"),
    }
    Ok(())
}

/// Sends whatever the provider returned and hands back the line recorded in
/// the conversation history.
async fn deliver_provider_reply(
    bot: &Bot,
    chat_id: ChatId,
    language: &str,
    reply: ProviderReply,
) -> Result<String> {
    if reply.is_empty() {
        let text = texts::no_response(language).to_string();
        bot.send_message(chat_id, &text).await?;
        return Ok(text);
    }

    for image_url in &reply.image_urls {
        send_image(bot, chat_id, image_url, None).await?;
    }

    if let Some(text) = &reply.text {
        let prefixed = texts::nano_prefixed(text);
        bot.send_message(chat_id, &prefixed).await?;
        Ok(prefixed)
    } else {
        Ok(texts::image_sent(language).to_string())
    }
}

/// Sends a photo from either a remote URL or a `data:image/...` URL.
async fn send_image(
    bot: &Bot,
    chat_id: ChatId,
    image_url: &str,
    caption: Option<String>,
) -> Result<()> {
    let input = if let Some(rest) = image_url.strip_prefix("data:image/") {
        let encoded = rest
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| anyhow!("malformed data URL"))?;
        let bytes = general_purpose::STANDARD.decode(encoded)?;
        InputFile::memory(bytes).file_name("image.png")
    } else {
        InputFile::url(Url::parse(image_url)?)
    };

    let mut request = bot.send_photo(chat_id, input);
    if let Some(caption) = caption {
        request = request.caption(caption);
    }
    request.await?;
    Ok(())
}

/// Only a delivered edit becomes part of the dialogue; failures and empty
/// results leave the history untouched.
fn edit_outcome_history_entry(
    language: &str,
    prompt: &str,
    outcome: &JobOutcome,
) -> Option<ChatEntry> {
    match outcome {
        JobOutcome::Succeeded { result_urls, .. } if !result_urls.is_empty() => Some(
            ChatEntry::assistant(texts::edit_history_entry(language, prompt)),
        ),
        _ => None,
    }
}

fn telegram_file_url(file_path: &str) -> String {
    format!(
        "https://api.telegram.org/file/bot{}/{}",
        CONFIG.bot_token, file_path
    )
}

/// Routes an incoming photo by mode: the edit mode submits a kie.ai job,
/// everything else goes through image analysis.
pub async fn handle_photo(bot: Bot, state: AppState, message: Message) -> Result<()> {
    let Some(profile) = user_profile_from(&message) else {
        return Ok(());
    };
    let chat_id = message.chat.id;
    let session = state.sessions.get_session(&profile).await;
    let language = session.language.clone();

    let Some(mode) = require_mode(&bot, chat_id, &language, session.mode).await? else {
        return Ok(());
    };

    let Some(largest) = message.photo().and_then(|sizes| sizes.last()) else {
        return Ok(());
    };
    let file = bot.get_file(largest.file.id.clone()).await?;
    let image_url = telegram_file_url(&file.path);

    if mode == Mode::ImageEdit {
        let prompt = message
            .caption()
            .unwrap_or(texts::default_edit_prompt(&language));
        return run_image_edit(
            &bot,
            &state,
            chat_id,
            profile.telegram_id,
            &language,
            prompt,
            image_url,
        )
        .await;
    }

    let prompt = message
        .caption()
        .unwrap_or(texts::default_analysis_prompt(&language));

    let image_bytes = match fetch_image_bytes(&image_url).await {
        Ok(bytes) => bytes,
        Err(err) => {
            error!("Failed to download photo for {}: {err}", profile.telegram_id);
            bot.send_message(chat_id, texts::ai_error(&language)).await?;
            return Ok(());
        }
    };

    match openrouter::image_model_reply(prompt, &[image_bytes]).await {
        Ok(reply) => {
            deliver_provider_reply(&bot, chat_id, &language, reply).await?;
        }
        Err(err) => {
            error!("Image analysis failed for {}: {err}", profile.telegram_id);
            bot.send_message(chat_id, texts::ai_error(&language)).await?;
        }
    }
    Ok(())
}

async fn fetch_image_bytes(image_url: &str) -> Result<Vec<u8>> {
    let response = get_http_client()
        .get(image_url)
        .send()
        .await?
        .error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

/// Full edit flow: processing notice, task submission, poll to completion,
/// then result photos (or an error rewrite of the notice).
async fn run_image_edit(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    telegram_id: i64,
    language: &str,
    prompt: &str,
    image_url: String,
) -> Result<()> {
    let Some(kie) = &state.kie else {
        bot.send_message(chat_id, texts::kie_disabled(language))
            .await?;
        return Ok(());
    };

    let processing = bot
        .send_message(chat_id, texts::edit_processing(language))
        .await?;

    let task_id = match kie.create_task(prompt, &[image_url]).await {
        Ok(task_id) => task_id,
        Err(err) => {
            warn!("kie.ai task creation failed for {telegram_id}: {err}");
            bot.edit_message_text(
                chat_id,
                processing.id,
                texts::edit_error(language, &err.to_string()),
            )
            .await?;
            return Ok(());
        }
    };

    bot.edit_message_text(
        chat_id,
        processing.id,
        texts::edit_task_created(language, &task_id),
    )
    .await?;

    match await_completion(kie, &task_id, kie.poll_settings()).await {
        Ok(outcome) => {
            match &outcome {
                JobOutcome::Succeeded {
                    result_urls,
                    cost_time_ms,
                } if !result_urls.is_empty() => {
                    debug!("kie.ai task {task_id} produced {} images", result_urls.len());
                    bot.delete_message(chat_id, processing.id).await?;
                    for url in result_urls {
                        send_image(
                            bot,
                            chat_id,
                            url,
                            Some(texts::edit_result_caption(language, prompt, *cost_time_ms)),
                        )
                        .await?;
                    }
                }
                JobOutcome::Succeeded { .. } => {
                    bot.edit_message_text(chat_id, processing.id, texts::edit_no_images(language))
                        .await?;
                }
                JobOutcome::Failed { code, message } => {
                    bot.edit_message_text(
                        chat_id,
                        processing.id,
                        texts::edit_failed(language, code.as_deref().unwrap_or("unknown"), message),
                    )
                    .await?;
                }
            }
            if let Some(entry) = edit_outcome_history_entry(language, prompt, &outcome) {
                state.sessions.append_history(telegram_id, entry);
            }
        }
        Err(err) => {
            warn!("kie.ai task {task_id} did not complete: {err}");
            bot.edit_message_text(
                chat_id,
                processing.id,
                texts::edit_error(language, &err.to_string()),
            )
            .await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ChatRole;

    #[test]
    fn delivered_edit_records_one_assistant_entry() {
        let outcome = JobOutcome::Succeeded {
            result_urls: vec!["https://cdn.example/out.png".to_string()],
            cost_time_ms: Some(5000),
        };
        let entry = edit_outcome_history_entry("ru", "сделай небо фиолетовым", &outcome)
            .expect("a delivered edit is recorded");
        assert_eq!(entry.role, ChatRole::Assistant);
        assert!(entry.content.contains("сделай небо фиолетовым"));
    }

    #[test]
    fn failed_edit_leaves_history_untouched() {
        let outcome = JobOutcome::Failed {
            code: Some("500".to_string()),
            message: "bad input".to_string(),
        };
        assert!(edit_outcome_history_entry("ru", "prompt", &outcome).is_none());
    }

    #[test]
    fn edit_without_result_images_leaves_history_untouched() {
        let outcome = JobOutcome::Succeeded {
            result_urls: vec![],
            cost_time_ms: None,
        };
        assert!(edit_outcome_history_entry("ru", "prompt", &outcome).is_none());
    }
}
