pub mod callbacks;
pub mod commands;
pub mod dispatch;
pub mod keyboards;

use teloxide::types::Message;

use crate::db::UserProfile;

/// Builds the store-facing profile from a Telegram message sender.
/// Messages without a sender (channel posts) yield `None`.
pub fn user_profile_from(message: &Message) -> Option<UserProfile> {
    let user = message.from.as_ref()?;
    let telegram_id = i64::try_from(user.id.0).ok()?;
    Some(UserProfile {
        telegram_id,
        username: user.username.clone(),
        first_name: Some(user.first_name.clone()),
        last_name: user.last_name.clone(),
        language_code: user.language_code.clone(),
    })
}
