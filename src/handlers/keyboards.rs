use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use crate::modes::{ALL_MODES, MODE_CALLBACK_PREFIX};

// Reply-keyboard button labels, matched verbatim in the text dispatcher.
pub const BTN_PROFILE: &str = "👤 Профиль";
pub const BTN_TEXT: &str = "🖋 Текст";
pub const BTN_DESIGN: &str = "🎨 Дизайн";
pub const BTN_SELECT_MODE: &str = "⚙️ Выбрать нейросеть";
pub const BTN_PREMIUM: &str = "💰 Премиум-услуги";

pub const CB_SELECT_MODE: &str = "select_mode";
pub const CB_BUY_SUBSCRIPTION: &str = "buy_subscription";
pub const CB_PROFILE: &str = "profile";
pub const CB_TEXT_MODE: &str = "text_mode";
pub const CB_DESIGN_MODE: &str = "design_mode";
pub const CB_PREMIUM_SERVICES: &str = "premium_services";
pub const CB_SELECT_LANGUAGE: &str = "select_language";
pub const LANG_CALLBACK_PREFIX: &str = "lang_";

/// Persistent reply keyboard shown under the input field.
pub fn main_menu() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![KeyboardButton::new(BTN_PROFILE), KeyboardButton::new(BTN_TEXT)],
        vec![
            KeyboardButton::new(BTN_DESIGN),
            KeyboardButton::new(BTN_SELECT_MODE),
        ],
        vec![KeyboardButton::new(BTN_PREMIUM)],
    ])
    .resize_keyboard()
}

/// One inline button per mode, row each, carrying `mode_<key>` callback data.
pub fn mode_selection() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(ALL_MODES.iter().map(|mode| {
        vec![InlineKeyboardButton::callback(
            mode.label(),
            format!("{MODE_CALLBACK_PREFIX}{}", mode.callback_key()),
        )]
    }))
}

pub fn profile_actions() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "🪙 Купить подписку / 🔋",
            CB_BUY_SUBSCRIPTION,
        )],
        vec![InlineKeyboardButton::callback(
            "🌐 Язык / Language",
            CB_SELECT_LANGUAGE,
        )],
    ])
}

pub fn premium_actions() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "🪙 Купить подписку",
        CB_BUY_SUBSCRIPTION,
    )]])
}

pub fn subscription_options() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "💎 Премиум на месяц - 299 🔋",
            "sub_premium_30d",
        )],
        vec![InlineKeyboardButton::callback(
            "💎 Премиум на год - 2999 🔋",
            "sub_premium_365d",
        )],
        vec![InlineKeyboardButton::callback("🪙 Купить 🔋", "buy_batteries")],
    ])
}

pub fn language_selection() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("🇷🇺 Русский", format!("{LANG_CALLBACK_PREFIX}ru")),
        InlineKeyboardButton::callback("🇬🇧 English", format!("{LANG_CALLBACK_PREFIX}en")),
    ]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::Mode;

    #[test]
    fn mode_keyboard_has_one_row_per_mode() {
        let keyboard = mode_selection();
        assert_eq!(keyboard.inline_keyboard.len(), ALL_MODES.len());
        let first = &keyboard.inline_keyboard[0][0];
        assert_eq!(first.text, Mode::ChatText.label());
    }

    #[test]
    fn main_menu_lists_all_five_actions() {
        let keyboard = main_menu();
        let labels: Vec<&str> = keyboard
            .keyboard
            .iter()
            .flatten()
            .map(|button| button.text.as_str())
            .collect();
        assert_eq!(
            labels,
            vec![BTN_PROFILE, BTN_TEXT, BTN_DESIGN, BTN_SELECT_MODE, BTN_PREMIUM]
        );
    }
}
