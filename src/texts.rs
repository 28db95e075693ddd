//! Localized user-facing strings (Russian default, English fallback),
//! ported from the upstream bot's string table.

pub fn is_english(language: &str) -> bool {
    language
        .split('-')
        .next()
        .map(|primary| primary.eq_ignore_ascii_case("en"))
        .unwrap_or(false)
}

pub fn welcome(language: &str) -> &'static str {
    if is_english(language) {
        "👋 Welcome to GeminiAI!\n\nI can help you with:\n🤖 AI Chat\n🎨 Image Editing\n📝 Text Processing\n\nSelect a mode from the menu below:"
    } else {
        "👋 Добро пожаловать в GeminiAI!\n\nЯ могу помочь вам с:\n🤖 Чатом с ИИ\n🎨 Редактированием изображений\n📝 Работой с текстом\n\nВыберите режим в меню ниже:"
    }
}

pub fn menu(language: &str) -> &'static str {
    if is_english(language) {
        "🎯 Main Menu\n\nChoose an action:"
    } else {
        "🎯 Главное меню\n\nВыберите действие:"
    }
}

pub fn no_mode_selected(language: &str) -> &'static str {
    if is_english(language) {
        "❌ No mode selected. Please select a mode from the menu below."
    } else {
        "❌ У вас не выбран режим. Пожалуйста, выберите режим в меню снизу."
    }
}

pub fn select_mode(language: &str) -> &'static str {
    if is_english(language) {
        "🤖 Choose a neural network to work with:"
    } else {
        "🤖 Выберите нейросеть для работы:"
    }
}

pub fn mode_selected(language: &str, mode_label: &str) -> String {
    if is_english(language) {
        format!("✅ Mode \"{mode_label}\" selected!")
    } else {
        format!("✅ Режим \"{mode_label}\" выбран!")
    }
}

pub fn mode_not_found(language: &str) -> &'static str {
    if is_english(language) {
        "❌ Mode not found."
    } else {
        "❌ Режим не найден."
    }
}

pub fn text_mode_ready(language: &str, mode_label: &str) -> String {
    if is_english(language) {
        format!("✅ \"Text\" mode activated!\n\nCurrent model: {mode_label}\n\nSend me a text message and I will help you with it.")
    } else {
        format!("✅ Режим \"Текст\" активирован!\n\nТекущая модель: {mode_label}\n\nОтправьте мне текстовое сообщение, и я помогу вам с ним.")
    }
}

pub fn design_mode_ready(language: &str, mode_label: &str) -> String {
    if is_english(language) {
        format!("✅ \"Design\" mode activated!\n\nCurrent model: {mode_label}\n\nDescribe what you want to create.")
    } else {
        format!("✅ Режим \"Дизайн\" активирован!\n\nТекущая модель: {mode_label}\n\nОпишите, что вы хотите создать.")
    }
}

pub fn new_dialogue(language: &str) -> &'static str {
    if is_english(language) {
        "💬 Dialogue updated, continue communicating!"
    } else {
        "💬 Диалог обновлён, продолжайте общаться!"
    }
}

pub fn daily_limit_reached(language: &str, limit: i64) -> String {
    if is_english(language) {
        format!("⚠️ You have reached the daily request limit ({limit}).\n\n💎 Buy premium to increase the limit.")
    } else {
        format!("⚠️ Вы достигли дневного лимита запросов ({limit}).\n\n💎 Купите премиум для увеличения лимита.")
    }
}

pub fn ai_error(language: &str) -> &'static str {
    if is_english(language) {
        "❌ An error occurred while generating the response. Try again."
    } else {
        "❌ Произошла ошибка при генерации ответа. Попробуйте ещё раз."
    }
}

pub fn chat_provider_error(language: &str) -> &'static str {
    if is_english(language) {
        "❌ ChatGPT connection error. Try another mode."
    } else {
        "❌ Ошибка подключения к ChatGPT. Попробуйте другой режим."
    }
}

pub fn kie_disabled(language: &str) -> &'static str {
    if is_english(language) {
        "❌ kie.ai is disabled. Check settings in .env file."
    } else {
        "❌ kie.ai отключен. Проверьте настройки в .env файле."
    }
}

pub fn kie_needs_image(language: &str) -> &'static str {
    if is_english(language) {
        "📸 <b>Image required for editing</b>\n\n💡 <b>How to use Nano Banana Edit:</b>\n1. Send an image\n2. Add a caption describing the changes you want\n\n<b>Example:</b>\n📷 [send photo]\n✏️ Caption: \"Make background blue and add sun\""
    } else {
        "📸 <b>Для редактирования нужно изображение</b>\n\n💡 <b>Как использовать Nano Banana Edit:</b>\n1. Отправьте изображение\n2. В подписи к изображению опишите, как вы хотите его изменить\n\n<b>Пример:</b>\n📷 [отправить фото]\n✏️ Подпись: \"Сделай фон синим и добавь солнце\""
    }
}

pub fn edit_processing(language: &str) -> &'static str {
    if is_english(language) {
        "🎨 Editing the image with Nano Banana Edit (kie.ai)..."
    } else {
        "🎨 Редактирую изображение через Nano Banana Edit (kie.ai)..."
    }
}

pub fn edit_task_created(language: &str, task_id: &str) -> String {
    if is_english(language) {
        format!("⏳ Task created (ID: {task_id})\nWaiting for the result...")
    } else {
        format!("⏳ Задача создана (ID: {task_id})\nОжидание результата...")
    }
}

pub fn edit_failed(language: &str, code: &str, message: &str) -> String {
    if is_english(language) {
        format!("❌ Edit failed:\nCode: {code}\nMessage: {message}")
    } else {
        format!("❌ Ошибка редактирования:\nКод: {code}\nСообщение: {message}")
    }
}

pub fn edit_no_images(language: &str) -> &'static str {
    if is_english(language) {
        "❌ The image was not processed"
    } else {
        "❌ Изображение не было обработано"
    }
}

pub fn edit_result_caption(language: &str, prompt: &str, cost_time_ms: Option<u64>) -> String {
    let mut caption = if is_english(language) {
        format!("🍌 Nano Banana Edit (kie.ai)\n\n📝 Changes: {prompt}")
    } else {
        format!("🍌 Nano Banana Edit (kie.ai)\n\n📝 Изменения: {prompt}")
    };
    if let Some(elapsed) = cost_time_ms {
        if is_english(language) {
            caption.push_str(&format!("\n⏱️ Processing time: {elapsed}ms"));
        } else {
            caption.push_str(&format!("\n⏱️ Время обработки: {elapsed}ms"));
        }
    }
    caption
}

pub fn edit_history_entry(language: &str, prompt: &str) -> String {
    if is_english(language) {
        format!("Image edited: \"{prompt}\"")
    } else {
        format!("Изображение отредактировано: \"{prompt}\"")
    }
}

pub fn edit_error(language: &str, detail: &str) -> String {
    if is_english(language) {
        format!("❌ kie.ai editing error:\n{detail}")
    } else {
        format!("❌ Ошибка при редактировании через kie.ai:\n{detail}")
    }
}

pub fn edit_mode_hint(language: &str) -> &'static str {
    if is_english(language) {
        "\n\n💡 <b>How to use:</b>\n1. Send an image\n2. Describe the desired changes in the caption\n\n📸 Up to 10 images at a time (up to 10MB each)"
    } else {
        "\n\n💡 <b>Как использовать:</b>\n1. Отправьте изображение\n2. В подписи к изображению опишите, как вы хотите его изменить\n\n📸 Поддерживается до 10 изображений за раз (до 10MB каждое)"
    }
}

pub fn analysis_mode_hint(language: &str) -> &'static str {
    if is_english(language) {
        "\n\n💡 <b>Capabilities:</b>\n• Image analysis\n• Image generation\n• Text replies\n\n📸 Send photos with a caption for analysis."
    } else {
        "\n\n💡 <b>Возможности:</b>\n• Анализ изображений\n• Генерация изображений\n• Текстовые ответы\n\n📸 Можете отправлять фотографии с подписью для анализа."
    }
}

pub fn nano_quick_reply(language: &str, prompt: &str) -> String {
    if is_english(language) {
        format!("🍌 Nano Banana: Quick reply to \"{prompt}\"")
    } else {
        format!("🍌 Nano Banana: Быстрый ответ на \"{prompt}\"")
    }
}

pub fn nano_prefixed(text: &str) -> String {
    format!("🍌 Nano Banana: {text}")
}

pub fn image_sent(language: &str) -> &'static str {
    if is_english(language) {
        "Image sent"
    } else {
        "Изображение отправлено"
    }
}

pub fn no_response(language: &str) -> &'static str {
    if is_english(language) {
        "No response from the model"
    } else {
        "Нет ответа от модели"
    }
}

pub fn default_edit_prompt(language: &str) -> &'static str {
    if is_english(language) {
        "Edit this image"
    } else {
        "Отредактируй это изображение"
    }
}

pub fn default_analysis_prompt(language: &str) -> &'static str {
    if is_english(language) {
        "Describe the image"
    } else {
        "Опишите изображение"
    }
}

pub fn language_set(language: &str) -> &'static str {
    if is_english(language) {
        "🌐 Language switched to English."
    } else {
        "🌐 Язык переключён на русский."
    }
}

pub fn select_language(language: &str) -> &'static str {
    if is_english(language) {
        "🌐 Choose your language:"
    } else {
        "🌐 Выберите язык:"
    }
}

pub fn help(language: &str) -> &'static str {
    if is_english(language) {
        "❓ <b>Help</b>\n\n<b>Available commands:</b>\n/menu - Main menu\n/profile - Your profile\n/info - Bot information\n/newdialogue - New dialogue\n/help - Help\n\n<b>Operating modes:</b>\n🤖 <b>ChatGPT</b> - Universal AI assistant\n🍌 <b>Nano Banana</b> - Image analysis (OpenRouter)\n✏️ <b>Nano Banana Edit (kie.ai)</b> - Image editing\n🎬 <b>Sora 2</b> - Video generation"
    } else {
        "❓ <b>Помощь</b>\n\n<b>Доступные команды:</b>\n/menu - Главное меню\n/profile - Ваш профиль\n/info - Информация о боте\n/newdialogue - Новый диалог\n/help - Помощь\n\n<b>Режимы работы:</b>\n🤖 <b>ChatGPT</b> - Универсальный ИИ-ассистент\n🍌 <b>Nano Banana</b> - Анализ изображений (OpenRouter)\n✏️ <b>Nano Banana Edit (kie.ai)</b> - Редактирование изображений\n🎬 <b>Sora 2</b> - Генерация видео"
    }
}

pub fn info(language: &str) -> &'static str {
    if is_english(language) {
        "ℹ️ <b>Bot Information</b>\n\n<b>GeminiAI</b> - multifunctional AI bot\n\n<b>Capabilities:</b>\n• Text generation\n• AI-powered image editing (kie.ai)\n• Image analysis (OpenRouter)\n• Code work\n• Idea generation\n• Learning assistance\n\n<b>Models:</b>\n• ChatGPT (GPT-4)\n• Nano Banana (OpenRouter) - analysis\n• Nano Banana Edit (kie.ai) - editing\n• Sora 2 (video)\n\n<b>Premium:</b>\n• Increased limits\n• Priority support\n• Additional features"
    } else {
        "ℹ️ <b>Информация о боте</b>\n\n<b>GeminiAI</b> - многофункциональный ИИ-бот\n\n<b>Возможности:</b>\n• Текстовая генерация\n• Редактирование изображений через ИИ (kie.ai)\n• Анализ изображений (OpenRouter)\n• Работа с кодом\n• Генерация идей\n• Помощь в обучении\n\n<b>Модели:</b>\n• ChatGPT (GPT-4)\n• Nano Banana (OpenRouter) - анализ\n• Nano Banana Edit (kie.ai) - редактирование\n• Sora 2 (видео)\n\n<b>Премиум:</b>\n• Увеличенные лимиты\n• Приоритетная поддержка\n• Дополнительные функции"
    }
}

pub fn premium_services(language: &str) -> &'static str {
    if is_english(language) {
        "💎 <b>Premium Services</b>\n\n<b>Premium benefits:</b>\n• Up to 1000 requests per day\n• Priority processing\n• Access to all models\n• Extended limits\n\n💰 Choose a subscription below:"
    } else {
        "💎 <b>Премиум-услуги</b>\n\n<b>Преимущества премиума:</b>\n• До 1000 запросов в день\n• Приоритетная обработка\n• Доступ ко всем моделям\n• Расширенные лимиты\n\n💰 Выберите подписку ниже:"
    }
}

pub fn subscription_options(language: &str) -> &'static str {
    if is_english(language) {
        "💎 <b>Subscriptions</b>\n\nChoose a subscription:\n\n📅 <b>For a month</b> - 299 🔋\n• 1000 requests/day\n• All models\n• Priority support\n\n📅 <b>For a year</b> - 2999 🔋\n• Save 589 🔋\n• All benefits of monthly subscription"
    } else {
        "💎 <b>Подписки</b>\n\nВыберите подписку:\n\n📅 <b>На месяц</b> - 299 🔋\n• 1000 запросов/день\n• Все модели\n• Приоритетная поддержка\n\n📅 <b>На год</b> - 2999 🔋\n• Экономия 589 🔋\n• Все преимущества месячной подписки"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_tag_prefix_selects_english() {
        assert!(welcome("en-US").starts_with("👋 Welcome"));
        assert!(welcome("en").starts_with("👋 Welcome"));
    }

    #[test]
    fn unknown_languages_fall_back_to_russian() {
        assert!(welcome("de").starts_with("👋 Добро"));
        assert!(welcome("").starts_with("👋 Добро"));
    }

    #[test]
    fn edit_caption_omits_the_time_line_when_unreported() {
        let with_time = edit_result_caption("ru", "синий фон", Some(8421));
        assert!(with_time.contains("8421ms"));

        let without_time = edit_result_caption("ru", "синий фон", None);
        assert!(!without_time.contains("⏱️"));
        assert!(without_time.contains("синий фон"));
    }

    #[test]
    fn limit_message_names_the_ceiling() {
        assert!(daily_limit_reached("ru", 25).contains("(25)"));
        assert!(daily_limit_reached("en", 1000).contains("(1000)"));
    }
}
