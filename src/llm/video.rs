use crate::texts;

/// Video generation is not wired to a real backend; the reply acknowledges
/// the request and states that generation is unavailable.
pub fn simulated_video_reply(language: &str, prompt: &str) -> String {
    if texts::is_english(language) {
        format!(
            "🎬 Sora 2: A video will be generated for \"{prompt}\"\n\n\
             ⚠️ Video generation is temporarily unavailable"
        )
    } else {
        format!(
            "🎬 Sora 2: Видео будет сгенерировано по запросу \"{prompt}\"\n\n\
             ⚠️ Видеогенерация временно недоступна"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_echoes_the_prompt() {
        let reply = simulated_video_reply("ru", "закат над морем");
        assert!(reply.contains("закат над морем"));
        assert!(reply.contains("недоступна"));
    }

    #[test]
    fn english_sessions_get_english_text() {
        let reply = simulated_video_reply("en-US", "a sunset");
        assert!(reply.contains("a sunset"));
        assert!(reply.contains("unavailable"));
    }
}
