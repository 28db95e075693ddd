use std::fmt;

/// The AI capability a session is currently bound to. Routing is exhaustive
/// over this enum; unknown callback payloads fail to parse instead of
/// falling through a default branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    ChatText,
    ImageAnalysis,
    ImageEdit,
    VideoGen,
}

pub const ALL_MODES: [Mode; 4] = [
    Mode::ChatText,
    Mode::ImageAnalysis,
    Mode::ImageEdit,
    Mode::VideoGen,
];

pub const MODE_CALLBACK_PREFIX: &str = "mode_";

impl Mode {
    /// Stable key used in callback payloads (`mode_<key>`).
    pub fn callback_key(self) -> &'static str {
        match self {
            Mode::ChatText => "chat_text",
            Mode::ImageAnalysis => "image_analysis",
            Mode::ImageEdit => "image_edit",
            Mode::VideoGen => "video_gen",
        }
    }

    pub fn from_callback_key(key: &str) -> Option<Self> {
        ALL_MODES
            .iter()
            .copied()
            .find(|mode| mode.callback_key() == key)
    }

    /// User-facing label, kept close to the upstream bot's mode names.
    pub fn label(self) -> &'static str {
        match self {
            Mode::ChatText => "ChatGPT",
            Mode::ImageAnalysis => "Nano Banana",
            Mode::ImageEdit => "Nano Banana Edit (kie.ai)",
            Mode::VideoGen => "Sora 2",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_keys_round_trip() {
        for mode in ALL_MODES {
            assert_eq!(Mode::from_callback_key(mode.callback_key()), Some(mode));
        }
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert_eq!(Mode::from_callback_key("quantum_poetry"), None);
        assert_eq!(Mode::from_callback_key(""), None);
    }
}
