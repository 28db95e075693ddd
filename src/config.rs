use std::env;

use once_cell::sync::Lazy;

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub log_level: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub chat_max_tokens: u32,
    pub chat_temperature: f32,
    pub enable_openrouter: bool,
    pub openrouter_api_key: String,
    pub openrouter_base_url: String,
    pub openrouter_model: String,
    pub enable_kie: bool,
    pub kie_api_key: String,
    pub kie_base_url: String,
    pub kie_model: String,
    pub kie_poll_interval_ms: u64,
    pub kie_max_wait_ms: u64,
    pub kie_transport_retries: u32,
    pub kie_output_format: String,
    pub kie_image_size: String,
    pub free_daily_limit: i64,
    pub premium_daily_limit: i64,
    pub history_cap: usize,
    pub history_window: usize,
    pub default_language: String,
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::load);

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .map(|value| value.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_f32(name: &str, default: f32) -> f32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<f32>().ok())
        .unwrap_or(default)
}

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_i64(name: &str, default: i64) -> i64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<i64>().ok())
        .unwrap_or(default)
}

impl Config {
    fn load() -> Self {
        Config {
            bot_token: env_string("BOT_TOKEN", ""),
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            database_url: env_string("DATABASE_URL", "sqlite://bot.db?mode=rwc"),
            db_max_connections: env_u32("DB_MAX_CONNECTIONS", 20),
            openai_api_key: env_string("OPENAI_API_KEY", ""),
            openai_base_url: env_string("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            openai_model: env_string("OPENAI_MODEL", "gpt-3.5-turbo"),
            chat_max_tokens: env_u32("CHAT_MAX_TOKENS", 1000),
            chat_temperature: env_f32("CHAT_TEMPERATURE", 0.7),
            enable_openrouter: env_bool("OPENROUTER", false),
            openrouter_api_key: env_string("OPENROUTER_API_KEY", ""),
            openrouter_base_url: env_string("OPENROUTER_BASE_URL", "https://openrouter.ai/api/v1"),
            openrouter_model: env_string(
                "NANO_OPENROUTER_MODEL_NAME",
                "google/gemini-2.5-flash-image",
            ),
            enable_kie: env_bool("KIE_AI_ENABLED", false),
            kie_api_key: env_string("KIE_AI_API_KEY", ""),
            kie_base_url: env_string("KIE_AI_BASE_URL", "https://api.kie.ai/api/v1/jobs"),
            kie_model: env_string("KIE_AI_MODEL", "google/nano-banana-edit"),
            kie_poll_interval_ms: env_u64("KIE_AI_POLL_INTERVAL", 2000),
            kie_max_wait_ms: env_u64("KIE_AI_MAX_WAIT_TIME", 120_000),
            kie_transport_retries: env_u32("KIE_AI_TRANSPORT_RETRIES", 0),
            kie_output_format: env_string("KIE_AI_OUTPUT_FORMAT", "png"),
            kie_image_size: env_string("KIE_AI_IMAGE_SIZE", "1:1"),
            free_daily_limit: env_i64("FREE_DAILY_LIMIT", 25),
            premium_daily_limit: env_i64("PREMIUM_DAILY_LIMIT", 1000),
            history_cap: env_usize("CONVERSATION_HISTORY_CAP", 50),
            history_window: env_usize("CONVERSATION_HISTORY_WINDOW", 10),
            default_language: env_string("DEFAULT_LANGUAGE", "ru"),
        }
    }
}
