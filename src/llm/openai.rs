use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::CONFIG;
use crate::error::ProviderError;
use crate::llm::summarize_error_body;
use crate::session::ChatEntry;
use crate::utils::http::get_http_client;

/// Chat completion over the recent dialogue window. The caller decides how
/// much history to hand over; this function sends exactly what it is given.
pub async fn chat_completion(history: &[ChatEntry]) -> Result<String, ProviderError> {
    if CONFIG.openai_api_key.is_empty() {
        return Err(ProviderError::Unavailable("OpenAI"));
    }

    let messages: Vec<Value> = history
        .iter()
        .map(|entry| {
            json!({
                "role": entry.role.as_str(),
                "content": entry.content,
            })
        })
        .collect();

    let payload = json!({
        "model": CONFIG.openai_model,
        "messages": messages,
        "max_tokens": CONFIG.chat_max_tokens,
        "temperature": CONFIG.chat_temperature,
    });

    debug!(
        "OpenAI request: model={}, messages={}",
        CONFIG.openai_model,
        history.len()
    );

    let response = get_http_client()
        .post(format!(
            "{}/chat/completions",
            CONFIG.openai_base_url.trim_end_matches('/')
        ))
        .header("Authorization", format!("Bearer {}", CONFIG.openai_api_key))
        .json(&payload)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let (message, body_summary) = summarize_error_body(&body);
        warn!("OpenAI API error: status={status}, body={body_summary}");
        return Err(ProviderError::Remote {
            status,
            detail: message.unwrap_or(body_summary),
        });
    }

    let value = response.json::<Value>().await?;
    let content = value
        .pointer("/choices/0/message/content")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .trim()
        .to_string();

    if content.is_empty() {
        warn!("OpenAI response had no message content");
    }
    Ok(content)
}
