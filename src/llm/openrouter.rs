use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::CONFIG;
use crate::error::ProviderError;
use crate::llm::{summarize_error_body, ProviderReply};
use crate::utils::http::get_http_client;

/// Reads the reply out of a chat-completion message, preferring attached
/// images over multi-part content over a plain string body. Models that
/// return generated images use the top-level `images` array; vision models
/// answering about an input image usually return plain text.
pub fn extract_message_reply(message: &Value) -> ProviderReply {
    if let Some(images) = message.get("images").and_then(|v| v.as_array()) {
        let urls: Vec<String> = images
            .iter()
            .filter(|img| img.get("type").and_then(|v| v.as_str()) == Some("image_url"))
            .filter_map(|img| img.pointer("/image_url/url").and_then(|v| v.as_str()))
            .map(|url| url.to_string())
            .collect();
        if !urls.is_empty() {
            let text = message
                .get("content")
                .and_then(|v| v.as_str())
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string());
            return ProviderReply {
                text,
                image_urls: urls,
            };
        }
    }

    if let Some(parts) = message.get("content").and_then(|v| v.as_array()) {
        let text = parts
            .iter()
            .find(|part| part.get("type").and_then(|v| v.as_str()) == Some("text"))
            .and_then(|part| part.get("text").and_then(|v| v.as_str()))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());
        let image_urls: Vec<String> = parts
            .iter()
            .filter(|part| {
                matches!(
                    part.get("type").and_then(|v| v.as_str()),
                    Some("output_image") | Some("image_url") | Some("image")
                )
            })
            .filter_map(|part| part.pointer("/image_url/url").and_then(|v| v.as_str()))
            .map(|url| url.to_string())
            .collect();
        return ProviderReply { text, image_urls };
    }

    let text = message
        .get("content")
        .and_then(|v| v.as_str())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());
    ProviderReply {
        text,
        image_urls: Vec::new(),
    }
}

fn build_user_content(prompt: &str, images: &[Vec<u8>]) -> Value {
    if images.is_empty() {
        return Value::String(prompt.to_string());
    }

    let mut parts = vec![json!({ "type": "text", "text": prompt })];
    for image in images {
        // Telegram photos are always re-encoded as JPEG
        let encoded = general_purpose::STANDARD.encode(image);
        parts.push(json!({
            "type": "image_url",
            "image_url": { "url": format!("data:image/jpeg;base64,{encoded}") }
        }));
    }
    Value::Array(parts)
}

async fn call_api(payload: &Value) -> Result<Value, ProviderError> {
    let response = get_http_client()
        .post(format!(
            "{}/chat/completions",
            CONFIG.openrouter_base_url.trim_end_matches('/')
        ))
        .header(
            "Authorization",
            format!("Bearer {}", CONFIG.openrouter_api_key),
        )
        .header("HTTP-Referer", "https://t.me/gemini_assistant_bot")
        .header("X-Title", "Gemini Assistant Bot")
        .json(payload)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let (message, body_summary) = summarize_error_body(&body);
        warn!("OpenRouter API error: status={status}, body={body_summary}");
        return Err(ProviderError::Remote {
            status,
            detail: message.unwrap_or(body_summary),
        });
    }

    Ok(response.json::<Value>().await?)
}

/// Single-turn request to the image-capable model. `images` may be empty
/// (prompt-only generation) or carry input photos for analysis.
pub async fn image_model_reply(
    prompt: &str,
    images: &[Vec<u8>],
) -> Result<ProviderReply, ProviderError> {
    if !CONFIG.enable_openrouter || CONFIG.openrouter_api_key.is_empty() {
        return Err(ProviderError::Unavailable("OpenRouter"));
    }

    let payload = json!({
        "model": CONFIG.openrouter_model,
        "messages": [
            { "role": "user", "content": build_user_content(prompt, images) }
        ],
        "max_tokens": CONFIG.chat_max_tokens,
        "temperature": CONFIG.chat_temperature,
    });

    debug!(
        "OpenRouter request: model={}, input_images={}",
        CONFIG.openrouter_model,
        images.len()
    );

    let value = call_api(&payload).await?;
    let message = value
        .pointer("/choices/0/message")
        .cloned()
        .unwrap_or(Value::Null);
    Ok(extract_message_reply(&message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn images_array_wins_over_string_content() {
        let message = json!({
            "content": "here is your picture",
            "images": [
                { "type": "image_url", "image_url": { "url": "data:image/png;base64,AAAA" } }
            ]
        });
        let reply = extract_message_reply(&message);
        assert_eq!(reply.image_urls, vec!["data:image/png;base64,AAAA"]);
        assert_eq!(reply.text.as_deref(), Some("here is your picture"));
    }

    #[test]
    fn content_parts_yield_text_and_image() {
        let message = json!({
            "content": [
                { "type": "text", "text": "a red fox" },
                { "type": "output_image", "image_url": { "url": "https://cdn.example/fox.png" } }
            ]
        });
        let reply = extract_message_reply(&message);
        assert_eq!(reply.text.as_deref(), Some("a red fox"));
        assert_eq!(reply.image_urls, vec!["https://cdn.example/fox.png"]);
    }

    #[test]
    fn plain_string_content_is_text_only() {
        let message = json!({ "content": "just words" });
        let reply = extract_message_reply(&message);
        assert_eq!(reply.text.as_deref(), Some("just words"));
        assert!(reply.image_urls.is_empty());
    }

    #[test]
    fn empty_message_yields_empty_reply() {
        assert!(extract_message_reply(&Value::Null).is_empty());
        assert!(extract_message_reply(&json!({ "content": "   " })).is_empty());
    }

    #[test]
    fn user_content_with_images_becomes_part_array() {
        let content = build_user_content("describe", &[vec![1, 2, 3]]);
        let parts = content.as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["type"], "text");
        let url = parts[1]["image_url"]["url"].as_str().unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));
    }
}
