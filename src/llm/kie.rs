use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::CONFIG;
use crate::error::ProviderError;
use crate::jobs::{JobStatus, JobStatusSource, PollSettings};
use crate::llm::summarize_error_body;
use crate::utils::http::get_http_client;

const MAX_INPUT_IMAGES: usize = 10;

/// Client for the kie.ai asynchronous job API. Task creation and status
/// lookups are separate calls; completion is driven by the generic poller.
#[derive(Debug, Clone)]
pub struct KieAiClient {
    api_key: String,
    base_url: String,
    model: String,
    output_format: String,
    image_size: String,
}

impl KieAiClient {
    /// `None` when the integration is switched off or has no API key.
    pub fn from_config() -> Option<Self> {
        if !CONFIG.enable_kie || CONFIG.kie_api_key.is_empty() {
            return None;
        }
        Some(KieAiClient {
            api_key: CONFIG.kie_api_key.clone(),
            base_url: CONFIG.kie_base_url.trim_end_matches('/').to_string(),
            model: CONFIG.kie_model.clone(),
            output_format: CONFIG.kie_output_format.clone(),
            image_size: CONFIG.kie_image_size.clone(),
        })
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: std::time::Duration::from_millis(CONFIG.kie_poll_interval_ms),
            max_wait: std::time::Duration::from_millis(CONFIG.kie_max_wait_ms),
            transport_retries: CONFIG.kie_transport_retries,
        }
    }

    /// Submits an edit job and returns its task id.
    pub async fn create_task(
        &self,
        prompt: &str,
        image_urls: &[String],
    ) -> Result<String, ProviderError> {
        if image_urls.is_empty() {
            return Err(ProviderError::InvalidInput(
                "at least one input image is required".to_string(),
            ));
        }
        if image_urls.len() > MAX_INPUT_IMAGES {
            return Err(ProviderError::InvalidInput(format!(
                "at most {MAX_INPUT_IMAGES} input images are accepted, got {}",
                image_urls.len()
            )));
        }

        let payload = json!({
            "model": self.model,
            "input": {
                "prompt": prompt,
                "image_urls": image_urls,
                "output_format": self.output_format,
                "image_size": self.image_size,
            }
        });

        debug!(
            "kie.ai createTask: model={}, images={}",
            self.model,
            image_urls.len()
        );

        let response = get_http_client()
            .post(format!("{}/createTask", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            let (message, body_summary) = summarize_error_body(&body);
            warn!("kie.ai createTask error: status={status}, body={body_summary}");
            return Err(ProviderError::Remote {
                status,
                detail: message.unwrap_or(body_summary),
            });
        }

        let value = response.json::<Value>().await?;
        check_envelope_code(&value)?;

        let task_id = value
            .pointer("/data/taskId")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ProviderError::Remote {
                status,
                detail: "createTask response carried no taskId".to_string(),
            })?;
        debug!("kie.ai task created: {task_id}");
        Ok(task_id.to_string())
    }
}

/// The API wraps every payload in `{code, msg, data}` and reports its own
/// failures with a non-200 code inside an HTTP 200 response.
fn check_envelope_code(value: &Value) -> Result<(), ProviderError> {
    let code = value.get("code").and_then(|v| v.as_i64()).unwrap_or(0);
    if code == 200 {
        return Ok(());
    }
    let detail = value
        .get("msg")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown provider error")
        .to_string();
    Err(ProviderError::Remote {
        status: code.clamp(0, u16::MAX as i64) as u16,
        detail,
    })
}

/// Maps one recordInfo envelope onto a job status. Any state other than
/// `success` or `fail` means the job is still running.
fn parse_record(value: &Value) -> Result<JobStatus, ProviderError> {
    check_envelope_code(value)?;
    let data = value.get("data").cloned().unwrap_or(Value::Null);

    match data.get("state").and_then(|v| v.as_str()) {
        Some("success") => {
            // resultJson is a JSON document nested inside a string field
            let result_json = data
                .get("resultJson")
                .and_then(|v| v.as_str())
                .unwrap_or("{}");
            let result: Value = serde_json::from_str(result_json).unwrap_or(Value::Null);
            let result_urls = result
                .get("resultUrls")
                .and_then(|v| v.as_array())
                .map(|urls| {
                    urls.iter()
                        .filter_map(|v| v.as_str())
                        .map(|s| s.to_string())
                        .collect()
                })
                .unwrap_or_default();
            let cost_time_ms = data.get("costTime").and_then(|v| v.as_u64());
            Ok(JobStatus::Succeeded {
                result_urls,
                cost_time_ms,
            })
        }
        Some("fail") => {
            let code = data.get("failCode").and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            });
            let message = data
                .get("failMsg")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown failure")
                .to_string();
            Ok(JobStatus::Failed { code, message })
        }
        _ => Ok(JobStatus::Pending),
    }
}

impl JobStatusSource for KieAiClient {
    async fn job_status(&self, task_id: &str) -> Result<JobStatus, ProviderError> {
        let response = get_http_client()
            .get(format!("{}/recordInfo", self.base_url))
            .query(&[("taskId", task_id)])
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let (message, body_summary) = summarize_error_body(&body);
            warn!("kie.ai recordInfo error: status={status}, body={body_summary}");
            return Err(ProviderError::Remote {
                status,
                detail: message.unwrap_or(body_summary),
            });
        }

        let value = response.json::<Value>().await?;
        parse_record(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_record_unpacks_nested_result_json() {
        let record = json!({
            "code": 200,
            "data": {
                "state": "success",
                "resultJson": "{\"resultUrls\":[\"https://cdn.example/a.png\",\"https://cdn.example/b.png\"]}",
                "costTime": 8421
            }
        });
        assert_eq!(
            parse_record(&record).unwrap(),
            JobStatus::Succeeded {
                result_urls: vec![
                    "https://cdn.example/a.png".to_string(),
                    "https://cdn.example/b.png".to_string(),
                ],
                cost_time_ms: Some(8421),
            }
        );
    }

    #[test]
    fn success_without_result_urls_is_still_terminal() {
        let record = json!({
            "code": 200,
            "data": { "state": "success", "resultJson": "{}" }
        });
        assert_eq!(
            parse_record(&record).unwrap(),
            JobStatus::Succeeded {
                result_urls: vec![],
                cost_time_ms: None,
            }
        );
    }

    #[test]
    fn fail_record_carries_code_and_message() {
        let record = json!({
            "code": 200,
            "data": { "state": "fail", "failCode": 422, "failMsg": "content policy" }
        });
        assert_eq!(
            parse_record(&record).unwrap(),
            JobStatus::Failed {
                code: Some("422".to_string()),
                message: "content policy".to_string(),
            }
        );
    }

    #[test]
    fn unknown_states_are_pending() {
        for state in ["waiting", "queuing", "generating", ""] {
            let record = json!({ "code": 200, "data": { "state": state } });
            assert_eq!(parse_record(&record).unwrap(), JobStatus::Pending);
        }
        let no_state = json!({ "code": 200, "data": {} });
        assert_eq!(parse_record(&no_state).unwrap(), JobStatus::Pending);
    }

    #[test]
    fn envelope_error_code_is_a_provider_error() {
        let record = json!({ "code": 501, "msg": "record not found" });
        let err = parse_record(&record).unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Remote { status: 501, ref detail } if detail == "record not found"
        ));
    }

    #[test]
    fn malformed_result_json_degrades_to_no_urls() {
        let record = json!({
            "code": 200,
            "data": { "state": "success", "resultJson": "not json" }
        });
        assert_eq!(
            parse_record(&record).unwrap(),
            JobStatus::Succeeded {
                result_urls: vec![],
                cost_time_ms: None,
            }
        );
    }
}
