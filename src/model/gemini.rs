use super::{ModelClient, types::*};
use crate::{Error, Result, config::ModelConfig, imaging::ImagePart};
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Native Gemini REST client.
pub struct GeminiClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    temperature: Option<f32>,
}

impl GeminiClient {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let base = config.base_url.trim().trim_end_matches('/');
        let api_base = if base.is_empty() {
            DEFAULT_API_BASE.to_string()
        } else {
            base.to_string()
        };

        Ok(Self {
            http: reqwest::Client::builder().build()?,
            api_base,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    pub fn endpoint(&self) -> String {
        let model = self.model.trim();
        let model_path = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    fn build_request(&self, prompt: &str, image: &ImagePart) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![
                    GeminiPart::Text {
                        text: prompt.to_string(),
                    },
                    GeminiPart::InlineData {
                        inline_data: GeminiInlineData {
                            mime_type: image.mime_type.clone(),
                            data: image.data.clone(),
                        },
                    },
                ],
            }],
            generation_config: self
                .temperature
                .map(|temperature| GenerationConfig { temperature }),
        }
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str, image: &ImagePart) -> Result<String> {
        let url = self.endpoint();
        debug!("Calling Gemini generateContent at {}", url);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.build_request(prompt, image))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::model(upstream_error_message(status, &body)));
        }

        let payload: GenerateContentResponse = response.json().await?;
        let text = response_text(payload)?;
        debug!("Gemini returned {} characters", text.len());
        Ok(text)
    }
}

fn upstream_error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<GeminiErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => {
            format!("[{}] {}", status, envelope.error.message)
        }
        _ if body.trim().is_empty() => format!("[{}]", status),
        _ => format!("[{}] {}", status, body.trim()),
    }
}

/// Concatenated text of the first candidate, or an error when the model gave none.
pub fn response_text(payload: GenerateContentResponse) -> Result<String> {
    let Some(candidate) = payload.candidates.into_iter().next() else {
        let reason = payload
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason);
        return Err(match reason {
            Some(reason) => Error::model(format!("Prompt was blocked due to {}", reason)),
            None => Error::model("Model returned no candidates"),
        });
    };

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "UNKNOWN".to_string());
        return Err(Error::model(format!(
            "Model returned no text (finish reason: {})",
            reason
        )));
    }
    Ok(text)
}
