use async_trait::async_trait;
use recall_core::{RecallError, Result};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use crate::provider::*;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini `generateContent` backend.
pub struct GeminiGenerator {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    settings: GenerationSettings,
}

impl GeminiGenerator {
    pub fn new(api_key: String, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.into(),
            model: model.into(),
            settings: GenerationSettings::default(),
        }
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn build_request_body(&self, prompt: &str) -> Value {
        let mut body = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }],
            }],
        });

        let mut generation_config = serde_json::Map::new();
        if let Some(t) = self.settings.temperature {
            generation_config.insert("temperature".into(), serde_json::json!(t));
        }
        if let Some(n) = self.settings.max_output_tokens {
            generation_config.insert("maxOutputTokens".into(), serde_json::json!(n));
        }
        if !generation_config.is_empty() {
            body["generationConfig"] = Value::Object(generation_config);
        }
        body
    }
}

/// Pull the reply text out of a `generateContent` response body.
pub fn extract_text(data: &Value) -> Result<String> {
    if let Some(err) = data.get("error") {
        let message = err["message"].as_str().unwrap_or("unknown error");
        return Err(RecallError::Generation(format!("API error: {message}")));
    }

    if let Some(reason) = data["promptFeedback"]["blockReason"].as_str() {
        return Err(RecallError::Generation(format!("prompt blocked: {reason}")));
    }

    let candidate = &data["candidates"][0];
    let text: String = candidate["content"]["parts"]
        .as_array()
        .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
        .unwrap_or_default();

    if text.is_empty() {
        let reason = candidate["finishReason"].as_str().unwrap_or("no candidates");
        return Err(RecallError::Generation(format!(
            "response contained no text ({reason})"
        )));
    }
    Ok(text)
}

#[async_trait]
impl Generator for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = self.build_request_body(prompt);
        debug!(model = %self.model, prompt_chars = prompt.len(), "sending generateContent request");

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RecallError::Generation(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(RecallError::Generation(format!("HTTP {status}: {text}")));
        }

        let data: Value = resp
            .json()
            .await
            .map_err(|e| RecallError::Generation(e.to_string()))?;

        extract_text(&data)
    }

    async fn health_check(&self) -> Result<()> {
        info!(model = %self.model, "checking Gemini configuration");
        if self.api_key.is_empty() {
            return Err(RecallError::Generation("Gemini API key not set".into()));
        }
        Ok(())
    }
}
