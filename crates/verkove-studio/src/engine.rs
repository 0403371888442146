use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use llm::builder::{LLMBackend, LLMBuilder};
use llm::chat::ChatMessage;
use serde_json::{json, Value};
use tracing::debug;

use verkove_core::AiSettings;

use crate::parse::parse_generate_content;
use crate::provider::{ImageInput, ProviderClient, ProviderError, ProviderReply};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

fn map_backend(provider: &str) -> Result<LLMBackend, ProviderError> {
    match provider {
        "openai" => Ok(LLMBackend::OpenAI),
        "anthropic" => Ok(LLMBackend::Anthropic),
        "google" => Ok(LLMBackend::Google),
        "ollama" => Ok(LLMBackend::Ollama),
        "groq" => Ok(LLMBackend::Groq),
        "mistral" => Ok(LLMBackend::Mistral),
        "deepseek" => Ok(LLMBackend::DeepSeek),
        other => Err(ProviderError::Backend(format!("unknown provider: {other}"))),
    }
}

async fn within<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, ProviderError>>,
) -> Result<T, ProviderError> {
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| ProviderError::Timeout(limit))?
}

/// Provider backed by the configured `llm` backend for text and the Gemini
/// `generateContent` REST endpoint for images.
pub struct GeminiProvider {
    settings: AiSettings,
    http: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(settings: AiSettings) -> Self {
        Self {
            settings,
            http: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        let base = self
            .settings
            .base_url
            .as_deref()
            .unwrap_or(GEMINI_BASE_URL)
            .trim_end_matches('/');
        format!(
            "{base}/v1beta/models/{}:generateContent",
            self.settings.image_model
        )
    }

    async fn chat(&self, directive: &str) -> Result<String, ProviderError> {
        let backend = map_backend(&self.settings.provider)?;

        let mut builder = LLMBuilder::new()
            .backend(backend)
            .model(&self.settings.model);

        if !self.settings.api_key.is_empty() {
            builder = builder.api_key(&self.settings.api_key);
        }

        let llm = builder
            .build()
            .map_err(|e| ProviderError::Backend(format!("build LLM: {e}")))?;

        let messages = vec![ChatMessage::user().content(directive).build()];

        let response = llm
            .chat(&messages)
            .await
            .map_err(|e| ProviderError::Backend(format!("chat: {e}")))?;

        match response.text() {
            Some(text) if !text.trim().is_empty() => Ok(text),
            Some(_) => Err(ProviderError::Malformed("LLM returned empty text".to_string())),
            None => Err(ProviderError::Malformed("LLM returned no text".to_string())),
        }
    }

    async fn generate_content(
        &self,
        directive: &str,
        image: Option<&ImageInput>,
    ) -> Result<ProviderReply, ProviderError> {
        let mut parts = vec![json!({ "text": directive })];
        if let Some(image) = image {
            parts.push(json!({
                "inlineData": {
                    "mimeType": image.mime,
                    "data": BASE64.encode(&image.bytes),
                }
            }));
        }
        let body = json!({
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] },
        });

        debug!(
            model = %self.settings.image_model,
            with_image = image.is_some(),
            "sending generateContent"
        );

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.settings.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;
        parse_generate_content(&value)
    }
}

#[async_trait]
impl ProviderClient for GeminiProvider {
    async fn generate_image(
        &self,
        directive: &str,
        image: Option<&ImageInput>,
    ) -> Result<ProviderReply, ProviderError> {
        if self.settings.provider != "google" {
            return Err(ProviderError::Unsupported("image generation"));
        }
        within(self.settings.timeout(), self.generate_content(directive, image)).await
    }

    async fn complete(&self, directive: &str) -> Result<String, ProviderError> {
        within(self.settings.timeout(), self.chat(directive)).await
    }
}
