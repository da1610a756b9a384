use std::time::Duration;

use futures::future::BoxFuture;

use crate::{
    core::{
        config::ProviderSettings,
        errors::{AppError, AppResult},
    },
    providers::{
        openrouter::{check_status, map_transport_error},
        response::extract_content,
        retry::RetryPolicy,
        LanguageModel, SYSTEM_PROMPT,
    },
};

const OPENAI_PATH: &str = "/v1/chat/completions";
const OLLAMA_PATH: &str = "/api/chat";

/// Local llama.cpp (OpenAI-compatible) or Ollama-style chat server.
#[derive(Debug, Clone)]
pub struct LlamaCppClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    retry: RetryPolicy,
}

impl LlamaCppClient {
    pub fn new(settings: &ProviderSettings, retry: RetryPolicy) -> AppResult<Self> {
        let base_url = settings
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| AppError::InvalidInput("llama.cpp base url is required".to_string()))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|err| AppError::Network(err.to_string()))?;
        Ok(Self {
            http,
            endpoint: resolve_endpoint(base_url),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            retry,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn chat_once(&self, prompt: &str) -> AppResult<String> {
        let payload = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt}
            ],
            "stream": false,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens
        });

        let response = self
            .http
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(map_transport_error)?;

        let body = check_status(response).await?;
        extract_content(&body)
    }
}

impl LanguageModel for LlamaCppClient {
    fn name(&self) -> &str {
        "llamacpp"
    }

    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, AppResult<String>> {
        Box::pin(async move { self.retry.run(|_| self.chat_once(prompt)).await })
    }
}

/// An explicit chat endpoint is used as-is; a bare server root gets the
/// OpenAI-compatible path.
fn resolve_endpoint(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with(OPENAI_PATH) || trimmed.ends_with(OLLAMA_PATH) {
        trimmed.to_string()
    } else {
        format!("{trimmed}{OPENAI_PATH}")
    }
}
