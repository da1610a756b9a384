use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::StatusCode;
use serde_json::Value;

use crate::{
    core::{
        config::ProviderSettings,
        errors::{AppError, AppResult},
    },
    providers::{response::extract_content, retry::RetryPolicy, LanguageModel, SYSTEM_PROMPT},
};

const ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";

#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    retry: RetryPolicy,
}

impl OpenRouterClient {
    pub fn new(settings: &ProviderSettings, retry: RetryPolicy) -> AppResult<Self> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AppError::InvalidInput("OpenRouter API key is required".to_string()))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|err| AppError::Network(err.to_string()))?;
        Ok(Self {
            http,
            api_key,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            retry,
        })
    }

    async fn chat_once(&self, prompt: &str) -> AppResult<String> {
        let payload = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt}
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens
        });

        let response = self
            .http
            .post(ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(map_transport_error)?;

        let body = check_status(response).await?;
        extract_content(&body)
    }
}

impl LanguageModel for OpenRouterClient {
    fn name(&self) -> &str {
        "openrouter"
    }

    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, AppResult<String>> {
        Box::pin(async move { self.retry.run(|_| self.chat_once(prompt)).await })
    }
}

pub(crate) fn map_transport_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::ProviderTimeout
    } else {
        AppError::Network(err.to_string())
    }
}

/// Maps HTTP failures onto provider errors and decodes a successful JSON body.
pub(crate) async fn check_status(response: reqwest::Response) -> AppResult<Value> {
    match response.status() {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(AppError::ProviderAuth),
        StatusCode::TOO_MANY_REQUESTS => return Err(AppError::ProviderRateLimited),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            return Err(AppError::ProviderTimeout)
        }
        status if status.is_server_error() => {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Network(format!("status {status} body {body}")));
        }
        status if !status.is_success() => {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ProviderInvalidResponse(format!(
                "status {status} body {body}"
            )));
        }
        _ => {}
    }

    response
        .json()
        .await
        .map_err(|err| AppError::ProviderInvalidResponse(err.to_string()))
}
