use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{
    core::errors::{AppError, AppResult},
    providers::retry::RetryPolicy,
};

const ENV_PREFIX: &str = "SECTIONMAP_";
const DEFAULT_LLAMACPP_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenRouter,
    LlamaCpp,
    Fixed,
}

impl ProviderKind {
    pub fn parse(raw: &str) -> AppResult<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "openrouter" => Ok(Self::OpenRouter),
            "llamacpp" | "llama.cpp" | "ollama" => Ok(Self::LlamaCpp),
            "fixed" | "fallback" => Ok(Self::Fixed),
            other => Err(AppError::InvalidInput(format!("unknown provider {other}"))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenRouter => "openrouter",
            Self::LlamaCpp => "llamacpp",
            Self::Fixed => "fixed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            kind: ProviderKind::OpenRouter,
            model: "openrouter/auto".to_string(),
            api_key: None,
            base_url: Some(DEFAULT_LLAMACPP_URL.to_string()),
            temperature: 0.0,
            max_tokens: 512,
            timeout_secs: 60,
        }
    }
}

/// Passed explicitly into every top-level operation; nothing here is cached process-wide.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub provider: ProviderSettings,
    pub retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".sectionmap"),
            provider: ProviderSettings::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(format!("{ENV_PREFIX}{key}")).ok())
    }

    /// Builds a config from an arbitrary key lookup (keys without the env prefix).
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(dir) = lookup("DATA_DIR").filter(|value| !value.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(kind) = lookup("PROVIDER") {
            config.provider.kind = ProviderKind::parse(&kind)?;
        }
        if let Some(model) = lookup("MODEL").filter(|value| !value.trim().is_empty()) {
            config.provider.model = model;
        }
        config.provider.api_key = lookup("API_KEY").filter(|value| !value.trim().is_empty());
        if let Some(url) = lookup("BASE_URL").filter(|value| !value.trim().is_empty()) {
            config.provider.base_url = Some(url);
        }
        if let Some(raw) = lookup("TEMPERATURE") {
            let temperature: f64 = raw
                .trim()
                .parse()
                .map_err(|_| AppError::InvalidInput(format!("invalid temperature {raw}")))?;
            if !(0.0..=2.0).contains(&temperature) {
                return Err(AppError::InvalidInput(format!(
                    "temperature {temperature} outside 0.0..=2.0"
                )));
            }
            config.provider.temperature = temperature;
        }
        if let Some(raw) = lookup("MAX_TOKENS") {
            config.provider.max_tokens = raw
                .trim()
                .parse()
                .map_err(|_| AppError::InvalidInput(format!("invalid max tokens {raw}")))?;
        }
        Ok(config)
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.data_dir.join("exports")
    }
}
