use serde_json::Value;

use crate::core::errors::{AppError, AppResult};

type Strategy = fn(&Value) -> Option<&str>;

/// Tried in order; the first non-blank string wins.
const STRATEGIES: &[(&str, Strategy)] = &[
    ("openai_choices", openai_choice),
    ("ollama_message", ollama_message),
    ("content", top_level_content),
    ("completion", top_level_completion),
    ("text", top_level_text),
];

fn openai_choice(body: &Value) -> Option<&str> {
    body.get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?
        .as_str()
}

fn ollama_message(body: &Value) -> Option<&str> {
    body.get("message")?.get("content")?.as_str()
}

fn top_level_content(body: &Value) -> Option<&str> {
    body.get("content")?.as_str()
}

fn top_level_completion(body: &Value) -> Option<&str> {
    body.get("completion")?.as_str()
}

fn top_level_text(body: &Value) -> Option<&str> {
    body.get("text")?.as_str()
}

pub fn extract_content(body: &Value) -> AppResult<String> {
    STRATEGIES
        .iter()
        .find_map(|(_, strategy)| strategy(body).map(str::trim).filter(|text| !text.is_empty()))
        .map(str::to_string)
        .ok_or_else(|| AppError::ProviderInvalidResponse("response carries no text content".to_string()))
}
