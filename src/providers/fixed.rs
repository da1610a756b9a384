use futures::future::BoxFuture;

use crate::{core::errors::AppResult, outline::parser::FALLBACK_OUTLINE, providers::LanguageModel};

/// Returns the same text for every prompt.
#[derive(Debug, Clone)]
pub struct FixedResponseModel {
    text: String,
}

impl FixedResponseModel {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Default for FixedResponseModel {
    fn default() -> Self {
        Self::new(FALLBACK_OUTLINE)
    }
}

impl LanguageModel for FixedResponseModel {
    fn name(&self) -> &str {
        "fixed"
    }

    fn generate<'a>(&'a self, _prompt: &'a str) -> BoxFuture<'a, AppResult<String>> {
        Box::pin(async move { Ok(self.text.clone()) })
    }
}
