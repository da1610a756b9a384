pub mod fixed;
pub mod llamacpp;
pub mod openrouter;
pub mod response;
pub mod retry;

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::core::{
    config::{ProviderKind, ProviderSettings},
    errors::AppResult,
};

use self::{fixed::FixedResponseModel, llamacpp::LlamaCppClient, openrouter::OpenRouterClient, retry::RetryPolicy};

pub(crate) const SYSTEM_PROMPT: &str =
    "Return only the requested list, one item per line, without commentary.";

pub trait LanguageModel: Send + Sync {
    fn name(&self) -> &str;

    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, AppResult<String>>;
}

pub fn build_provider(
    settings: &ProviderSettings,
    retry: RetryPolicy,
) -> AppResult<Arc<dyn LanguageModel>> {
    let provider: Arc<dyn LanguageModel> = match settings.kind {
        ProviderKind::OpenRouter => Arc::new(OpenRouterClient::new(settings, retry)?),
        ProviderKind::LlamaCpp => Arc::new(LlamaCppClient::new(settings, retry)?),
        ProviderKind::Fixed => Arc::new(FixedResponseModel::default()),
    };
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::build_provider;
    use crate::{
        core::config::{ProviderKind, ProviderSettings},
        providers::retry::RetryPolicy,
    };

    #[test]
    fn factory_selects_by_kind() {
        let fixed = ProviderSettings {
            kind: ProviderKind::Fixed,
            ..ProviderSettings::default()
        };
        let model = build_provider(&fixed, RetryPolicy::default()).expect("fixed provider");
        assert_eq!(model.name(), "fixed");

        let llama = ProviderSettings {
            kind: ProviderKind::LlamaCpp,
            ..ProviderSettings::default()
        };
        let model = build_provider(&llama, RetryPolicy::default()).expect("llamacpp provider");
        assert_eq!(model.name(), "llamacpp");
    }

    #[test]
    fn openrouter_requires_api_key() {
        let settings = ProviderSettings::default();
        let err = build_provider(&settings, RetryPolicy::default())
            .err()
            .expect("missing key should fail");
        assert_eq!(err.code(), "INVALID_INPUT");
    }
}
