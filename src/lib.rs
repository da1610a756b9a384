pub mod commands;
pub mod core;
pub mod db;
pub mod extraction;
pub mod outline;
pub mod providers;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{
    core::{
        config::PipelineConfig,
        errors::AppResult,
        types::{
            ComputeChunksResponse, DiscoverOutlineResponse, ExportFormat, ExportResponse,
            ExtractRequirementsResponse, Fragment, RegisterDocumentResponse,
        },
    },
    db::Database,
    providers::{build_provider, LanguageModel},
};

fn log_filter_from_env() -> String {
    std::env::var("SECTIONMAP_LOG")
        .ok()
        .map(|value| value.trim().to_ascii_lowercase())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "info".to_string())
}

fn sqlx_debug_enabled() -> bool {
    matches!(
        std::env::var("SECTIONMAP_SQLX_DEBUG")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Installs the global fmt subscriber. Safe to call more than once.
pub fn init_tracing() {
    let mut directives = log_filter_from_env();
    if !sqlx_debug_enabled() {
        directives.push_str(",sqlx::query=warn");
    }
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("info,sqlx::query=warn"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Database, model, and configuration bundled for callers that drive every stage.
#[derive(Clone)]
pub struct Pipeline {
    pub db: Database,
    pub model: Arc<dyn LanguageModel>,
    pub config: PipelineConfig,
}

impl Pipeline {
    pub async fn open(config: PipelineConfig) -> AppResult<Self> {
        let db = Database::new(&config.data_dir).await?;
        let model = build_provider(&config.provider, config.retry)?;
        Ok(Self { db, model, config })
    }

    pub fn with_parts(db: Database, model: Arc<dyn LanguageModel>, config: PipelineConfig) -> Self {
        Self { db, model, config }
    }

    pub async fn register_document(
        &self,
        name: &str,
        fragments: Vec<Fragment>,
    ) -> AppResult<RegisterDocumentResponse> {
        commands::documents::register_document(&self.db, name, fragments).await
    }

    pub async fn discover_outline(&self, document_id: &str) -> AppResult<DiscoverOutlineResponse> {
        commands::outline::discover_outline(&self.db, self.model.as_ref(), document_id).await
    }

    pub async fn compute_chunks(&self, document_id: &str) -> AppResult<ComputeChunksResponse> {
        commands::chunks::compute_chunks(&self.db, document_id).await
    }

    pub async fn extract_requirements(&self, document_id: &str) -> AppResult<ExtractRequirementsResponse> {
        commands::extraction::extract_requirements(&self.db, Arc::clone(&self.model), document_id).await
    }

    pub async fn export_items(&self, document_id: &str, format: ExportFormat) -> AppResult<ExportResponse> {
        commands::export::export_items(&self.db, &self.config, document_id, format).await
    }
}
