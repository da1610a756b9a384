use std::collections::HashSet;

use tracing::info;
use uuid::Uuid;

use crate::{
    core::{
        errors::{AppError, AppResult},
        types::{DocumentSummary, Fragment, RegisterDocumentResponse},
    },
    db::{repositories::documents, Database},
};

/// Registers a fragment feed under a fresh document id. Fragment ids must be non-empty and
/// unique; each fragment is re-tagged with the new document id.
pub async fn register_document(
    db: &Database,
    name: &str,
    fragments: Vec<Fragment>,
) -> AppResult<RegisterDocumentResponse> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("document name is required".to_string()));
    }
    let mut seen = HashSet::new();
    for fragment in &fragments {
        if fragment.id.trim().is_empty() {
            return Err(AppError::InvalidInput("fragment id must not be empty".to_string()));
        }
        if !seen.insert(fragment.id.as_str()) {
            return Err(AppError::InvalidInput(format!("duplicate fragment id {}", fragment.id)));
        }
    }

    let document_id = Uuid::new_v4().to_string();
    let fragments: Vec<Fragment> = fragments
        .into_iter()
        .map(|fragment| Fragment {
            document_id: document_id.clone(),
            ..fragment
        })
        .collect();
    documents::insert_document(db.pool(), &document_id, name, &fragments).await?;

    info!(document_id = %document_id, fragments = fragments.len(), "document registered");
    Ok(RegisterDocumentResponse {
        document_id,
        fragment_count: fragments.len(),
    })
}

pub async fn get_document(db: &Database, document_id: &str) -> AppResult<DocumentSummary> {
    documents::get_document(db.pool(), document_id).await
}

pub async fn list_documents(db: &Database) -> AppResult<Vec<DocumentSummary>> {
    documents::list_documents(db.pool()).await
}

pub async fn delete_document(db: &Database, document_id: &str) -> AppResult<()> {
    if !documents::delete_document(db.pool(), document_id).await? {
        return Err(AppError::NotFound(format!("document {document_id}")));
    }
    info!(document_id, "document deleted");
    Ok(())
}
