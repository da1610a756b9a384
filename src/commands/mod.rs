pub mod chunks;
pub mod documents;
pub mod export;
pub mod extraction;
pub mod outline;

use crate::{
    core::{
        errors::{AppError, AppResult},
        types::{Fragment, SectionNode},
    },
    db::{
        repositories::{documents as document_repo, sections},
        Database,
    },
};

/// Fragment feed of an existing document; an empty feed cannot drive any later stage.
pub(crate) async fn load_fragments(db: &Database, document_id: &str) -> AppResult<Vec<Fragment>> {
    document_repo::get_document(db.pool(), document_id).await?;
    let fragments = document_repo::list_fragments(db.pool(), document_id).await?;
    if fragments.is_empty() {
        return Err(AppError::PreconditionFailed(format!(
            "document {document_id} has no fragments"
        )));
    }
    Ok(fragments)
}

pub(crate) async fn load_tree(db: &Database, document_id: &str) -> AppResult<SectionNode> {
    sections::get_tree(db.pool(), document_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("section tree for document {document_id}")))
}
