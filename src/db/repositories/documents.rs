use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::core::{
    errors::{AppError, AppResult},
    types::{BoundingBox, DocumentSummary, Fragment, FragmentKind},
};

pub(crate) fn parse_timestamp(value: String) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|v| v.with_timezone(&Utc))
        .map_err(|err| AppError::Database(format!("invalid timestamp {value}: {err}")))
}

/// Stores a document row and its whole fragment feed in one transaction.
pub async fn insert_document(
    pool: &SqlitePool,
    id: &str,
    name: &str,
    fragments: &[Fragment],
) -> AppResult<()> {
    let mut tx = pool.begin().await.map_err(AppError::persistence)?;
    sqlx::query("INSERT INTO documents (id, name, created_at) VALUES (?1, ?2, ?3)")
        .bind(id)
        .bind(name)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(AppError::persistence)?;

    for (ordinal, fragment) in fragments.iter().enumerate() {
        let bbox_json = fragment
            .bbox
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        sqlx::query(
            r#"
            INSERT INTO fragments (id, document_id, ordinal, kind, text, page, sequence, bbox_json)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&fragment.id)
        .bind(id)
        .bind(ordinal as i64)
        .bind(fragment.kind.as_str())
        .bind(&fragment.text)
        .bind(fragment.page.map(i64::from))
        .bind(i64::from(fragment.sequence))
        .bind(bbox_json)
        .execute(&mut *tx)
        .await
        .map_err(AppError::persistence)?;
    }
    tx.commit().await.map_err(AppError::persistence)?;
    Ok(())
}

pub async fn get_document(pool: &SqlitePool, document_id: &str) -> AppResult<DocumentSummary> {
    let row = sqlx::query(
        r#"
        SELECT d.id, d.name, d.created_at,
               (SELECT COUNT(*) FROM fragments f WHERE f.document_id = d.id) AS fragment_count
        FROM documents d
        WHERE d.id = ?1
        "#,
    )
    .bind(document_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("document {document_id}")))?;

    map_document_summary(row)
}

pub async fn list_documents(pool: &SqlitePool) -> AppResult<Vec<DocumentSummary>> {
    let rows = sqlx::query(
        r#"
        SELECT d.id, d.name, d.created_at,
               (SELECT COUNT(*) FROM fragments f WHERE f.document_id = d.id) AS fragment_count
        FROM documents d
        ORDER BY d.created_at DESC, d.id
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(map_document_summary).collect()
}

/// Fragments in the order they were registered; callers index them by ordering key.
pub async fn list_fragments(pool: &SqlitePool, document_id: &str) -> AppResult<Vec<Fragment>> {
    let rows = sqlx::query(
        r#"
        SELECT id, document_id, kind, text, page, sequence, bbox_json
        FROM fragments
        WHERE document_id = ?1
        ORDER BY ordinal
        "#,
    )
    .bind(document_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(map_fragment).collect()
}

pub async fn delete_document(pool: &SqlitePool, document_id: &str) -> AppResult<bool> {
    let changed = sqlx::query("DELETE FROM documents WHERE id = ?1")
        .bind(document_id)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(changed > 0)
}

fn map_document_summary(row: sqlx::sqlite::SqliteRow) -> AppResult<DocumentSummary> {
    let created_at: String = row.try_get("created_at")?;
    Ok(DocumentSummary {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        fragment_count: row.try_get("fragment_count")?,
        created_at: parse_timestamp(created_at)?,
    })
}

fn map_fragment(row: sqlx::sqlite::SqliteRow) -> AppResult<Fragment> {
    let kind: String = row.try_get("kind")?;
    let kind = FragmentKind::from_str(&kind)
        .ok_or_else(|| AppError::Database(format!("unknown fragment kind {kind}")))?;
    let page: Option<i64> = row.try_get("page")?;
    let sequence: i64 = row.try_get("sequence")?;
    let bbox_json: Option<String> = row.try_get("bbox_json")?;
    let bbox = bbox_json
        .map(|raw| serde_json::from_str::<BoundingBox>(&raw))
        .transpose()
        .map_err(|err| AppError::corrupt_artifact("bounding box", err))?;
    Ok(Fragment {
        id: row.try_get("id")?,
        document_id: row.try_get("document_id")?,
        kind,
        text: row.try_get("text")?,
        page: page.map(to_u32).transpose()?,
        bbox,
        sequence: to_u32(sequence)?,
    })
}

fn to_u32(value: i64) -> AppResult<u32> {
    u32::try_from(value).map_err(|_| AppError::Database(format!("value {value} out of range")))
}
