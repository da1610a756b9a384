use sectionmap_lib::{
    core::{
        errors::AppError,
        types::{BoundingBox, ChunkMap, ExtractedItem, Fragment, FragmentKind, SectionNode},
    },
    db::{
        repositories::{documents, extractions, sections},
        Database,
    },
};
use sqlx::Row;

fn feed(document_id: &str) -> Vec<Fragment> {
    let mut image = Fragment::text("img-1", document_id, Some(2), 0, "");
    image.kind = FragmentKind::Image;
    image.text = None;
    image.bbox = Some(BoundingBox {
        x0: 10.0,
        y0: 20.0,
        x1: 110.0,
        y1: 220.0,
    });
    vec![
        Fragment::text("p1-0", document_id, Some(1), 0, "1 Scope"),
        image,
        Fragment::text("p0-0", document_id, None, 0, "Cover"),
    ]
}

fn item(document_id: &str, id: &str, text: &str) -> ExtractedItem {
    ExtractedItem {
        id: id.to_string(),
        document_id: document_id.to_string(),
        section_id: format!("{document_id}-sec-0001"),
        section_number: Some("1".to_string()),
        section_title: "Scope".to_string(),
        text: text.to_string(),
        confidence: Some(0.5),
        source_fragment_ids: vec!["p1-0".to_string()],
    }
}

#[tokio::test]
async fn fragments_round_trip_in_registration_order() {
    let db = Database::in_memory().await.expect("db should initialize");
    documents::insert_document(db.pool(), "doc-1", "Pump spec", &feed("doc-1"))
        .await
        .expect("insert document");

    let stored = documents::list_fragments(db.pool(), "doc-1")
        .await
        .expect("list fragments");
    assert_eq!(stored, feed("doc-1"));

    let summary = documents::get_document(db.pool(), "doc-1")
        .await
        .expect("get document");
    assert_eq!(summary.name, "Pump spec");
    assert_eq!(summary.fragment_count, 3);

    let listed = documents::list_documents(db.pool()).await.expect("list documents");
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn missing_document_is_not_found() {
    let db = Database::in_memory().await.expect("db should initialize");
    let err = documents::get_document(db.pool(), "nope")
        .await
        .expect_err("should be missing");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn duplicate_fragment_ids_roll_back_the_whole_insert() {
    let db = Database::in_memory().await.expect("db should initialize");
    let mut fragments = feed("doc-1");
    fragments.push(Fragment::text("p1-0", "doc-1", Some(3), 0, "again"));

    let err = documents::insert_document(db.pool(), "doc-1", "Broken", &fragments)
        .await
        .expect_err("primary key clash");
    assert_eq!(err.code(), "INTERNAL_ERROR");
    assert!(documents::list_documents(db.pool())
        .await
        .expect("list documents")
        .is_empty());
}

#[tokio::test]
async fn replacing_tree_clears_derived_artifacts() {
    let db = Database::in_memory().await.expect("db should initialize");
    documents::insert_document(db.pool(), "doc-1", "Pump spec", &feed("doc-1"))
        .await
        .expect("insert document");

    let mut tree = SectionNode::new("doc-1-root", "doc-1", None, "Document", 0);
    tree.children.push(SectionNode::new("doc-1-sec-0001", "doc-1", Some("1".into()), "Scope", 0));
    sections::replace_tree(db.pool(), "doc-1", &tree).await.expect("store tree");

    let mut chunks = ChunkMap::new();
    chunks.insert("doc-1-sec-0001".into(), vec!["p1-0".into()]);
    chunks.insert("doc-1-root".into(), vec!["p1-0".into()]);
    sections::replace_chunk_map(db.pool(), "doc-1", &chunks)
        .await
        .expect("store chunks");
    extractions::replace_items(db.pool(), "doc-1", &[item("doc-1", "a", "Scope covers pumps")])
        .await
        .expect("store items");

    assert_eq!(
        sections::get_tree(db.pool(), "doc-1").await.expect("tree"),
        Some(tree.clone())
    );
    assert_eq!(
        sections::get_chunk_map(db.pool(), "doc-1").await.expect("chunks"),
        Some(chunks)
    );

    sections::replace_tree(db.pool(), "doc-1", &tree).await.expect("store tree again");
    assert_eq!(sections::get_chunk_map(db.pool(), "doc-1").await.expect("chunks"), None);
    assert!(extractions::list_items(db.pool(), "doc-1")
        .await
        .expect("items")
        .is_empty());
}

#[tokio::test]
async fn item_replacement_swaps_whole_list_in_order() {
    let db = Database::in_memory().await.expect("db should initialize");
    documents::insert_document(db.pool(), "doc-1", "Pump spec", &feed("doc-1"))
        .await
        .expect("insert document");

    let first = vec![item("doc-1", "z", "first"), item("doc-1", "a", "second")];
    extractions::replace_items(db.pool(), "doc-1", &first).await.expect("store items");
    assert_eq!(extractions::list_items(db.pool(), "doc-1").await.expect("items"), first);

    let second = vec![item("doc-1", "m", "only")];
    extractions::replace_items(db.pool(), "doc-1", &second).await.expect("store items");
    assert_eq!(extractions::list_items(db.pool(), "doc-1").await.expect("items"), second);
}

#[tokio::test]
async fn deleting_document_cascades() {
    let db = Database::in_memory().await.expect("db should initialize");
    documents::insert_document(db.pool(), "doc-1", "Pump spec", &feed("doc-1"))
        .await
        .expect("insert document");
    extractions::replace_items(db.pool(), "doc-1", &[item("doc-1", "a", "x")])
        .await
        .expect("store items");

    assert!(documents::delete_document(db.pool(), "doc-1").await.expect("delete"));
    assert!(!documents::delete_document(db.pool(), "doc-1").await.expect("delete again"));

    let remaining = sqlx::query("SELECT COUNT(*) AS n FROM fragments")
        .fetch_one(db.pool())
        .await
        .expect("count fragments");
    let count: i64 = remaining.get("n");
    assert_eq!(count, 0);
    assert!(extractions::list_items(db.pool(), "doc-1")
        .await
        .expect("items")
        .is_empty());
}

#[tokio::test]
async fn schema_has_no_dangling_foreign_keys() {
    let db = Database::in_memory().await.expect("db should initialize");
    for table in ["fragments", "section_trees", "chunk_maps", "extracted_items"] {
        let rows = sqlx::query(&format!("PRAGMA foreign_key_list({table});"))
            .fetch_all(db.pool())
            .await
            .expect("fk list");
        assert!(!rows.is_empty(), "{table} should reference documents");
        for row in rows {
            let target: String = row.get("table");
            assert_eq!(target, "documents");
        }
    }
}
