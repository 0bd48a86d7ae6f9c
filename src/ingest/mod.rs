pub mod db_writer;
pub mod entity_kind;
pub mod table;

pub use db_writer::{latest_dataset, load_store, replace_dataset, DatasetInfo};
pub use entity_kind::{detect_entity_kind, resolve_entity_kind};
pub use table::{parse_relationship_csv, ParsedTable, REQUIRED_COLUMNS};

use serde::Serialize;

use crate::db::Db;
use crate::error::Result;
use crate::graph::RelationshipStore;

/// Outcome of one upload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestSummary {
    /// All entity ids of the new table, sorted
    pub entities: Vec<String>,
    pub node_count: usize,
    pub edge_count: usize,
    pub skipped_rows: usize,
}

impl IngestSummary {
    fn new(store: &RelationshipStore, skipped_rows: usize) -> Self {
        let stats = store.stats();
        Self {
            entities: store.entity_names(),
            node_count: stats.node_count,
            edge_count: stats.edge_count,
            skipped_rows,
        }
    }
}

/// Convenience function to ingest one CSV upload
///
/// Orchestrates the full pipeline: parse → persist → build the in-memory store.
/// Nothing is written when parsing fails, and the returned store is only
/// built after the write committed.
pub async fn ingest_csv(
    db: &Db,
    source_name: &str,
    contents: &[u8],
) -> Result<(IngestSummary, RelationshipStore)> {
    let table = parse_relationship_csv(contents)?;
    let skipped_rows = table.skipped_rows;
    let store = RelationshipStore::from_relationships(table.entities.clone(), table.relationships.clone());

    let dataset_id = replace_dataset(db, source_name, table).await?;
    let summary = IngestSummary::new(&store, skipped_rows);

    log::info!(
        "Ingested '{}' as dataset {}: {} entities, {} relationships, {} rows skipped",
        source_name,
        dataset_id,
        summary.node_count,
        summary.edge_count,
        summary.skipped_rows
    );

    Ok((summary, store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrate;
    use crate::error::RelgraphError;
    use std::path::Path;
    use tempfile::TempDir;

    async fn setup_test_db() -> (Db, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Db::new(temp_dir.path().join("test.db"));
        let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations");
        db.with_connection(move |conn| migrate::run_migrations(conn, &migrations_dir))
            .await
            .unwrap();
        (db, temp_dir)
    }

    #[tokio::test]
    async fn test_ingest_summary() {
        let (db, _temp_dir) = setup_test_db().await;
        let csv = "entity_from,relationship_type,relationship_sub_type,entity_to\n\
                   Alice,employee,,Acme\nAcme,employee,,Bob\nBob,employee,,Acme\nAlice,employee,,Acme\n,owns,,X\n";

        let (summary, store) = ingest_csv(&db, "upload.csv", csv.as_bytes()).await.unwrap();
        assert_eq!(summary.entities, vec!["Acme", "Alice", "Bob"]);
        assert_eq!(summary.node_count, 3);
        assert_eq!(summary.edge_count, 3);
        assert_eq!(summary.skipped_rows, 1);
        assert_eq!(store.relationships().len(), 3);

        let reloaded = load_store(&db).await.unwrap().unwrap();
        assert_eq!(reloaded.relationships(), store.relationships());
    }

    #[tokio::test]
    async fn test_rejected_upload_writes_nothing() {
        let (db, _temp_dir) = setup_test_db().await;
        ingest_csv(
            &db,
            "good.csv",
            b"entity_from,relationship_type,relationship_sub_type,entity_to\nA,owns,,B\n",
        )
        .await
        .unwrap();

        let err = ingest_csv(&db, "bad.csv", b"from,to\nA,B\n").await.unwrap_err();
        assert!(matches!(err, RelgraphError::MissingColumns(_)));

        let store = load_store(&db).await.unwrap().unwrap();
        assert_eq!(store.entity_names(), vec!["A", "B"]);
        assert_eq!(latest_dataset(&db).await.unwrap().unwrap().source_name, "good.csv");
    }
}
