use rusqlite::{params, OptionalExtension};

use crate::db::Db;
use crate::error::{RelgraphError, Result};
use crate::graph::{Entity, EntityKind, Relationship, RelationshipStore};

use super::ParsedTable;

/// Row of the `datasets` table describing one upload
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DatasetInfo {
    pub id: i64,
    pub source_name: String,
    pub row_count: usize,
    pub skipped_rows: usize,
    pub uploaded_at: String,
}

/// Replace the stored table with `table` in a single transaction.
///
/// Either every entity and relationship of the new table is written, or the
/// previous table is left exactly as it was. Returns the new dataset id.
pub async fn replace_dataset(db: &Db, source_name: &str, table: ParsedTable) -> Result<i64> {
    let source_name = source_name.to_string();
    let uploaded_at = chrono::Utc::now().to_rfc3339();

    db.with_connection(move |conn| {
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM relationships", [])?;
        tx.execute("DELETE FROM entities", [])?;

        {
            let mut insert_entity =
                tx.prepare("INSERT OR REPLACE INTO entities (name, kind) VALUES (?1, ?2)")?;
            for entity in &table.entities {
                insert_entity.execute(params![entity.name, entity.kind.as_str()])?;
            }

            // Endpoints are always listed in `entities`; this only guards hand-built tables.
            let mut ensure_entity =
                tx.prepare("INSERT OR IGNORE INTO entities (name, kind) VALUES (?1, 'company')")?;
            let mut insert_rel = tx.prepare(
                r#"
                INSERT OR IGNORE INTO relationships (
                    entity_from, relationship_type, relationship_sub_type, entity_to
                ) VALUES (?1, ?2, ?3, ?4)
                "#,
            )?;
            for rel in &table.relationships {
                ensure_entity.execute(params![rel.source])?;
                ensure_entity.execute(params![rel.target])?;
                insert_rel.execute(params![
                    rel.source,
                    rel.relationship_type,
                    rel.relationship_sub_type,
                    rel.target,
                ])?;
            }
        }

        tx.execute(
            "INSERT INTO datasets (source_name, row_count, skipped_rows, uploaded_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                source_name,
                table.relationships.len() as i64,
                table.skipped_rows as i64,
                uploaded_at,
            ],
        )?;
        let dataset_id = tx.last_insert_rowid();

        tx.commit()?;
        Ok::<i64, RelgraphError>(dataset_id)
    })
    .await
}

/// Load the stored table into memory. `None` when nothing was ever uploaded.
pub async fn load_store(db: &Db) -> Result<Option<RelationshipStore>> {
    db.with_connection(|conn| {
        let mut stmt = conn.prepare("SELECT name, kind FROM entities ORDER BY name")?;
        let entities: Vec<Entity> = stmt
            .query_map([], |row| {
                let kind: String = row.get(1)?;
                Ok(Entity {
                    name: row.get(0)?,
                    kind: EntityKind::from_label(&kind),
                })
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

        if entities.is_empty() {
            return Ok(None);
        }

        let mut stmt = conn.prepare(
            "SELECT entity_from, entity_to, relationship_type, relationship_sub_type FROM relationships",
        )?;
        let relationships: Vec<Relationship> = stmt
            .query_map([], |row| {
                Ok(Relationship {
                    source: row.get(0)?,
                    target: row.get(1)?,
                    relationship_type: row.get(2)?,
                    relationship_sub_type: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

        Ok::<_, RelgraphError>(Some(RelationshipStore::from_relationships(entities, relationships)))
    })
    .await
}

/// Most recent upload, if any
pub async fn latest_dataset(db: &Db) -> Result<Option<DatasetInfo>> {
    db.with_connection(|conn| {
        let info = conn
            .query_row(
                "SELECT id, source_name, row_count, skipped_rows, uploaded_at FROM datasets ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    Ok(DatasetInfo {
                        id: row.get(0)?,
                        source_name: row.get(1)?,
                        row_count: row.get::<_, i64>(2)? as usize,
                        skipped_rows: row.get::<_, i64>(3)? as usize,
                        uploaded_at: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok::<_, RelgraphError>(info)
    })
    .await
}
