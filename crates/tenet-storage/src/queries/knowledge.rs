// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Knowledge sources and their chunks.

use rusqlite::params;
use tenet_core::TenetError;

use crate::database::{map_tr_err, Database};
use crate::models::{
    format_timestamp, timestamp_column, KnowledgeChunk, KnowledgeSource, Namespace, OptionalExt,
};
use crate::queries::embeddings::upsert_vector;
use crate::queries::fts_query;

fn row_to_source(row: &rusqlite::Row<'_>, offset: usize) -> Result<KnowledgeSource, rusqlite::Error> {
    Ok(KnowledgeSource {
        id: row.get(offset)?,
        url: row.get(offset + 1)?,
        title: row.get(offset + 2)?,
        learned_at: timestamp_column(row, offset + 3)?,
    })
}

/// Look up a source by its normalized url.
pub async fn find_source_by_url(
    db: &Database,
    url: &str,
) -> Result<Option<KnowledgeSource>, TenetError> {
    let url = url.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<KnowledgeSource>, rusqlite::Error> {
            conn.query_row(
                "SELECT id, url, title, learned_at FROM knowledge_sources WHERE url = ?1",
                params![url],
                |row| row_to_source(row, 0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Persist a source with all of its chunks and chunk vectors in one transaction.
///
/// Returns false, writing nothing, when a source with the same url already exists.
pub async fn insert_source_with_chunks(
    db: &Database,
    source: &KnowledgeSource,
    chunks: Vec<KnowledgeChunk>,
) -> Result<bool, TenetError> {
    let source = source.clone();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let tx = conn.transaction()?;
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO knowledge_sources (id, url, title, learned_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    source.id,
                    source.url,
                    source.title,
                    format_timestamp(&source.learned_at),
                ],
            )?;
            if inserted == 0 {
                return Ok(false);
            }
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO knowledge_chunks (id, source_id, ordinal, content)
                     VALUES (?1, ?2, ?3, ?4)",
                )?;
                for chunk in &chunks {
                    stmt.execute(params![chunk.id, source.id, chunk.ordinal, chunk.content])?;
                }
            }
            for chunk in &chunks {
                if let Some(vector) = chunk.embedding.as_ref().filter(|v| !v.is_empty()) {
                    upsert_vector(&tx, Namespace::Knowledge, &chunk.id, vector)?;
                }
            }
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(map_tr_err)
}

/// All learned sources, newest first.
pub async fn list_sources(db: &Database) -> Result<Vec<KnowledgeSource>, TenetError> {
    db.connection()
        .call(|conn| -> Result<Vec<KnowledgeSource>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, url, title, learned_at FROM knowledge_sources
                 ORDER BY learned_at DESC, rowid DESC",
            )?;
            let sources = stmt
                .query_map([], |row| row_to_source(row, 0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(sources)
        })
        .await
        .map_err(map_tr_err)
}

/// Chunks of one source in ordinal order. Vectors are not loaded.
pub async fn chunks_for_source(
    db: &Database,
    source_id: &str,
) -> Result<Vec<KnowledgeChunk>, TenetError> {
    let source_id = source_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<KnowledgeChunk>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, source_id, ordinal, content FROM knowledge_chunks
                 WHERE source_id = ?1 ORDER BY ordinal ASC",
            )?;
            let chunks = stmt
                .query_map(params![source_id], |row| {
                    Ok(KnowledgeChunk {
                        id: row.get(0)?,
                        source_id: row.get(1)?,
                        ordinal: row.get(2)?,
                        content: row.get(3)?,
                        embedding: None,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(chunks)
        })
        .await
        .map_err(map_tr_err)
}

/// Chunks joined to their source, for the given chunk ids. Unknown ids are skipped.
pub async fn chunks_with_sources(
    db: &Database,
    chunk_ids: &[String],
) -> Result<Vec<(KnowledgeChunk, KnowledgeSource)>, TenetError> {
    if chunk_ids.is_empty() {
        return Ok(vec![]);
    }
    let ids = chunk_ids.to_vec();
    db.connection()
        .call(move |conn| -> Result<Vec<(KnowledgeChunk, KnowledgeSource)>, rusqlite::Error> {
            let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{i}")).collect();
            let sql = format!(
                "SELECT c.id, c.source_id, c.ordinal, c.content, s.id, s.url, s.title, s.learned_at
                 FROM knowledge_chunks c JOIN knowledge_sources s ON s.id = c.source_id
                 WHERE c.id IN ({})",
                placeholders.join(", ")
            );
            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> =
                ids.iter().map(|id| id as &dyn rusqlite::types::ToSql).collect();
            let rows = stmt
                .query_map(params.as_slice(), |row| {
                    let chunk = KnowledgeChunk {
                        id: row.get(0)?,
                        source_id: row.get(1)?,
                        ordinal: row.get(2)?,
                        content: row.get(3)?,
                        embedding: None,
                    };
                    Ok((chunk, row_to_source(row, 4)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)
}

/// Full-text search over chunk content. Returns `(chunk_id, bm25_score)` pairs.
pub async fn search_chunks_fts(
    db: &Database,
    text: &str,
    limit: usize,
) -> Result<Vec<(String, f64)>, TenetError> {
    let Some(query) = fts_query(text) else {
        return Ok(vec![]);
    };
    db.connection()
        .call(move |conn| -> Result<Vec<(String, f64)>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT c.id, bm25(knowledge_fts) AS score FROM knowledge_fts
                 JOIN knowledge_chunks c ON c.rowid = knowledge_fts.rowid
                 WHERE knowledge_fts MATCH ?1 ORDER BY score LIMIT ?2",
            )?;
            let results = stmt
                .query_map(params![query, limit as i64], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(results)
        })
        .await
        .map_err(map_tr_err)
}
