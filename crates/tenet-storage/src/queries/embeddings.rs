// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector rows keyed by `(namespace, entity_id)`.
//!
//! Vectors are stored as little-endian f32 BLOBs. Similarity search is not
//! done here: callers load a namespace and scan it in Rust.

use chrono::{DateTime, Utc};
use rusqlite::params;
use tenet_core::TenetError;

use crate::database::{map_tr_err, Database};
use crate::models::{now_timestamp, timestamp_column, Namespace};

/// Serialize a vector to a little-endian byte BLOB.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize a little-endian byte BLOB. Trailing partial floats are ignored.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// One stored vector as loaded for a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredVector {
    pub entity_id: String,
    pub vector: Vec<f32>,
    pub updated_at: DateTime<Utc>,
}

/// Insert or replace the vector for `entity_id` in `namespace`.
pub(crate) fn upsert_vector(
    conn: &rusqlite::Connection,
    namespace: Namespace,
    entity_id: &str,
    vector: &[f32],
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO embeddings (namespace, entity_id, vector, dimensions, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(namespace, entity_id) DO UPDATE SET
             vector = excluded.vector,
             dimensions = excluded.dimensions,
             updated_at = excluded.updated_at",
        params![
            namespace.as_str(),
            entity_id,
            vec_to_blob(vector),
            vector.len() as i64,
            now_timestamp(),
        ],
    )?;
    Ok(())
}

/// Set `updated_at` on an existing vector row. Returns whether a row existed.
pub(crate) fn touch_vector(
    conn: &rusqlite::Connection,
    namespace: Namespace,
    entity_id: &str,
    at: &str,
) -> Result<bool, rusqlite::Error> {
    let touched = conn.execute(
        "UPDATE embeddings SET updated_at = ?1 WHERE namespace = ?2 AND entity_id = ?3",
        params![at, namespace.as_str(), entity_id],
    )?;
    Ok(touched > 0)
}

/// Delete the vector for `entity_id`. Returns whether a row existed.
pub(crate) fn delete_vector(
    conn: &rusqlite::Connection,
    namespace: Namespace,
    entity_id: &str,
) -> Result<bool, rusqlite::Error> {
    let removed = conn.execute(
        "DELETE FROM embeddings WHERE namespace = ?1 AND entity_id = ?2",
        params![namespace.as_str(), entity_id],
    )?;
    Ok(removed > 0)
}

/// Upsert one vector.
pub async fn store_vector(
    db: &Database,
    namespace: Namespace,
    entity_id: &str,
    vector: Vec<f32>,
) -> Result<(), TenetError> {
    let entity_id = entity_id.to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            upsert_vector(conn, namespace, &entity_id, &vector)
        })
        .await
        .map_err(map_tr_err)
}

/// Remove one vector. Returns whether it existed.
pub async fn remove_vector(
    db: &Database,
    namespace: Namespace,
    entity_id: &str,
) -> Result<bool, TenetError> {
    let entity_id = entity_id.to_string();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            delete_vector(conn, namespace, &entity_id)
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch one vector.
pub async fn get_vector(
    db: &Database,
    namespace: Namespace,
    entity_id: &str,
) -> Result<Option<Vec<f32>>, TenetError> {
    let entity_id = entity_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<Vec<f32>>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT vector FROM embeddings WHERE namespace = ?1 AND entity_id = ?2",
            )?;
            let mut rows = stmt.query(params![namespace.as_str(), entity_id])?;
            match rows.next()? {
                Some(row) => {
                    let blob: Vec<u8> = row.get(0)?;
                    Ok(Some(blob_to_vec(&blob)))
                }
                None => Ok(None),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Load every vector in a namespace.
pub async fn load_vectors(
    db: &Database,
    namespace: Namespace,
) -> Result<Vec<StoredVector>, TenetError> {
    db.connection()
        .call(move |conn| -> Result<Vec<StoredVector>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT entity_id, vector, updated_at FROM embeddings WHERE namespace = ?1",
            )?;
            let rows = stmt
                .query_map(params![namespace.as_str()], |row| {
                    let blob: Vec<u8> = row.get(1)?;
                    Ok(StoredVector {
                        entity_id: row.get(0)?,
                        vector: blob_to_vec(&blob),
                        updated_at: timestamp_column(row, 2)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)
}

/// Number of vectors stored in a namespace.
pub async fn count_vectors(db: &Database, namespace: Namespace) -> Result<u64, TenetError> {
    db.connection()
        .call(move |conn| -> Result<u64, rusqlite::Error> {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM embeddings WHERE namespace = ?1",
                params![namespace.as_str()],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
        .await
        .map_err(map_tr_err)
}
