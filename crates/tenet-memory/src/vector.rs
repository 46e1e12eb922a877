// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector store: fixed-length vectors keyed by entity id, cosine top-K search.
//!
//! Search is an exhaustive scan over one namespace, which is adequate for
//! thousands of vectors per user. The trait is the seam for an indexed backend.

use std::cmp::Ordering;

use async_trait::async_trait;
use tenet_core::{Namespace, TenetError};
use tenet_storage::queries::embeddings::{self, StoredVector};
use tenet_storage::Database;

use crate::types::{cosine_similarity, Similar};

/// Storage and nearest-neighbor search over embedding vectors.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace the vector for `id`. Empty vectors are rejected.
    async fn store_embedding(
        &self,
        namespace: Namespace,
        id: &str,
        vector: Vec<f32>,
    ) -> Result<(), TenetError>;

    /// Up to `k` most similar vectors, best first.
    async fn search(
        &self,
        query: &[f32],
        k: usize,
        namespace: Namespace,
    ) -> Result<Vec<Similar>, TenetError>;

    /// Remove the vector for `id`. Returns whether one existed.
    async fn remove(&self, namespace: Namespace, id: &str) -> Result<bool, TenetError>;

    /// Every vector in a namespace.
    async fn entries(&self, namespace: Namespace) -> Result<Vec<StoredVector>, TenetError>;

    async fn count(&self, namespace: Namespace) -> Result<u64, TenetError>;
}

/// [`VectorStore`] over the `embeddings` table, scanning in Rust.
#[derive(Clone)]
pub struct SqliteVectorStore {
    db: Database,
}

impl SqliteVectorStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn store_embedding(
        &self,
        namespace: Namespace,
        id: &str,
        vector: Vec<f32>,
    ) -> Result<(), TenetError> {
        if vector.is_empty() {
            return Err(TenetError::Internal(format!(
                "refusing to store an empty vector for {id}"
            )));
        }
        embeddings::store_vector(&self.db, namespace, id, vector).await
    }

    async fn search(
        &self,
        query: &[f32],
        k: usize,
        namespace: Namespace,
    ) -> Result<Vec<Similar>, TenetError> {
        if k == 0 || query.is_empty() {
            return Ok(vec![]);
        }
        let entries = embeddings::load_vectors(&self.db, namespace).await?;
        Ok(rank_by_similarity(query, &entries, k))
    }

    async fn remove(&self, namespace: Namespace, id: &str) -> Result<bool, TenetError> {
        embeddings::remove_vector(&self.db, namespace, id).await
    }

    async fn entries(&self, namespace: Namespace) -> Result<Vec<StoredVector>, TenetError> {
        embeddings::load_vectors(&self.db, namespace).await
    }

    async fn count(&self, namespace: Namespace) -> Result<u64, TenetError> {
        embeddings::count_vectors(&self.db, namespace).await
    }
}

/// Rank `entries` by cosine similarity to `query` and keep the best `k`.
///
/// Vectors of a different dimension are skipped. Ties go to the most recently
/// updated vector, then to the smaller id.
pub fn rank_by_similarity(query: &[f32], entries: &[StoredVector], k: usize) -> Vec<Similar> {
    let mut scored: Vec<(&StoredVector, f32)> = entries
        .iter()
        .filter(|e| e.vector.len() == query.len())
        .map(|e| (e, cosine_similarity(query, &e.vector)))
        .collect();

    scored.sort_by(|(a, sa), (b, sb)| {
        sb.partial_cmp(sa)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.updated_at.cmp(&a.updated_at))
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    });
    scored.truncate(k);

    scored
        .into_iter()
        .map(|(e, similarity)| Similar {
            id: e.entity_id.clone(),
            similarity,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn entry(id: &str, vector: Vec<f32>, age_secs: i64) -> StoredVector {
        StoredVector {
            entity_id: id.to_string(),
            vector,
            updated_at: Utc::now() - Duration::seconds(age_secs),
        }
    }

    #[test]
    fn rank_orders_by_similarity_and_truncates() {
        let entries = vec![
            entry("a", vec![0.5, 0.5, 0.0], 0),
            entry("b", vec![0.9, 0.1, 0.0], 0),
            entry("c", vec![0.0, 1.0, 0.0], 0),
        ];
        let hits = rank_by_similarity(&[1.0, 0.0, 0.0], &entries, 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "b");
        assert_eq!(hits[1].id, "a");
    }

    #[test]
    fn ties_prefer_most_recent_update() {
        let entries = vec![
            entry("old", vec![1.0, 0.0], 3600),
            entry("new", vec![2.0, 0.0], 10),
        ];
        let hits = rank_by_similarity(&[1.0, 0.0], &entries, 2);
        assert_eq!(hits[0].id, "new");
        assert_eq!(hits[1].id, "old");
    }

    #[test]
    fn mismatched_dimensions_are_skipped() {
        let entries = vec![entry("short", vec![1.0], 0), entry("ok", vec![1.0, 0.0], 0)];
        let hits = rank_by_similarity(&[1.0, 0.0], &entries, 5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "ok");
    }

    #[test]
    fn zero_query_scores_zero_not_nan() {
        let entries = vec![entry("a", vec![1.0, 0.0], 0)];
        let hits = rank_by_similarity(&[0.0, 0.0], &entries, 1);
        assert_eq!(hits[0].similarity, 0.0);
    }

    #[tokio::test]
    async fn sqlite_store_search_sees_writes_immediately() {
        let db = Database::open_in_memory().await.unwrap();
        let store = SqliteVectorStore::new(db);

        store.store_embedding(Namespace::Knowledge, "k1", vec![1.0, 0.0]).await.unwrap();
        store.store_embedding(Namespace::Knowledge, "k2", vec![0.0, 1.0]).await.unwrap();
        store.store_embedding(Namespace::Beliefs, "b1", vec![1.0, 0.0]).await.unwrap();

        let hits = store.search(&[1.0, 0.1], 5, Namespace::Knowledge).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "k1");
        assert_eq!(store.count(Namespace::Beliefs).await.unwrap(), 1);

        assert!(store.remove(Namespace::Knowledge, "k1").await.unwrap());
        let hits = store.search(&[1.0, 0.1], 5, Namespace::Knowledge).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "k2");
    }

    #[tokio::test]
    async fn empty_vector_is_rejected() {
        let db = Database::open_in_memory().await.unwrap();
        let store = SqliteVectorStore::new(db);
        let err = store.store_embedding(Namespace::Beliefs, "x", vec![]).await.unwrap_err();
        assert!(matches!(err, TenetError::Internal(_)));
        assert!(store.search(&[1.0], 0, Namespace::Beliefs).await.unwrap().is_empty());
    }
}
