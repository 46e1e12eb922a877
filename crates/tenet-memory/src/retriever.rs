// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hybrid retriever combining vector similarity and BM25 via RRF fusion.
//!
//! The retriever embeds the query, runs both vector search and FTS5 BM25,
//! fuses results using Reciprocal Rank Fusion (k=60), and weights each fused
//! score by the belief's decayed confidence. When the query cannot be
//! embedded, the lexical path runs alone.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tenet_config::model::MemoryConfig;
use tenet_core::{EmbeddingAdapter, Namespace, TenetError};
use tracing::{debug, warn};

use crate::decay::effective_confidence;
use crate::llm::embed_one;
use crate::recording::record_fallback;
use crate::store::BeliefStore;
use crate::types::ScoredBelief;
use crate::vector::VectorStore;

/// RRF constant per research literature.
const RRF_K: f32 = 60.0;

/// Ranks active beliefs for a free-text query.
pub struct HybridRetriever {
    beliefs: BeliefStore,
    vectors: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingAdapter>,
    config: MemoryConfig,
}

impl HybridRetriever {
    pub fn new(
        beliefs: BeliefStore,
        vectors: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingAdapter>,
        config: MemoryConfig,
    ) -> Self {
        Self {
            beliefs,
            vectors,
            embedder,
            config,
        }
    }

    /// Up to `limit` active beliefs for `query`, best first, as seen at `now`.
    ///
    /// Returned beliefs have their access count bumped.
    pub async fn recall(
        &self,
        query: &str,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScoredBelief>, TenetError> {
        if limit == 0 || query.trim().is_empty() {
            return Ok(vec![]);
        }
        let candidates = limit.saturating_mul(2).max(self.config.search_k);

        let (vector_results, lexical_results) =
            match embed_one(self.embedder.as_ref(), query, self.config.model_timeout()).await {
                Ok(embedding) => {
                    let similar = self
                        .vectors
                        .search(&embedding, candidates, Namespace::Beliefs)
                        .await?;
                    let vector: Vec<(String, f32)> =
                        similar.into_iter().map(|s| (s.id, s.similarity)).collect();
                    let bm25 = self.beliefs.search_bm25(query, candidates).await?;
                    (vector, bm25)
                }
                Err(e) => {
                    warn!(error = %e, "query embedding failed, recalling lexically");
                    record_fallback("embedding");
                    let lexical: Vec<(String, f64)> = self
                        .beliefs
                        .search_beliefs(query, candidates)
                        .await?
                        .into_iter()
                        .map(|b| (b.id, 0.0))
                        .collect();
                    (vec![], lexical)
                }
            };

        let fused = reciprocal_rank_fusion(&vector_results, &lexical_results);
        if fused.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<String> = fused.iter().map(|(id, _)| id.clone()).collect();
        let score_map: HashMap<&str, f32> =
            fused.iter().map(|(id, score)| (id.as_str(), *score)).collect();

        let half_life = self.config.decay_half_life_days;
        let mut scored: Vec<ScoredBelief> = self
            .beliefs
            .get_beliefs(&ids)
            .await?
            .into_iter()
            .filter(|b| b.is_active())
            .map(|belief| {
                let rrf = score_map.get(belief.id.as_str()).copied().unwrap_or(0.0);
                let effective = effective_confidence(&belief, now, half_life);
                ScoredBelief {
                    score: rrf * effective as f32,
                    effective_confidence: effective,
                    belief,
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.belief.id.cmp(&b.belief.id))
        });
        scored.truncate(limit);

        let returned: Vec<String> = scored.iter().map(|s| s.belief.id.clone()).collect();
        self.beliefs.record_access(&returned).await?;
        for s in &mut scored {
            s.belief.access_count += 1;
        }

        debug!(
            vector_hits = vector_results.len(),
            lexical_hits = lexical_results.len(),
            returned = scored.len(),
            "recall complete"
        );
        Ok(scored)
    }
}

/// Reciprocal Rank Fusion: merge two ranked lists into a single ranking.
///
/// RRF score for document d = sum(1 / (k + rank_i)) for each list containing d.
/// Both inputs are `(id, score)` pairs where position is rank; the scores
/// themselves are ignored. Ties are ordered by id.
pub fn reciprocal_rank_fusion(
    vector_results: &[(String, f32)],
    bm25_results: &[(String, f64)],
) -> Vec<(String, f32)> {
    let mut scores: HashMap<String, f32> = HashMap::new();

    let ranked = vector_results
        .iter()
        .map(|(id, _)| id)
        .enumerate()
        .chain(bm25_results.iter().map(|(id, _)| id).enumerate());
    for (rank, id) in ranked {
        *scores.entry(id.clone()).or_insert(0.0) += 1.0 / (RRF_K + rank as f32 + 1.0);
    }

    let mut fused: Vec<(String, f32)> = scores.into_iter().collect();
    fused.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    fused
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tenet_core::model::DEFAULT_SUBJECT;
    use tenet_core::BeliefType;
    use tenet_storage::Database;
    use tenet_test_utils::MockEmbedder;

    use crate::vector::SqliteVectorStore;

    fn ids(fused: &[(String, f32)]) -> Vec<&str> {
        fused.iter().map(|(id, _)| id.as_str()).collect()
    }

    #[test]
    fn rrf_fusion_overlapping_lists() {
        let vector = vec![("d1".to_string(), 0.9f32), ("d2".to_string(), 0.8f32)];
        let bm25 = vec![("d1".to_string(), -5.0f64), ("d3".to_string(), -3.0f64)];

        let fused = reciprocal_rank_fusion(&vector, &bm25);
        assert_eq!(ids(&fused), vec!["d1", "d2", "d3"]);
        assert!((fused[0].1 - 2.0 / 61.0).abs() < 1e-6);
        assert!((fused[1].1 - fused[2].1).abs() < 1e-6);
    }

    #[test]
    fn rrf_fusion_empty_lists() {
        assert!(reciprocal_rank_fusion(&[], &[]).is_empty());
    }

    #[test]
    fn rrf_prefers_agreement() {
        let vector = vec![
            ("d1".to_string(), 0.95f32),
            ("d2".to_string(), 0.85f32),
            ("d4".to_string(), 0.75f32),
        ];
        let bm25 = vec![
            ("d1".to_string(), -10.0f64),
            ("d3".to_string(), -8.0f64),
            ("d4".to_string(), -6.0f64),
        ];
        let fused = reciprocal_rank_fusion(&vector, &bm25);
        assert_eq!(fused[0].0, "d1");
        assert_eq!(fused[1].0, "d4");
    }

    async fn setup() -> (HybridRetriever, BeliefStore, Arc<MockEmbedder>) {
        let db = Database::open_in_memory().await.unwrap();
        let config = MemoryConfig::default();
        let beliefs = BeliefStore::new(db.clone(), config.reinforce_step);
        let embedder = Arc::new(MockEmbedder::new(2));
        let retriever = HybridRetriever::new(
            beliefs.clone(),
            Arc::new(SqliteVectorStore::new(db)),
            embedder.clone(),
            config,
        );
        (retriever, beliefs, embedder)
    }

    #[tokio::test]
    async fn recall_ranks_and_counts_access() {
        let (retriever, beliefs, embedder) = setup().await;
        let coffee = beliefs
            .create_belief("User drinks coffee", 0.9, BeliefType::Preference, DEFAULT_SUBJECT, vec![1.0, 0.0], None)
            .await
            .unwrap();
        beliefs
            .create_belief("User cycles to work", 0.9, BeliefType::Factual, DEFAULT_SUBJECT, vec![0.0, 1.0], None)
            .await
            .unwrap();
        embedder.set("coffee", vec![1.0, 0.1]);

        let hits = retriever.recall("coffee", 1, Utc::now()).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].belief.id, coffee.id);
        assert_eq!(hits[0].belief.access_count, 1);

        let stored = beliefs.get_belief(&coffee.id).await.unwrap().unwrap();
        assert_eq!(stored.access_count, 1);
    }

    #[tokio::test]
    async fn decayed_beliefs_rank_lower() {
        let (retriever, beliefs, embedder) = setup().await;
        let a = beliefs
            .create_belief("tea in the morning", 0.8, BeliefType::Preference, DEFAULT_SUBJECT, vec![1.0, 0.0], None)
            .await
            .unwrap();
        embedder.set("tea", vec![1.0, 0.0]);

        let fresh = retriever.recall("tea", 5, Utc::now()).await.unwrap();
        let later = retriever
            .recall("tea", 5, Utc::now() + Duration::days(120))
            .await
            .unwrap();
        assert_eq!(fresh[0].belief.id, a.id);
        assert!(later[0].score < fresh[0].score);
        assert!(later[0].effective_confidence < 0.25);
    }

    #[tokio::test]
    async fn embedding_outage_recalls_lexically() {
        let (retriever, beliefs, embedder) = setup().await;
        beliefs
            .create_belief("User speaks Portuguese", 0.6, BeliefType::Factual, DEFAULT_SUBJECT, vec![1.0, 0.0], None)
            .await
            .unwrap();
        embedder.set_failing(true);

        let hits = retriever.recall("portuguese", 5, Utc::now()).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(retriever.recall("klingon", 5, Utc::now()).await.unwrap().is_empty());
    }
}
