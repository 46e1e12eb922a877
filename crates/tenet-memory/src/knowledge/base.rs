// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Learn and search externally sourced documents.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tenet_config::model::KnowledgeConfig;
use tenet_core::{EmbeddingAdapter, KnowledgeChunk, KnowledgeSource, Namespace, TenetError};
use tenet_storage::queries::knowledge;
use tenet_storage::Database;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::chunker::chunk_content;
use super::source_url::normalize_url;
use crate::llm::embed_one;
use crate::recording::record_fallback;
use crate::types::{KnowledgeHit, LearnOutcome};
use crate::vector::VectorStore;

/// Document store sharing the vector store under the knowledge namespace.
pub struct KnowledgeBase {
    db: Database,
    vectors: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingAdapter>,
    config: KnowledgeConfig,
    model_timeout: Duration,
}

impl KnowledgeBase {
    pub fn new(
        db: Database,
        vectors: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingAdapter>,
        config: KnowledgeConfig,
        model_timeout: Duration,
    ) -> Self {
        Self {
            db,
            vectors,
            embedder,
            config,
            model_timeout,
        }
    }

    /// Chunk, embed and persist a document unless its url was already learned.
    ///
    /// Chunks whose embedding fails are stored without a vector and remain
    /// reachable through lexical search.
    pub async fn learn_from_content(
        &self,
        url: &str,
        title: &str,
        content: &str,
    ) -> Result<LearnOutcome, TenetError> {
        let url = normalize_url(url);
        if let Some(existing) = knowledge::find_source_by_url(&self.db, &url).await? {
            debug!(url = %url, source_id = %existing.id, "source already learned");
            return Ok(skipped(existing.id));
        }

        let source = KnowledgeSource {
            id: Uuid::new_v4().to_string(),
            url: url.clone(),
            title: title.trim().to_string(),
            learned_at: Utc::now(),
        };

        let mut chunks = Vec::new();
        let mut without_vector = 0;
        for (ordinal, text) in chunk_content(content, self.config.chunk_max_words)
            .into_iter()
            .enumerate()
        {
            let embedding = match embed_one(self.embedder.as_ref(), &text, self.model_timeout).await {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!(error = %e, ordinal, "chunk embedding failed, storing without vector");
                    record_fallback("embedding");
                    without_vector += 1;
                    None
                }
            };
            chunks.push(KnowledgeChunk {
                id: Uuid::new_v4().to_string(),
                source_id: source.id.clone(),
                ordinal: ordinal as u32,
                content: text,
                embedding,
            });
        }

        let stored = chunks.len();
        if !knowledge::insert_source_with_chunks(&self.db, &source, chunks).await? {
            // Another caller learned the same url between the lookup and the insert.
            let existing = knowledge::find_source_by_url(&self.db, &url).await?;
            return Ok(skipped(existing.map(|s| s.id).unwrap_or(source.id)));
        }

        info!(url = %url, source_id = %source.id, chunks = stored, "source learned");
        Ok(LearnOutcome {
            source_id: source.id,
            skipped: false,
            chunks_stored: stored,
            chunks_without_vector: without_vector,
        })
    }

    /// Vector search over knowledge chunks, joined to their sources.
    ///
    /// An embedding failure yields no hits.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<KnowledgeHit>, TenetError> {
        let embedding = match embed_one(self.embedder.as_ref(), query, self.model_timeout).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "query embedding failed, knowledge search returns nothing");
                record_fallback("embedding");
                return Ok(vec![]);
            }
        };
        let similar = self.vectors.search(&embedding, limit, Namespace::Knowledge).await?;
        let scored: Vec<(String, f32)> =
            similar.into_iter().map(|s| (s.id, s.similarity)).collect();
        self.join_hits(scored).await
    }

    /// Full-text search over chunk content, including chunks without a vector.
    pub async fn search_lexical(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<KnowledgeHit>, TenetError> {
        let hits = knowledge::search_chunks_fts(&self.db, query, limit).await?;
        let scored: Vec<(String, f32)> = hits
            .into_iter()
            .enumerate()
            .map(|(rank, (id, _))| (id, 1.0 / (rank as f32 + 1.0)))
            .collect();
        self.join_hits(scored).await
    }

    /// Learned sources, newest first.
    pub async fn list_sources(&self) -> Result<Vec<KnowledgeSource>, TenetError> {
        knowledge::list_sources(&self.db).await
    }

    /// Chunks of one source in document order.
    pub async fn chunks(&self, source_id: &str) -> Result<Vec<KnowledgeChunk>, TenetError> {
        knowledge::chunks_for_source(&self.db, source_id).await
    }

    async fn join_hits(&self, scored: Vec<(String, f32)>) -> Result<Vec<KnowledgeHit>, TenetError> {
        let ids: Vec<String> = scored.iter().map(|(id, _)| id.clone()).collect();
        let mut joined: HashMap<String, (KnowledgeChunk, KnowledgeSource)> =
            knowledge::chunks_with_sources(&self.db, &ids)
                .await?
                .into_iter()
                .map(|(chunk, source)| (chunk.id.clone(), (chunk, source)))
                .collect();
        Ok(scored
            .into_iter()
            .filter_map(|(id, score)| {
                joined
                    .remove(&id)
                    .map(|(chunk, source)| KnowledgeHit {
                        chunk,
                        source,
                        score,
                    })
            })
            .collect())
    }
}

fn skipped(source_id: String) -> LearnOutcome {
    LearnOutcome {
        source_id,
        skipped: true,
        chunks_stored: 0,
        chunks_without_vector: 0,
    }
}
