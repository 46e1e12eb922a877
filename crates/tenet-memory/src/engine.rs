// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `MemoryEngine`: the public surface of the belief and episodic memory core.
//!
//! Writes triggered by a conversation thread run under that thread's lock.
//! Maintenance passes run outside any thread lock and tolerate concurrent
//! foreground writes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tenet_config::TenetConfig;
use tenet_core::{
    Belief, BeliefChange, BeliefStatus, ChatAdapter, ChatMessage, EmbeddingAdapter, Episode,
    EpisodeKind, KnowledgeSource, Namespace, PluginAdapter, TenetError,
};
use tenet_storage::queries::knowledge;
use tenet_storage::Database;
use tracing::{debug, info, warn};

use crate::consolidation::Consolidator;
use crate::episodes::EpisodeStore;
use crate::extractor::{strip_remember_prefix, BeliefExtractor};
use crate::knowledge::KnowledgeBase;
use crate::llm::embed_one;
use crate::maintenance::Maintenance;
use crate::merge::MergeEngine;
use crate::recording::{record_fallback, register_metrics, set_active_beliefs};
use crate::resolver::ContradictionResolver;
use crate::retriever::HybridRetriever;
use crate::serializer::ThreadSerializer;
use crate::store::BeliefStore;
use crate::types::{
    KnowledgeHit, LearnOutcome, MemoryStats, MergeOutcome, MergeReport, ReflectReport,
    RememberOutcome, ScoredBelief,
};
use crate::vector::{SqliteVectorStore, VectorStore};

/// Thread used by [`MemoryEngine::remember`] when the caller names none.
pub const DEFAULT_THREAD: &str = "default";

/// Belief and episodic memory engine.
pub struct MemoryEngine {
    beliefs: BeliefStore,
    episodes: EpisodeStore,
    vectors: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingAdapter>,
    extractor: BeliefExtractor,
    merge: Arc<MergeEngine>,
    retriever: HybridRetriever,
    consolidator: Consolidator,
    maintenance: Maintenance,
    knowledge: KnowledgeBase,
    serializer: ThreadSerializer,
    config: TenetConfig,
}

impl MemoryEngine {
    /// Build an engine over an open database and the two model capabilities.
    pub fn new(
        db: Database,
        chat: Arc<dyn ChatAdapter>,
        embedder: Arc<dyn EmbeddingAdapter>,
        config: TenetConfig,
    ) -> Self {
        register_metrics();
        debug!(chat = chat.name(), embedder = embedder.name(), "memory engine ready");
        let memory = config.memory.clone();
        let vectors: Arc<dyn VectorStore> = Arc::new(SqliteVectorStore::new(db.clone()));
        let beliefs = BeliefStore::new(db.clone(), memory.reinforce_step);
        let episodes = EpisodeStore::new(db.clone());

        let merge = Arc::new(MergeEngine::new(
            beliefs.clone(),
            vectors.clone(),
            embedder.clone(),
            ContradictionResolver::new(chat.clone(), memory.clone()),
            memory.clone(),
        ));

        Self {
            extractor: BeliefExtractor::new(chat.clone(), memory.clone()),
            retriever: HybridRetriever::new(
                beliefs.clone(),
                vectors.clone(),
                embedder.clone(),
                memory.clone(),
            ),
            consolidator: Consolidator::new(
                chat.clone(),
                embedder.clone(),
                episodes.clone(),
                memory.clone(),
            ),
            maintenance: Maintenance::new(
                beliefs.clone(),
                vectors.clone(),
                chat,
                merge.clone(),
                memory.clone(),
            ),
            knowledge: KnowledgeBase::new(
                db,
                vectors.clone(),
                embedder.clone(),
                config.knowledge.clone(),
                memory.model_timeout(),
            ),
            beliefs,
            episodes,
            vectors,
            embedder,
            merge,
            serializer: ThreadSerializer::new(),
            config,
        }
    }

    /// Open the configured database and build an engine over it.
    pub async fn open(
        config: TenetConfig,
        chat: Arc<dyn ChatAdapter>,
        embedder: Arc<dyn EmbeddingAdapter>,
    ) -> Result<Self, TenetError> {
        let db = Database::open_with_config(&config.storage).await?;
        Ok(Self::new(db, chat, embedder, config))
    }

    pub fn config(&self) -> &TenetConfig {
        &self.config
    }

    /// Record an observation on the default thread and merge what it says.
    pub async fn remember(&self, text: &str) -> Result<RememberOutcome, TenetError> {
        self.remember_on(DEFAULT_THREAD, text).await
    }

    /// Record an observation on `thread_id` and merge its fact and insight.
    ///
    /// The episode is always written. Model failures degrade per stage and
    /// never fail the call; storage errors do.
    pub async fn remember_on(
        &self,
        thread_id: &str,
        text: &str,
    ) -> Result<RememberOutcome, TenetError> {
        let _guard = self.serializer.acquire(thread_id).await;

        let content = strip_remember_prefix(text);
        let vector = if content.is_empty() {
            None
        } else {
            match embed_one(self.embedder.as_ref(), content, self.config.memory.model_timeout())
                .await
            {
                Ok(v) => Some(v),
                Err(e) => {
                    debug!(error = %e, "episode embedding failed");
                    record_fallback("embedding");
                    None
                }
            }
        };
        let episode = self
            .episodes
            .append(thread_id, content, EpisodeKind::Observation, vector)
            .await?;

        if content.is_empty() {
            return Ok(RememberOutcome {
                episode_id: episode.id,
                belief_ids: vec![],
                is_reinforcement: false,
                outcomes: vec![],
            });
        }

        let extraction = self.extractor.extract(content).await;
        let (fact, insight) = extraction.into_proposals(&self.config.memory);

        let mut outcomes = Vec::new();
        let mut is_reinforcement = false;
        if let Some(fact) = fact {
            let outcome = self.merge.propose(&fact, Some(&episode.id)).await?;
            is_reinforcement = outcome.is_reinforcement();
            outcomes.push(outcome);
        }
        if let Some(insight) = insight {
            outcomes.push(self.merge.propose(&insight, Some(&episode.id)).await?);
        }

        let belief_ids: Vec<String> = outcomes
            .iter()
            .filter_map(|o| o.belief_id().map(str::to_string))
            .collect();
        info!(
            episode_id = %episode.id,
            thread_id,
            beliefs = belief_ids.len(),
            is_reinforcement,
            "observation remembered"
        );
        Ok(RememberOutcome {
            episode_id: episode.id,
            belief_ids,
            is_reinforcement,
            outcomes,
        })
    }

    /// Active beliefs relevant to `query`, best first.
    pub async fn recall(&self, query: &str) -> Result<Vec<ScoredBelief>, TenetError> {
        self.retriever
            .recall(query, self.config.memory.recall_limit, Utc::now())
            .await
    }

    /// Beliefs in `status`, or every belief when `None`.
    pub async fn list_beliefs(
        &self,
        status: Option<BeliefStatus>,
    ) -> Result<Vec<Belief>, TenetError> {
        self.beliefs.list_beliefs(status).await
    }

    pub async fn get_belief(&self, id: &str) -> Result<Option<Belief>, TenetError> {
        self.beliefs.get_belief(id).await
    }

    /// Soft-delete a belief. False when the id is unknown or not active.
    pub async fn forget(&self, id: &str) -> Result<bool, TenetError> {
        let forgotten = self.beliefs.forget(id).await?;
        if forgotten {
            info!(belief_id = id, "belief forgotten");
        } else {
            debug!(belief_id = id, "forget ignored: unknown or inactive");
        }
        Ok(forgotten)
    }

    /// Prune active beliefs whose effective confidence is below `threshold` now.
    pub async fn prune_beliefs(&self, threshold: f64) -> Result<Vec<String>, TenetError> {
        self.prune_beliefs_at(threshold, Utc::now()).await
    }

    /// Prune as seen at `now`.
    pub async fn prune_beliefs_at(
        &self,
        threshold: f64,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, TenetError> {
        self.maintenance.prune_beliefs_at(threshold, now).await
    }

    /// Prune with the configured threshold.
    pub async fn prune_stale(&self) -> Result<Vec<String>, TenetError> {
        self.prune_beliefs(self.config.memory.prune_threshold).await
    }

    pub async fn reflect(&self) -> Result<ReflectReport, TenetError> {
        self.maintenance.reflect(Utc::now()).await
    }

    pub async fn merge_duplicates(
        &self,
        clusters: &[Vec<String>],
    ) -> Result<Vec<MergeReport>, TenetError> {
        self.maintenance.merge_duplicates(clusters).await
    }

    pub async fn synthesize(&self) -> Result<Vec<MergeOutcome>, TenetError> {
        self.maintenance.synthesize().await
    }

    /// Invalidate `remove_id` in favor of `keep_id`.
    pub async fn resolve(&self, keep_id: &str, remove_id: &str) -> Result<bool, TenetError> {
        self.maintenance.resolve(keep_id, remove_id).await
    }

    /// Summarize recent turns of a thread into a summary episode.
    pub async fn consolidate(
        &self,
        thread_id: &str,
        turns: &[ChatMessage],
    ) -> Result<Option<Episode>, TenetError> {
        let _guard = self.serializer.acquire(thread_id).await;
        self.consolidator.consolidate(thread_id, turns).await
    }

    pub async fn learn_from_content(
        &self,
        url: &str,
        title: &str,
        content: &str,
    ) -> Result<LearnOutcome, TenetError> {
        self.knowledge.learn_from_content(url, title, content).await
    }

    /// Vector search over learned chunks. Empty when the query cannot be embedded.
    pub async fn knowledge_search(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<KnowledgeHit>, TenetError> {
        let limit = limit.unwrap_or(self.config.knowledge.search_limit);
        self.knowledge.search(query, limit).await
    }

    /// Full-text search over learned chunks.
    pub async fn knowledge_search_lexical(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<KnowledgeHit>, TenetError> {
        let limit = limit.unwrap_or(self.config.knowledge.search_limit);
        self.knowledge.search_lexical(query, limit).await
    }

    pub async fn list_sources(&self) -> Result<Vec<KnowledgeSource>, TenetError> {
        self.knowledge.list_sources().await
    }

    /// Audit trail of one belief, oldest first.
    pub async fn belief_history(&self, id: &str) -> Result<Vec<BeliefChange>, TenetError> {
        if self.beliefs.get_belief(id).await?.is_none() {
            return Err(TenetError::NotFound {
                kind: "belief",
                id: id.to_string(),
            });
        }
        self.beliefs.history(id).await
    }

    /// Episodes that produced or reinforced a belief, oldest first.
    pub async fn belief_episodes(&self, id: &str) -> Result<Vec<Episode>, TenetError> {
        self.episodes.episodes_for(id).await
    }

    /// Most recent episodes, optionally for one thread.
    pub async fn recent_episodes(
        &self,
        thread_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Episode>, TenetError> {
        self.episodes.recent(thread_id, limit).await
    }

    pub async fn stats(&self) -> Result<MemoryStats, TenetError> {
        let mut stats = MemoryStats::default();
        for (status, count) in self.beliefs.count_by_status().await? {
            match status {
                BeliefStatus::Active => stats.active = count,
                BeliefStatus::Invalidated => stats.invalidated = count,
                BeliefStatus::Forgotten => stats.forgotten = count,
                BeliefStatus::Pruned => stats.pruned = count,
            }
        }
        stats.changes = self.beliefs.count_changes().await?;
        stats.belief_vectors = self.vectors.count(Namespace::Beliefs).await?;
        stats.knowledge_sources =
            knowledge::list_sources(self.beliefs.database()).await?.len() as u64;

        if stats.belief_vectors != stats.active {
            warn!(
                active = stats.active,
                vectors = stats.belief_vectors,
                "active belief and vector counts differ"
            );
        }
        set_active_beliefs(stats.active);
        Ok(stats)
    }
}
