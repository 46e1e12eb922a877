// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reinforcement / merge engine.
//!
//! A new statement is compared with its nearest active beliefs and routed by
//! similarity band:
//!
//! - above `reinforce_threshold`: reinforce the top match;
//! - in `(contradiction_band, reinforce_threshold]`: ask the resolver whether
//!   any of the similar active beliefs is contradicted and replace it if so;
//! - otherwise, or when nothing is contradicted: create a new belief.

use std::collections::HashMap;
use std::sync::Arc;

use tenet_config::model::MemoryConfig;
use tenet_core::{BeliefType, EmbeddingAdapter, Namespace, TenetError};
use tracing::{debug, warn};

use crate::llm::embed_one;
use crate::recording::{record_fallback, record_outcome};
use crate::resolver::{ContradictionResolver, Verdict};
use crate::store::BeliefStore;
use crate::types::{MergeOutcome, Similar};
use crate::vector::VectorStore;

/// A statement waiting to become (or reinforce) a belief.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub statement: String,
    pub belief_type: BeliefType,
    pub subject: String,
    /// Confidence given to the belief if one is created.
    pub confidence: f64,
}

/// Chooses between reinforce, contradict-and-replace and create for each statement.
pub struct MergeEngine {
    beliefs: BeliefStore,
    vectors: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingAdapter>,
    resolver: ContradictionResolver,
    config: MemoryConfig,
}

impl MergeEngine {
    pub fn new(
        beliefs: BeliefStore,
        vectors: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingAdapter>,
        resolver: ContradictionResolver,
        config: MemoryConfig,
    ) -> Self {
        Self {
            beliefs,
            vectors,
            embedder,
            resolver,
            config,
        }
    }

    /// Embed the proposal and merge it into the belief set.
    ///
    /// An embedding failure leaves the belief set untouched and yields `Skipped`.
    pub async fn propose(
        &self,
        proposal: &Proposal,
        episode_id: Option<&str>,
    ) -> Result<MergeOutcome, TenetError> {
        let embedding = match embed_one(
            self.embedder.as_ref(),
            &proposal.statement,
            self.config.model_timeout(),
        )
        .await
        {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "embedding failed, statement not stored as a belief");
                record_fallback("embedding");
                record_outcome("skipped");
                return Ok(MergeOutcome::Skipped {
                    statement: proposal.statement.clone(),
                });
            }
        };
        self.merge(proposal, embedding, episode_id).await
    }

    /// Merge a proposal whose embedding is already known.
    pub async fn merge(
        &self,
        proposal: &Proposal,
        embedding: Vec<f32>,
        episode_id: Option<&str>,
    ) -> Result<MergeOutcome, TenetError> {
        let similar = self
            .vectors
            .search(&embedding, self.config.search_k, Namespace::Beliefs)
            .await?;

        let outcome = match similar.first() {
            Some(top) if f64::from(top.similarity) > self.config.reinforce_threshold => {
                match self.beliefs.reinforce_belief(&top.id, episode_id).await? {
                    Some(_) => MergeOutcome::Reinforced {
                        belief_id: top.id.clone(),
                        similarity: top.similarity,
                    },
                    None => self.create(proposal, embedding, episode_id).await?,
                }
            }
            Some(top) if f64::from(top.similarity) > self.config.contradiction_band => {
                self.check_contradiction(proposal, embedding, &similar, episode_id)
                    .await?
            }
            _ => self.create(proposal, embedding, episode_id).await?,
        };

        debug!(
            outcome = outcome.label(),
            belief_id = outcome.belief_id().unwrap_or_default(),
            top_similarity = similar.first().map(|s| s.similarity),
            "statement merged"
        );
        record_outcome(outcome.label());
        Ok(outcome)
    }

    async fn check_contradiction(
        &self,
        proposal: &Proposal,
        embedding: Vec<f32>,
        similar: &[Similar],
        episode_id: Option<&str>,
    ) -> Result<MergeOutcome, TenetError> {
        // The whole similar set, in rank order, not only the in-band head.
        let ranked: Vec<String> = similar.iter().map(|s| s.id.clone()).collect();
        let by_id: HashMap<String, String> = self
            .beliefs
            .get_beliefs(&ranked)
            .await?
            .into_iter()
            .filter(|b| b.is_active())
            .map(|b| (b.id, b.statement))
            .collect();
        let (ids, statements): (Vec<String>, Vec<String>) = ranked
            .into_iter()
            .filter_map(|id| by_id.get(&id).cloned().map(|statement| (id, statement)))
            .unzip();

        if let Verdict::Contradicts(index) =
            self.resolver.check(&proposal.statement, &statements).await
        {
            let old_id = &ids[index];
            let replaced = self
                .beliefs
                .replace_belief(
                    old_id,
                    &proposal.statement,
                    proposal.confidence,
                    proposal.belief_type,
                    &proposal.subject,
                    embedding.clone(),
                    episode_id,
                )
                .await?;
            if let Some(belief) = replaced {
                return Ok(MergeOutcome::Replaced {
                    belief_id: belief.id,
                    replaced_id: old_id.clone(),
                });
            }
        }
        self.create(proposal, embedding, episode_id).await
    }

    async fn create(
        &self,
        proposal: &Proposal,
        embedding: Vec<f32>,
        episode_id: Option<&str>,
    ) -> Result<MergeOutcome, TenetError> {
        let belief = self
            .beliefs
            .create_belief(
                &proposal.statement,
                proposal.confidence,
                proposal.belief_type,
                &proposal.subject,
                embedding,
                episode_id,
            )
            .await?;
        Ok(MergeOutcome::Created {
            belief_id: belief.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenet_core::{BeliefStatus, ChangeType};
    use tenet_storage::Database;
    use tenet_test_utils::{MockChat, MockEmbedder};

    use crate::vector::SqliteVectorStore;

    struct Fixture {
        engine: MergeEngine,
        beliefs: BeliefStore,
        chat: Arc<MockChat>,
    }

    async fn fixture() -> Fixture {
        let db = Database::open_in_memory().await.unwrap();
        let config = MemoryConfig::default();
        let beliefs = BeliefStore::new(db.clone(), config.reinforce_step);
        let chat = Arc::new(MockChat::new());
        let engine = MergeEngine::new(
            beliefs.clone(),
            Arc::new(SqliteVectorStore::new(db)),
            Arc::new(MockEmbedder::new(2)),
            ContradictionResolver::new(chat.clone(), config.clone()),
            config,
        );
        Fixture {
            engine,
            beliefs,
            chat,
        }
    }

    fn proposal(statement: &str) -> Proposal {
        Proposal {
            statement: statement.into(),
            belief_type: BeliefType::Factual,
            subject: "owner".into(),
            confidence: 0.6,
        }
    }

    /// Unit vector at `cos` similarity to [1, 0].
    fn at(cos: f32) -> Vec<f32> {
        vec![cos, (1.0 - cos * cos).sqrt()]
    }

    #[tokio::test]
    async fn empty_store_creates() {
        let f = fixture().await;
        let outcome = f.engine.merge(&proposal("a"), vec![1.0, 0.0], None).await.unwrap();
        assert!(matches!(outcome, MergeOutcome::Created { .. }));
        assert!(f.chat.requests().is_empty());
    }

    #[tokio::test]
    async fn high_similarity_reinforces_top_match() {
        let f = fixture().await;
        let first = f.engine.merge(&proposal("a"), vec![1.0, 0.0], None).await.unwrap();
        let second = f.engine.merge(&proposal("a'"), at(0.9), None).await.unwrap();

        assert!(second.is_reinforcement());
        assert_eq!(second.belief_id(), first.belief_id());
        assert!(f.chat.requests().is_empty());
    }

    #[tokio::test]
    async fn band_with_contradiction_replaces() {
        let f = fixture().await;
        f.chat.push_response("1");
        let first = f.engine.merge(&proposal("SQLite is slow"), vec![1.0, 0.0], None).await.unwrap();
        let old_id = first.belief_id().unwrap().to_string();

        let second = f
            .engine
            .merge(&proposal("SQLite is fast"), at(0.75), None)
            .await
            .unwrap();
        let MergeOutcome::Replaced {
            belief_id,
            replaced_id,
        } = second
        else {
            panic!("expected replacement, got {second:?}");
        };
        assert_eq!(replaced_id, old_id);

        let old = f.beliefs.get_belief(&old_id).await.unwrap().unwrap();
        assert_eq!(old.status, BeliefStatus::Invalidated);
        let history = f.beliefs.history(&belief_id).await.unwrap();
        assert_eq!(history[0].change_type, ChangeType::Created);
        assert_eq!(history[0].detail.as_deref(), Some(format!("replaces {old_id}").as_str()));
    }

    #[tokio::test]
    async fn band_without_contradiction_creates() {
        let f = fixture().await;
        f.chat.push_response("NONE");
        f.engine.merge(&proposal("a"), vec![1.0, 0.0], None).await.unwrap();
        let outcome = f.engine.merge(&proposal("b"), at(0.8), None).await.unwrap();
        assert!(matches!(outcome, MergeOutcome::Created { .. }));
        assert_eq!(f.beliefs.list_beliefs(Some(BeliefStatus::Active)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn garbage_verdict_never_invalidates() {
        let f = fixture().await;
        f.chat.push_response("I think it is the first one");
        f.engine.merge(&proposal("a"), vec![1.0, 0.0], None).await.unwrap();
        f.engine.merge(&proposal("b"), at(0.8), None).await.unwrap();
        assert!(f
            .beliefs
            .list_beliefs(Some(BeliefStatus::Invalidated))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn resolver_sees_candidates_below_the_band() {
        let f = fixture().await;
        f.chat.push_response("2");
        f.engine.merge(&proposal("near"), vec![1.0, 0.0], None).await.unwrap();
        let far = f.engine.merge(&proposal("far"), at(-0.2), None).await.unwrap();
        let far_id = far.belief_id().unwrap().to_string();

        let query = at(0.75);
        let outcome = f.engine.merge(&proposal("new"), query, None).await.unwrap();
        let MergeOutcome::Replaced { replaced_id, .. } = outcome else {
            panic!("expected replacement, got {outcome:?}");
        };
        assert_eq!(replaced_id, far_id);

        let requests = f.chat.requests();
        let prompt = &requests[0].last().unwrap().content;
        assert!(prompt.contains("1. near"));
        assert!(prompt.contains("2. far"));
    }

    #[tokio::test]
    async fn low_similarity_skips_resolver() {
        let f = fixture().await;
        f.engine.merge(&proposal("a"), vec![1.0, 0.0], None).await.unwrap();
        let outcome = f.engine.merge(&proposal("b"), at(0.5), None).await.unwrap();
        assert!(matches!(outcome, MergeOutcome::Created { .. }));
        assert!(f.chat.requests().is_empty());
    }
}
