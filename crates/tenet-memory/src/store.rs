// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Belief store: lifecycle and confidence bookkeeping over SQLite.
//!
//! Every mutation goes through one storage transaction that also writes the
//! change row, so the audit trail never drifts from the belief table. The
//! belief vector is written and removed alongside the row.

use tenet_core::{
    Belief, BeliefChange, BeliefStatus, BeliefType, ChangeType, NewChange, TenetError,
};
use tenet_storage::queries::{beliefs, changes};
use tenet_storage::Database;
use tracing::debug;

/// Persistent store for beliefs and their change history.
#[derive(Clone)]
pub struct BeliefStore {
    db: Database,
    reinforce_step: f64,
}

impl BeliefStore {
    /// `reinforce_step` is the fraction of the remaining distance to 1.0 added per reinforcement.
    pub fn new(db: Database, reinforce_step: f64) -> Self {
        Self { db, reinforce_step }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Create an active belief with its embedding and a "created" change row.
    pub async fn create_belief(
        &self,
        statement: &str,
        confidence: f64,
        belief_type: BeliefType,
        subject: &str,
        vector: Vec<f32>,
        episode_id: Option<&str>,
    ) -> Result<Belief, TenetError> {
        let belief = Belief::new(statement, confidence, belief_type, subject);
        let change = NewChange::new(ChangeType::Created).with_episode(episode_id);
        beliefs::create_belief(&self.db, &belief, vector, change).await?;
        debug!(belief_id = %belief.id, confidence, "belief created");
        Ok(belief)
    }

    /// Invalidate `old_id` and create a belief for `statement` in its place.
    ///
    /// Returns `None` when `old_id` is no longer active; nothing is written then.
    #[allow(clippy::too_many_arguments)]
    pub async fn replace_belief(
        &self,
        old_id: &str,
        statement: &str,
        confidence: f64,
        belief_type: BeliefType,
        subject: &str,
        vector: Vec<f32>,
        episode_id: Option<&str>,
    ) -> Result<Option<Belief>, TenetError> {
        let belief = Belief::new(statement, confidence, belief_type, subject);
        let replaced = beliefs::replace_belief(&self.db, old_id, &belief, vector, episode_id).await?;
        if !replaced {
            return Ok(None);
        }
        debug!(belief_id = %belief.id, replaced_id = old_id, "belief replaced");
        Ok(Some(belief))
    }

    /// Saturating reinforcement toward 1.0. Returns the new confidence, or
    /// `None` when the belief is unknown or not active.
    pub async fn reinforce_belief(
        &self,
        id: &str,
        episode_id: Option<&str>,
    ) -> Result<Option<f64>, TenetError> {
        let confidence =
            beliefs::reinforce_belief(&self.db, id, self.reinforce_step, episode_id).await?;
        if let Some(confidence) = confidence {
            debug!(belief_id = id, confidence, "belief reinforced");
        }
        Ok(confidence)
    }

    /// Mark an active belief invalidated.
    pub async fn invalidate(&self, id: &str, detail: Option<String>) -> Result<bool, TenetError> {
        let mut change = NewChange::new(ChangeType::Contradicted);
        change.detail = detail;
        beliefs::transition_belief(&self.db, id, BeliefStatus::Invalidated, change).await
    }

    /// Explicit soft delete. False for unknown or already inactive ids.
    pub async fn forget(&self, id: &str) -> Result<bool, TenetError> {
        let change = NewChange::new(ChangeType::Forgotten);
        beliefs::transition_belief(&self.db, id, BeliefStatus::Forgotten, change).await
    }

    /// Forget `loser` as the losing side of a duplicate merge into `winner`.
    pub async fn merge_into(&self, loser: &str, winner: &str) -> Result<bool, TenetError> {
        let change =
            NewChange::new(ChangeType::Merged).with_detail(format!("merged into {winner}"));
        beliefs::transition_belief(&self.db, loser, BeliefStatus::Forgotten, change).await
    }

    /// Retire a decayed belief.
    pub async fn prune(&self, id: &str, detail: String) -> Result<bool, TenetError> {
        let change = NewChange::new(ChangeType::Pruned).with_detail(detail);
        beliefs::transition_belief(&self.db, id, BeliefStatus::Pruned, change).await
    }

    pub async fn get_belief(&self, id: &str) -> Result<Option<Belief>, TenetError> {
        beliefs::get_belief(&self.db, id).await
    }

    /// Beliefs for the given ids in any status. Unknown ids are skipped.
    pub async fn get_beliefs(&self, ids: &[String]) -> Result<Vec<Belief>, TenetError> {
        beliefs::get_beliefs_by_ids(&self.db, ids).await
    }

    /// Beliefs with the given status, or all of them, most recently updated first.
    pub async fn list_beliefs(
        &self,
        status: Option<BeliefStatus>,
    ) -> Result<Vec<Belief>, TenetError> {
        beliefs::list_beliefs(&self.db, status).await
    }

    /// Ranked full-text hits as `(belief_id, bm25)` pairs.
    pub async fn search_bm25(
        &self,
        text: &str,
        limit: usize,
    ) -> Result<Vec<(String, f64)>, TenetError> {
        beliefs::search_beliefs_fts(&self.db, text, limit).await
    }

    /// Lexical search over active beliefs, used when embeddings are unavailable.
    ///
    /// Full-text match first; a substring match when that finds nothing.
    pub async fn search_beliefs(&self, text: &str, limit: usize) -> Result<Vec<Belief>, TenetError> {
        let hits = self.search_bm25(text, limit).await?;
        if hits.is_empty() {
            return beliefs::search_beliefs_like(&self.db, text, limit).await;
        }
        let ids: Vec<String> = hits.into_iter().map(|(id, _)| id).collect();
        let mut found = self.get_beliefs(&ids).await?;
        found.sort_by_key(|b| ids.iter().position(|id| *id == b.id));
        Ok(found)
    }

    /// Count a recall hit against each belief.
    pub async fn record_access(&self, ids: &[String]) -> Result<(), TenetError> {
        beliefs::record_access(&self.db, ids).await
    }

    /// Change rows for one belief, oldest first.
    pub async fn history(&self, id: &str) -> Result<Vec<BeliefChange>, TenetError> {
        changes::history(&self.db, id).await
    }

    pub async fn count_by_status(&self) -> Result<Vec<(BeliefStatus, u64)>, TenetError> {
        beliefs::count_by_status(&self.db).await
    }

    pub async fn count_changes(&self) -> Result<u64, TenetError> {
        changes::count_changes(&self.db).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenet_core::model::DEFAULT_SUBJECT;
    use tenet_core::Namespace;
    use tenet_storage::queries::embeddings::get_vector;

    async fn store() -> BeliefStore {
        let db = Database::open_in_memory().await.unwrap();
        BeliefStore::new(db, 0.15)
    }

    async fn create(store: &BeliefStore, statement: &str) -> Belief {
        store
            .create_belief(
                statement,
                0.6,
                BeliefType::Factual,
                DEFAULT_SUBJECT,
                vec![1.0, 0.0],
                None,
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = store().await;
        let belief = create(&store, "User lives in Lisbon").await;

        let stored = store.get_belief(&belief.id).await.unwrap().unwrap();
        assert_eq!(stored.statement, "User lives in Lisbon");
        assert_eq!(stored.status, BeliefStatus::Active);

        let history = store.history(&belief.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].change_type, ChangeType::Created);
    }

    #[tokio::test]
    async fn reinforcement_saturates_below_one() {
        let store = store().await;
        let belief = create(&store, "User likes tea").await;

        let mut last = belief.confidence;
        for _ in 0..50 {
            let next = store.reinforce_belief(&belief.id, None).await.unwrap().unwrap();
            assert!(next >= last);
            assert!(next <= 1.0);
            last = next;
        }
        assert_eq!(store.history(&belief.id).await.unwrap().len(), 51);
    }

    #[tokio::test]
    async fn forget_is_soft_and_single_shot() {
        let store = store().await;
        let belief = create(&store, "User owns a bike").await;

        assert!(store.forget(&belief.id).await.unwrap());
        assert!(!store.forget(&belief.id).await.unwrap());
        assert!(!store.forget("missing").await.unwrap());

        let stored = store.get_belief(&belief.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BeliefStatus::Forgotten);
        let history = store.history(&belief.id).await.unwrap();
        assert_eq!(history.last().unwrap().change_type, ChangeType::Forgotten);
        assert!(get_vector(store.database(), Namespace::Beliefs, &belief.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn inactive_beliefs_cannot_be_reinforced() {
        let store = store().await;
        let belief = create(&store, "User plays chess").await;
        store.invalidate(&belief.id, None).await.unwrap();
        assert!(store.reinforce_belief(&belief.id, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn replace_refuses_inactive_target() {
        let store = store().await;
        let old = create(&store, "SQLite is slow").await;
        store.forget(&old.id).await.unwrap();

        let replaced = store
            .replace_belief(
                &old.id,
                "SQLite is fast",
                0.6,
                BeliefType::Factual,
                DEFAULT_SUBJECT,
                vec![1.0, 0.0],
                None,
            )
            .await
            .unwrap();
        assert!(replaced.is_none());
        assert_eq!(store.list_beliefs(Some(BeliefStatus::Active)).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn lexical_search_falls_back_to_substring() {
        let store = store().await;
        create(&store, "User prefers dark roast coffee").await;
        create(&store, "User commutes by train").await;

        let hits = store.search_beliefs("coffee", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].statement.contains("coffee"));

        // Partial word: FTS finds nothing, substring match does.
        let hits = store.search_beliefs("commut", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn merge_into_records_winner() {
        let store = store().await;
        let winner = create(&store, "User drinks coffee").await;
        let loser = create(&store, "User drinks coffee daily").await;

        assert!(store.merge_into(&loser.id, &winner.id).await.unwrap());
        let history = store.history(&loser.id).await.unwrap();
        let last = history.last().unwrap();
        assert_eq!(last.change_type, ChangeType::Merged);
        assert_eq!(last.detail.as_deref(), Some(format!("merged into {}", winner.id).as_str()));
    }
}
