// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only episode log and its links to beliefs.

use tenet_core::{Episode, EpisodeKind, TenetError};
use tenet_storage::queries::episodes;
use tenet_storage::Database;

/// Persistent log of observations and conversation summaries.
#[derive(Clone)]
pub struct EpisodeStore {
    db: Database,
}

impl EpisodeStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Append an episode. The vector, when present, goes to the episodes namespace.
    pub async fn append(
        &self,
        thread_id: &str,
        content: &str,
        kind: EpisodeKind,
        vector: Option<Vec<f32>>,
    ) -> Result<Episode, TenetError> {
        let episode = Episode::new(thread_id, content, kind);
        episodes::create_episode(&self.db, &episode, vector).await?;
        Ok(episode)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Episode>, TenetError> {
        episodes::get_episode(&self.db, id).await
    }

    /// Newest first, optionally limited to one thread.
    pub async fn recent(
        &self,
        thread_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Episode>, TenetError> {
        episodes::list_episodes(&self.db, thread_id, limit).await
    }

    /// Beliefs produced or reinforced by an episode.
    pub async fn beliefs_for(&self, episode_id: &str) -> Result<Vec<String>, TenetError> {
        episodes::beliefs_for_episode(&self.db, episode_id).await
    }

    /// Episodes that produced or reinforced a belief, oldest first.
    pub async fn episodes_for(&self, belief_id: &str) -> Result<Vec<Episode>, TenetError> {
        episodes::episodes_for_belief(&self.db, belief_id).await
    }
}
