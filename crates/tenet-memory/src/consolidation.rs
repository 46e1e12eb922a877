// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation consolidation into episodic summaries.

use std::sync::Arc;

use tenet_config::model::MemoryConfig;
use tenet_core::{ChatAdapter, ChatMessage, EmbeddingAdapter, Episode, EpisodeKind, TenetError};
use tracing::{debug, info, warn};

use crate::episodes::EpisodeStore;
use crate::llm::{chat_with_timeout, embed_one};
use crate::recording::record_fallback;

/// Reply the model gives when a window holds nothing worth keeping.
const NOTHING_NOTEWORTHY: &str = "nothing noteworthy";

const SUMMARY_PROMPT: &str = "Summarize the conversation below in one short paragraph, keeping \
only durable facts, decisions and preferences worth remembering later. If there is nothing \
worth remembering, reply exactly: NOTHING NOTEWORTHY";

/// Summarizes windows of conversation turns into episodes.
pub struct Consolidator {
    chat: Arc<dyn ChatAdapter>,
    embedder: Arc<dyn EmbeddingAdapter>,
    episodes: EpisodeStore,
    config: MemoryConfig,
}

impl Consolidator {
    pub fn new(
        chat: Arc<dyn ChatAdapter>,
        embedder: Arc<dyn EmbeddingAdapter>,
        episodes: EpisodeStore,
        config: MemoryConfig,
    ) -> Self {
        Self {
            chat,
            embedder,
            episodes,
            config,
        }
    }

    /// Summarize the most recent turns of `thread_id` into a summary episode.
    ///
    /// Returns `None` without a model call when there are too few turns, and
    /// `None` when the model is unavailable or finds nothing noteworthy.
    pub async fn consolidate(
        &self,
        thread_id: &str,
        turns: &[ChatMessage],
    ) -> Result<Option<Episode>, TenetError> {
        if turns.len() < self.config.consolidation_min_turns {
            debug!(turns = turns.len(), "too few turns to consolidate");
            return Ok(None);
        }
        let window = &turns[turns.len().saturating_sub(self.config.consolidation_max_turns)..];

        let messages = vec![
            ChatMessage::system(SUMMARY_PROMPT),
            ChatMessage::user(render_transcript(window)),
        ];
        let summary = match chat_with_timeout(
            self.chat.as_ref(),
            messages,
            self.config.chat_options(),
            self.config.model_timeout(),
        )
        .await
        {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(error = %e, "consolidation call failed, skipping");
                record_fallback("consolidation");
                return Ok(None);
            }
        };
        if summary.is_empty() || is_nothing_noteworthy(&summary) {
            debug!(thread_id, "nothing noteworthy in window");
            return Ok(None);
        }

        let vector = match embed_one(self.embedder.as_ref(), &summary, self.config.model_timeout())
            .await
        {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(error = %e, "summary embedding failed, storing without vector");
                record_fallback("embedding");
                None
            }
        };
        let episode = self
            .episodes
            .append(thread_id, &summary, EpisodeKind::Summary, vector)
            .await?;
        info!(episode_id = %episode.id, thread_id, turns = window.len(), "conversation consolidated");
        Ok(Some(episode))
    }
}

fn render_transcript(turns: &[ChatMessage]) -> String {
    let mut out = String::new();
    for turn in turns {
        let role = match turn.role.as_str() {
            "user" => "User",
            "assistant" => "Assistant",
            other => other,
        };
        out.push_str(&format!("{role}: {}\n", turn.content));
    }
    out
}

/// Case-insensitive sentinel match, ignoring punctuation around the phrase.
fn is_nothing_noteworthy(reply: &str) -> bool {
    let stripped = reply.trim_matches(|c: char| !c.is_alphanumeric());
    stripped.eq_ignore_ascii_case(NOTHING_NOTEWORTHY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenet_storage::Database;
    use tenet_test_utils::{MockChat, MockEmbedder};

    fn turns(n: usize) -> Vec<ChatMessage> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    ChatMessage::user(format!("turn {i}"))
                } else {
                    ChatMessage::assistant(format!("reply {i}"))
                }
            })
            .collect()
    }

    async fn consolidator(chat: Arc<MockChat>, embedder: MockEmbedder) -> (Consolidator, EpisodeStore) {
        let db = Database::open_in_memory().await.unwrap();
        let episodes = EpisodeStore::new(db);
        let c = Consolidator::new(chat, Arc::new(embedder), episodes.clone(), MemoryConfig::default());
        (c, episodes)
    }

    #[test]
    fn sentinel_matching_is_lenient() {
        assert!(is_nothing_noteworthy("NOTHING NOTEWORTHY"));
        assert!(is_nothing_noteworthy("Nothing noteworthy."));
        assert!(is_nothing_noteworthy("  \"nothing noteworthy\"  "));
        assert!(!is_nothing_noteworthy("Nothing noteworthy except the move to Porto."));
    }

    #[test]
    fn transcript_labels_roles() {
        let text = render_transcript(&turns(2));
        assert_eq!(text, "User: turn 0\nAssistant: reply 1\n");
    }

    #[tokio::test]
    async fn too_few_turns_skips_without_model_call() {
        let chat = Arc::new(MockChat::new());
        let (c, _) = consolidator(chat.clone(), MockEmbedder::new(3)).await;
        assert!(c.consolidate("t", &turns(3)).await.unwrap().is_none());
        assert!(chat.requests().is_empty());
    }

    #[tokio::test]
    async fn summary_is_stored_even_when_embedding_fails() {
        let chat = Arc::new(MockChat::with_responses(vec!["User is moving to Porto in May."]));
        let embedder = MockEmbedder::new(3);
        embedder.set_failing(true);
        let (c, episodes) = consolidator(chat, embedder).await;

        let episode = c.consolidate("t", &turns(4)).await.unwrap().unwrap();
        assert_eq!(episode.kind, EpisodeKind::Summary);
        assert_eq!(episode.thread_id, "t");
        let stored = episodes.get(&episode.id).await.unwrap().unwrap();
        assert_eq!(stored.content, "User is moving to Porto in May.");
    }

    #[tokio::test]
    async fn sentinel_reply_stores_nothing() {
        let chat = Arc::new(MockChat::with_responses(vec!["Nothing noteworthy."]));
        let (c, episodes) = consolidator(chat, MockEmbedder::new(3)).await;
        assert!(c.consolidate("t", &turns(6)).await.unwrap().is_none());
        assert!(episodes.recent(None, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn window_is_bounded_to_recent_turns() {
        let chat = Arc::new(MockChat::with_responses(vec!["summary"]));
        let (c, _) = consolidator(chat.clone(), MockEmbedder::new(3)).await;
        c.consolidate("t", &turns(50)).await.unwrap();

        let requests = chat.requests();
        let transcript = &requests[0][1].content;
        assert!(!transcript.contains("turn 8\n"));
        assert!(transcript.contains("turn 10\n"));
        assert!(transcript.contains("reply 49"));
    }

    #[tokio::test]
    async fn provider_failure_skips() {
        let chat = Arc::new(MockChat::new());
        chat.set_failing(true);
        let (c, _) = consolidator(chat, MockEmbedder::new(3)).await;
        assert!(c.consolidate("t", &turns(5)).await.unwrap().is_none());
    }
}
