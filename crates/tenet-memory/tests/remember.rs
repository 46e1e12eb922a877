// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end `remember` / `recall` flows against a temp database.

mod common;

use chrono::{Duration, Utc};
use tenet_core::{BeliefStatus, ChangeType};
use tenet_memory::MergeOutcome;

use common::{at, engine, fact_reply, harness};

#[tokio::test]
async fn first_observation_creates_one_belief() {
    let h = harness().await;
    let engine = engine(&h);
    h.chat.push_response(
        r#"{"fact": "User likes coffee in the morning", "insight": null, "type": "preference", "subject": "owner"}"#,
    );

    let outcome = engine.remember("I like coffee in the morning").await.unwrap();
    assert!(!outcome.is_reinforcement);
    assert_eq!(outcome.belief_ids.len(), 1);
    assert!(matches!(outcome.outcomes[0], MergeOutcome::Created { .. }));

    let id = &outcome.belief_ids[0];
    let history = engine.belief_history(id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].change_type, ChangeType::Created);
    assert_eq!(history[0].episode_id.as_deref(), Some(outcome.episode_id.as_str()));

    let episodes = engine.belief_episodes(id).await.unwrap();
    assert_eq!(episodes.len(), 1);
    assert_eq!(episodes[0].content, "I like coffee in the morning");
    assert_eq!(engine.list_beliefs(Some(BeliefStatus::Active)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn paraphrase_reinforces_existing_belief() {
    let h = harness().await;
    let engine = engine(&h);
    h.embedder.set("User drinks coffee every morning", vec![1.0, 0.0]);
    h.embedder.set("User has coffee each morning", at(0.9));
    h.chat.push_response(fact_reply("User drinks coffee every morning"));
    h.chat.push_response(fact_reply("User has coffee each morning"));

    let first = engine.remember("coffee every morning").await.unwrap();
    let second = engine.remember("my mornings start with coffee").await.unwrap();

    assert!(second.is_reinforcement);
    assert_eq!(second.belief_ids, first.belief_ids);

    let belief = engine.get_belief(&first.belief_ids[0]).await.unwrap().unwrap();
    assert!(belief.confidence > 0.6 && belief.confidence <= 1.0);
    let history = engine.belief_history(&belief.id).await.unwrap();
    let kinds: Vec<ChangeType> = history.iter().map(|c| c.change_type).collect();
    assert_eq!(kinds, vec![ChangeType::Created, ChangeType::Reinforced]);
    assert_eq!(engine.belief_episodes(&belief.id).await.unwrap().len(), 2);
    // Above the reinforce threshold the resolver is never asked.
    assert_eq!(h.chat.requests().len(), 2);
}

#[tokio::test]
async fn contradiction_replaces_the_old_belief() {
    let h = harness().await;
    let engine = engine(&h);
    h.embedder.set("SQLite is slow", vec![1.0, 0.0]);
    h.embedder.set("SQLite is fast", at(0.75));
    h.chat.push_response(fact_reply("SQLite is slow"));
    h.chat.push_response(fact_reply("SQLite is fast"));
    h.chat.push_response("1");

    let first = engine.remember("SQLite is slow").await.unwrap();
    let second = engine.remember("SQLite is fast").await.unwrap();
    let old_id = &first.belief_ids[0];

    assert!(!second.is_reinforcement);
    match &second.outcomes[0] {
        MergeOutcome::Replaced {
            belief_id,
            replaced_id,
        } => {
            assert_eq!(replaced_id, old_id);
            assert_ne!(belief_id, old_id);
        }
        other => panic!("expected replacement, got {other:?}"),
    }

    let old = engine.get_belief(old_id).await.unwrap().unwrap();
    assert_eq!(old.status, BeliefStatus::Invalidated);
    let history = engine.belief_history(old_id).await.unwrap();
    assert_eq!(history.last().unwrap().change_type, ChangeType::Contradicted);

    let active = engine.list_beliefs(Some(BeliefStatus::Active)).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].statement, "SQLite is fast");
}

#[tokio::test]
async fn contradiction_reaches_weaker_similar_beliefs() {
    let h = harness().await;
    let engine = engine(&h);
    h.embedder.set("User drinks green tea", at(0.75));
    h.embedder.set("User dislikes tea", vec![0.5, -(0.75f32).sqrt()]);
    h.embedder.set("User likes tea", vec![1.0, 0.0]);
    h.chat.push_response(fact_reply("User drinks green tea"));
    h.chat.push_response(fact_reply("User dislikes tea"));
    h.chat.push_response(fact_reply("User likes tea"));
    h.chat.push_response("2");

    let green = engine.remember("User drinks green tea").await.unwrap();
    let dislikes = engine.remember("User dislikes tea").await.unwrap();
    let likes = engine.remember("User likes tea").await.unwrap();

    let requests = h.chat.requests();
    let prompt = &requests[3].last().unwrap().content;
    assert!(prompt.contains("1. User drinks green tea"));
    assert!(prompt.contains("2. User dislikes tea"));

    let weaker = engine.get_belief(&dislikes.belief_ids[0]).await.unwrap().unwrap();
    assert_eq!(weaker.status, BeliefStatus::Invalidated);
    let stronger = engine.get_belief(&green.belief_ids[0]).await.unwrap().unwrap();
    assert_eq!(stronger.status, BeliefStatus::Active);
    assert!(matches!(
        &likes.outcomes[0],
        MergeOutcome::Replaced { replaced_id, .. } if replaced_id == &dislikes.belief_ids[0]
    ));
}

#[tokio::test]
async fn unusable_verdict_creates_alongside() {
    let h = harness().await;
    let engine = engine(&h);
    h.embedder.set("User works remotely", vec![1.0, 0.0]);
    h.embedder.set("User works from Lisbon", at(0.8));
    h.chat.push_response(fact_reply("User works remotely"));
    h.chat.push_response(fact_reply("User works from Lisbon"));
    h.chat.push_response("Statement 1 seems related");

    engine.remember("I work remotely").await.unwrap();
    let second = engine.remember("I work from Lisbon").await.unwrap();

    assert!(matches!(second.outcomes[0], MergeOutcome::Created { .. }));
    assert_eq!(engine.list_beliefs(Some(BeliefStatus::Active)).await.unwrap().len(), 2);
}

#[tokio::test]
async fn insight_is_stored_as_second_belief() {
    let h = harness().await;
    let engine = engine(&h);
    h.embedder.set("User runs every day", vec![1.0, 0.0]);
    h.embedder.set("User values fitness", vec![0.0, 1.0]);
    h.chat.push_response(
        r#"{"fact": "User runs every day", "insight": "User values fitness", "type": "procedural"}"#,
    );

    let outcome = engine.remember("remember this: I run every day").await.unwrap();
    assert_eq!(outcome.belief_ids.len(), 2);

    let insight = engine.get_belief(&outcome.belief_ids[1]).await.unwrap().unwrap();
    assert_eq!(insight.statement, "User values fitness");
    assert_eq!(insight.belief_type, tenet_core::BeliefType::Insight);
    assert_eq!(insight.confidence, h.config.memory.insight_confidence);
}

#[tokio::test]
async fn chat_outage_uses_raw_text_as_fact() {
    let h = harness().await;
    let engine = engine(&h);
    h.chat.set_failing(true);

    let outcome = engine.remember("Remember that my cat is called Miso").await.unwrap();
    let belief = engine.get_belief(&outcome.belief_ids[0]).await.unwrap().unwrap();
    assert_eq!(belief.statement, "my cat is called Miso");
    assert_eq!(belief.subject, "owner");
}

#[tokio::test]
async fn embedding_outage_keeps_the_episode() {
    let h = harness().await;
    let engine = engine(&h);
    h.embedder.set_failing(true);
    h.chat.push_response(fact_reply("User lives in Porto"));

    let outcome = engine.remember("I live in Porto").await.unwrap();
    assert!(outcome.belief_ids.is_empty());
    assert!(matches!(outcome.outcomes[0], MergeOutcome::Skipped { .. }));

    let episodes = engine.recent_episodes(None, 10).await.unwrap();
    assert_eq!(episodes.len(), 1);
    assert_eq!(episodes[0].id, outcome.episode_id);
}

#[tokio::test]
async fn empty_text_records_episode_only() {
    let h = harness().await;
    let engine = engine(&h);

    let outcome = engine.remember("remember:   ").await.unwrap();
    assert!(outcome.belief_ids.is_empty());
    assert!(h.chat.requests().is_empty());
    assert_eq!(engine.recent_episodes(None, 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn recall_ranks_relevant_beliefs_first() {
    let h = harness().await;
    let engine = engine(&h);
    h.embedder.set("User drinks oolong tea", vec![1.0, 0.0]);
    h.embedder.set("User commutes by bike", vec![0.0, 1.0]);
    h.embedder.set("tea", at(0.95));
    h.chat.push_response(fact_reply("User drinks oolong tea"));
    h.chat.push_response(fact_reply("User commutes by bike"));

    engine.remember("I drink oolong tea").await.unwrap();
    engine.remember("I bike to work").await.unwrap();

    let hits = engine.recall("tea").await.unwrap();
    assert_eq!(hits[0].belief.statement, "User drinks oolong tea");
    assert_eq!(hits[0].belief.access_count, 1);
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
}

#[tokio::test]
async fn forget_hides_belief_from_recall() {
    let h = harness().await;
    let engine = engine(&h);
    h.embedder.set("User plays chess", vec![1.0, 0.0]);
    h.embedder.set("chess", vec![1.0, 0.0]);
    h.chat.push_response(fact_reply("User plays chess"));

    let id = engine.remember("I play chess").await.unwrap().belief_ids[0].clone();
    assert!(engine.forget(&id).await.unwrap());
    assert!(!engine.forget(&id).await.unwrap());
    assert!(!engine.forget("no-such-id").await.unwrap());

    assert!(engine.recall("chess").await.unwrap().is_empty());
    let forgotten = engine.list_beliefs(Some(BeliefStatus::Forgotten)).await.unwrap();
    assert_eq!(forgotten.len(), 1);
}

#[tokio::test]
async fn prune_spares_recent_and_removes_decayed() {
    let h = harness().await;
    let engine = engine(&h);
    h.chat.push_response(fact_reply("User owns a kayak"));

    let id = engine.remember("I own a kayak").await.unwrap().belief_ids[0].clone();
    let half_life = h.config.memory.decay_half_life_days;

    let within = Utc::now() + Duration::days(half_life as i64 - 1);
    assert!(engine.prune_beliefs_at(0.05, within).await.unwrap().is_empty());

    let long_after = Utc::now() + Duration::days(half_life as i64 * 8);
    assert_eq!(engine.prune_beliefs_at(0.05, long_after).await.unwrap(), vec![id.clone()]);

    let belief = engine.get_belief(&id).await.unwrap().unwrap();
    assert_eq!(belief.status, BeliefStatus::Pruned);
    let history = engine.belief_history(&id).await.unwrap();
    assert_eq!(history.last().unwrap().change_type, ChangeType::Pruned);
}

#[tokio::test]
async fn stats_track_lifecycle() {
    let h = harness().await;
    let engine = engine(&h);
    h.embedder.set("User speaks Dutch", vec![1.0, 0.0]);
    h.embedder.set("User speaks Greek", vec![0.0, 1.0]);
    h.chat.push_response(fact_reply("User speaks Dutch"));
    h.chat.push_response(fact_reply("User speaks Greek"));

    let dutch = engine.remember("I speak Dutch").await.unwrap().belief_ids[0].clone();
    engine.remember("I speak Greek").await.unwrap();
    engine.forget(&dutch).await.unwrap();

    let stats = engine.stats().await.unwrap();
    assert_eq!(stats.active, 1);
    assert_eq!(stats.forgotten, 1);
    assert_eq!(stats.belief_vectors, 1);
    assert_eq!(stats.changes, 3);
}

#[tokio::test]
async fn history_of_unknown_belief_is_not_found() {
    let h = harness().await;
    let engine = engine(&h);
    let err = engine.belief_history("missing").await.unwrap_err();
    assert!(matches!(err, tenet_core::TenetError::NotFound { .. }));
}
